//! Fetch → normalize → group pipeline

use crate::core::error::{ReportedError, Result};
use crate::core::normalize::normalize;
use crate::core::rates::{ContinentGroups, RateTable};
use crate::core::registry::RegistryLocation;
use crate::core::source::RateSource;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

/// Result of one aggregation cycle, for a single reference currency.
#[derive(Debug, Clone, Serialize)]
pub struct RateSheet {
    pub reference: String,
    pub fetched_at: DateTime<Utc>,
    /// Flat view, for single currency lookups and export.
    pub rates: RateTable,
    /// Display view. Currencies without a rate stay unset.
    pub continents: ContinentGroups,
    pub fetch_error: Option<ReportedError>,
    /// Currencies left out of `rates`, or the reference itself when it
    /// cannot be re-based against.
    pub rejected: Vec<ReportedError>,
}

impl RateSheet {
    pub fn rate(&self, code: &str) -> Option<f64> {
        self.rates.get(code)
    }

    /// `(code, value)` pairs in display order, skipping unset currencies.
    pub fn display_rows(&self) -> Vec<(&str, f64)> {
        self.continents
            .iter()
            .flat_map(|continent| &continent.currencies)
            .filter_map(|slot| slot.rate.map(|rate| (slot.code.as_str(), rate)))
            .collect()
    }
}

/// Runs aggregation cycles against one rate source and registry. Holds no
/// per-cycle state, so a single instance serves any number of references.
pub struct RateAggregator {
    source: Box<dyn RateSource>,
    registry: RegistryLocation,
}

impl RateAggregator {
    pub fn new(source: impl RateSource + 'static, registry: RegistryLocation) -> Self {
        RateAggregator {
            source: Box::new(source),
            registry,
        }
    }

    /// Only a registry failure is returned as an error. Fetch and
    /// normalization failures leave rates unset and are recorded on the sheet.
    #[instrument(name = "FetchAll", skip(self))]
    pub async fn fetch_all(&self, reference: &str) -> Result<RateSheet> {
        info!("Aggregating rates");
        let fetched_at = Utc::now();

        let fetched = self.source.fetch().await;
        let fetch_error = fetched.failure.as_ref().map(|e| {
            warn!(error = %e, kept = fetched.rates.len(), "Continuing after fetch failure");
            ReportedError::from(e)
        });

        let (rates, rejected) = match normalize(&fetched.rates, reference) {
            Ok(normalized) => (
                normalized.rates,
                normalized
                    .rejected
                    .iter()
                    .map(ReportedError::from)
                    .collect(),
            ),
            Err(e) => {
                warn!(error = %e, "Cannot re-base rates to reference");
                (RateTable::new(), vec![ReportedError::from(&e)])
            }
        };

        let mut continents = self.registry.load()?;
        continents.fill_from(&rates);
        debug!(
            rates = rates.len(),
            continents = continents.len(),
            "Aggregation complete"
        );

        Ok(RateSheet {
            reference: reference.to_string(),
            fetched_at,
            rates,
            continents,
            fetch_error,
            rejected,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::{ErrorKind, RatesError};
    use crate::core::source::Fetched;
    use async_trait::async_trait;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::NamedTempFile;

    struct StaticSource {
        rates: RateTable,
        calls: Arc<AtomicUsize>,
    }

    impl StaticSource {
        fn new(rates: RateTable) -> Self {
            Self {
                rates,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl RateSource for StaticSource {
        async fn fetch(&self) -> Fetched {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Fetched::complete(self.rates.clone())
        }
    }

    struct PartialSource;

    #[async_trait]
    impl RateSource for PartialSource {
        async fn fetch(&self) -> Fetched {
            Fetched::partial(
                RateTable::from([("EUR", 4.60), ("USD", 4.20)]),
                RatesError::fetch("http://rates.test", "Malformed row 3"),
            )
        }
    }

    struct FailingSource;

    #[async_trait]
    impl RateSource for FailingSource {
        async fn fetch(&self) -> Fetched {
            Fetched::failed(RatesError::fetch("http://rates.test", "Mocked exception"))
        }
    }

    fn registry_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{content}").unwrap();
        file
    }

    fn raw_rates() -> RateTable {
        RateTable::from([("EUR", 4.60), ("USD", 4.20), ("RON", 1.00)])
    }

    fn slot_rate(sheet: &RateSheet, continent: &str, code: &str) -> Option<f64> {
        sheet
            .continents
            .get(continent)
            .and_then(|c| c.get(code))
            .and_then(|slot| slot.rate)
    }

    #[tokio::test]
    async fn test_fetch_all_fills_grouped_rates() {
        let registry = registry_file("Europe\nEUR\nRON\nISK\nAmerica\nUSD\n");
        let aggregator = RateAggregator::new(
            StaticSource::new(raw_rates()),
            RegistryLocation::File(registry.path().to_path_buf()),
        );

        let sheet = aggregator.fetch_all("USD").await.unwrap();

        assert_eq!(sheet.reference, "USD");
        assert_eq!(
            sheet.rates,
            RateTable::from([("EUR", 0.91), ("USD", 1.00), ("RON", 4.20)])
        );
        assert_eq!(slot_rate(&sheet, "Europe", "EUR"), Some(0.91));
        assert_eq!(slot_rate(&sheet, "Europe", "RON"), Some(4.20));
        assert_eq!(slot_rate(&sheet, "America", "USD"), Some(1.0));

        let isk = sheet.continents.get("Europe").unwrap().get("ISK").unwrap();
        assert_eq!(isk.rate, None);
        assert!(sheet.fetch_error.is_none());
        assert!(sheet.rejected.is_empty());
        assert_eq!(
            sheet.display_rows(),
            vec![("EUR", 0.91), ("RON", 4.20), ("USD", 1.0)]
        );
    }

    #[tokio::test]
    async fn test_fetch_failure_leaves_rates_unset() {
        let aggregator = RateAggregator::new(FailingSource, RegistryLocation::Bundled);

        let sheet = aggregator.fetch_all("USD").await.unwrap();

        assert!(sheet.rates.is_empty());
        assert!(!sheet.continents.is_empty());
        assert!(
            sheet
                .continents
                .iter()
                .flat_map(|c| &c.currencies)
                .all(|slot| slot.rate.is_none())
        );
        assert!(sheet.display_rows().is_empty());
        let fetch_error = sheet.fetch_error.unwrap();
        assert_eq!(fetch_error.kind, ErrorKind::FetchFailure);
        assert_eq!(
            fetch_error.message,
            "Failed to fetch rates from http://rates.test: Mocked exception"
        );
    }

    #[tokio::test]
    async fn test_partial_fetch_keeps_parsed_rows() {
        let registry = registry_file("Europe\nEUR\nRON\nAmerica\nUSD\n");
        let aggregator = RateAggregator::new(
            PartialSource,
            RegistryLocation::File(registry.path().to_path_buf()),
        );

        let sheet = aggregator.fetch_all("USD").await.unwrap();

        assert_eq!(sheet.rates, RateTable::from([("EUR", 0.91), ("USD", 1.00)]));
        assert_eq!(slot_rate(&sheet, "Europe", "EUR"), Some(0.91));
        assert_eq!(slot_rate(&sheet, "America", "USD"), Some(1.0));
        // The domestic row is only added after a complete parse
        assert_eq!(slot_rate(&sheet, "Europe", "RON"), None);
        assert!(sheet.rejected.is_empty());

        let fetch_error = sheet.fetch_error.unwrap();
        assert_eq!(fetch_error.kind, ErrorKind::FetchFailure);
        assert!(fetch_error.message.ends_with("Malformed row 3"));
    }

    #[tokio::test]
    async fn test_missing_registry_aborts_cycle() {
        let dir = tempfile::TempDir::new().unwrap();
        let aggregator = RateAggregator::new(
            StaticSource::new(raw_rates()),
            RegistryLocation::File(dir.path().join("currency_per_category")),
        );

        let err = aggregator.fetch_all("USD").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ResourceUnavailable);
    }

    #[tokio::test]
    async fn test_invalid_reference_rate_is_recorded_not_raised() {
        let registry = registry_file("Europe\nEUR\nAmerica\nUSD\n");
        let aggregator = RateAggregator::new(
            StaticSource::new(RateTable::from([("EUR", 4.60), ("USD", 0.0)])),
            RegistryLocation::File(registry.path().to_path_buf()),
        );

        let sheet = aggregator.fetch_all("USD").await.unwrap();
        assert!(sheet.rates.is_empty());
        assert_eq!(sheet.rejected.len(), 1);
        assert_eq!(sheet.rejected[0].kind, ErrorKind::InvalidRate);
        assert_eq!(sheet.rejected[0].message, "Invalid rate for USD: 0");
        assert_eq!(slot_rate(&sheet, "Europe", "EUR"), None);
    }

    #[tokio::test]
    async fn test_zero_rate_rejects_single_currency() {
        let registry = registry_file("Europe\nEUR\nAsia\nXAU\nAmerica\nUSD\n");
        let aggregator = RateAggregator::new(
            StaticSource::new(RateTable::from([("EUR", 4.60), ("XAU", 0.0), ("USD", 4.20)])),
            RegistryLocation::File(registry.path().to_path_buf()),
        );

        let sheet = aggregator.fetch_all("USD").await.unwrap();
        assert_eq!(slot_rate(&sheet, "Europe", "EUR"), Some(0.91));
        assert_eq!(slot_rate(&sheet, "Asia", "XAU"), None);
        assert_eq!(sheet.rejected.len(), 1);
        assert_eq!(sheet.rejected[0].kind, ErrorKind::InvalidRate);
    }

    #[tokio::test]
    async fn test_references_do_not_interfere() {
        let source = StaticSource::new(raw_rates());
        let calls = Arc::clone(&source.calls);
        let aggregator = RateAggregator::new(source, RegistryLocation::Bundled);

        let usd = aggregator.fetch_all("USD").await.unwrap();
        let eur = aggregator.fetch_all("EUR").await.unwrap();
        let usd_again = aggregator.fetch_all("USD").await.unwrap();

        assert_eq!(usd.rate("USD"), Some(1.0));
        assert_eq!(usd.rate("EUR"), Some(0.91));
        assert_eq!(eur.rate("EUR"), Some(1.0));
        assert_eq!(eur.rate("USD"), Some(1.1));
        assert_eq!(usd.rates, usd_again.rates);
        assert_eq!(usd.continents, usd_again.continents);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_concurrent_cycles_on_shared_aggregator() {
        let aggregator = RateAggregator::new(StaticSource::new(raw_rates()), RegistryLocation::Bundled);

        let (usd, ron) = tokio::join!(aggregator.fetch_all("USD"), aggregator.fetch_all("RON"));
        let (usd, ron) = (usd.unwrap(), ron.unwrap());

        assert_eq!(usd.rate("RON"), Some(4.2));
        assert_eq!(ron.rate("RON"), Some(1.0));
        assert_eq!(ron.rate("USD"), Some(0.24));
    }

    #[tokio::test]
    async fn test_sheet_serializes_unset_rates_as_null() {
        let registry = registry_file("Europe\nEUR\nISK\n");
        let aggregator = RateAggregator::new(
            StaticSource::new(raw_rates()),
            RegistryLocation::File(registry.path().to_path_buf()),
        );

        let sheet = aggregator.fetch_all("USD").await.unwrap();
        let json = serde_json::to_value(&sheet).unwrap();
        assert_eq!(
            json["continents"],
            serde_json::json!({"Europe": {"EUR": 0.91, "ISK": null}})
        );
        assert_eq!(json["rates"]["RON"], serde_json::json!(4.2));
        assert_eq!(json["reference"], "USD");
        assert!(json["fetch_error"].is_null());
    }
}
