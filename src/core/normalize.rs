//! Re-basing of raw rates onto a reference currency

use crate::core::error::{RatesError, Result};
use crate::core::rates::RateTable;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::debug;

/// Used as the reference rate when the reference currency is not in the raw table.
pub const IDENTITY_RATE: f64 = 1.0;

#[derive(Debug, Default)]
pub struct Normalized {
    pub rates: RateTable,
    /// Entries that could not be re-based. They are absent from `rates`.
    pub rejected: Vec<RatesError>,
}

/// Rounds the exact binary value to two decimals, ties to even.
pub fn round2(value: f64) -> f64 {
    Decimal::from_f64_retain(value)
        .and_then(|d| {
            d.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
                .to_f64()
        })
        .unwrap_or_else(|| (value * 100.0).round() / 100.0)
}

fn is_valid_rate(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// How many units of `code` one unit of the reference buys, given both raw
/// rates in domestic units per foreign unit.
pub fn rebase(reference_rate: f64, code: &str, value: f64) -> Result<f64> {
    let invalid = || RatesError::InvalidRate {
        currency: code.to_string(),
        value,
    };
    if !is_valid_rate(value) {
        return Err(invalid());
    }
    let quotient = reference_rate / value;
    if !quotient.is_finite() {
        return Err(invalid());
    }
    Ok(round2(quotient))
}

/// Re-bases every rate in `raw` so that `reference` maps to `1.00`.
///
/// Entries with an unusable rate are rejected individually. An unusable rate
/// for the reference itself fails the whole call since nothing can be
/// expressed against it.
pub fn normalize(raw: &RateTable, reference: &str) -> Result<Normalized> {
    let reference_rate = raw.get(reference).unwrap_or_else(|| {
        debug!(reference, "Reference currency not in raw rates, using identity");
        IDENTITY_RATE
    });
    if !is_valid_rate(reference_rate) {
        return Err(RatesError::InvalidRate {
            currency: reference.to_string(),
            value: reference_rate,
        });
    }

    let mut normalized = Normalized::default();
    for (code, value) in raw.iter() {
        match rebase(reference_rate, code, value) {
            Ok(rate) => {
                normalized.rates.insert(code, rate);
            }
            Err(e) => {
                debug!(error = %e, "Rejecting rate");
                normalized.rejected.push(e);
            }
        }
    }

    debug!(
        reference,
        reference_rate,
        count = normalized.rates.len(),
        rejected = normalized.rejected.len(),
        "Normalized rates"
    );
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;

    fn raw() -> RateTable {
        RateTable::from([("EUR", 4.60), ("USD", 4.20), ("RON", 1.00)])
    }

    #[test]
    fn test_rebase_to_usd() {
        let normalized = normalize(&raw(), "USD").unwrap();
        assert_eq!(
            normalized.rates,
            RateTable::from([("EUR", 0.91), ("USD", 1.00), ("RON", 4.20)])
        );
        assert!(normalized.rejected.is_empty());
    }

    #[test]
    fn test_reference_maps_to_exactly_one() {
        let table = RateTable::from([
            ("EUR", 4.9771),
            ("USD", 4.5873),
            ("GBP", 5.8123),
            ("JPY", 3.0421),
            ("RON", 1.0),
        ]);
        for (reference, _) in table.iter() {
            let normalized = normalize(&table, reference).unwrap();
            assert_eq!(normalized.rates.get(reference), Some(1.0), "{reference}");
        }
    }

    #[test]
    fn test_each_rate_is_rounded_ratio_of_reference() {
        let table = RateTable::from([("EUR", 4.9771), ("GBP", 5.8123), ("JPY", 3.0421)]);
        let normalized = normalize(&table, "GBP").unwrap();
        for (code, value) in table.iter() {
            let expected = round2(5.8123 / value);
            assert_eq!(normalized.rates.get(code), Some(expected), "{code}");
        }
    }

    #[test]
    fn test_missing_reference_falls_back_to_identity() {
        let normalized = normalize(&raw(), "CHF").unwrap();
        assert_eq!(normalized.rates.get("EUR"), Some(0.22));
        assert_eq!(normalized.rates.get("USD"), Some(0.24));
        assert_eq!(normalized.rates.get("RON"), Some(1.0));
        assert!(!normalized.rates.contains("CHF"));
    }

    #[test]
    fn test_zero_rate_rejects_only_that_entry() {
        let table = RateTable::from([("EUR", 4.60), ("XAU", 0.0), ("USD", 4.20)]);
        let normalized = normalize(&table, "USD").unwrap();

        assert_eq!(normalized.rates.len(), 2);
        assert!(!normalized.rates.contains("XAU"));
        assert_eq!(normalized.rejected.len(), 1);
        assert_eq!(normalized.rejected[0].kind(), ErrorKind::InvalidRate);
        assert_eq!(normalized.rejected[0].to_string(), "Invalid rate for XAU: 0");
    }

    #[test]
    fn test_invalid_reference_rate_fails() {
        let table = RateTable::from([("EUR", 4.60), ("USD", 0.0)]);
        let err = normalize(&table, "USD").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRate);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let table = raw();
        let first = normalize(&table, "EUR").unwrap();
        let second = normalize(&table, "EUR").unwrap();
        assert_eq!(first.rates, second.rates);
        assert_eq!(first.rejected.len(), second.rejected.len());
        assert_eq!(table, raw());
    }

    #[test]
    fn test_empty_table_normalizes_to_empty() {
        let normalized = normalize(&RateTable::new(), "USD").unwrap();
        assert!(normalized.rates.is_empty());
    }

    #[test]
    fn test_rates_near_a_tie_round_on_binary_value() {
        let table = RateTable::from([("USD", 4.2), ("XXX", 1.6)]);
        let normalized = normalize(&table, "USD").unwrap();
        assert_eq!(normalized.rates.get("XXX"), Some(2.62));

        let table = RateTable::from([("RON", 1.0), ("YYY", 8.0)]);
        let normalized = normalize(&table, "RON").unwrap();
        assert_eq!(normalized.rates.get("YYY"), Some(0.12));
    }

    #[test]
    fn test_round2_ties_to_even() {
        assert_eq!(round2(0.125), 0.12);
        assert_eq!(round2(0.375), 0.38);
        assert_eq!(round2(-0.125), -0.12);
        assert_eq!(round2(2.675), 2.67);
        assert_eq!(round2(0.913_043), 0.91);
        assert_eq!(round2(4.2), 4.2);
        assert_eq!(round2(1.0), 1.0);
    }
}
