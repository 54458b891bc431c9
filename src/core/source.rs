//! Raw rate acquisition abstractions

use crate::core::error::RatesError;
use crate::core::rates::RateTable;
use async_trait::async_trait;

/// Outcome of one fetch. A failed fetch still carries the rows committed
/// before the failure point, which is an empty table for transport errors.
#[derive(Debug, Default)]
pub struct Fetched {
    pub rates: RateTable,
    pub failure: Option<RatesError>,
}

impl Fetched {
    pub fn complete(rates: RateTable) -> Self {
        Fetched {
            rates,
            failure: None,
        }
    }

    pub fn failed(failure: RatesError) -> Self {
        Fetched {
            rates: RateTable::new(),
            failure: Some(failure),
        }
    }

    pub fn partial(rates: RateTable, failure: RatesError) -> Self {
        Fetched {
            rates,
            failure: Some(failure),
        }
    }
}

/// Source of raw rates, expressed as domestic currency units per unit of
/// each listed currency.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Never fails outright; errors are reported through [`Fetched::failure`].
    async fn fetch(&self) -> Fetched;
}
