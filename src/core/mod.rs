//! Rate acquisition, re-basing and continent grouping

pub mod aggregator;
pub mod config;
pub mod convert;
pub mod error;
pub mod export;
pub mod log;
pub mod normalize;
pub mod rates;
pub mod registry;
pub mod source;

// Re-export main types for cleaner imports
pub use aggregator::{RateAggregator, RateSheet};
pub use error::{ErrorKind, RatesError, ReportedError};
pub use rates::{Continent, ContinentGroups, CurrencySlot, RateTable};
pub use registry::{ContinentRegistry, RegistryLocation};
pub use source::{Fetched, RateSource};
