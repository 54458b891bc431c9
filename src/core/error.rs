//! Error taxonomy shared by the rate pipeline and its export boundary.

use serde::Serialize;
use std::fmt::Display;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = RatesError> = std::result::Result<T, E>;

/// Discriminant for [`RatesError`], used by callers that branch on the
/// failure class rather than the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ResourceUnavailable,
    FetchFailure,
    InvalidRate,
    InvalidDestination,
    InvalidName,
    NameTooLong,
    InvalidAmount,
    Export,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                ErrorKind::ResourceUnavailable => "resource unavailable",
                ErrorKind::FetchFailure => "fetch failure",
                ErrorKind::InvalidRate => "invalid rate",
                ErrorKind::InvalidDestination => "invalid destination",
                ErrorKind::InvalidName => "invalid name",
                ErrorKind::NameTooLong => "name too long",
                ErrorKind::InvalidAmount => "invalid amount",
                ErrorKind::Export => "export failure",
            }
        )
    }
}

#[derive(Error, Debug)]
pub enum RatesError {
    /// The continent registry could not be read. Fatal for an aggregation cycle.
    #[error("Currency registry unavailable at {}: {source}", .path.display())]
    ResourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Network or markup failure while fetching raw rates.
    #[error("Failed to fetch rates from {url}: {reason}")]
    FetchFailure { url: String, reason: String },

    /// A rate that cannot take part in re-basing (zero, negative, not finite).
    #[error("Invalid rate for {currency}: {value}")]
    InvalidRate { currency: String, value: f64 },

    #[error("Invalid export destination: {}", .0.display())]
    InvalidDestination(PathBuf),

    #[error("Invalid export name: {0}")]
    InvalidName(String),

    #[error("Export name is longer than {max} characters: {name}")]
    NameTooLong { name: String, max: usize },

    #[error("Invalid amount, expected a value followed by a currency code: '{0}'")]
    InvalidAmount(String),

    #[error("Failed to write export to {}: {source}", .path.display())]
    Export {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl RatesError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RatesError::ResourceUnavailable { .. } => ErrorKind::ResourceUnavailable,
            RatesError::FetchFailure { .. } => ErrorKind::FetchFailure,
            RatesError::InvalidRate { .. } => ErrorKind::InvalidRate,
            RatesError::InvalidDestination(_) => ErrorKind::InvalidDestination,
            RatesError::InvalidName(_) => ErrorKind::InvalidName,
            RatesError::NameTooLong { .. } => ErrorKind::NameTooLong,
            RatesError::InvalidAmount(_) => ErrorKind::InvalidAmount,
            RatesError::Export { .. } => ErrorKind::Export,
        }
    }

    pub(crate) fn fetch(url: &str, reason: impl Display) -> Self {
        RatesError::FetchFailure {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// A non-fatal failure kept on a result, with its kind preserved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportedError {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&RatesError> for ReportedError {
    fn from(error: &RatesError) -> Self {
        ReportedError {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

impl Display for ReportedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}
