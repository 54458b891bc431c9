//! Amount input parsing and conversion of a rate sheet into amounts

use crate::core::aggregator::RateSheet;
use crate::core::error::{RatesError, Result};
use crate::core::normalize::round2;
use crate::core::rates::RateTable;

/// An amount of a currency, as typed by a user: `"10 USD"`, `"2.5EUR"`.
#[derive(Debug, Clone, PartialEq)]
pub struct Amount {
    pub value: f64,
    pub currency: String,
}

/// Parses a numeric value followed by a three letter uppercase currency code.
pub fn parse_amount(input: &str) -> Result<Amount> {
    let invalid = || RatesError::InvalidAmount(input.to_string());
    let trimmed = input.trim();

    let split = trimmed
        .find(|c: char| c.is_ascii_uppercase())
        .ok_or_else(invalid)?;
    let (value, currency) = trimmed.split_at(split);
    let currency = currency.trim();

    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(invalid());
    }

    let value = value.trim().parse::<f64>().map_err(|_| invalid())?;
    if !value.is_finite() {
        return Err(invalid());
    }

    Ok(Amount {
        value,
        currency: currency.to_string(),
    })
}

/// Value of `amount` units of the reference in a currency quoted at `rate`.
pub fn convert(amount: f64, rate: f64) -> f64 {
    round2(amount * round2(rate))
}

/// A copy of `sheet` where every rate is replaced by the converted amount.
pub fn apply_amount(sheet: &RateSheet, amount: f64) -> RateSheet {
    let rates: RateTable = sheet
        .rates
        .iter()
        .map(|(code, rate)| (code, convert(amount, rate)))
        .collect();

    let mut continents = sheet.continents.clone();
    continents.fill_from(&rates);

    RateSheet {
        rates,
        continents,
        ..sheet.clone()
    }
}
