use super::rates::fetch_with_spinner;
use super::ui;
use crate::core::RateAggregator;
use crate::core::convert::{Amount, apply_amount, parse_amount};
use crate::core::export::{export_csv, export_path};
use anyhow::Result;
use std::path::Path;

/// Fetches rates for `input` (or one unit of `default_reference`) and saves
/// the currencies that have a value to `<destination>/<name>.csv`.
pub async fn run(
    aggregator: &RateAggregator,
    destination: &Path,
    name: &str,
    input: Option<&str>,
    default_reference: &str,
) -> Result<()> {
    let amount = match input {
        Some(input) => parse_amount(input)?,
        None => Amount {
            value: 1.0,
            currency: default_reference.to_string(),
        },
    };

    // Fail on a bad destination before doing any network work
    export_path(destination, name)?;

    let sheet = fetch_with_spinner(aggregator, &amount.currency).await?;
    let converted = apply_amount(&sheet, amount.value);
    let rows = converted.display_rows();
    let count = rows.len();
    let path = export_csv(rows, destination, name)?;

    if let Some(error) = &sheet.fetch_error {
        eprintln!(
            "{}",
            ui::style_text(&format!("Rates unavailable: {error}"), ui::StyleType::Error)
        );
    }
    println!(
        "Exported {count} rates for {} {} to {}",
        amount.value,
        amount.currency,
        path.display()
    );
    Ok(())
}
