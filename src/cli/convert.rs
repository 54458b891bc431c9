use super::rates::fetch_with_spinner;
use crate::core::RateAggregator;
use crate::core::convert::{apply_amount, parse_amount};
use anyhow::Result;

/// Prints what an amount such as `"10 USD"` is worth in every listed currency.
pub async fn run(aggregator: &RateAggregator, input: &str) -> Result<()> {
    let amount = parse_amount(input)?;
    let sheet = fetch_with_spinner(aggregator, &amount.currency).await?;
    let converted = apply_amount(&sheet, amount.value);

    println!(
        "{}",
        converted.display_as_tables(&format!("Value of {} {}", amount.value, amount.currency))
    );
    Ok(())
}
