use super::ui;
use crate::core::{RateAggregator, RateSheet};
use anyhow::Result;
use comfy_table::Cell;

impl RateSheet {
    pub fn display_as_tables(&self, value_header: &str) -> String {
        let mut output = format!(
            "{} {}\n",
            ui::style_text("Reference:", ui::StyleType::Label),
            ui::style_text(&self.reference, ui::StyleType::Title)
        );
        output.push_str(&ui::style_text(
            &format!("Fetched at {}", self.fetched_at.format("%Y-%m-%d %H:%M:%S UTC")),
            ui::StyleType::Subtle,
        ));

        for continent in &self.continents {
            let mut table = ui::new_styled_table();
            table.set_header(vec![ui::header_cell("Currency"), ui::header_cell(value_header)]);

            for slot in &continent.currencies {
                table.add_row(vec![
                    Cell::new(&slot.code),
                    ui::format_optional_cell(slot.rate, |r| format!("{r:.2}")),
                ]);
            }

            output.push_str(&format!(
                "\n\n{}\n",
                ui::style_text(&continent.name, ui::StyleType::Title)
            ));
            output.push_str(&table.to_string());
        }

        if let Some(error) = &self.fetch_error {
            output.push_str(&format!(
                "\n\n{}",
                ui::style_text(&format!("Rates unavailable: {error}"), ui::StyleType::Error)
            ));
        }
        for rejected in &self.rejected {
            output.push_str(&format!(
                "\n{}",
                ui::style_text(&format!("Skipped: {rejected}"), ui::StyleType::Subtle)
            ));
        }

        output
    }
}

pub(crate) async fn fetch_with_spinner(
    aggregator: &RateAggregator,
    reference: &str,
) -> Result<RateSheet> {
    let pb = ui::new_spinner(&format!("Fetching rates for {reference}..."));
    let result = aggregator.fetch_all(reference).await;
    pb.finish_and_clear();
    Ok(result?)
}

pub async fn run(aggregator: &RateAggregator, reference: &str, json: bool) -> Result<()> {
    let sheet = fetch_with_spinner(aggregator, reference).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&sheet)?);
    } else {
        println!("{}", sheet.display_as_tables(&format!("Rate (per 1 {reference})")));
    }
    Ok(())
}
