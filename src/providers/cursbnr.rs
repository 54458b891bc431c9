use crate::core::config::SourceConfig;
use crate::core::error::{RatesError, Result};
use crate::core::rates::RateTable;
use crate::core::source::{Fetched, RateSource};
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::{debug, instrument, warn};

pub const DEFAULT_URL: &str = "https://www.cursbnr.ro/";
pub const DEFAULT_TABLE_ID: &str = "table-currencies";
pub const DEFAULT_DOMESTIC_CURRENCY: &str = "RON";
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Scrapes the rates table of an exchange rate page such as cursbnr.ro.
pub struct CursBnrSource {
    url: String,
    table_id: String,
    domestic_currency: String,
    timeout: Duration,
}

impl CursBnrSource {
    pub fn new(url: &str) -> Self {
        CursBnrSource {
            url: url.to_string(),
            table_id: DEFAULT_TABLE_ID.to_string(),
            domestic_currency: DEFAULT_DOMESTIC_CURRENCY.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn from_config(config: &SourceConfig) -> Self {
        CursBnrSource {
            url: config.url.clone(),
            table_id: config.table_id.clone(),
            domestic_currency: config.domestic_currency.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn download(&self) -> Result<String> {
        debug!("Requesting rates page from {}", self.url);

        let client = reqwest::Client::builder()
            .user_agent("ratesheet/0.1")
            .timeout(self.timeout)
            .build()
            .map_err(|e| RatesError::fetch(&self.url, e))?;

        let response = client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| RatesError::fetch(&self.url, format!("Request error: {e}")))?;

        if !response.status().is_success() {
            return Err(RatesError::fetch(
                &self.url,
                format!("HTTP error: {}", response.status()),
            ));
        }

        response
            .text()
            .await
            .map_err(|e| RatesError::fetch(&self.url, format!("Failed to read body: {e}")))
    }
}

#[async_trait]
impl RateSource for CursBnrSource {
    #[instrument(name = "CursBnrFetch", skip(self), fields(url = %self.url))]
    async fn fetch(&self) -> Fetched {
        let body = match self.download().await {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "Rate fetch failed");
                return Fetched::failed(e);
            }
        };

        let parsed = parse_rate_table(&body, &self.table_id, &self.domestic_currency);
        match parsed.error {
            None => {
                debug!(count = parsed.rates.len(), "Parsed rates table");
                Fetched::complete(parsed.rates)
            }
            Some(reason) => {
                let failure = RatesError::fetch(&self.url, reason);
                warn!(error = %failure, kept = parsed.rates.len(), "Rates table parse stopped");
                Fetched::partial(parsed.rates, failure)
            }
        }
    }
}

#[derive(Debug, Default)]
struct ParsedTable {
    rates: RateTable,
    error: Option<String>,
}

impl ParsedTable {
    fn stopped(rates: RateTable, reason: String) -> Self {
        ParsedTable {
            rates,
            error: Some(reason),
        }
    }
}

/// Strips a leading unit multiplier, e.g. `100JPY` becomes `JPY`.
pub fn strip_multiplier(label: &str) -> &str {
    label
        .trim()
        .trim_start_matches(|c: char| c.is_ascii_digit())
        .trim_start()
}

fn cell_text(cell: &ElementRef<'_>) -> String {
    cell.text().collect::<String>().trim().to_string()
}

/// Reads label and rate from the first and third cells of every body row.
/// Parsing stops at the first malformed row; rows before it are kept and the
/// domestic row is only added once the whole table has been read.
fn parse_rate_table(html: &str, table_id: &str, domestic_currency: &str) -> ParsedTable {
    let table_selector = match Selector::parse(&format!("table#{table_id}")) {
        Ok(selector) => selector,
        Err(e) => {
            return ParsedTable::stopped(
                RateTable::new(),
                format!("Invalid table id '{table_id}': {e:?}"),
            );
        }
    };
    let row_selector = Selector::parse("tbody > tr").expect("valid row selector");
    let cell_selector = Selector::parse("td").expect("valid cell selector");

    let document = Html::parse_document(html);
    let Some(table) = document.select(&table_selector).next() else {
        return ParsedTable::stopped(RateTable::new(), format!("Table #{table_id} not found"));
    };

    let mut rates = RateTable::new();
    for (index, row) in table.select(&row_selector).enumerate() {
        let cells: Vec<String> = row.select(&cell_selector).map(|c| cell_text(&c)).collect();
        if cells.is_empty() {
            continue;
        }
        if cells.len() < 3 {
            return ParsedTable::stopped(
                rates,
                format!("Row {} has {} cells, expected at least 3", index + 1, cells.len()),
            );
        }

        let label = &cells[0];
        let code = strip_multiplier(label);
        if code.is_empty() {
            return ParsedTable::stopped(
                rates,
                format!("Row {} has no currency code in label '{label}'", index + 1),
            );
        }

        let value = match cells[2].parse::<f64>() {
            Ok(value) => value,
            Err(e) => {
                return ParsedTable::stopped(
                    rates,
                    format!("Row {} has invalid rate '{}' for {label}: {e}", index + 1, cells[2]),
                );
            }
        };

        if code != label {
            debug!(label = %label, code, "Stripped multiplier prefix");
        }
        rates.insert(code, value);
    }

    rates.insert(domestic_currency, 1.0);
    ParsedTable { rates, error: None }
}
