pub mod cli;
pub mod core;
pub mod providers;

use crate::core::RateAggregator;
use crate::core::config::AppConfig;
use crate::providers::CursBnrSource;
use anyhow::Result;
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub enum AppCommand {
    Rates {
        reference: Option<String>,
        json: bool,
    },
    Convert {
        input: String,
    },
    Export {
        destination: PathBuf,
        name: String,
        input: Option<String>,
    },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Rate sheet starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let source = CursBnrSource::from_config(&config.source);
    let aggregator = RateAggregator::new(source, config.registry_location());

    match command {
        AppCommand::Rates { reference, json } => {
            let reference = reference.as_deref().unwrap_or(&config.reference);
            cli::rates::run(&aggregator, reference, json).await
        }
        AppCommand::Convert { input } => cli::convert::run(&aggregator, &input).await,
        AppCommand::Export {
            destination,
            name,
            input,
        } => {
            cli::export::run(
                &aggregator,
                &destination,
                &name,
                input.as_deref(),
                &config.reference,
            )
            .await
        }
    }
}
