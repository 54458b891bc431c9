use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use ratesheet::core::log::init_logging;
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for ratesheet::AppCommand {
    fn from(cmd: Commands) -> ratesheet::AppCommand {
        match cmd {
            Commands::Rates { reference, json } => ratesheet::AppCommand::Rates { reference, json },
            Commands::Convert { input } => ratesheet::AppCommand::Convert { input },
            Commands::Export {
                destination,
                name,
                input,
            } => ratesheet::AppCommand::Export {
                destination,
                name,
                input,
            },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display rates grouped by continent
    Rates {
        /// Currency to express rates against, overrides the configured one
        #[arg(short, long)]
        reference: Option<String>,

        /// Print the rate sheet as JSON
        #[arg(long)]
        json: bool,
    },
    /// Convert an amount such as "10 USD" into every listed currency
    Convert {
        /// Amount followed by its currency code
        input: String,
    },
    /// Save rates to a two column CSV file
    Export {
        /// Existing directory to write to
        destination: PathBuf,

        /// File name without extension
        name: String,

        /// Amount followed by its currency code, defaults to one unit of the configured reference
        #[arg(short, long)]
        input: Option<String>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => ratesheet::cli::setup::setup(),
        Some(cmd) => ratesheet::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
