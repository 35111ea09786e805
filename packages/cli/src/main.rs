// ABOUTME: Entry point for the `revv` binary
// ABOUTME: Parses commands, loads configuration, and dispatches to the server or admin commands

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use revv_cli::{commands, logging, server, Config};
use revv_core::BillingMonth;

#[derive(Parser)]
#[command(name = "revv")]
#[command(about = "REVV - repair order pipeline for collision repair shops")]
#[command(version)]
struct Cli {
    /// SQLite database file (overrides REVV_DATABASE_PATH)
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Port to listen on (overrides REVV_API_PORT)
        #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
        port: Option<u16>,
    },
    /// Create the database if needed and apply migrations
    Migrate,
    /// List open repair orders from earlier months awaiting a revenue period
    Carryover {
        #[arg(long)]
        shop: String,
        /// Month to look back from, YYYY-MM (defaults to this month)
        #[arg(long)]
        as_of: Option<BillingMonth>,
    },
    /// Print the revenue report for a month
    Report {
        #[arg(long)]
        shop: String,
        /// Month to report, YYYY-MM
        #[arg(long)]
        month: BillingMonth,
    },
    /// Identify the carrier for a tracking number
    DetectCarrier { tracking_number: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logging::init_tracing();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    if let Some(database) = cli.database {
        config.database_path = database;
    }

    match cli.command {
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.port = port;
            }
            server::serve(config).await
        }
        Commands::Migrate => commands::migrate(&config.database_path).await,
        Commands::Carryover { shop, as_of } => {
            commands::list_carryover(&config.database_path, &shop, as_of).await
        }
        Commands::Report { shop, month } => {
            commands::revenue_report(&config.database_path, &shop, month).await
        }
        Commands::DetectCarrier { tracking_number } => {
            commands::detect_carrier(&tracking_number);
            Ok(())
        }
    }
}
