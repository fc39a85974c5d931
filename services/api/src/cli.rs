use crate::admin::{export_collection, ListParams};
use crate::infra::AppContext;
use crate::server;
use clap::{Args, Parser, Subcommand};
use chrono::Utc;
use std::path::PathBuf;
use talent_bridge::config::AppConfig;
use talent_bridge::dashboard::{RefreshOutcome, RefreshTrigger};
use talent_bridge::directory::hash_access_code;
use talent_bridge::error::AppError;
use talent_bridge::export::ExportError;
use talent_bridge::telemetry;
use tracing::warn;

#[derive(Parser, Debug)]
#[command(
    name = "Talent Bridge",
    about = "Run the talent sponsorship back office or query it from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Write one dashboard collection to a CSV file
    Export(ExportArgs),
    /// Print dashboard statistics as JSON
    Stats,
    /// Print an argon2 hash of a directory access code for DIRECTORY_ACCESS_CODE_HASH
    HashAccessCode {
        /// Plaintext code handed to sponsors
        code: String,
    },
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

#[derive(Args, Debug)]
pub(crate) struct ExportArgs {
    /// Collection to export: talent, sponsors or contacts
    collection: String,
    /// Only rows whose text fields contain this term
    #[arg(long)]
    search: Option<String>,
    /// Only rows with this status ("all" for every status)
    #[arg(long)]
    status: Option<String>,
    /// Directory the CSV file is written to
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Export(args) => run_export(args).await,
        Command::Stats => run_stats().await,
        Command::HashAccessCode { code } => {
            println!("{}", hash_access_code(&code)?);
            Ok(())
        }
    }
}

/// Build the services and load the dashboard once, as the server does at
/// startup.
async fn loaded_context() -> Result<AppContext, AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    let context = AppContext::build(&config)?;

    if let RefreshOutcome::Completed(report) =
        context.dashboard.refresh(RefreshTrigger::Manual).await
    {
        for failure in &report.failures {
            warn!(table = failure.table.name(), error = %failure.message, "collection not loaded");
        }
    }
    Ok(context)
}

async fn run_export(args: ExportArgs) -> Result<(), AppError> {
    let context = loaded_context().await?;
    let params = ListParams {
        search: args.search,
        status: args.status,
    };

    match export_collection(&context.dashboard, &args.collection, params)? {
        None => println!("No {} rows match; nothing written.", args.collection),
        Some(export) => {
            std::fs::create_dir_all(&args.out_dir)?;
            let path = args.out_dir.join(&export.filename);
            std::fs::write(&path, export.content)?;
            println!("Wrote {} rows to {}", export.rows, path.display());
        }
    }
    Ok(())
}

async fn run_stats() -> Result<(), AppError> {
    let context = loaded_context().await?;
    let stats = context.dashboard.stats(Utc::now());
    let rendered = serde_json::to_string_pretty(&stats).map_err(ExportError::from)?;
    println!("{rendered}");
    Ok(())
}
