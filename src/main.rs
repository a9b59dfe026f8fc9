use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use incentive_ai::config::{AppConfig, StoreBackend};
use incentive_ai::dataset;
use incentive_ai::error::AppError;
use incentive_ai::evaluation::{CreditShare, EvaluationEngine, PayoutSummary};
use incentive_ai::scheme::{validate_scheme, IncentiveScheme};
use incentive_ai::telemetry;
use incentive_ai::versioning::{JsonFileStore, SchemeService, SchemeServiceError};

#[derive(Parser, Debug)]
#[command(
    name = "incentive-ai",
    about = "Validate and evaluate incentive compensation schemes from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a scheme document without writing anything
    Validate(ValidateArgs),
    /// Evaluate a scheme against a CSV transaction dataset
    Evaluate(EvaluateArgs),
    /// List the latest version of every scheme in the configured store
    List,
}

#[derive(Args, Debug)]
struct ValidateArgs {
    /// Path to the scheme JSON document
    #[arg(long)]
    scheme: PathBuf,
}

#[derive(Args, Debug)]
struct EvaluateArgs {
    /// Path to the scheme JSON document
    #[arg(long)]
    scheme: PathBuf,
    /// Path to the CSV transaction dataset
    #[arg(long)]
    dataset: PathBuf,
    /// Emit the full report as JSON instead of a text summary
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct EvaluationReport {
    scheme_id: String,
    name: String,
    version: u32,
    currency: String,
    summary: PayoutSummary,
    credit_split: Vec<CreditShare>,
}

fn load_scheme(path: &PathBuf) -> Result<IncentiveScheme, AppError> {
    let bytes = fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn run() -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    let cli = Cli::parse();

    match cli.command {
        Command::Validate(args) => {
            let scheme = load_scheme(&args.scheme)?;
            validate_scheme(&scheme, None)?;
            println!(
                "scheme '{}' (version {}) is valid",
                scheme.name, scheme.metadata.version
            );
        }
        Command::Evaluate(args) => {
            let scheme = load_scheme(&args.scheme)?;
            validate_scheme(&scheme, None)?;
            let records = dataset::load_records(&args.dataset)?;
            info!(records = records.len(), "loaded transaction dataset");

            let engine = EvaluationEngine::new(scheme);
            let summary = engine.evaluate_all(&records);
            let credit_split = engine.credit_split(summary.total_payout);
            let scheme = engine.scheme();
            let report = EvaluationReport {
                scheme_id: scheme.scheme_id.clone(),
                name: scheme.name.clone(),
                version: scheme.metadata.version,
                currency: scheme.currency.clone(),
                summary,
                credit_split,
            };

            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{} ({})", report.name, report.scheme_id);
                println!(
                    "records: {}  excluded: {}  not qualified: {}  paid: {}",
                    report.summary.records,
                    report.summary.excluded,
                    report.summary.not_qualified,
                    report.summary.paid
                );
                println!(
                    "total payout: {:.2} {}",
                    report.summary.total_payout, report.currency
                );
                for share in &report.credit_split {
                    println!(
                        "  {}: {:.2} {} ({}%)",
                        share.role, share.amount, report.currency, share.percentage
                    );
                }
            }
        }
        Command::List => match config.store.backend {
            StoreBackend::File => {
                let store =
                    JsonFileStore::open(&config.store.path).map_err(SchemeServiceError::from)?;
                let service = SchemeService::new(Arc::new(store));
                for scheme in service.list_latest()? {
                    println!(
                        "{}  v{}  {}  {}",
                        scheme.scheme_id,
                        scheme.metadata.version,
                        scheme.metadata.status,
                        scheme.name
                    );
                }
            }
            StoreBackend::Memory => {
                println!("store backend is transient; no persisted schemes to list");
            }
        },
    }

    Ok(())
}

fn main() {
    if let Err(err) = run() {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}
