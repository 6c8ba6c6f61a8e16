use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use account_karma::{save_errors, ResolverConfig, Table};

#[derive(Parser)]
#[command(name = "account-karma")]
#[command(about = "Detect duplicate accounts and parent/child relationships in an account export")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify every account and write the augmented CSV
    Resolve {
        /// Input CSV file
        input: PathBuf,

        /// Output CSV file
        #[arg(short, long, default_value = "processed_accounts.csv")]
        output: PathBuf,

        /// Write row errors to this CSV file
        #[arg(long)]
        errors: Option<PathBuf>,

        /// JSON configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Preferred domain suffix for canonical parents (e.g. "com")
        #[arg(long)]
        preferred_suffix: Option<String>,

        /// Name similarity threshold, 0.0 - 1.0
        #[arg(long)]
        threshold: Option<f64>,

        /// Ignore opportunity counts when ranking
        #[arg(long)]
        no_opportunity_tiebreak: bool,

        /// Threads for the fuzzy name pass (0 = all cores)
        #[arg(long)]
        workers: Option<usize>,

        /// Write the run summary as JSON
        #[arg(long)]
        summary_json: Option<PathBuf>,
    },

    /// Show which header is used for each field
    Columns {
        /// Input CSV file
        input: PathBuf,

        /// JSON configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,account_karma=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Resolve {
            input,
            output,
            errors,
            config,
            preferred_suffix,
            threshold,
            no_opportunity_tiebreak,
            workers,
            summary_json,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(suffix) = preferred_suffix {
                config.preferred_suffix = suffix;
            }
            if let Some(threshold) = threshold {
                config.name_similarity_threshold = threshold;
            }
            if no_opportunity_tiebreak {
                config.opportunity_tiebreak_enabled = false;
            }
            if let Some(workers) = workers {
                config.workers = workers;
            }

            run_resolve(&input, &output, errors.as_deref(), summary_json.as_deref(), &config)
        }
        Commands::Columns { input, config } => {
            let config = load_config(config.as_deref())?;
            run_columns(&input, &config)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<ResolverConfig> {
    match path {
        Some(path) => ResolverConfig::from_file(path),
        None => Ok(ResolverConfig::default()),
    }
}

fn run_resolve(
    input: &Path,
    output: &Path,
    errors_path: Option<&Path>,
    summary_path: Option<&Path>,
    config: &ResolverConfig,
) -> Result<()> {
    tracing::info!(input = %input.display(), "loading accounts");
    let table = Table::load(input)?;

    let outcome = account_karma::run(&table, config).context("Invalid configuration")?;

    outcome.table.write(output)?;
    tracing::info!(output = %output.display(), rows = outcome.table.rows.len(), "augmented table written");

    if !outcome.errors.is_empty() {
        match errors_path {
            Some(path) => {
                save_errors(&outcome.errors, path)?;
                tracing::info!(path = %path.display(), count = outcome.errors.len(), "row errors written");
            }
            None => {
                for error in &outcome.errors {
                    eprintln!("{} [{}] {}", error.severity().as_str(), error.kind.code(), error);
                }
            }
        }
    }

    if let Some(path) = summary_path {
        let json = serde_json::to_string_pretty(&outcome.summary)?;
        fs::write(path, json).with_context(|| format!("Failed to write summary: {:?}", path))?;
    }

    println!("{}", outcome.summary.summary());
    println!("Fingerprint: {}", outcome.summary.fingerprint);

    Ok(())
}

fn run_columns(input: &Path, config: &ResolverConfig) -> Result<()> {
    let table = Table::load(input)?;
    let index = config
        .columns
        .resolve(&table.headers)
        .context("Column mapping failed")?;

    let show = |field: &str, column: Option<usize>| match column {
        Some(c) => println!("{:<22} → {}", field, table.headers[c]),
        None => println!("{:<22} → (not found)", field),
    };

    show("account_id", Some(index.account_id));
    show("name", Some(index.name));
    show("domain", index.domain);
    show("country", index.country);
    show("open_opportunities", index.open_opportunities);
    show("closed_opportunities", index.closed_opportunities);
    show("existing_parent_id", index.existing_parent_id);

    Ok(())
}
