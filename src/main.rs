use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;

use cmc_history::cli::{Cli, Command};
use cmc_history::config::{Config, DateRange};
use cmc_history::extract::extract_table;
use cmc_history::render::{read_csv, render_table};
use cmc_history::report::write_report;
use cmc_history::source::rest::{HistoryClient, HistoryRequest};

fn main() {
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {:#}", e);
            std::process::exit(1);
        }
    };

    init_tracing(&config, cli.verbose);

    if let Err(e) = run(cli.command, &config) {
        report(&e);
        std::process::exit(1);
    }
}

fn init_tracing(config: &Config, verbose: bool) {
    let fallback = if verbose {
        "debug".to_string()
    } else {
        config.logging.level.clone()
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::try_new(&fallback)
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
            }),
        )
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();
}

fn run(command: Command, config: &Config) -> Result<()> {
    let stdout = io::stdout().lock();
    match command {
        Command::Fetch {
            currency,
            start,
            end,
            output,
        } => {
            let today = chrono::Local::now().date_naive();
            let range = DateRange::resolve(start, end, today)?;
            let request = HistoryRequest::new(&currency, range)?;
            let client = HistoryClient::new(&config.source)?;

            tracing::info!(
                currency = %request.currency,
                base_url = %config.source.base_url,
                "Starting cmc-history fetch"
            );
            let table = client.fetch_table(&request)?;
            if table.is_empty() {
                tracing::warn!(currency = %request.currency, "Price table has no rows");
            }
            render_table(table, &output.render_options(), stdout)?;
        }
        Command::Parse { html_file, output } => {
            let html = read_to_string(&html_file)?;
            let table = extract_table(&html)
                .with_context(|| format!("failed to extract {}", html_file.display()))?;
            render_table(table, &output.render_options(), stdout)?;
        }
        Command::Show { csv_file, output } => {
            let file = File::open(&csv_file)
                .with_context(|| format!("failed to open {}", csv_file.display()))?;
            let table = read_csv(BufReader::new(file))
                .with_context(|| format!("failed to read {}", csv_file.display()))?;
            render_table(table, &output.render_options(), stdout)?;
        }
    }
    Ok(())
}

fn read_to_string(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn report(err: &anyhow::Error) {
    tracing::debug!(error = %err, "cmc-history failed");
    let _ = write_report(err, io::stderr().lock());
}
