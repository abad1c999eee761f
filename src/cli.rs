use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::config::parse_date_arg;
use crate::render::{OutputFormat, RenderOptions};

#[derive(Debug, Parser)]
#[command(
    name = "cmc-history",
    about = "Print the CoinMarketCap USD price history for a cryptocurrency in CSV format",
    version
)]
pub struct Cli {
    /// Config file (default: config/default.toml when present)
    #[arg(long, short, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Download and print the price history of a currency
    Fetch {
        /// CoinMarketCap currency slug, with dashes in place of spaces (e.g. bitcoin-cash)
        currency: String,

        /// First day, YYYYMMDD (default: 91 days before --end)
        #[arg(long, value_parser = parse_date_arg)]
        start: Option<NaiveDate>,

        /// Last day, YYYYMMDD (default: today)
        #[arg(long, value_parser = parse_date_arg)]
        end: Option<NaiveDate>,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// Extract the price table from a saved historical-data page
    Parse {
        html_file: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// Print a previously saved CSV file
    Show {
        csv_file: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Debug, Clone, Args)]
pub struct OutputArgs {
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    pub format: OutputFormat,

    /// Order rows from oldest to newest
    #[arg(long)]
    pub oldest_first: bool,
}

impl OutputArgs {
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            format: self.format,
            oldest_first: self.oldest_first,
        }
    }
}
