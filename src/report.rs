//! User-facing failure report written to stderr by the binary.

use std::io::{self, Write};

use crate::error::AppError;

pub const CURRENCY_HINT: &str = "Did you use a valid CoinMarketCap currency?\n\
It should be entered exactly as displayed on CoinMarketCap.com (case-insensitive), \
with dashes in place of spaces.";

/// Write the diagnostic for `err`.
///
/// Fetch failures name the requested URL first. Fetch failures and rejected
/// currency slugs are followed by [`CURRENCY_HINT`]. The last line is the
/// error with its cause chain, each cause printed once.
pub fn write_report<W: Write>(err: &anyhow::Error, mut out: W) -> io::Result<()> {
    if let Some(app_err) = err.downcast_ref::<AppError>() {
        if app_err.is_fetch_failure() {
            let url = app_err
                .url()
                .unwrap_or_else(|| "CoinMarketCap".to_string());
            writeln!(out, "Error fetching price data from {}", url)?;
        }
        if app_err.is_fetch_failure() || matches!(app_err, AppError::InvalidCurrency(_)) {
            writeln!(out, "{}", CURRENCY_HINT)?;
        }
    }
    writeln!(out, "error: {:#}", err)?;
    out.flush()
}
