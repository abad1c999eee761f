use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("invalid currency '{0}': expected the CoinMarketCap slug, e.g. 'bitcoin' or 'bitcoin-cash'")]
    InvalidCurrency(String),

    #[error("HTTP request failed")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("malformed price table: {0}")]
    Extract(String),

    #[error("cannot parse {field} value '{value}'")]
    Parse { field: String, value: String },

    #[error("invalid input: {0}")]
    Input(String),

    #[error("CSV error")]
    Csv(#[from] csv::Error),

    #[error("JSON error")]
    Json(#[from] serde_json::Error),

    #[error("IO error")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// True for failures of the network fetch step (transport or status).
    pub fn is_fetch_failure(&self) -> bool {
        matches!(self, AppError::Http(_) | AppError::Status { .. })
    }

    /// URL of the failed request, when known.
    pub fn url(&self) -> Option<String> {
        match self {
            AppError::Status { url, .. } => Some(url.clone()),
            AppError::Http(e) => e.url().map(|u| u.to_string()),
            _ => None,
        }
    }
}
