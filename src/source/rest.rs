use std::time::Duration;

use reqwest::StatusCode;
use url::Url;

use crate::config::{DateRange, SourceConfig};
use crate::error::AppError;
use crate::extract::extract_table;
use crate::model::price::PriceTable;

/// One historical-data page: a currency slug over an inclusive date range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRequest {
    pub currency: String,
    pub range: DateRange,
}

impl HistoryRequest {
    /// Normalize the slug (trimmed, lower-case). Slugs use dashes in place of
    /// spaces, so any whitespace left after trimming is rejected.
    pub fn new(currency: &str, range: DateRange) -> Result<Self, AppError> {
        let slug = currency.trim().to_ascii_lowercase();
        if slug.is_empty() || slug.chars().any(char::is_whitespace) {
            return Err(AppError::InvalidCurrency(currency.to_string()));
        }
        Ok(Self {
            currency: slug,
            range,
        })
    }
}

/// Blocking client for the CoinMarketCap historical-data pages.
pub struct HistoryClient {
    http: reqwest::blocking::Client,
    base_url: Url,
}

impl HistoryClient {
    pub fn new(config: &SourceConfig) -> Result<Self, AppError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            AppError::Config(format!("source.base_url '{}': {}", config.base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::Config(format!(
                "source.base_url '{}' cannot carry a path",
                config.base_url
            )));
        }
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| AppError::Config(format!("cannot build HTTP client: {}", e)))?;
        Ok(Self { http, base_url })
    }

    /// `{base}/currencies/{currency}/historical-data/?start=YYYYMMDD&end=YYYYMMDD`
    pub fn history_url(&self, request: &HistoryRequest) -> Result<Url, AppError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                AppError::Config(format!("base URL '{}' cannot carry a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(["currencies", request.currency.as_str(), "historical-data", ""]);
        url.query_pairs_mut()
            .append_pair("start", &request.range.start_param())
            .append_pair("end", &request.range.end_param());
        Ok(url)
    }

    /// GET the page for `request`. Anything other than `200 OK` is an error;
    /// there is no retry.
    pub fn fetch_html(&self, request: &HistoryRequest) -> Result<String, AppError> {
        let url = self.history_url(request)?;
        let span = tracing::info_span!("fetch_history", currency = %request.currency, url = %url);
        let _guard = span.enter();

        tracing::info!(
            start = %request.range.start_param(),
            end = %request.range.end_param(),
            "Requesting historical-data page"
        );

        let resp = self.http.get(url.clone()).send()?;
        let status = resp.status();
        if status != StatusCode::OK {
            tracing::warn!(status = status.as_u16(), "Historical-data request rejected");
            return Err(AppError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = resp.text()?;
        tracing::debug!(
            status = status.as_u16(),
            bytes = body.len(),
            "Historical-data page received"
        );
        Ok(body)
    }

    /// Fetch the page and extract its price table.
    pub fn fetch_table(&self, request: &HistoryRequest) -> Result<PriceTable, AppError> {
        let html = self.fetch_html(request)?;
        extract_table(&html)
    }
}
