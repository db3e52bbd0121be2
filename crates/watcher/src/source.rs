//! Source client: fetches the raw cell values of the watched range

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Default endpoint of the Google Sheets API
pub const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/";

/// Longest error body kept in a [`SourceError::Status`]
const MAX_ERROR_BODY: usize = 512;

/// Errors from fetching a range; all of them are treated as retryable
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request to source failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("source returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid source url: {0}")]
    Url(String),
}

/// Anything that can return the rows of a range as strings
///
/// Rows may be short or missing entirely; normalization is the caller's job.
#[async_trait]
pub trait GridSource: Send + Sync {
    async fn fetch(&self, range: &str) -> Result<Vec<Vec<String>>, SourceError>;
}

/// Credentials for the Sheets values API
#[derive(Clone)]
pub enum SheetsAuth {
    /// API key, sent as the `key` query parameter (link-shared sheets)
    ApiKey(String),
    /// OAuth 2.0 access token, sent as a bearer header
    BearerToken(String),
}

impl std::fmt::Debug for SheetsAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SheetsAuth::ApiKey(_) => f.write_str("ApiKey(***)"),
            SheetsAuth::BearerToken(_) => f.write_str("BearerToken(***)"),
        }
    }
}

/// Body of `spreadsheets.values.get`
#[derive(Debug, Deserialize)]
struct ValueRange {
    /// Absent when the whole range is empty
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

/// Client for the Google Sheets values API
#[derive(Debug, Clone)]
pub struct SheetsClient {
    http: reqwest::Client,
    base: Url,
    spreadsheet_id: String,
    auth: SheetsAuth,
}

impl SheetsClient {
    /// Create a client for one spreadsheet
    pub fn new(
        spreadsheet_id: impl Into<String>,
        auth: SheetsAuth,
        timeout: Duration,
    ) -> Result<Self, SourceError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let base = Url::parse(SHEETS_API_BASE).map_err(|e| SourceError::Url(e.to_string()))?;
        Ok(Self {
            http,
            base,
            spreadsheet_id: spreadsheet_id.into(),
            auth,
        })
    }

    /// Point the client at a different API root (proxies, local fakes)
    pub fn with_base_url(mut self, base: &str) -> Result<Self, SourceError> {
        self.base = Url::parse(base).map_err(|e| SourceError::Url(e.to_string()))?;
        Ok(self)
    }

    /// Build the `values.get` URL for a sheet-qualified range
    fn values_url(&self, range: &str) -> Result<Url, SourceError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| SourceError::Url(format!("{} cannot be a base URL", self.base)))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.spreadsheet_id.as_str(), "values", range]);

        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("valueRenderOption", "FORMATTED_VALUE")
                .append_pair("dateTimeRenderOption", "FORMATTED_STRING");
            if let SheetsAuth::ApiKey(key) = &self.auth {
                query.append_pair("key", key);
            }
        }

        Ok(url)
    }
}

#[async_trait]
impl GridSource for SheetsClient {
    async fn fetch(&self, range: &str) -> Result<Vec<Vec<String>>, SourceError> {
        let url = self.values_url(range)?;

        let mut request = self.http.get(url);
        if let SheetsAuth::BearerToken(token) = &self.auth {
            request = request.bearer_auth(token);
        }

        // Strip URLs from errors so an API key never reaches the logs
        let response = request.send().await.map_err(|e| e.without_url())?;
        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            truncate_on_char_boundary(&mut body, MAX_ERROR_BODY);
            return Err(SourceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: ValueRange = response.json().await.map_err(|e| e.without_url())?;
        debug!("Fetched {} rows from {}", body.values.len(), range);

        Ok(body
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect())
    }
}

/// Render one JSON cell as the text shown in the sheet
fn cell_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn truncate_on_char_boundary(s: &mut String, max: usize) {
    if s.len() <= max {
        return;
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    s.truncate(cut);
}
