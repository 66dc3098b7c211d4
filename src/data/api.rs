//! HTTP measurement API client.

use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::Value;
use tracing::{debug, warn};

use crate::data::MeasurementSource;
use crate::domain::{MeasurementQuery, RawRow};
use crate::error::AppError;
use crate::io::normalize::{row_from_json, rows_from_json};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/api";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

const LIST_PATH: &str = "/measurements";
const LATEST_PATH: &str = "/measurements/latest";

pub struct MeasurementsClient {
    client: Client,
    base_url: String,
}

impl MeasurementsClient {
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(AppError::config("Measurement API URL is empty (set DASH_API_URL)."));
        }
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::runtime(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get_json(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, AppError> {
        let url = format!("{}{path}", self.base_url);
        debug!(%url, ?query, "GET");

        let resp = self
            .client
            .get(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .query(query)
            .send()
            .map_err(|e| AppError::runtime(format!("Request to {url} failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            let message = http_error_message(status.as_u16(), status.canonical_reason(), &body);
            warn!(%url, status = status.as_u16(), "measurement API returned an error");
            return Err(AppError::runtime(message));
        }

        resp.json::<Value>()
            .map_err(|e| AppError::runtime(format!("Failed to parse response from {url}: {e}")))
    }
}

impl MeasurementSource for MeasurementsClient {
    fn list(&self, query: &MeasurementQuery) -> Result<Vec<RawRow>, AppError> {
        let body = self.get_json(LIST_PATH, &query.pairs())?;
        let rows = rows_from_json(body);
        debug!(rows = rows.len(), "fetched measurement list");
        Ok(rows)
    }

    fn latest(&self, train_id: Option<&str>) -> Result<Option<RawRow>, AppError> {
        let query: Vec<(&str, &str)> = train_id
            .filter(|t| !t.is_empty())
            .map(|t| vec![("train_id", t)])
            .unwrap_or_default();
        let body = self.get_json(LATEST_PATH, &query)?;
        Ok(row_from_json(body))
    }

    fn describe(&self) -> String {
        format!("api {}", self.base_url)
    }
}

/// Resolve the API base URL from `DASH_API_URL`, falling back to the default.
pub fn base_url_from_env() -> String {
    dotenvy::dotenv().ok();
    std::env::var("DASH_API_URL")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
}

fn http_error_message(status: u16, reason: Option<&str>, body: &str) -> String {
    let reason = reason.unwrap_or("");
    let body = body.trim();
    let head = format!("HTTP {status} {reason}");
    let head = head.trim_end();
    if body.is_empty() {
        head.to_string()
    } else {
        format!("{head}: {body}")
    }
}
