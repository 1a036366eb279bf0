//! Verdict search API client
//!
//! Builds the search request for a publish date, performs the list-fetch
//! through a [`Transport`], and turns the response into [`VerdictRecord`]s.
//! The raw body is kept so it can be archived verbatim.

use crate::config::ApiConfig;
use crate::error::TransportFailure;
use crate::transport::{HttpRequest, Transport};
use crate::types::{SelectionCriteria, VerdictRecord};
use chrono::{Duration as ChronoDuration, NaiveDate};
use serde_json::{Value, json};
use std::sync::Arc;
use url::Url;

/// Result of a successful list-fetch
#[derive(Clone, Debug)]
pub struct SearchResponse {
    /// Response body exactly as received
    pub raw: Vec<u8>,
    /// Parsed records, in API order
    pub records: Vec<VerdictRecord>,
    /// HTTP attempts used
    pub attempts: u32,
}

/// Why the list-fetch produced nothing usable
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The request itself failed
    #[error(transparent)]
    Transport(TransportFailure),
    /// The body was not a verdict list
    #[error("invalid API response: {0}")]
    InvalidResponse(String),
}

/// Client for the verdict search endpoint
pub struct VerdictSearch {
    transport: Arc<dyn Transport>,
    api: ApiConfig,
}

impl VerdictSearch {
    /// Create a client sending requests through `transport`
    pub fn new(transport: Arc<dyn Transport>, api: ApiConfig) -> Self {
        Self { transport, api }
    }

    /// Fetch the verdicts published on `date`
    pub async fn fetch(
        &self,
        date: NaiveDate,
        criteria: &SelectionCriteria,
    ) -> std::result::Result<SearchResponse, SearchError> {
        let payload = search_payload(&self.api, date, criteria);
        let request = HttpRequest::post_json(&self.api.search_url, payload, self.api.request_timeout);

        tracing::info!(url = %self.api.search_url, %date, "requesting verdict list");

        let response = self
            .transport
            .request(&request)
            .await
            .map_err(SearchError::Transport)?;

        let records = parse_verdicts(&response.body).map_err(SearchError::InvalidResponse)?;

        tracing::info!(
            count = records.len(),
            bytes = response.body.len(),
            attempts = response.attempts,
            "fetched verdict records"
        );

        Ok(SearchResponse {
            raw: response.body,
            records,
            attempts: response.attempts,
        })
    }

    /// Download location for `record`, if it names a file
    pub fn locator(&self, record: &VerdictRecord) -> Option<Url> {
        download_locator(&self.api, record)
    }
}

/// Start of the publish window for `date`, as the API expects it
///
/// The court publishes on local calendar days; the API wants the local
/// midnight expressed in UTC.
pub fn publish_window_start(date: NaiveDate, utc_offset_hours: i32) -> String {
    let local_midnight = date.and_time(chrono::NaiveTime::MIN);
    let utc = local_midnight - ChronoDuration::hours(i64::from(utc_offset_hours));
    utc.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// JSON body of the search request
pub fn search_payload(api: &ApiConfig, date: NaiveDate, criteria: &SelectionCriteria) -> Value {
    let window = publish_window_start(date, api.utc_offset_hours);
    json!({
        "document": {
            "PublishFrom": window,
            "PublishTo": window,
            "Type": [{ "parent": 0, "value": api.type_code, "text": criteria.document_type }],
            "Technical": criteria.importance,
            "dateType": 2,
            "CodeTypes": [api.type_code],
        },
        "AllSubjects": [{ "Subject": null, "SubSubject": null, "SubSubSubject": null }],
        "Counsel": [],
        "Parties": [],
        "SearchText": [],
        "lan": "1",
    })
}

/// Parse a list response: either `{"data": [...]}` or a bare array
///
/// A `null` or absent `data` means no verdicts were published. Items that are
/// not JSON objects are skipped with a warning; only a body that is not a
/// list at all is an error.
pub fn parse_verdicts(body: &[u8]) -> std::result::Result<Vec<VerdictRecord>, String> {
    let value: Value = serde_json::from_slice(body).map_err(|e| e.to_string())?;

    let list = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => items,
            Some(Value::Null) | None => Vec::new(),
            Some(other) => {
                return Err(format!("\"data\" is not an array: {}", type_name(&other)));
            }
        },
        other => return Err(format!("expected object or array, got {}", type_name(&other))),
    };

    let total = list.len();
    let records: Vec<VerdictRecord> = list
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| {
            if !item.is_object() {
                tracing::warn!(index, kind = type_name(&item), "skipping verdict entry that is not an object");
                return None;
            }
            match serde_json::from_value(item) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(index, error = %e, "skipping unreadable verdict record");
                    None
                }
            }
        })
        .collect();

    if records.len() < total {
        tracing::warn!(kept = records.len(), total, "some verdict entries were skipped");
    }
    Ok(records)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// `download_url?path=<PathForWeb>&fileName=<FileName>&type=<download_type>`
pub fn download_locator(api: &ApiConfig, record: &VerdictRecord) -> Option<Url> {
    let path = record.path_for_web.as_deref().filter(|p| !p.is_empty())?;
    let file_name = record.file_name.as_deref().filter(|f| !f.is_empty())?;
    let download_type = api.download_type.to_string();

    Url::parse_with_params(
        &api.download_url,
        [
            ("path", path),
            ("fileName", file_name),
            ("type", download_type.as_str()),
        ],
    )
    .ok()
}
