//! Configuration types for verdict-dl

use crate::error::{Error, Result};
use crate::types::SelectionCriteria;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Remote API endpoints and request settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Verdict search endpoint (POST, JSON body)
    #[serde(default = "default_search_url")]
    pub search_url: String,

    /// Verdict file download endpoint (GET with query parameters)
    #[serde(default = "default_download_url")]
    pub download_url: String,

    /// Decision type code understood by the search API (default: 2, judgment)
    #[serde(default = "default_type_code")]
    pub type_code: u32,

    /// `type` query parameter sent with each download (default: 2)
    #[serde(default = "default_type_code")]
    pub download_type: u32,

    /// Offset of the court's local time from UTC, used to build the publish window (default: 3)
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,

    /// User-Agent header
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Referer header (the search page the API expects requests from)
    #[serde(default = "default_referer")]
    pub referer: Option<String>,

    /// Timeout for the list-fetch request (default: 20 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// Timeout for a single file download (default: 60 seconds)
    #[serde(default = "default_download_timeout", with = "duration_serde")]
    pub download_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            search_url: default_search_url(),
            download_url: default_download_url(),
            type_code: default_type_code(),
            download_type: default_type_code(),
            utc_offset_hours: default_utc_offset_hours(),
            user_agent: default_user_agent(),
            referer: default_referer(),
            request_timeout: default_request_timeout(),
            download_timeout: default_download_timeout(),
        }
    }
}

/// Which verdicts to keep from the list response
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Required document type, compared against the record's `Type` (default: "פסק-דין", judgment)
    #[serde(default = "default_document_type")]
    pub document_type: String,

    /// Required importance flag, compared verbatim against the record's `Technical` value
    /// (default: 0, substantive decisions only)
    #[serde(default = "default_importance")]
    pub importance: serde_json::Value,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            document_type: default_document_type(),
            importance: default_importance(),
        }
    }
}

impl SelectionConfig {
    /// Criteria applied by the verdict filter
    pub fn criteria(&self) -> SelectionCriteria {
        SelectionCriteria {
            document_type: self.document_type.clone(),
            importance: self.importance.clone(),
        }
    }
}

/// Output layout
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Root output directory (default: "./output")
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Subdirectory for downloaded verdict files (default: "documents")
    #[serde(default = "default_documents_subdir")]
    pub documents_subdir: PathBuf,

    /// Metadata file name (default: "metadata.json")
    #[serde(default = "default_metadata_file")]
    pub metadata_file: PathBuf,

    /// Raw list response file name (default: "verdicts.json")
    #[serde(default = "default_raw_response_file")]
    pub raw_response_file: PathBuf,

    /// Run log file name (default: "download_log.txt")
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,

    /// Keep files already present under their final name instead of downloading again
    #[serde(default)]
    pub skip_existing: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            documents_subdir: default_documents_subdir(),
            metadata_file: default_metadata_file(),
            raw_response_file: default_raw_response_file(),
            log_file: default_log_file(),
            skip_existing: false,
        }
    }
}

impl OutputConfig {
    /// Directory receiving downloaded verdicts
    pub fn documents_dir(&self) -> PathBuf {
        self.output_dir.join(&self.documents_subdir)
    }

    /// Path of the metadata JSON array
    pub fn metadata_path(&self) -> PathBuf {
        self.output_dir.join(&self.metadata_file)
    }

    /// Path of the verbatim list response
    pub fn raw_response_path(&self) -> PathBuf {
        self.output_dir.join(&self.raw_response_file)
    }

    /// Path of the run log
    pub fn log_path(&self) -> PathBuf {
        self.output_dir.join(&self.log_file)
    }
}

/// Retry configuration shared by the list-fetch and every download
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per request, including the first (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the second attempt (default: 1000 ms)
    #[serde(default = "default_initial_delay", with = "duration_millis_serde")]
    pub initial_delay: Duration,

    /// Upper bound for any single delay (default: 30000 ms)
    #[serde(default = "default_max_delay", with = "duration_millis_serde")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: false)
    #[serde(default)]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: false,
        }
    }
}

/// Main configuration for a run
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Target publish date (None = today in local time)
    #[serde(default)]
    pub date: Option<NaiveDate>,

    /// Remote API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Verdict selection criteria
    #[serde(default)]
    pub selection: SelectionConfig,

    /// Output layout
    #[serde(default)]
    pub output: OutputConfig,

    /// Retry behavior
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Config {
    /// Load configuration from a JSON file; missing fields take their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(
                "config",
                format!("failed to read {}: {}", path.display(), e),
            )
        })?;
        let config: Config = serde_json::from_str(&content).map_err(|e| {
            Error::config(
                "config",
                format!("failed to parse {}: {}", path.display(), e),
            )
        })?;
        Ok(config)
    }

    /// Date the run targets
    pub fn target_date(&self) -> NaiveDate {
        self.date
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    /// Check settings that would otherwise surface as confusing runtime failures
    pub fn validate(&self) -> Result<()> {
        if self.retry.max_attempts == 0 {
            return Err(Error::config(
                "retry.max_attempts",
                "must be at least 1",
            ));
        }
        if self.retry.backoff_multiplier.is_nan() || self.retry.backoff_multiplier < 1.0 {
            return Err(Error::config(
                "retry.backoff_multiplier",
                format!("must be >= 1.0, got {}", self.retry.backoff_multiplier),
            ));
        }
        if self.retry.initial_delay > self.retry.max_delay {
            return Err(Error::config(
                "retry.initial_delay",
                "must not exceed retry.max_delay",
            ));
        }
        for (key, value) in [
            ("api.search_url", &self.api.search_url),
            ("api.download_url", &self.api.download_url),
        ] {
            url::Url::parse(value)
                .map_err(|e| Error::config(key, format!("invalid URL '{}': {}", value, e)))?;
        }
        if !(-14..=14).contains(&self.api.utc_offset_hours) {
            return Err(Error::config(
                "api.utc_offset_hours",
                format!("out of range: {}", self.api.utc_offset_hours),
            ));
        }
        if self.selection.document_type.trim().is_empty() {
            return Err(Error::config(
                "selection.document_type",
                "must not be empty",
            ));
        }
        if self.selection.importance.is_null() {
            return Err(Error::config("selection.importance", "must not be null"));
        }
        Ok(())
    }
}

// Default value functions
fn default_search_url() -> String {
    "https://supremedecisions.court.gov.il/Home/SearchVerdicts".to_string()
}

fn default_download_url() -> String {
    "https://supremedecisions.court.gov.il/Home/Download".to_string()
}

fn default_type_code() -> u32 {
    2
}

fn default_utc_offset_hours() -> i32 {
    3
}

fn default_user_agent() -> String {
    "SupremeCourtDecisionScraper/1.0".to_string()
}

fn default_referer() -> Option<String> {
    Some("https://supremedecisions.court.gov.il/Pages/fullsearch.aspx".to_string())
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(20)
}

fn default_download_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_document_type() -> String {
    "פסק-דין".to_string()
}

fn default_importance() -> serde_json::Value {
    serde_json::Value::from(0)
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_documents_subdir() -> PathBuf {
    PathBuf::from("documents")
}

fn default_metadata_file() -> PathBuf {
    PathBuf::from("metadata.json")
}

fn default_raw_response_file() -> PathBuf {
    PathBuf::from("verdicts.json")
}

fn default_log_file() -> PathBuf {
    PathBuf::from("download_log.txt")
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay() -> Duration {
    Duration::from_millis(1000)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(30)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Duration serialization helper (milliseconds)
mod duration_millis_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
