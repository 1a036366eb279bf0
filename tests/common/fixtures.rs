//! Verdict list fixtures and configuration for runs against a mock court API

use chrono::NaiveDate;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use verdict_dl::{Config, MetadataEntry, RetryConfig};

/// Document type the fixtures select
pub const JUDGMENT: &str = "judgment";

/// Target date used by every scenario
pub fn run_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 10, 1).unwrap_or_default()
}

/// One verdict record in the API's wire format
pub fn verdict(case_id: i64, doc_type: &str, importance: &str, file_name: &str) -> Value {
    json!({
        "CaseId": case_id,
        "CaseNum": format!("{}/25", case_id),
        "CaseName": format!("Appellant {} v. State", case_id),
        "CaseDesc": "Criminal appeal",
        "Type": doc_type,
        "Technical": importance,
        "VerdictDt": "/Date(1759276800000)/",
        "VerdictsDtString": "01/10/2025",
        "Year": 2025,
        "PathForWeb": format!("/25/{}/", case_id),
        "FileName": file_name,
        "DocName": file_name,
    })
}

/// Five records of which cases 102 and 105 match judgment + substantive
pub fn five_records_two_matches() -> Value {
    json!({
        "data": [
            verdict(101, "decision", "substantive", "v101.pdf"),
            verdict(102, JUDGMENT, "substantive", "v102.pdf"),
            verdict(103, JUDGMENT, "technical", "v103.pdf"),
            verdict(104, "decision", "technical", "v104.pdf"),
            verdict(105, JUDGMENT, "substantive", "v105.pdf"),
        ]
    })
}

/// Retry policy with millisecond delays so scenarios stay fast
pub fn fast_retry() -> RetryConfig {
    RetryConfig {
        max_attempts: 3,
        initial_delay: Duration::from_millis(5),
        max_delay: Duration::from_millis(20),
        backoff_multiplier: 2.0,
        jitter: false,
    }
}

/// Configuration pointing at `server_uri`, writing under `temp_dir`
pub fn test_config(server_uri: &str, temp_dir: &TempDir) -> Config {
    let mut config = Config {
        date: Some(run_date()),
        retry: fast_retry(),
        ..Default::default()
    };
    config.api.search_url = format!("{}/Home/SearchVerdicts", server_uri);
    config.api.download_url = format!("{}/Home/Download", server_uri);
    config.api.request_timeout = Duration::from_secs(5);
    config.api.download_timeout = Duration::from_secs(5);
    config.selection.document_type = JUDGMENT.to_string();
    config.selection.importance = json!("substantive");
    config.output.output_dir = temp_dir.path().join("output");
    config
}

/// Read back the metadata written by a run
pub fn read_metadata(config: &Config) -> Vec<MetadataEntry> {
    let path = config.output.metadata_path();
    verdict_dl::metadata::load(&path)
        .unwrap_or_else(|e| panic!("failed to read {}: {}", path.display(), e))
}

/// Names of the regular files in `dir`, sorted; empty if `dir` does not exist
pub fn list_files(dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Documents directory of `config`
pub fn documents_dir(config: &Config) -> PathBuf {
    config.output.documents_dir()
}
