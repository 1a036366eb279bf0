//! Core types for verdict-dl

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

/// A single court decision as returned by the search API
///
/// Every field is optional: the API is not guaranteed to send any of them, and
/// a missing field only ever excludes the record from selection. Text fields
/// accept numbers and booleans as their JSON text and read any other
/// non-string value as absent, so one oddly typed field never rejects a record.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VerdictRecord {
    /// Case identifier
    #[serde(rename = "CaseId", default)]
    pub case_id: Option<serde_json::Value>,

    /// Case number as displayed by the court
    #[serde(rename = "CaseNum", default, deserialize_with = "lenient_text")]
    pub case_number: Option<String>,

    /// Parties to the case
    #[serde(rename = "CaseName", default, deserialize_with = "lenient_text")]
    pub parties: Option<String>,

    /// Free-text case description
    #[serde(rename = "CaseDesc", default, deserialize_with = "lenient_text")]
    pub case_description: Option<String>,

    /// Document type (e.g. judgment, decision)
    #[serde(rename = "Type", default, deserialize_with = "lenient_text")]
    pub document_type: Option<String>,

    /// Importance classification, kept verbatim
    #[serde(rename = "Technical", default)]
    pub importance: Option<serde_json::Value>,

    /// Decision date in .NET form, `/Date(1696118400000)/`
    #[serde(rename = "VerdictDt", default, deserialize_with = "lenient_text")]
    pub decision_date: Option<String>,

    /// Publication date as a display string
    #[serde(rename = "VerdictsDtString", default, deserialize_with = "lenient_text")]
    pub published_date: Option<String>,

    /// Case year
    #[serde(rename = "Year", default)]
    pub year: Option<serde_json::Value>,

    /// Server-side directory of the verdict file
    #[serde(rename = "PathForWeb", default, deserialize_with = "lenient_text")]
    pub path_for_web: Option<String>,

    /// Server-side file name of the verdict file
    #[serde(rename = "FileName", default, deserialize_with = "lenient_text")]
    pub file_name: Option<String>,

    /// Display name of the document, usually carrying its extension
    #[serde(rename = "DocName", default, deserialize_with = "lenient_text")]
    pub doc_name: Option<String>,
}

impl VerdictRecord {
    /// Case identifier rendered as text (numbers and strings alike)
    pub fn case_id_text(&self) -> Option<String> {
        self.case_id.as_ref().and_then(value_text)
    }
}

fn value_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        serde_json::Value::Null | serde_json::Value::Array(_) | serde_json::Value::Object(_) => None,
    }
}

fn lenient_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_text))
}

/// Predicates a verdict must satisfy to be downloaded
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SelectionCriteria {
    /// Required document type
    pub document_type: String,
    /// Required importance value, compared verbatim
    pub importance: serde_json::Value,
}

/// One verdict selected for download
#[derive(Clone, Debug)]
pub struct DownloadTask {
    /// 1-based position among the selected verdicts
    pub index: usize,
    /// Target file name inside the documents directory
    pub file_name: String,
    /// Where to fetch the file from (None when the record carries no path/file name)
    pub locator: Option<Url>,
    /// Target date of the run
    pub date: NaiveDate,
    /// Record the task was derived from
    pub verdict: VerdictRecord,
}

/// Terminal status of a task
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    /// File is present under its final name
    Succeeded,
    /// File could not be obtained
    Failed,
}

/// Why a task failed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureReason {
    /// Transport gave up (retries exhausted or non-retryable status)
    NetworkError,
    /// The file could not be written locally
    WriteError,
    /// The record had no usable download location
    MissingLocator,
}

impl FailureReason {
    /// Stable string form, as written to metadata
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::NetworkError => "network-error",
            FailureReason::WriteError => "write-error",
            FailureReason::MissingLocator => "missing-locator",
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of downloading one task
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// File was fetched and written
    Succeeded {
        /// Final path of the file
        path: PathBuf,
        /// Bytes written
        bytes_written: u64,
        /// HTTP attempts used
        attempts: u32,
    },
    /// File already existed and was kept
    Skipped {
        /// Final path of the file
        path: PathBuf,
        /// Size of the existing file
        bytes: u64,
    },
    /// File could not be obtained
    Failed {
        /// Failure category
        reason: FailureReason,
        /// Human-readable detail
        detail: String,
        /// HTTP attempts used (0 when no request was made)
        attempts: u32,
    },
}

impl DownloadOutcome {
    /// Whether the file is on disk after this outcome
    pub fn is_success(&self) -> bool {
        !matches!(self, DownloadOutcome::Failed { .. })
    }
}

/// Persisted audit record for one task
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetadataEntry {
    /// 1-based task index
    pub index: usize,
    /// Local file name (also for failures, to allow a manual retry)
    pub file_name: String,
    /// Source case identifier
    pub case_id: Option<String>,
    /// Target date of the run, YYYY-MM-DD
    pub date: NaiveDate,
    /// Terminal status
    pub status: EntryStatus,
    /// Failure category, present only on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<FailureReason>,
    /// Failure detail, present only on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Case number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_number: Option<String>,
    /// Parties to the case
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parties: Option<String>,
    /// Case description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_description: Option<String>,
    /// Document type reported by the API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision_type: Option<String>,
    /// Decision date parsed from the API's .NET date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision_date: Option<NaiveDate>,
    /// Publication date string reported by the API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
    /// Case year
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<serde_json::Value>,
    /// Size of the file on disk
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size_bytes: Option<u64>,
    /// URL the file was requested from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    /// Local path of the file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_path: Option<PathBuf>,
    /// HTTP attempts used
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempts: Option<u32>,
}

impl MetadataEntry {
    /// Build the entry for a task and its outcome
    pub fn from_outcome(task: &DownloadTask, outcome: &DownloadOutcome) -> Self {
        let verdict = &task.verdict;
        let mut entry = MetadataEntry {
            index: task.index,
            file_name: task.file_name.clone(),
            case_id: verdict.case_id_text(),
            date: task.date,
            status: EntryStatus::Succeeded,
            reason: None,
            error: None,
            case_number: verdict.case_number.clone(),
            parties: verdict.parties.clone(),
            case_description: verdict.case_description.clone(),
            decision_type: verdict.document_type.clone(),
            decision_date: verdict
                .decision_date
                .as_deref()
                .and_then(crate::naming::parse_dotnet_date),
            published_date: verdict.published_date.clone(),
            year: verdict.year.clone(),
            file_size_bytes: None,
            download_url: task.locator.as_ref().map(|u| u.to_string()),
            local_path: None,
            attempts: None,
        };

        match outcome {
            DownloadOutcome::Succeeded {
                path,
                bytes_written,
                attempts,
            } => {
                entry.file_size_bytes = Some(*bytes_written);
                entry.local_path = Some(path.clone());
                entry.attempts = Some(*attempts);
            }
            DownloadOutcome::Skipped { path, bytes } => {
                entry.file_size_bytes = Some(*bytes);
                entry.local_path = Some(path.clone());
            }
            DownloadOutcome::Failed {
                reason,
                detail,
                attempts,
            } => {
                entry.status = EntryStatus::Failed;
                entry.reason = Some(*reason);
                entry.error = Some(detail.clone());
                entry.attempts = Some(*attempts);
            }
        }
        entry
    }
}

/// Where a run currently is
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum RunState {
    /// Not started
    Idle,
    /// Requesting the verdict list
    Fetching,
    /// Applying selection criteria
    Filtering,
    /// Processing task `index` of `total`
    Downloading {
        /// 1-based task index
        index: usize,
        /// Number of tasks
        total: usize,
    },
    /// Writing metadata
    Finalizing,
    /// Completed (possibly with task failures)
    Done,
    /// List-fetch failed; nothing was processed
    Aborted,
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunState::Idle => write!(f, "idle"),
            RunState::Fetching => write!(f, "fetching"),
            RunState::Filtering => write!(f, "filtering"),
            RunState::Downloading { index, total } => write!(f, "downloading {index}/{total}"),
            RunState::Finalizing => write!(f, "finalizing"),
            RunState::Done => write!(f, "done"),
            RunState::Aborted => write!(f, "aborted"),
        }
    }
}

/// Aggregate outcome of a completed run
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    /// Records returned by the API
    pub fetched: usize,
    /// Records that passed selection (= number of tasks)
    pub matched: usize,
    /// Files fetched and written
    pub downloaded: usize,
    /// Files already present and kept
    pub skipped: usize,
    /// Tasks that failed
    pub failed: usize,
    /// Where metadata was written (None if the flush failed)
    pub metadata_path: Option<PathBuf>,
}

impl RunResult {
    /// Whether every task ended with its file on disk
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }
}
