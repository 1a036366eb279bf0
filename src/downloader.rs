//! Per-verdict file download
//!
//! [`Downloader::download`] never returns an error: every failure is folded
//! into a [`DownloadOutcome::Failed`] so one bad verdict cannot stop the run.

use crate::error::Error;
use crate::transport::{HttpRequest, Transport};
use crate::types::{DownloadOutcome, DownloadTask, FailureReason};
use crate::utils;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Fetches verdict files into the documents directory
pub struct Downloader {
    transport: Arc<dyn Transport>,
    documents_dir: PathBuf,
    timeout: Duration,
    skip_existing: bool,
}

impl Downloader {
    /// Create a downloader writing into `documents_dir`
    pub fn new(transport: Arc<dyn Transport>, documents_dir: PathBuf, timeout: Duration) -> Self {
        Self {
            transport,
            documents_dir,
            timeout,
            skip_existing: false,
        }
    }

    /// Keep non-empty files already present under their final name
    pub fn with_skip_existing(mut self, skip_existing: bool) -> Self {
        self.skip_existing = skip_existing;
        self
    }

    /// Directory files are written to
    pub fn documents_dir(&self) -> &Path {
        &self.documents_dir
    }

    /// Final path for `task`
    pub fn target_path(&self, task: &DownloadTask) -> PathBuf {
        self.documents_dir.join(&task.file_name)
    }

    /// Download `task` and write it under its final name
    pub async fn download(&self, task: &DownloadTask) -> DownloadOutcome {
        let target = self.target_path(task);

        if self.skip_existing {
            if let Some(bytes) = utils::existing_file_size(&target).await {
                tracing::info!(
                    index = task.index,
                    file = %task.file_name,
                    bytes,
                    "file already present, skipping download"
                );
                return DownloadOutcome::Skipped { path: target, bytes };
            }
        }

        let Some(locator) = &task.locator else {
            return DownloadOutcome::Failed {
                reason: FailureReason::MissingLocator,
                detail: "verdict record has no PathForWeb/FileName".to_string(),
                attempts: 0,
            };
        };

        let request = HttpRequest::get(locator.as_str(), self.timeout);
        let response = match self.transport.request(&request).await {
            Ok(response) => response,
            Err(failure) => {
                return DownloadOutcome::Failed {
                    reason: FailureReason::NetworkError,
                    detail: failure.to_string(),
                    attempts: failure.attempts,
                };
            }
        };

        if let Err(e) = self.write(&target, &response.body).await {
            return DownloadOutcome::Failed {
                reason: FailureReason::WriteError,
                detail: e.to_string(),
                attempts: response.attempts,
            };
        }

        DownloadOutcome::Succeeded {
            path: target,
            bytes_written: response.body.len() as u64,
            attempts: response.attempts,
        }
    }

    async fn write(&self, target: &Path, content: &[u8]) -> Result<(), Error> {
        utils::ensure_dir(&self.documents_dir)
            .await
            .map_err(|e| Error::write(&self.documents_dir, e))?;
        utils::atomic_write(target, content)
            .await
            .map_err(|e| Error::write(target, e))
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiConfig, RetryConfig};
    use crate::transport::HttpTransport;
    use crate::types::VerdictRecord;
    use chrono::NaiveDate;
    use tempfile::TempDir;
    use url::Url;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn transport() -> Arc<dyn Transport> {
        let retry = RetryConfig {
            max_attempts: 3,
            initial_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(20),
            backoff_multiplier: 2.0,
            jitter: false,
        };
        Arc::new(HttpTransport::new(&ApiConfig::default(), retry).unwrap())
    }

    fn task(locator: Option<Url>) -> DownloadTask {
        DownloadTask {
            index: 1,
            file_name: "case_001_2025-10-01.pdf".to_string(),
            locator,
            date: NaiveDate::from_ymd_opt(2025, 10, 1).unwrap(),
            verdict: VerdictRecord::default(),
        }
    }

    fn locator(server: &MockServer) -> Option<Url> {
        Some(Url::parse(&format!("{}/Home/Download?path=/25/&fileName=a.pdf&type=2", server.uri())).unwrap())
    }

    #[tokio::test]
    async fn writes_file_under_task_name() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Home/Download"))
            .and(query_param("fileName", "a.pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.7 verdict".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let temp_dir = TempDir::new().unwrap();
        let documents = temp_dir.path().join("documents");
        let downloader = Downloader::new(transport(), documents.clone(), Duration::from_secs(5));

        let outcome = downloader.download(&task(locator(&server))).await;

        let expected = documents.join("case_001_2025-10-01.pdf");
        assert_eq!(
            outcome,
            DownloadOutcome::Succeeded {
                path: expected.clone(),
                bytes_written: 16,
                attempts: 1,
            }
        );
        assert_eq!(std::fs::read(&expected).unwrap(), b"%PDF-1.7 verdict");
    }

    #[tokio::test]
    async fn exhausted_retries_become_network_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        let temp_dir = TempDir::new().unwrap();
        let downloader = Downloader::new(transport(), temp_dir.path().to_path_buf(), Duration::from_secs(5));

        let outcome = downloader.download(&task(locator(&server))).await;

        match outcome {
            DownloadOutcome::Failed {
                reason,
                detail,
                attempts,
            } => {
                assert_eq!(reason, FailureReason::NetworkError);
                assert_eq!(attempts, 3);
                assert!(detail.contains("500"), "detail: {detail}");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(!temp_dir.path().join("case_001_2025-10-01.pdf").exists());
    }

    #[tokio::test]
    async fn not_found_fails_after_one_attempt() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let temp_dir = TempDir::new().unwrap();
        let downloader = Downloader::new(transport(), temp_dir.path().to_path_buf(), Duration::from_secs(5));

        let outcome = downloader.download(&task(locator(&server))).await;
        assert!(matches!(
            outcome,
            DownloadOutcome::Failed {
                reason: FailureReason::NetworkError,
                attempts: 1,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn unwritable_documents_dir_becomes_write_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"data".to_vec()))
            .mount(&server)
            .await;

        let temp_dir = TempDir::new().unwrap();
        // A regular file where the documents directory should be
        let documents = temp_dir.path().join("documents");
        std::fs::write(&documents, "not a directory").unwrap();

        let downloader = Downloader::new(transport(), documents.clone(), Duration::from_secs(5));
        let outcome = downloader.download(&task(locator(&server))).await;

        match outcome {
            DownloadOutcome::Failed { reason, attempts, .. } => {
                assert_eq!(reason, FailureReason::WriteError);
                assert_eq!(attempts, 1);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_locator_fails_without_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let temp_dir = TempDir::new().unwrap();
        let downloader = Downloader::new(transport(), temp_dir.path().to_path_buf(), Duration::from_secs(5));

        let outcome = downloader.download(&task(None)).await;
        assert!(matches!(
            outcome,
            DownloadOutcome::Failed {
                reason: FailureReason::MissingLocator,
                attempts: 0,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn skip_existing_keeps_file_and_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"new".to_vec()))
            .expect(0)
            .mount(&server)
            .await;

        let temp_dir = TempDir::new().unwrap();
        let existing = temp_dir.path().join("case_001_2025-10-01.pdf");
        std::fs::write(&existing, b"already here").unwrap();

        let downloader = Downloader::new(transport(), temp_dir.path().to_path_buf(), Duration::from_secs(5))
            .with_skip_existing(true);
        let outcome = downloader.download(&task(locator(&server))).await;

        assert_eq!(
            outcome,
            DownloadOutcome::Skipped {
                path: existing.clone(),
                bytes: 12,
            }
        );
        assert_eq!(std::fs::read(&existing).unwrap(), b"already here");
    }

    #[tokio::test]
    async fn without_skip_existing_file_is_replaced() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"new".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let temp_dir = TempDir::new().unwrap();
        let existing = temp_dir.path().join("case_001_2025-10-01.pdf");
        std::fs::write(&existing, b"stale copy").unwrap();

        let downloader = Downloader::new(transport(), temp_dir.path().to_path_buf(), Duration::from_secs(5));
        let outcome = downloader.download(&task(locator(&server))).await;

        assert!(outcome.is_success());
        assert_eq!(std::fs::read(&existing).unwrap(), b"new");
    }
}
