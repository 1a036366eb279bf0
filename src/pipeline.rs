//! Run orchestration
//!
//! A [`Pipeline`] performs one run for one target date:
//!
//! ```text
//! Idle → Fetching → Filtering → Downloading(1..=N) → Finalizing → Done
//!           └──────→ Aborted
//! ```
//!
//! Only a failed list-fetch aborts. Individual download failures are recorded
//! and the run moves on to the next task; metadata is flushed once, after
//! every task has reached a terminal outcome.

use crate::config::Config;
use crate::downloader::Downloader;
use crate::error::{Error, Result};
use crate::filter::filter_verdicts;
use crate::metadata::MetadataRecorder;
use crate::naming;
use crate::search::VerdictSearch;
use crate::transport::{HttpTransport, Transport};
use crate::types::{DownloadOutcome, DownloadTask, MetadataEntry, RunResult, RunState, VerdictRecord};
use crate::utils;
use chrono::NaiveDate;
use std::sync::Arc;

/// One end-to-end run of the verdict pipeline
pub struct Pipeline {
    config: Config,
    date: NaiveDate,
    search: VerdictSearch,
    downloader: Downloader,
    metadata: MetadataRecorder,
    state: RunState,
    result: RunResult,
}

impl Pipeline {
    /// Validate `config` and build a pipeline backed by the HTTP transport
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::new(&config.api, config.retry.clone())?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Build a pipeline sending every request through `transport`
    pub fn with_transport(config: Config, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;

        let date = config.target_date();
        let search = VerdictSearch::new(transport.clone(), config.api.clone());
        let downloader = Downloader::new(
            transport,
            config.output.documents_dir(),
            config.api.download_timeout,
        )
        .with_skip_existing(config.output.skip_existing);
        let metadata = MetadataRecorder::new(config.output.metadata_path());

        Ok(Self {
            config,
            date,
            search,
            downloader,
            metadata,
            state: RunState::Idle,
            result: RunResult::default(),
        })
    }

    /// Current state
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Target date of this run
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Entries recorded so far
    pub fn entries(&self) -> &[MetadataEntry] {
        self.metadata.entries()
    }

    /// Execute the run
    ///
    /// Returns [`Error::Abort`] when the verdict list cannot be obtained; in
    /// that case no document and no metadata file is written. Any other
    /// outcome, including runs where every download failed, is `Ok`.
    pub async fn run(&mut self) -> Result<RunResult> {
        if self.state != RunState::Idle {
            return Err(Error::InvalidState(format!(
                "pipeline already ran (state: {})",
                self.state
            )));
        }

        tracing::info!(date = %self.date, "starting verdict run");

        self.transition(RunState::Fetching);
        let criteria = self.config.selection.criteria();
        let response = match self.search.fetch(self.date, &criteria).await {
            Ok(response) => response,
            Err(e) => {
                self.transition(RunState::Aborted);
                tracing::error!(date = %self.date, error = %e, "failed to fetch verdict list, aborting run");
                return Err(Error::Abort { source: e });
            }
        };
        self.result.fetched = response.records.len();
        tracing::info!(
            fetched = self.result.fetched,
            attempts = response.attempts,
            "verdict list received"
        );
        self.save_raw_response(&response.raw).await;

        self.transition(RunState::Filtering);
        let selected = filter_verdicts(&response.records, &criteria);
        let tasks = self.build_tasks(selected);
        self.result.matched = tasks.len();
        tracing::info!(
            fetched = self.result.fetched,
            matched = tasks.len(),
            document_type = %criteria.document_type,
            importance = %criteria.importance,
            "filtered verdicts"
        );

        if !tasks.is_empty() {
            if let Err(e) = utils::ensure_dir(self.downloader.documents_dir()).await {
                tracing::warn!(
                    path = %self.downloader.documents_dir().display(),
                    error = %e,
                    "failed to create documents directory"
                );
            }
        }

        let total = tasks.len();
        for task in &tasks {
            self.transition(RunState::Downloading {
                index: task.index,
                total,
            });
            self.process_task(task, total).await;
        }

        self.transition(RunState::Finalizing);
        debug_assert_eq!(self.metadata.len(), tasks.len());
        match self.metadata.flush().await {
            Ok(()) => self.result.metadata_path = Some(self.metadata.path().to_path_buf()),
            Err(e) => {
                tracing::error!(
                    path = %self.metadata.path().display(),
                    error = %e,
                    "failed to write metadata"
                );
            }
        }

        self.transition(RunState::Done);
        tracing::info!(
            fetched = self.result.fetched,
            matched = self.result.matched,
            downloaded = self.result.downloaded,
            skipped = self.result.skipped,
            failed = self.result.failed,
            "run complete"
        );

        Ok(self.result.clone())
    }

    /// Turn selected records into numbered download tasks
    pub fn build_tasks(&self, selected: Vec<VerdictRecord>) -> Vec<DownloadTask> {
        selected
            .into_iter()
            .enumerate()
            .map(|(i, verdict)| {
                let index = i + 1;
                let extension = verdict
                    .doc_name
                    .as_deref()
                    .or(verdict.file_name.as_deref())
                    .map(naming::infer_extension)
                    .unwrap_or_else(|| naming::DEFAULT_EXTENSION.to_string());
                DownloadTask {
                    index,
                    file_name: naming::file_name_with_extension(index, self.date, &extension),
                    locator: self.search.locator(&verdict),
                    date: self.date,
                    verdict,
                }
            })
            .collect()
    }

    async fn process_task(&mut self, task: &DownloadTask, total: usize) {
        let case_id = task.verdict.case_id_text().unwrap_or_else(|| "-".to_string());
        tracing::info!(
            index = task.index,
            total,
            file = %task.file_name,
            case_id = %case_id,
            "downloading verdict"
        );

        let outcome = self.downloader.download(task).await;
        match &outcome {
            DownloadOutcome::Succeeded {
                bytes_written,
                attempts,
                ..
            } => {
                self.result.downloaded += 1;
                tracing::info!(
                    index = task.index,
                    file = %task.file_name,
                    bytes = bytes_written,
                    attempts,
                    "downloaded successfully"
                );
            }
            DownloadOutcome::Skipped { .. } => {
                self.result.skipped += 1;
            }
            DownloadOutcome::Failed {
                reason,
                detail,
                attempts,
            } => {
                self.result.failed += 1;
                tracing::warn!(
                    index = task.index,
                    file = %task.file_name,
                    reason = %reason,
                    error = %detail,
                    attempts,
                    url = task.locator.as_ref().map(|u| u.as_str()).unwrap_or("-"),
                    "download failed"
                );
            }
        }

        self.metadata.record(MetadataEntry::from_outcome(task, &outcome));
    }

    async fn save_raw_response(&self, raw: &[u8]) {
        let path = self.config.output.raw_response_path();
        let result = async {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                utils::ensure_dir(parent).await?;
            }
            utils::atomic_write(&path, raw).await
        }
        .await;

        match result {
            Ok(()) => tracing::info!(path = %path.display(), bytes = raw.len(), "raw verdict list saved"),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to save raw verdict list"),
        }
    }

    fn transition(&mut self, next: RunState) {
        tracing::debug!(from = %self.state, to = %next, "run state");
        self.state = next;
    }
}
