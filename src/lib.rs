//! # verdict-dl
//!
//! Downloads the court verdicts published on a given date.
//!
//! One run fetches the verdict list from the search API, keeps the records
//! matching a document type and importance flag, downloads each matching
//! verdict file with retries, and writes a JSON metadata array describing the
//! outcome of every download.
//!
//! ## Quick Start
//!
//! ```no_run
//! use verdict_dl::{Config, Pipeline};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config {
//!         date: chrono::NaiveDate::from_ymd_opt(2025, 10, 1),
//!         ..Default::default()
//!     };
//!
//!     let mut pipeline = Pipeline::new(config)?;
//!     let result = pipeline.run().await?;
//!     println!("downloaded {} of {} verdicts", result.downloaded, result.matched);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Per-verdict file download
pub mod downloader;
/// Error types
pub mod error;
/// Verdict selection
pub mod filter;
/// Run metadata bookkeeping
pub mod metadata;
/// Local file naming
pub mod naming;
/// Run orchestration
pub mod pipeline;
/// Retry logic with exponential backoff
pub mod retry;
/// Verdict search API client
pub mod search;
/// HTTP transport
pub mod transport;
/// Core types
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use config::{ApiConfig, Config, OutputConfig, RetryConfig, SelectionConfig};
pub use downloader::Downloader;
pub use error::{Error, Result, TransportError, TransportFailure};
pub use metadata::MetadataRecorder;
pub use pipeline::Pipeline;
pub use search::{SearchError, VerdictSearch};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, Transport};
pub use types::{
    DownloadOutcome, DownloadTask, EntryStatus, FailureReason, MetadataEntry, RunResult, RunState,
    SelectionCriteria, VerdictRecord,
};
