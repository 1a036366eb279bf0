//! Run metadata bookkeeping
//!
//! Entries are appended in processing order and written once, as a single
//! JSON array, when the run finishes.

use crate::error::{Error, Result};
use crate::types::MetadataEntry;
use crate::utils;
use std::path::{Path, PathBuf};

/// Ordered collection of per-task audit records
#[derive(Debug)]
pub struct MetadataRecorder {
    path: PathBuf,
    entries: Vec<MetadataEntry>,
}

impl MetadataRecorder {
    /// Recorder that will flush to `path`
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            entries: Vec::new(),
        }
    }

    /// Append an entry
    pub fn record(&mut self, entry: MetadataEntry) {
        self.entries.push(entry);
    }

    /// Entries recorded so far
    pub fn entries(&self) -> &[MetadataEntry] {
        &self.entries
    }

    /// Number of entries recorded so far
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entry was recorded
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Destination of [`flush`](Self::flush)
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write all entries to the metadata file, replacing its previous content
    pub async fn flush(&mut self) -> Result<()> {
        let json = serde_json::to_vec_pretty(&self.entries)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            utils::ensure_dir(parent)
                .await
                .map_err(|e| Error::write(parent, e))?;
        }
        utils::atomic_write(&self.path, &json)
            .await
            .map_err(|e| Error::write(&self.path, e))?;

        tracing::info!(
            path = %self.path.display(),
            entries = self.entries.len(),
            "metadata written"
        );
        Ok(())
    }
}

/// Read a metadata file written by [`MetadataRecorder::flush`]
pub fn load(path: &Path) -> Result<Vec<MetadataEntry>> {
    let content = std::fs::read(path)?;
    Ok(serde_json::from_slice(&content)?)
}
