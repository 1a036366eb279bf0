//! Utility functions for file operations

use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Create `path` and its parents if missing
pub async fn ensure_dir(path: &Path) -> std::io::Result<()> {
    tokio::fs::create_dir_all(path).await
}

/// Hidden sibling used while `target` is being written
///
/// The temp file lives in the same directory so the final rename never
/// crosses a filesystem boundary.
pub fn temp_path_for(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!(".{}.part.{}", name, std::process::id()))
}

/// Write `content` to `target` so that readers see either the old file or the complete new one
///
/// Data goes to a temp sibling, is fsynced, then renamed over `target`. On
/// any failure the temp file is removed and nothing appears under `target`.
pub async fn atomic_write(target: &Path, content: &[u8]) -> std::io::Result<()> {
    if target.parent().is_none() || target.file_name().is_none() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("not a file path: {}", target.display()),
        ));
    }

    let temp_path = temp_path_for(target);
    let result = write_then_rename(&temp_path, target, content).await;

    if result.is_err() {
        if let Err(e) = tokio::fs::remove_file(&temp_path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %temp_path.display(), error = %e, "failed to remove temp file");
            }
        }
    }
    result
}

async fn write_then_rename(temp_path: &Path, target: &Path, content: &[u8]) -> std::io::Result<()> {
    {
        let mut file = tokio::fs::File::create(temp_path).await?;
        file.write_all(content).await?;
        file.sync_all().await?;
    }

    tokio::fs::rename(temp_path, target).await?;

    // fsync the parent directory so the rename itself is durable
    if let Some(parent) = target.parent() {
        sync_dir(parent).await;
    }

    Ok(())
}

/// Best-effort fsync of a directory; a failure is logged, not returned
#[cfg(unix)]
async fn sync_dir(dir: &Path) -> bool {
    let synced = match tokio::fs::File::open(dir).await {
        Ok(handle) => handle.sync_all().await,
        Err(e) => Err(e),
    };
    match synced {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!(path = %dir.display(), error = %e, "failed to fsync directory");
            false
        }
    }
}

#[cfg(not(unix))]
async fn sync_dir(_dir: &Path) -> bool {
    true
}

/// Size of an existing, non-empty regular file at `path`
pub async fn existing_file_size(path: &Path) -> Option<u64> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() && meta.len() > 0 => Some(meta.len()),
        _ => None,
    }
}
