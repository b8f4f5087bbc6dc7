//! On-disk token cache
//!
//! One JSON document per cache path, equal to the last `TokenRecord`. The
//! cache is best-effort: a missing or corrupt file is a cache miss, and a
//! failed write is logged and otherwise ignored so that a freshly obtained
//! token still reaches the caller.
//!
//! Writes go to a temp file in the same directory that is then renamed over
//! the target, so readers never see a torn file. There is no cross-process
//! locking: two processes sharing a cache path can still overwrite each
//! other's updates.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::token::TokenRecord;

/// Token cache at a fixed path.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read the cached record. Never fails: problems are logged and reported
    /// as a miss.
    pub async fn load(&self) -> Option<TokenRecord> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no cached token");
                return None;
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "cannot read token cache");
                return None;
            }
        };

        match serde_json::from_str::<TokenRecord>(&contents) {
            Ok(record) => {
                info!(path = %self.path.display(), expires_at = record.expires_at, "loaded cached token");
                Some(record)
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "token cache is corrupt, ignoring it");
                None
            }
        }
    }

    /// Persist `record`. On failure the previous file is left as it was.
    pub async fn save(&self, record: &TokenRecord) {
        if let Err(e) = write_atomic(&self.path, record).await {
            warn!(path = %self.path.display(), error = %e, "cannot save token cache");
        }
    }

    /// Delete the cache file. A file that is already gone is fine.
    pub async fn clear(&self) {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => info!(path = %self.path.display(), "cleared token cache"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "cannot clear token cache"),
        }
    }
}

/// Write the record to a temp file next to `path`, then rename it over `path`.
async fn write_atomic(path: &Path, record: &TokenRecord) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(record).map_err(std::io::Error::other)?;

    let file_name = path
        .file_name()
        .ok_or_else(|| std::io::Error::other("token cache path has no file name"))?;
    let mut tmp_name = std::ffi::OsString::from(".");
    tmp_name.push(file_name);
    tmp_name.push(format!(".tmp.{}", std::process::id()));
    let tmp_path = path.with_file_name(tmp_name);

    if let Err(e) = write_private(&tmp_path, json.as_bytes()).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(e);
    }

    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(e);
    }

    debug!(path = %path.display(), "persisted token cache");
    Ok(())
}

/// Create `path` fresh and write `contents`. On unix the file is created
/// with mode 0600 and is never readable by other users.
async fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    use tokio::io::AsyncWriteExt;

    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path).await?;
    file.write_all(contents).await?;
    file.sync_all().await
}
