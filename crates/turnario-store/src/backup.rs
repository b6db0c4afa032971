//! Local backup cache for last-known-good documents.
//!
//! A best-effort mirror on local disk, used only as a read fallback when
//! the remote store is unreachable after retries. Never a write target of
//! record: save failures are logged and swallowed.

use std::path::PathBuf;

use tokio::fs;
use tracing::{debug, warn};

/// On-disk mirror of the last-known-good copy of each document.
#[derive(Debug, Clone)]
pub struct BackupCache {
    dir: PathBuf,
}

impl BackupCache {
    /// Create a cache rooted at `dir`. The directory is created lazily on
    /// first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The default cache location under the platform data directory.
    pub fn default_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("turnario")
            .join("backup")
    }

    fn file_for(&self, key: &str) -> PathBuf {
        // Keys are document paths; flatten separators so every document
        // lands in one directory.
        let sanitized: String = key
            .chars()
            .map(|c| match c {
                'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' => c,
                _ => '_',
            })
            .collect();
        self.dir.join(sanitized)
    }

    /// Mirror a document to disk. Best-effort: failures are logged at
    /// `warn` and swallowed, never raised to the caller.
    pub async fn save(&self, key: &str, document: &serde_json::Value) {
        let path = self.file_for(key);

        let payload = match serde_json::to_vec_pretty(document) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(key = %key, error = %e, "backup save skipped: unserializable document");
                return;
            }
        };

        if let Err(e) = fs::create_dir_all(&self.dir).await {
            warn!(key = %key, error = %e, "backup save failed: cannot create cache dir");
            return;
        }

        match fs::write(&path, payload).await {
            Ok(()) => debug!(key = %key, path = %path.display(), "backup refreshed"),
            Err(e) => warn!(key = %key, error = %e, "backup save failed"),
        }
    }

    /// Load the mirrored copy of a document. Returns `None` if absent or
    /// corrupt; never errors.
    pub async fn load(&self, key: &str) -> Option<serde_json::Value> {
        let path = self.file_for(key);

        let raw = match fs::read(&path).await {
            Ok(raw) => raw,
            Err(_) => return None,
        };

        match serde_json::from_slice(&raw) {
            Ok(value) => {
                debug!(key = %key, "loaded document from backup");
                Some(value)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "backup copy is corrupt, ignoring");
                None
            }
        }
    }
}
