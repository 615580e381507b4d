//! Session state implementations.

use crate::error::StoreResult;
use crate::traits::SessionState;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Session state held in memory. Lost on restart.
#[derive(Debug, Default)]
pub struct MemorySessionState {
    last_sync_time: RwLock<Option<i64>>,
}

impl MemorySessionState {
    /// Creates an empty session.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionState for MemorySessionState {
    async fn last_sync_time(&self) -> StoreResult<Option<i64>> {
        Ok(*self.last_sync_time.read())
    }

    async fn set_last_sync_time(&self, epoch_millis: i64) -> StoreResult<()> {
        *self.last_sync_time.write() = Some(epoch_millis);
        Ok(())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionFile {
    #[serde(default)]
    last_sync_time: Option<i64>,
}

/// Session state persisted as a small JSON document.
///
/// Writes go to a sibling temporary file which is then renamed over the
/// target, so a crash mid-write leaves the previous value intact.
#[derive(Debug, Clone)]
pub struct FileSessionState {
    path: PathBuf,
}

impl FileSessionState {
    /// Uses the file at `path`. The file need not exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> StoreResult<SessionFile> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(SessionFile::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn store(&self, file: &SessionFile) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(file)?).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl SessionState for FileSessionState {
    async fn last_sync_time(&self) -> StoreResult<Option<i64>> {
        Ok(self.load().await?.last_sync_time)
    }

    async fn set_last_sync_time(&self, epoch_millis: i64) -> StoreResult<()> {
        let mut file = self.load().await?;
        file.last_sync_time = Some(epoch_millis);
        self.store(&file).await?;
        debug!(path = ?self.path, epoch_millis, "persisted last sync time");
        Ok(())
    }
}
