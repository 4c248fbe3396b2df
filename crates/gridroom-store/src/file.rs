//! JSON file backend.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;

use crate::{RoomStore, Snapshot, StoreError};

/// Stores the room document as a pretty-printed JSON file.
///
/// Saves go to a uniquely named sibling file that is then renamed over
/// the target, so a crash mid-write leaves the previous document intact.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "rooms".to_string());
        let suffix: u64 = rand::rng().random();
        self.path.with_file_name(format!(".{name}.{suffix:016x}.tmp"))
    }

    /// Moves a bad document aside as `{name}.bad-{unix millis}` so a
    /// recovery save never destroys the only copy.
    async fn back_up(&self) {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let mut backup = self.path.clone().into_os_string();
        backup.push(format!(".bad-{millis}"));
        let backup = PathBuf::from(backup);

        match tokio::fs::rename(&self.path, &backup).await {
            Ok(()) => {
                tracing::warn!(backup = %backup.display(), "bad room document backed up");
            }
            Err(e) => tracing::error!(
                path = %self.path.display(),
                error = %e,
                "could not back up bad room document"
            ),
        }
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl RoomStore for JsonFileStore {
    async fn load(&self) -> Result<Snapshot, StoreError> {
        let recovered = match tokio::fs::read(&self.path).await {
            Ok(bytes) => match serde_json::from_slice::<Snapshot>(&bytes) {
                Ok(snapshot) => return Ok(snapshot),
                Err(e) => {
                    let salvaged = Snapshot::salvage(&bytes);
                    tracing::warn!(
                        path = %self.path.display(),
                        error = %e,
                        kept = salvaged.len(),
                        "room document is malformed, keeping the rooms that still decode"
                    );
                    self.back_up().await;
                    salvaged
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "no room document yet, creating one");
                Snapshot::default()
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "room document is unreadable, starting empty"
                );
                self.back_up().await;
                Snapshot::default()
            }
        };

        self.save(&recovered).await?;
        Ok(recovered)
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(snapshot)?;
        let temp = self.temp_path();

        tokio::fs::write(&temp, &bytes)
            .await
            .map_err(|e| self.io_error(e))?;

        if let Err(e) = tokio::fs::rename(&temp, &self.path).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(self.io_error(e));
        }

        tracing::trace!(path = %self.path.display(), rooms = snapshot.len(), "room document saved");
        Ok(())
    }
}
