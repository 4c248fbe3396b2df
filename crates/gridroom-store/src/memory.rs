//! In-process backend.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tokio::sync::Mutex;

use crate::{RoomStore, Snapshot, StoreError};

/// Keeps the room document in memory.
///
/// Nothing survives the process. Besides ephemeral servers this is the
/// backend for tests: writes can be made to fail on demand, and
/// [`saves`](Self::saves) counts committed writes.
#[derive(Debug, Default)]
pub struct MemoryStore {
    document: Mutex<Option<Snapshot>>,
    fail_writes: AtomicBool,
    saves: AtomicUsize,
}

impl MemoryStore {
    /// Creates a store with no document yet (the first load creates one).
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `snapshot`.
    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            document: Mutex::new(Some(snapshot)),
            ..Self::default()
        }
    }

    /// When `true`, every subsequent save fails with
    /// [`StoreError::Unavailable`] and leaves the document untouched.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of saves committed so far.
    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Returns a copy of the committed document, if one exists.
    pub async fn document(&self) -> Option<Snapshot> {
        self.document.lock().await.clone()
    }
}

impl RoomStore for MemoryStore {
    async fn load(&self) -> Result<Snapshot, StoreError> {
        if let Some(snapshot) = self.document.lock().await.clone() {
            return Ok(snapshot);
        }
        let snapshot = Snapshot::default();
        self.save(&snapshot).await?;
        Ok(snapshot)
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes disabled".into()));
        }
        *self.document.lock().await = Some(snapshot.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
