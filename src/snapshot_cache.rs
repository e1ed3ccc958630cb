// Most recent GlobalSnapshot, shared between the poller (single writer) and HTTP/WS readers.

use std::sync::{Arc, RwLock};

use crate::models::GlobalSnapshot;

/// Holds the current snapshot behind an `Arc`; a cycle swaps the pointer, never the contents.
#[derive(Debug, Default)]
pub struct SnapshotCache {
    current: RwLock<Arc<GlobalSnapshot>>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consistent view of the last completed cycle (empty before the first one).
    pub fn current(&self) -> Arc<GlobalSnapshot> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    pub fn replace(&self, snapshot: Arc<GlobalSnapshot>) {
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        *guard = snapshot;
    }
}
