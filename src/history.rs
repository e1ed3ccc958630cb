// Status-transition logging. Write-only from the poller's point of view.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::models::{HistoryEntry, HistoryReason, SectorSnapshot, SectorStatus};

#[async_trait]
pub trait HistorySink: Send + Sync {
    async fn append_history(&self, entry: &HistoryEntry) -> anyhow::Result<()>;
}

/// Entries for every sector whose status moved into a new non-OK state.
/// Sectors absent from `previous` are compared against OK.
pub fn detect_transitions(
    previous: &[SectorSnapshot],
    current: &[SectorSnapshot],
) -> Vec<HistoryEntry> {
    let before: HashMap<&str, SectorStatus> = previous
        .iter()
        .map(|s| (s.id.as_str(), s.status))
        .collect();
    current
        .iter()
        .filter_map(|s| {
            let prev = before.get(s.id.as_str()).copied().unwrap_or_default();
            HistoryReason::for_transition(prev, s.status).map(|r| HistoryEntry::new(&s.id, r))
        })
        .collect()
}

/// Appends each entry; a failed write is logged and skipped. Returns how many were stored.
pub async fn record(sink: &dyn HistorySink, entries: &[HistoryEntry]) -> u64 {
    let mut written = 0;
    for entry in entries {
        match sink.append_history(entry).await {
            Ok(()) => {
                tracing::info!(sector = %entry.sector, reason = %entry.reason, "status transition");
                written += 1;
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    sector = %entry.sector,
                    operation = "append_history",
                    "failed to write history entry"
                );
            }
        }
    }
    written
}
