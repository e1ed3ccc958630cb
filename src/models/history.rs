// Status-transition history records

use serde::{Deserialize, Serialize};

use super::SectorStatus;

/// Why a sector entered a non-OK state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryReason {
    SwitchOffline,
    DeviceFailure,
}

impl HistoryReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryReason::SwitchOffline => "Switch Offline",
            HistoryReason::DeviceFailure => "Falha em Equipamento",
        }
    }

    /// Logged exactly when the new status is non-OK and differs from the previous one.
    pub fn for_transition(previous: SectorStatus, current: SectorStatus) -> Option<Self> {
        if current == previous {
            return None;
        }
        match current {
            SectorStatus::Ok => None,
            SectorStatus::Warning => Some(HistoryReason::DeviceFailure),
            SectorStatus::Critical => Some(HistoryReason::SwitchOffline),
        }
    }
}

/// Append-only record of a transition; `timestamp` is RFC3339 UTC with milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: String,
    pub sector: String,
    pub reason: String,
}

impl HistoryEntry {
    pub fn new(sector: &str, reason: HistoryReason) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            sector: sector.to_string(),
            reason: reason.as_str().to_string(),
        }
    }
}

/// Stored history row, as listed by GET /history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: i64,
    pub timestamp: String,
    pub sector: String,
    pub reason: String,
}
