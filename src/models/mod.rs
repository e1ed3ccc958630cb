// Domain models

mod history;
mod roster;
mod status;
mod topology;

pub use history::{HistoryEntry, HistoryReason, HistoryRecord};
pub use roster::{Device, NewDevice, Sector, fallback_roster};
pub use status::{
    DeviceStatus, GlobalSnapshot, Latency, ProbeResult, SectorSnapshot, SectorStatus,
};
pub use topology::{Link, MaintenanceRecord, NewLink, Waypoint};
