// Roster loading: the sectors and devices to probe, fetched fresh every cycle.

use async_trait::async_trait;

use crate::models::{Device, Sector, fallback_roster};

/// Where the roster comes from (the SQLite repo in production).
#[async_trait]
pub trait RosterSource: Send + Sync {
    async fn list_sectors(&self) -> anyhow::Result<Vec<Sector>>;
    async fn list_devices(&self) -> anyhow::Result<Vec<Device>>;
}

/// Sectors and devices for one cycle.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    pub sectors: Vec<Sector>,
    pub devices: Vec<Device>,
    /// True when the built-in sectors replaced an unavailable or empty roster.
    pub is_fallback: bool,
}

/// Never fails: an unavailable or empty sector list falls back to the built-in
/// sectors, an unavailable device list to no devices. Malformed sectors are dropped
/// first, so a roster of only malformed sectors also falls back.
pub async fn load_roster(source: &dyn RosterSource) -> Roster {
    let listed = source.list_sectors().await.map(|mut sectors| {
        sectors.retain(|s| {
            if s.is_malformed() {
                tracing::warn!(name = %s.name, "skipping sector with blank id");
                false
            } else {
                true
            }
        });
        sectors
    });
    let (sectors, is_fallback) = match listed {
        Ok(sectors) if !sectors.is_empty() => (sectors, false),
        Ok(_) => {
            tracing::warn!(operation = "list_sectors", "roster is empty; using fallback sectors");
            (fallback_roster(), true)
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                operation = "list_sectors",
                "roster unavailable; using fallback sectors"
            );
            (fallback_roster(), true)
        }
    };

    let devices = match source.list_devices().await {
        Ok(devices) => devices,
        Err(e) => {
            tracing::warn!(
                error = %e,
                operation = "list_devices",
                "device list unavailable; probing switches only"
            );
            Vec::new()
        }
    };

    Roster {
        sectors,
        devices,
        is_fallback,
    }
}
