// Roster models: sectors (switches) and the devices attached to them

use serde::{Deserialize, Serialize};

/// A monitored location with one network switch. `id` is the stable key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sector {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub ip: Option<String>,
}

impl Sector {
    pub fn new(id: impl Into<String>, name: impl Into<String>, ip: Option<&str>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ip: ip.map(str::to_string),
        }
    }

    /// Trimmed switch address; `None` when absent or blank.
    pub fn address(&self) -> Option<&str> {
        self.ip.as_deref().map(str::trim).filter(|ip| !ip.is_empty())
    }

    /// A sector without a usable key cannot be tracked across cycles.
    pub fn is_malformed(&self) -> bool {
        self.id.trim().is_empty()
    }
}

/// Equipment attached to a sector, probed independently of the switch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: i64,
    pub sector_id: String,
    pub name: String,
    #[serde(default)]
    pub ip: Option<String>,
}

/// Device as submitted by the dashboard (id assigned by the database).
#[derive(Debug, Clone, Deserialize)]
pub struct NewDevice {
    pub sector_id: String,
    pub name: String,
    #[serde(default)]
    pub ip: Option<String>,
}

/// Sectors used when the roster source is unavailable or empty.
pub fn fallback_roster() -> Vec<Sector> {
    [
        ("REFEITORIO", "Refeitório", "192.168.39.1"),
        ("CPD", "CPD", "192.168.36.53"),
        ("OLD", "OLD", "192.168.36.60"),
        ("SUPERVISAO", "Supervisão", "192.168.36.14"),
        ("COI", "COI", "192.168.36.15"),
        ("PCTS", "PCTS", "192.168.36.17"),
        ("BALANCA", "Balança", "192.168.36.18"),
        ("PORTARIA", "Portaria", "192.168.36.19"),
        ("VINHACA", "Vinhaça", "192.168.36.20"),
    ]
    .into_iter()
    .map(|(id, name, ip)| Sector::new(id, name, Some(ip)))
    .collect()
}
