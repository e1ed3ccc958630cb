// Probe results and per-cycle status snapshots (wire format for /status-rede and /ws)

use serde::{Deserialize, Serialize};
use std::fmt;

/// Round-trip time of a probe. Serializes as `"12.3ms"` or `"timeout"`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Latency {
    Millis(f64),
    Timeout,
}

impl fmt::Display for Latency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Latency::Millis(ms) => write!(f, "{}ms", ms),
            Latency::Timeout => f.write_str("timeout"),
        }
    }
}

impl From<Latency> for String {
    fn from(latency: Latency) -> Self {
        latency.to_string()
    }
}

impl TryFrom<String> for Latency {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        if s == "timeout" {
            return Ok(Latency::Timeout);
        }
        s.strip_suffix("ms")
            .and_then(|n| n.trim().parse::<f64>().ok())
            .map(Latency::Millis)
            .ok_or_else(|| format!("invalid latency: {s:?}"))
    }
}

/// Outcome of a single reachability check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeResult {
    pub alive: bool,
    pub latency: Latency,
}

impl ProbeResult {
    pub fn alive(ms: f64) -> Self {
        Self {
            alive: true,
            latency: Latency::Millis(ms),
        }
    }

    pub fn dead() -> Self {
        Self {
            alive: false,
            latency: Latency::Timeout,
        }
    }
}

/// Classified health of a sector; serializes uppercase ("OK", "WARNING", "CRITICAL").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SectorStatus {
    #[default]
    Ok,
    Warning,
    Critical,
}

impl SectorStatus {
    /// Switch down is CRITICAL regardless of devices; any device down is WARNING.
    pub fn classify(switch_online: bool, devices: &[DeviceStatus]) -> Self {
        if !switch_online {
            SectorStatus::Critical
        } else if devices.iter().any(|d| !d.online) {
            SectorStatus::Warning
        } else {
            SectorStatus::Ok
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SectorStatus::Ok => "OK",
            SectorStatus::Warning => "WARNING",
            SectorStatus::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for SectorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceStatus {
    pub name: String,
    pub ip: Option<String>,
    pub online: bool,
}

/// Status of one sector for one cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorSnapshot {
    pub id: String,
    pub name: String,
    pub ip: Option<String>,
    pub online: bool,
    pub devices: Vec<DeviceStatus>,
    pub status: SectorStatus,
    pub latency: Latency,
    pub last_check: String,
}

/// All sector snapshots of one completed cycle, in roster order.
pub type GlobalSnapshot = Vec<SectorSnapshot>;
