// Shared test helpers: scripted prober, in-memory roster and history sink
#![allow(dead_code)]

use async_trait::async_trait;
use facility_monitor::aggregator::Aggregator;
use facility_monitor::broadcast::Broadcaster;
use facility_monitor::history::HistorySink;
use facility_monitor::models::*;
use facility_monitor::poller::{CycleContext, PollerStats};
use facility_monitor::prober::{ProbeError, ProbeSettings, Prober};
use facility_monitor::roster::RosterSource;
use facility_monitor::snapshot_cache::SnapshotCache;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const SETTINGS: ProbeSettings = ProbeSettings {
    timeout_secs: 2,
    interval_secs: 1,
};

#[derive(Debug, Clone, Copy)]
pub enum Outcome {
    Up(f64),
    Down,
    Error,
    Panic,
}

/// Answers from a per-address script; unknown addresses are down.
#[derive(Default)]
pub struct ScriptedProber {
    outcomes: Mutex<HashMap<String, Outcome>>,
    delays: Mutex<HashMap<String, Duration>>,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedProber {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set(&self, address: &str, outcome: Outcome) {
        self.outcomes
            .lock()
            .unwrap()
            .insert(address.to_string(), outcome);
    }

    pub fn delay(&self, address: &str, delay: Duration) {
        self.delays
            .lock()
            .unwrap()
            .insert(address.to_string(), delay);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Prober for ScriptedProber {
    async fn echo(
        &self,
        address: &str,
        _settings: &ProbeSettings,
    ) -> Result<ProbeResult, ProbeError> {
        self.calls.lock().unwrap().push(address.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = self.delays.lock().unwrap().get(address).copied();
        if let Some(d) = delay {
            tokio::time::sleep(d).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let outcome = self
            .outcomes
            .lock()
            .unwrap()
            .get(address)
            .copied()
            .unwrap_or(Outcome::Down);
        match outcome {
            Outcome::Up(ms) => Ok(ProbeResult::alive(ms)),
            Outcome::Down => Ok(ProbeResult::dead()),
            Outcome::Error => Err(ProbeError::UnparseableOutput),
            Outcome::Panic => panic!("scripted probe panic for {address}"),
        }
    }
}

#[derive(Default)]
pub struct StaticRoster {
    pub sectors: Mutex<Vec<Sector>>,
    pub devices: Mutex<Vec<Device>>,
    pub fail_sectors: AtomicBool,
    pub fail_devices: AtomicBool,
}

impl StaticRoster {
    pub fn new(sectors: Vec<Sector>, devices: Vec<Device>) -> Arc<Self> {
        Arc::new(Self {
            sectors: Mutex::new(sectors),
            devices: Mutex::new(devices),
            ..Default::default()
        })
    }
}

#[async_trait]
impl RosterSource for StaticRoster {
    async fn list_sectors(&self) -> anyhow::Result<Vec<Sector>> {
        anyhow::ensure!(
            !self.fail_sectors.load(Ordering::SeqCst),
            "roster database unreachable"
        );
        Ok(self.sectors.lock().unwrap().clone())
    }

    async fn list_devices(&self) -> anyhow::Result<Vec<Device>> {
        anyhow::ensure!(
            !self.fail_devices.load(Ordering::SeqCst),
            "device table unreachable"
        );
        Ok(self.devices.lock().unwrap().clone())
    }
}

#[derive(Default)]
pub struct RecordingHistory {
    pub entries: Mutex<Vec<HistoryEntry>>,
    pub fail: AtomicBool,
}

impl RecordingHistory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.entries.lock().unwrap().clone()
    }
}

#[async_trait]
impl HistorySink for RecordingHistory {
    async fn append_history(&self, entry: &HistoryEntry) -> anyhow::Result<()> {
        anyhow::ensure!(!self.fail.load(Ordering::SeqCst), "history table locked");
        self.entries.lock().unwrap().push(entry.clone());
        Ok(())
    }
}

pub fn sector(id: &str, ip: &str) -> Sector {
    Sector::new(id, id, Some(ip))
}

pub fn device(id: i64, sector_id: &str, ip: Option<&str>) -> Device {
    Device {
        id,
        sector_id: sector_id.to_string(),
        name: format!("dev-{id}"),
        ip: ip.map(str::to_string),
    }
}

pub fn aggregator(prober: Arc<ScriptedProber>, max_concurrent_probes: usize) -> Arc<Aggregator> {
    Arc::new(Aggregator::new(prober, SETTINGS, max_concurrent_probes))
}

pub fn cycle_context(
    roster: Arc<StaticRoster>,
    prober: Arc<ScriptedProber>,
    history: Arc<RecordingHistory>,
) -> CycleContext {
    CycleContext {
        roster,
        history,
        aggregator: aggregator(prober, 64),
        cache: Arc::new(SnapshotCache::new()),
        broadcaster: Broadcaster::new(8),
        stats: Arc::new(PollerStats::default()),
    }
}
