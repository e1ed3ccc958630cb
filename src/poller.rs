// Poll cycle orchestration: every tick, load the roster, aggregate all sectors in
// parallel, log status transitions, swap the snapshot cache and notify dashboards.
// Cycles run inline in the loop, so they never overlap; a tick that fires while a
// cycle is still running is skipped.

use futures_util::future::join_all;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tokio::time::{Duration, Instant, interval};
use tracing::Instrument;

use crate::aggregator::Aggregator;
use crate::broadcast::Broadcaster;
use crate::history::{self, HistorySink, detect_transitions};
use crate::models::{GlobalSnapshot, Latency, Sector, SectorSnapshot, SectorStatus};
use crate::roster::{RosterSource, load_roster};
use crate::snapshot_cache::SnapshotCache;

/// `last_check` display format (day first, like the dashboard locale).
pub const LAST_CHECK_FORMAT: &str = "%d/%m/%Y, %H:%M:%S";

/// Running totals for the periodic stats log.
#[derive(Debug, Default)]
pub struct PollerStats {
    pub cycles_total: AtomicU64,
    pub history_entries_total: AtomicU64,
}

/// Everything one cycle reads from or writes to.
#[derive(Clone)]
pub struct CycleContext {
    pub roster: Arc<dyn RosterSource>,
    pub history: Arc<dyn HistorySink>,
    pub aggregator: Arc<Aggregator>,
    pub cache: Arc<SnapshotCache>,
    pub broadcaster: Broadcaster,
    pub stats: Arc<PollerStats>,
}

/// Context, connection counter and shutdown for the poller task.
pub struct PollerDeps {
    pub ctx: CycleContext,
    pub ws_connections: Arc<AtomicUsize>,
    pub shutdown_rx: tokio::sync::oneshot::Receiver<()>,
}

pub struct PollerConfig {
    pub interval_secs: u64,
    /// How often to log app stats (real seconds).
    pub stats_log_interval_secs: u64,
}

/// Runs one full cycle and returns the snapshot it installed.
pub async fn run_cycle(ctx: &CycleContext) -> Arc<GlobalSnapshot> {
    let started = Instant::now();
    let roster = load_roster(ctx.roster.as_ref()).await;
    let last_check = chrono::Local::now().format(LAST_CHECK_FORMAT).to_string();
    let devices = Arc::new(roster.devices);

    let tasks = roster.sectors.iter().map(|sector| {
        let aggregator = Arc::clone(&ctx.aggregator);
        let devices = Arc::clone(&devices);
        let sector = sector.clone();
        let last_check = last_check.clone();
        tokio::spawn(async move {
            aggregator
                .aggregate_sector(&sector, &devices, &last_check)
                .await
        })
    });
    // join_all keeps roster order regardless of completion order
    let results = join_all(tasks).await;

    let snapshot: GlobalSnapshot = roster
        .sectors
        .iter()
        .zip(results)
        .map(|(sector, result)| match result {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    sector = %sector.id,
                    operation = "aggregate_sector",
                    "sector aggregation faulted; reporting it as unreachable"
                );
                unreachable_sector(sector, &last_check)
            }
        })
        .collect();

    let previous = ctx.cache.current();
    let entries = detect_transitions(&previous, &snapshot);
    let written = history::record(ctx.history.as_ref(), &entries).await;

    let snapshot = Arc::new(snapshot);
    ctx.cache.replace(Arc::clone(&snapshot));
    let receivers = ctx.broadcaster.notify(&snapshot);

    ctx.stats.cycles_total.fetch_add(1, Ordering::Relaxed);
    ctx.stats
        .history_entries_total
        .fetch_add(written, Ordering::Relaxed);
    tracing::debug!(
        sectors = snapshot.len(),
        fallback = roster.is_fallback,
        transitions = entries.len(),
        receivers,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "poll cycle complete"
    );
    snapshot
}

fn unreachable_sector(sector: &Sector, last_check: &str) -> SectorSnapshot {
    SectorSnapshot {
        id: sector.id.clone(),
        name: sector.name.clone(),
        ip: sector.address().map(str::to_string),
        online: false,
        devices: Vec::new(),
        status: SectorStatus::Critical,
        latency: Latency::Timeout,
        last_check: last_check.to_string(),
    }
}

pub fn spawn(deps: PollerDeps, config: PollerConfig) -> tokio::task::JoinHandle<()> {
    let PollerDeps {
        ctx,
        ws_connections,
        mut shutdown_rx,
    } = deps;
    let PollerConfig {
        interval_secs,
        stats_log_interval_secs,
    } = config;

    tokio::spawn(async move {
        let mut tick = interval(Duration::from_secs(interval_secs));
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut stats_log_tick = interval(Duration::from_secs(stats_log_interval_secs));
        stats_log_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // skip the immediate first stats tick; the first cycle tick still fires at once
        stats_log_tick.tick().await;

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    run_cycle(&ctx).await;
                }
                _ = &mut shutdown_rx => {
                    tracing::debug!("Poller shutting down");
                    break;
                }
                _ = stats_log_tick.tick() => {
                    tracing::info!(
                        ws_clients = ws_connections.load(Ordering::Relaxed),
                        cycles_total = ctx.stats.cycles_total.load(Ordering::Relaxed),
                        history_entries_total = ctx.stats.history_entries_total.load(Ordering::Relaxed),
                        "app stats"
                    );
                }
            }
        }
    }
    .instrument(tracing::debug_span!("poller", interval_secs)))
}
