// Background storage upkeep: prune old history on an interval and VACUUM on a
// configurable schedule (cron expression in local time, or a fixed interval).

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::facility_repo::FacilityRepo;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone)]
pub struct HousekeepingConfig {
    pub prune_interval_secs: u64,
    /// Optional cron expression for VACUUM (e.g. "0 0 3 * * *" = 03:00 daily). Uses local time.
    pub vacuum_schedule: Option<String>,
    /// Run VACUUM every N seconds when vacuum_schedule is not set.
    pub vacuum_interval_secs: u64,
}

pub fn spawn(repo: Arc<FacilityRepo>, config: HousekeepingConfig) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        run(repo, config).await;
    })
}

#[instrument(skip(repo), fields(prune_interval_secs = config.prune_interval_secs))]
async fn run(repo: Arc<FacilityRepo>, config: HousekeepingConfig) {
    let mut prune_interval = tokio::time::interval(Duration::from_secs(config.prune_interval_secs));
    prune_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let (vacuum_tx, mut vacuum_rx) = tokio::sync::mpsc::channel::<()>(1);
    tokio::spawn(vacuum_scheduler(config.clone(), vacuum_tx));

    loop {
        tokio::select! {
            _ = prune_interval.tick() => {
                match repo.prune_history().await {
                    Ok(0) => debug!("no history to prune"),
                    Ok(n) => info!(pruned = n, "old history pruned"),
                    Err(e) => warn!(error = %e, operation = "prune_history", "failed to prune history"),
                }
            }
            Some(()) = vacuum_rx.recv() => {
                if let Err(e) = repo.vacuum().await {
                    warn!(error = %e, "vacuum failed");
                } else {
                    info!("vacuum complete");
                }
            }
        }
    }
}

/// Parses a VACUUM cron expression; `None` when absent or invalid.
pub fn parse_schedule(expr: Option<&str>) -> Option<cron::Schedule> {
    let expr = expr?;
    match cron::Schedule::from_str(expr) {
        Ok(schedule) => Some(schedule),
        Err(e) => {
            warn!(cron = %expr, error = %e, "invalid vacuum_schedule; falling back to vacuum_interval_secs");
            None
        }
    }
}

/// Sends a message on `tx` at each VACUUM time (cron or fixed interval).
async fn vacuum_scheduler(config: HousekeepingConfig, tx: tokio::sync::mpsc::Sender<()>) {
    if let Some(schedule) = parse_schedule(config.vacuum_schedule.as_deref()) {
        loop {
            let now = chrono::Local::now();
            if let Some(next) = schedule.after(&now).next() {
                let delay = (next - now).to_std().unwrap_or(Duration::from_secs(1));
                tokio::time::sleep(delay).await;
                if tx.send(()).await.is_err() {
                    break;
                }
            } else {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
        }
    } else {
        let interval = Duration::from_secs(config.vacuum_interval_secs);
        loop {
            tokio::time::sleep(interval).await;
            if tx.send(()).await.is_err() {
                break;
            }
        }
    }
}
