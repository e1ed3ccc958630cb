use anyhow::Result;
use facility_monitor::*;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;
    let broadcaster = broadcast::Broadcaster::new(app_config.publishing.broadcast_capacity);
    let cache = Arc::new(snapshot_cache::SnapshotCache::new());

    let repo = Arc::new(
        facility_repo::FacilityRepo::connect(
            &app_config.database.path,
            app_config.database.max_pool_size,
            app_config.database.history_retention_days,
        )
        .await?,
    );
    repo.init().await?;

    let polling = &app_config.polling;
    let aggregator = Arc::new(aggregator::Aggregator::new(
        Arc::new(prober::SystemPing),
        prober::ProbeSettings {
            timeout_secs: polling.probe_timeout_secs,
            interval_secs: polling.probe_interval_secs,
        },
        polling.max_concurrent_probes,
    ));

    let ws_connections = Arc::new(AtomicUsize::new(0));
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

    let poller_handle = poller::spawn(
        poller::PollerDeps {
            ctx: poller::CycleContext {
                roster: repo.clone(),
                history: repo.clone(),
                aggregator,
                cache: cache.clone(),
                broadcaster: broadcaster.clone(),
                stats: Arc::new(poller::PollerStats::default()),
            },
            ws_connections: ws_connections.clone(),
            shutdown_rx,
        },
        poller::PollerConfig {
            interval_secs: polling.interval_secs,
            stats_log_interval_secs: app_config.monitoring.stats_log_interval_secs,
        },
    );

    housekeeping::spawn(
        repo.clone(),
        housekeeping::HousekeepingConfig {
            prune_interval_secs: app_config.database.prune_interval_secs,
            vacuum_schedule: app_config.database.vacuum_schedule.clone(),
            vacuum_interval_secs: app_config.database.vacuum_interval_secs,
        },
    );

    let app = routes::app(
        repo,
        cache,
        broadcaster,
        ws_connections,
        app_config.clone(),
    );
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(
        interval_secs = app_config.polling.interval_secs,
        "Listening on http://{}",
        addr
    );

    tokio::select! {
        result = axum::serve(listener, app) => {
            result?;
        }
        _ = async {
            #[cfg(unix)]
            {
                let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                    Ok(s) => s,
                    Err(_) => {
                        let _ = tokio::signal::ctrl_c().await;
                        return;
                    }
                };
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            #[cfg(not(unix))]
            {
                let _ = tokio::signal::ctrl_c().await;
            }
        } => {
            tracing::info!("Received shutdown signal");
            let _ = shutdown_tx.send(());
            let _ = poller_handle.await;
        }
    }

    Ok(())
}
