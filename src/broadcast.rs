// Push channel to connected dashboards. Fire-and-forget: lagging or gone
// subscribers are handled by the WebSocket task, not here.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tokio::time::{Duration, Instant};

use crate::models::{GlobalSnapshot, Link};

/// Rate limit for "no receivers" log (avoid logging every cycle when no dashboard is open)
const NO_RECEIVERS_LOG_INTERVAL: Duration = Duration::from_secs(60);

/// Message pushed on /ws, e.g. `{"event":"update","data":[...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    Update(GlobalSnapshot),
    TopologyUpdate(Vec<Link>),
    MaintenanceUpdate,
}

#[derive(Clone)]
pub struct Broadcaster {
    tx: broadcast::Sender<ServerEvent>,
    last_no_receivers_log: Arc<Mutex<Option<Instant>>>,
}

impl Broadcaster {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            tx,
            last_no_receivers_log: Arc::new(Mutex::new(None)),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.tx.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Delivers a completed cycle's snapshot to every current subscriber.
    pub fn notify(&self, snapshot: &GlobalSnapshot) -> usize {
        self.publish(ServerEvent::Update(snapshot.clone()))
    }

    /// Returns the number of subscribers the event was queued for.
    pub fn publish(&self, event: ServerEvent) -> usize {
        match self.tx.send(event) {
            Ok(n) => n,
            Err(_) => {
                let mut last = self
                    .last_no_receivers_log
                    .lock()
                    .unwrap_or_else(|e| e.into_inner());
                if last.is_none_or(|t| t.elapsed() >= NO_RECEIVERS_LOG_INTERVAL) {
                    tracing::debug!(
                        operation = "broadcast",
                        "No active WebSocket clients; broadcast channel has no receivers"
                    );
                    *last = Some(Instant::now());
                }
                0
            }
        }
    }
}
