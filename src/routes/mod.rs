// HTTP + WebSocket routes

mod error;
mod http;
mod ws;

use axum::{
    Router,
    routing::{delete, get},
};
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use tower_http::cors::{Any, CorsLayer};

use crate::broadcast::Broadcaster;
use crate::config::AppConfig;
use crate::facility_repo::FacilityRepo;
use crate::snapshot_cache::SnapshotCache;

pub use error::{ApiError, ApiResult};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) repo: Arc<FacilityRepo>,
    pub(crate) cache: Arc<SnapshotCache>,
    pub(crate) broadcaster: Broadcaster,
    pub(crate) ws_connections: Arc<AtomicUsize>,
    pub(crate) config: AppConfig,
}

pub fn app(
    repo: Arc<FacilityRepo>,
    cache: Arc<SnapshotCache>,
    broadcaster: Broadcaster,
    ws_connections: Arc<AtomicUsize>,
    config: AppConfig,
) -> Router {
    let state = AppState {
        repo,
        cache,
        broadcaster,
        ws_connections,
        config,
    };
    Router::new()
        .route("/", get(|| async { "Facility monitor online" })) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .route("/status-rede", get(http::status_handler)) // GET /status-rede
        .route(
            "/hosts",
            get(http::list_hosts_handler).post(http::upsert_hosts_handler),
        ) // GET, POST /hosts
        .route(
            "/devices",
            get(http::list_devices_handler).post(http::create_devices_handler),
        ) // GET, POST /devices
        .route("/devices/{id}", delete(http::delete_device_handler)) // DELETE /devices/{id}
        .route(
            "/history",
            get(http::list_history_handler).delete(http::clear_history_handler),
        ) // GET, DELETE /history
        .route(
            "/links",
            get(http::list_links_handler).post(http::create_link_handler),
        ) // GET, POST /links
        .route("/links/{id}", delete(http::delete_link_handler)) // DELETE /links/{id}
        .route(
            "/maintenance",
            get(http::list_maintenance_handler).post(http::upsert_maintenance_handler),
        ) // GET, POST /maintenance
        .route("/ws", get(ws::ws_events)) // WS /ws
        .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any).allow_methods(Any))
        .with_state(state)
}
