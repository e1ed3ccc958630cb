// HTTP handlers: status snapshot, roster, history, topology and maintenance

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::{Value, json};

use super::AppState;
use super::error::{ApiError, ApiResult};
use crate::broadcast::ServerEvent;
use crate::maintenance::MaintenanceView;
use crate::models::{
    Device, GlobalSnapshot, HistoryRecord, Link, MaintenanceRecord, NewDevice, NewLink, Sector,
};
use crate::version::{NAME, VERSION};

/// Number of rows returned by GET /history.
const HISTORY_PAGE_SIZE: u32 = 50;

/// Request bodies that accept either one object or an array of them.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(t) => vec![t],
            OneOrMany::Many(v) => v,
        }
    }
}

fn success() -> Json<Value> {
    Json(json!({ "success": true }))
}

/// GET /version: returns service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    Json(json!({
        "name": NAME,
        "version": VERSION,
    }))
}

/// GET /status-rede: last completed cycle; `[]` until the first one finishes.
pub(super) async fn status_handler(State(state): State<AppState>) -> Json<GlobalSnapshot> {
    Json(state.cache.current().as_ref().clone())
}

pub(super) async fn list_hosts_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Sector>>> {
    Ok(Json(state.repo.list_sectors().await?))
}

/// POST /hosts: upsert by id; takes effect on the next cycle.
pub(super) async fn upsert_hosts_handler(
    State(state): State<AppState>,
    Json(body): Json<OneOrMany<Sector>>,
) -> ApiResult<Json<Value>> {
    let sectors = body.into_vec();
    if sectors.iter().any(Sector::is_malformed) {
        return Err(ApiError::InvalidRequest("sector id must be non-empty".into()));
    }
    state.repo.upsert_sectors(&sectors).await?;
    Ok(success())
}

#[derive(Debug, Deserialize)]
pub(super) struct DevicesQuery {
    sector: Option<String>,
}

pub(super) async fn list_devices_handler(
    State(state): State<AppState>,
    Query(query): Query<DevicesQuery>,
) -> ApiResult<Json<Vec<Device>>> {
    let devices = match query.sector.as_deref() {
        Some(sector) => state.repo.list_devices_for_sector(sector).await?,
        None => state.repo.list_devices().await?,
    };
    Ok(Json(devices))
}

pub(super) async fn create_devices_handler(
    State(state): State<AppState>,
    Json(body): Json<OneOrMany<NewDevice>>,
) -> ApiResult<Json<Value>> {
    let devices = body.into_vec();
    if devices.iter().any(|d| d.sector_id.trim().is_empty()) {
        return Err(ApiError::InvalidRequest("device sector_id must be non-empty".into()));
    }
    for device in &devices {
        state.repo.insert_device(device).await?;
    }
    Ok(success())
}

pub(super) async fn delete_device_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    if !state.repo.delete_device(id).await? {
        return Err(ApiError::NotFound(format!("device {} not found", id)));
    }
    Ok(success())
}

/// GET /history: latest transitions, newest first.
pub(super) async fn list_history_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<HistoryRecord>>> {
    Ok(Json(state.repo.recent_history(HISTORY_PAGE_SIZE).await?))
}

pub(super) async fn clear_history_handler(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let removed = state.repo.clear_history().await?;
    tracing::info!(removed, "history cleared");
    Ok(success())
}

pub(super) async fn list_links_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Link>>> {
    Ok(Json(state.repo.list_links().await?))
}

/// Every topology change pushes the full link list so clients can redraw cables.
async fn publish_topology(state: &AppState) -> ApiResult<()> {
    let links = state.repo.list_links().await?;
    state.broadcaster.publish(ServerEvent::TopologyUpdate(links));
    Ok(())
}

pub(super) async fn create_link_handler(
    State(state): State<AppState>,
    Json(link): Json<NewLink>,
) -> ApiResult<Json<Value>> {
    if link.from_sector.trim().is_empty() || link.to_sector.trim().is_empty() {
        return Err(ApiError::InvalidRequest("link endpoints must be non-empty".into()));
    }
    state.repo.insert_link(&link).await?;
    publish_topology(&state).await?;
    Ok(success())
}

pub(super) async fn delete_link_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    if !state.repo.delete_link(id).await? {
        return Err(ApiError::NotFound(format!("link {} not found", id)));
    }
    publish_topology(&state).await?;
    Ok(success())
}

/// GET /maintenance: records annotated with OK/EXPIRED as of today (local date).
pub(super) async fn list_maintenance_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<MaintenanceView>>> {
    let today = chrono::Local::now().date_naive();
    let views = state
        .repo
        .list_maintenance()
        .await?
        .into_iter()
        .map(|r| MaintenanceView::new(r, today))
        .collect();
    Ok(Json(views))
}

pub(super) async fn upsert_maintenance_handler(
    State(state): State<AppState>,
    Json(record): Json<MaintenanceRecord>,
) -> ApiResult<Json<Value>> {
    state.repo.upsert_maintenance(&record).await?;
    state.broadcaster.publish(ServerEvent::MaintenanceUpdate);
    Ok(success())
}
