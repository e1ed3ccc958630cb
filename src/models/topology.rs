// Cable topology and junction-box maintenance records

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A point on a drawn cable route (facility map coordinates).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    pub z: f64,
}

/// Physical cable between two sectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub id: i64,
    pub from_sector: String,
    pub to_sector: String,
    #[serde(default)]
    pub waypoints: Vec<Waypoint>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewLink {
    pub from_sector: String,
    pub to_sector: String,
    #[serde(default)]
    pub waypoints: Vec<Waypoint>,
}

/// Last cleaning of the inline box at `box_index` along link `link_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceRecord {
    pub link_id: i64,
    pub box_index: u32,
    pub last_cleaned: NaiveDate,
    #[serde(default)]
    pub notes: Option<String>,
}
