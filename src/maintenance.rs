// Junction-box cleaning status: a box is due once a year.

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::MaintenanceRecord;

/// Days after the last cleaning before a box counts as overdue.
pub const CLEANING_VALIDITY_DAYS: i64 = 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BoxStatus {
    Ok,
    Expired,
    Unknown,
}

impl BoxStatus {
    pub fn classify(record: Option<&MaintenanceRecord>, today: NaiveDate) -> Self {
        match record {
            None => BoxStatus::Unknown,
            Some(r) if days_since(r.last_cleaned, today) > CLEANING_VALIDITY_DAYS => {
                BoxStatus::Expired
            }
            Some(_) => BoxStatus::Ok,
        }
    }
}

/// Signed: a cleaning date in the future gives a negative count.
fn days_since(date: NaiveDate, today: NaiveDate) -> i64 {
    (today - date).num_days()
}

/// Record plus its computed status, as listed by GET /maintenance.
#[derive(Debug, Clone, Serialize)]
pub struct MaintenanceView {
    #[serde(flatten)]
    pub record: MaintenanceRecord,
    pub status: BoxStatus,
    pub days_since_cleaned: i64,
}

impl MaintenanceView {
    pub fn new(record: MaintenanceRecord, today: NaiveDate) -> Self {
        let status = BoxStatus::classify(Some(&record), today);
        let days_since_cleaned = days_since(record.last_cleaned, today).max(0);
        Self {
            record,
            status,
            days_since_cleaned,
        }
    }
}
