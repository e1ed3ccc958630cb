// Cable links (waypoints stored as JSON text) and per-box maintenance records.

use chrono::NaiveDate;
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqliteRow};

use super::FacilityRepo;
use crate::models::{Link, MaintenanceRecord, NewLink, Waypoint};

const DATE_FORMAT: &str = "%Y-%m-%d";

pub(super) async fn init_tables(pool: &SqlitePool) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS links (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            from_sector TEXT NOT NULL,
            to_sector TEXT NOT NULL,
            waypoints TEXT NOT NULL DEFAULT '[]'
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS maintenance (
            link_id INTEGER NOT NULL,
            box_index INTEGER NOT NULL,
            last_cleaned TEXT NOT NULL,
            notes TEXT,
            PRIMARY KEY (link_id, box_index)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

impl FacilityRepo {
    pub async fn list_links(&self) -> anyhow::Result<Vec<Link>> {
        let rows = sqlx::query("SELECT id, from_sector, to_sector, waypoints FROM links ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(parse_link_row).collect()
    }

    pub async fn insert_link(&self, link: &NewLink) -> anyhow::Result<Link> {
        let waypoints = serde_json::to_string(&link.waypoints)?;
        let id = sqlx::query("INSERT INTO links (from_sector, to_sector, waypoints) VALUES (?, ?, ?)")
            .bind(&link.from_sector)
            .bind(&link.to_sector)
            .bind(&waypoints)
            .execute(&self.pool)
            .await?
            .last_insert_rowid();
        Ok(Link {
            id,
            from_sector: link.from_sector.clone(),
            to_sector: link.to_sector.clone(),
            waypoints: link.waypoints.clone(),
        })
    }

    /// Also drops the maintenance records of the link's boxes. Returns false when absent.
    pub async fn delete_link(&self, id: i64) -> anyhow::Result<bool> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM maintenance WHERE link_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM links WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_maintenance(&self) -> anyhow::Result<Vec<MaintenanceRecord>> {
        let rows = sqlx::query(
            "SELECT link_id, box_index, last_cleaned, notes FROM maintenance ORDER BY link_id, box_index",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(parse_maintenance_row).collect()
    }

    /// One record per (link, box); a new cleaning replaces the previous one.
    pub async fn upsert_maintenance(&self, record: &MaintenanceRecord) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO maintenance (link_id, box_index, last_cleaned, notes) VALUES (?, ?, ?, ?)
             ON CONFLICT(link_id, box_index) DO UPDATE
             SET last_cleaned = excluded.last_cleaned, notes = excluded.notes",
        )
        .bind(record.link_id)
        .bind(record.box_index as i64)
        .bind(record.last_cleaned.format(DATE_FORMAT).to_string())
        .bind(&record.notes)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

fn parse_link_row(row: &SqliteRow) -> anyhow::Result<Link> {
    let waypoints: String = row.try_get("waypoints")?;
    let waypoints: Vec<Waypoint> = serde_json::from_str(&waypoints)?;
    Ok(Link {
        id: row.try_get("id")?,
        from_sector: row.try_get("from_sector")?,
        to_sector: row.try_get("to_sector")?,
        waypoints,
    })
}

fn parse_maintenance_row(row: &SqliteRow) -> anyhow::Result<MaintenanceRecord> {
    let last_cleaned: String = row.try_get("last_cleaned")?;
    let box_index: i64 = row.try_get("box_index")?;
    Ok(MaintenanceRecord {
        link_id: row.try_get("link_id")?,
        box_index: u32::try_from(box_index)?,
        last_cleaned: NaiveDate::parse_from_str(&last_cleaned, DATE_FORMAT)?,
        notes: row.try_get("notes")?,
    })
}
