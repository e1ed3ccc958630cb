// SQLite store: roster (hosts/devices), status history, cable links and box maintenance.
// Serves as the poller's roster source and history sink.

mod topology;

use crate::history::HistorySink;
use crate::models::{Device, HistoryEntry, HistoryRecord, NewDevice, Sector};
use crate::roster::RosterSource;
use async_trait::async_trait;
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use std::path::Path;
use std::str::FromStr;
use tracing::instrument;

pub struct FacilityRepo {
    pool: SqlitePool,
    retention_days: u32,
}

impl FacilityRepo {
    pub async fn connect(
        path: &str,
        max_pool_size: u32,
        retention_days: u32,
    ) -> anyhow::Result<Self> {
        if let Some(parent) = Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}", path))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5))
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_pool_size)
            .connect_with(opts)
            .await?;
        Ok(Self {
            pool,
            retention_days,
        })
    }

    pub async fn init(&self) -> anyhow::Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS hosts (id TEXT PRIMARY KEY, name TEXT NOT NULL, ip TEXT)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS devices (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                sector_id TEXT NOT NULL,
                name TEXT NOT NULL,
                ip TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_devices_sector ON devices(sector_id)")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                sector TEXT NOT NULL,
                reason TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_history_timestamp ON history(timestamp)")
            .execute(&self.pool)
            .await?;

        topology::init_tables(&self.pool).await?;

        Ok(())
    }

    // --- roster ---

    pub async fn list_sectors(&self) -> anyhow::Result<Vec<Sector>> {
        let rows = sqlx::query("SELECT id, name, ip FROM hosts ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(parse_sector_row).collect()
    }

    /// Inserts or updates sectors by id.
    #[instrument(skip(self, sectors), fields(repo = "facility", operation = "upsert_sectors", count = sectors.len()))]
    pub async fn upsert_sectors(&self, sectors: &[Sector]) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;
        for s in sectors {
            anyhow::ensure!(!s.is_malformed(), "sector id must be non-empty");
            sqlx::query(
                "INSERT INTO hosts (id, name, ip) VALUES (?, ?, ?)
                 ON CONFLICT(id) DO UPDATE SET name = excluded.name, ip = excluded.ip",
            )
            .bind(s.id.trim())
            .bind(&s.name)
            .bind(&s.ip)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn list_devices(&self) -> anyhow::Result<Vec<Device>> {
        let rows = sqlx::query("SELECT id, sector_id, name, ip FROM devices ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(parse_device_row).collect()
    }

    pub async fn list_devices_for_sector(&self, sector_id: &str) -> anyhow::Result<Vec<Device>> {
        let rows = sqlx::query(
            "SELECT id, sector_id, name, ip FROM devices WHERE sector_id = ? ORDER BY id",
        )
        .bind(sector_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(parse_device_row).collect()
    }

    pub async fn insert_device(&self, device: &NewDevice) -> anyhow::Result<Device> {
        let id = sqlx::query("INSERT INTO devices (sector_id, name, ip) VALUES (?, ?, ?)")
            .bind(&device.sector_id)
            .bind(&device.name)
            .bind(&device.ip)
            .execute(&self.pool)
            .await?
            .last_insert_rowid();
        Ok(Device {
            id,
            sector_id: device.sector_id.clone(),
            name: device.name.clone(),
            ip: device.ip.clone(),
        })
    }

    /// Returns false when no device had that id.
    pub async fn delete_device(&self, id: i64) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM devices WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- history ---

    #[instrument(skip(self, entry), fields(repo = "facility", operation = "append_history", sector = %entry.sector))]
    pub async fn append_history(&self, entry: &HistoryEntry) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO history (timestamp, sector, reason) VALUES (?, ?, ?)")
            .bind(&entry.timestamp)
            .bind(&entry.sector)
            .bind(&entry.reason)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Newest first.
    pub async fn recent_history(&self, limit: u32) -> anyhow::Result<Vec<HistoryRecord>> {
        let rows = sqlx::query(
            "SELECT id, timestamp, sector, reason FROM history
             ORDER BY timestamp DESC, id DESC LIMIT ?",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(parse_history_row).collect()
    }

    pub async fn clear_history(&self) -> anyhow::Result<u64> {
        let result = sqlx::query("DELETE FROM history")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Deletes entries older than the retention window. Returns rows removed.
    #[instrument(skip(self), fields(repo = "facility", operation = "prune_history"))]
    pub async fn prune_history(&self) -> anyhow::Result<u64> {
        let cutoff = chrono::Utc::now() - chrono::Duration::days(self.retention_days as i64);
        let cutoff = cutoff.to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
        let result = sqlx::query("DELETE FROM history WHERE timestamp < ?")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Reclaims space after history pruning.
    #[instrument(skip(self), fields(repo = "facility", operation = "vacuum"))]
    pub async fn vacuum(&self) -> anyhow::Result<()> {
        sqlx::query("VACUUM").execute(&self.pool).await?;
        Ok(())
    }
}

fn parse_sector_row(row: &SqliteRow) -> anyhow::Result<Sector> {
    Ok(Sector {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        ip: row.try_get("ip")?,
    })
}

fn parse_history_row(row: &SqliteRow) -> anyhow::Result<HistoryRecord> {
    Ok(HistoryRecord {
        id: row.try_get("id")?,
        timestamp: row.try_get("timestamp")?,
        sector: row.try_get("sector")?,
        reason: row.try_get("reason")?,
    })
}

fn parse_device_row(row: &SqliteRow) -> anyhow::Result<Device> {
    Ok(Device {
        id: row.try_get("id")?,
        sector_id: row.try_get("sector_id")?,
        name: row.try_get("name")?,
        ip: row.try_get("ip")?,
    })
}

#[async_trait]
impl RosterSource for FacilityRepo {
    async fn list_sectors(&self) -> anyhow::Result<Vec<Sector>> {
        FacilityRepo::list_sectors(self).await
    }

    async fn list_devices(&self) -> anyhow::Result<Vec<Device>> {
        FacilityRepo::list_devices(self).await
    }
}

#[async_trait]
impl HistorySink for FacilityRepo {
    async fn append_history(&self, entry: &HistoryEntry) -> anyhow::Result<()> {
        FacilityRepo::append_history(self, entry).await
    }
}
