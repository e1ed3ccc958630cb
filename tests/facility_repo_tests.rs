// FacilityRepo tests: init, roster, devices, history, links and maintenance

use chrono::NaiveDate;
use facility_monitor::facility_repo::FacilityRepo;
use facility_monitor::models::*;
use facility_monitor::roster::load_roster;
use tempfile::TempDir;

async fn open_repo(dir: &TempDir) -> FacilityRepo {
    let path = dir.path().join("facility.db");
    let repo = FacilityRepo::connect(path.to_str().unwrap(), 2, 30)
        .await
        .unwrap();
    repo.init().await.unwrap();
    repo
}

fn new_device(sector_id: &str, name: &str, ip: Option<&str>) -> NewDevice {
    NewDevice {
        sector_id: sector_id.into(),
        name: name.into(),
        ip: ip.map(str::to_string),
    }
}

#[tokio::test]
async fn facility_repo_connect_and_init() {
    let dir = TempDir::new().unwrap();
    let repo = open_repo(&dir).await;
    // Second init is no-op (IF NOT EXISTS)
    repo.init().await.unwrap();
    assert!(repo.list_sectors().await.unwrap().is_empty());
}

#[tokio::test]
async fn facility_repo_creates_missing_parent_directory() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("data").join("facility.db");
    let repo = FacilityRepo::connect(path.to_str().unwrap(), 1, 30)
        .await
        .unwrap();
    repo.init().await.unwrap();
    assert!(path.exists());
}

#[tokio::test]
async fn facility_repo_upserts_sectors_by_id() {
    let dir = TempDir::new().unwrap();
    let repo = open_repo(&dir).await;

    repo.upsert_sectors(&[
        Sector::new("PCTS", "PCTS", Some("192.168.36.17")),
        Sector::new("COI", "COI", Some("192.168.36.15")),
    ])
    .await
    .unwrap();
    repo.upsert_sectors(&[Sector::new("COI", "COI", Some("192.168.36.99"))])
        .await
        .unwrap();

    let sectors = repo.list_sectors().await.unwrap();
    assert_eq!(sectors.len(), 2);
    // ordered by name
    assert_eq!(sectors[0].id, "COI");
    assert_eq!(sectors[0].ip.as_deref(), Some("192.168.36.99"));
    assert_eq!(sectors[1].id, "PCTS");
}

#[tokio::test]
async fn facility_repo_rejects_blank_sector_id() {
    let dir = TempDir::new().unwrap();
    let repo = open_repo(&dir).await;

    let result = repo
        .upsert_sectors(&[
            Sector::new("COI", "COI", None),
            Sector::new("  ", "Sem id", None),
        ])
        .await;

    assert!(result.is_err());
    // whole batch rolled back
    assert!(repo.list_sectors().await.unwrap().is_empty());
}

#[tokio::test]
async fn facility_repo_device_crud() {
    let dir = TempDir::new().unwrap();
    let repo = open_repo(&dir).await;

    let camera = repo
        .insert_device(&new_device("COI", "camera", Some("10.0.0.5")))
        .await
        .unwrap();
    let printer = repo
        .insert_device(&new_device("CPD", "printer", None))
        .await
        .unwrap();
    assert_ne!(camera.id, printer.id);

    let all = repo.list_devices().await.unwrap();
    assert_eq!(all, vec![camera.clone(), printer.clone()]);

    let coi = repo.list_devices_for_sector("COI").await.unwrap();
    assert_eq!(coi, vec![camera.clone()]);

    assert!(repo.delete_device(camera.id).await.unwrap());
    assert!(!repo.delete_device(camera.id).await.unwrap());
    assert_eq!(repo.list_devices().await.unwrap(), vec![printer]);
}

#[tokio::test]
async fn facility_repo_history_append_and_recent() {
    let dir = TempDir::new().unwrap();
    let repo = open_repo(&dir).await;

    for (ts, sector) in [
        ("2025-01-01T10:00:00.000Z", "COI"),
        ("2025-01-01T12:00:00.000Z", "CPD"),
        ("2025-01-01T11:00:00.000Z", "PCTS"),
    ] {
        repo.append_history(&HistoryEntry {
            timestamp: ts.into(),
            sector: sector.into(),
            reason: HistoryReason::SwitchOffline.as_str().into(),
        })
        .await
        .unwrap();
    }

    let recent = repo.recent_history(2).await.unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].sector, "CPD");
    assert_eq!(recent[1].sector, "PCTS");
    assert_eq!(recent[0].reason, "Switch Offline");

    assert_eq!(repo.clear_history().await.unwrap(), 3);
    assert!(repo.recent_history(50).await.unwrap().is_empty());
}

#[tokio::test]
async fn facility_repo_prunes_expired_history() {
    let dir = TempDir::new().unwrap();
    let repo = open_repo(&dir).await;

    repo.append_history(&HistoryEntry {
        timestamp: "2000-01-01T00:00:00.000Z".into(),
        sector: "COI".into(),
        reason: HistoryReason::DeviceFailure.as_str().into(),
    })
    .await
    .unwrap();
    repo.append_history(&HistoryEntry::new("CPD", HistoryReason::SwitchOffline))
        .await
        .unwrap();

    assert_eq!(repo.prune_history().await.unwrap(), 1);
    let left = repo.recent_history(50).await.unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].sector, "CPD");

    repo.vacuum().await.unwrap();
}

#[tokio::test]
async fn facility_repo_links_and_maintenance() {
    let dir = TempDir::new().unwrap();
    let repo = open_repo(&dir).await;

    let link = repo
        .insert_link(&NewLink {
            from_sector: "CPD".into(),
            to_sector: "COI".into(),
            waypoints: vec![
                Waypoint {
                    x: 1.0,
                    y: 0.0,
                    z: 2.5,
                },
                Waypoint {
                    x: 4.0,
                    y: 0.0,
                    z: -1.0,
                },
            ],
        })
        .await
        .unwrap();
    assert_eq!(repo.list_links().await.unwrap(), vec![link.clone()]);

    let date = |d| NaiveDate::from_ymd_opt(2025, 3, d).unwrap();
    repo.upsert_maintenance(&MaintenanceRecord {
        link_id: link.id,
        box_index: 0,
        last_cleaned: date(1),
        notes: None,
    })
    .await
    .unwrap();
    repo.upsert_maintenance(&MaintenanceRecord {
        link_id: link.id,
        box_index: 0,
        last_cleaned: date(20),
        notes: Some("filtro trocado".into()),
    })
    .await
    .unwrap();

    let records = repo.list_maintenance().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].last_cleaned, date(20));
    assert_eq!(records[0].notes.as_deref(), Some("filtro trocado"));

    assert!(repo.delete_link(link.id).await.unwrap());
    assert!(repo.list_links().await.unwrap().is_empty());
    assert!(repo.list_maintenance().await.unwrap().is_empty());
    assert!(!repo.delete_link(link.id).await.unwrap());
}

#[tokio::test]
async fn facility_repo_serves_the_poller_roster() {
    let dir = TempDir::new().unwrap();
    let repo = open_repo(&dir).await;

    // empty table: fallback roster
    let roster = load_roster(&repo).await;
    assert!(roster.is_fallback);
    assert_eq!(roster.sectors.len(), 9);

    repo.upsert_sectors(&[Sector::new("COI", "COI", Some("10.0.0.1"))])
        .await
        .unwrap();
    repo.insert_device(&new_device("COI", "camera", Some("10.0.0.2")))
        .await
        .unwrap();

    let roster = load_roster(&repo).await;
    assert!(!roster.is_fallback);
    assert_eq!(roster.sectors.len(), 1);
    assert_eq!(roster.devices.len(), 1);
}
