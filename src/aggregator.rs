// Per-sector fan-out: probe the switch and every attached device concurrently,
// then reduce to one SectorSnapshot.

use futures_util::future::join_all;
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::models::{Device, DeviceStatus, ProbeResult, Sector, SectorSnapshot, SectorStatus};
use crate::prober::{ProbeSettings, Prober, probe};

pub struct Aggregator {
    prober: Arc<dyn Prober>,
    settings: ProbeSettings,
    /// Caps in-flight probes across all sectors of a cycle.
    limiter: Semaphore,
}

impl Aggregator {
    pub fn new(prober: Arc<dyn Prober>, settings: ProbeSettings, max_concurrent_probes: usize) -> Self {
        Self {
            prober,
            settings,
            limiter: Semaphore::new(max_concurrent_probes.max(1)),
        }
    }

    async fn limited_probe(&self, address: Option<&str>) -> ProbeResult {
        // The semaphore is never closed, so acquire only fails if that changes.
        let _permit = self.limiter.acquire().await.ok();
        probe(self.prober.as_ref(), address, &self.settings).await
    }

    /// Probes `sector` and the devices of `all_devices` whose `sector_id` matches.
    pub async fn aggregate_sector(
        &self,
        sector: &Sector,
        all_devices: &[Device],
        last_check: &str,
    ) -> SectorSnapshot {
        let sector_ip = sector.address();
        let devices: Vec<&Device> = all_devices
            .iter()
            .filter(|d| d.sector_id == sector.id)
            .collect();

        let device_probes = devices.iter().map(|d| self.limited_probe(d.ip.as_deref()));
        let (switch, device_results) =
            futures_util::join!(self.limited_probe(sector_ip), join_all(device_probes));

        let device_statuses: Vec<DeviceStatus> = devices
            .iter()
            .zip(device_results)
            .map(|(d, r)| DeviceStatus {
                name: d.name.clone(),
                ip: d.ip.clone(),
                online: r.alive,
            })
            .collect();

        let status = SectorStatus::classify(switch.alive, &device_statuses);
        tracing::trace!(
            sector = %sector.id,
            status = %status,
            devices = device_statuses.len(),
            "sector aggregated"
        );

        SectorSnapshot {
            id: sector.id.clone(),
            name: sector.name.clone(),
            ip: sector_ip.map(str::to_string),
            online: switch.alive,
            devices: device_statuses,
            status,
            latency: switch.latency,
            last_check: last_check.to_string(),
        }
    }
}
