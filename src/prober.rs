// Reachability probes. The OS `ping` binary sits behind the `Prober` seam so the
// cycle can be driven by scripted probers in tests.

use async_trait::async_trait;
use std::time::Duration;
use tokio::process::Command;

use crate::models::ProbeResult;

/// Per-probe limits, fixed at startup from `[polling]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeSettings {
    pub timeout_secs: u64,
    /// Minimum spacing between individual echo requests.
    pub interval_secs: u64,
}

impl ProbeSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("invalid address {0:?}")]
    InvalidAddress(String),
    #[error("failed to run ping: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("no round-trip time in ping output")]
    UnparseableOutput,
}

#[async_trait]
pub trait Prober: Send + Sync {
    /// Sends echo request(s) to a non-empty, trimmed address.
    async fn echo(
        &self,
        address: &str,
        settings: &ProbeSettings,
    ) -> Result<ProbeResult, ProbeError>;
}

/// Probes `address`, absorbing every failure as "not alive".
///
/// An absent or blank address short-circuits without touching the network.
/// The call never outlives `settings.timeout()`; a reply that misses it counts as a timeout.
pub async fn probe(
    prober: &dyn Prober,
    address: Option<&str>,
    settings: &ProbeSettings,
) -> ProbeResult {
    let Some(address) = address.map(str::trim).filter(|a| !a.is_empty()) else {
        return ProbeResult::dead();
    };
    match tokio::time::timeout(settings.timeout(), prober.echo(address, settings)).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => {
            tracing::debug!(error = %e, address, operation = "probe", "probe failed");
            ProbeResult::dead()
        }
        Err(_) => {
            tracing::debug!(address, operation = "probe", "probe exceeded its deadline");
            ProbeResult::dead()
        }
    }
}

/// ICMP echo through the system `ping` command (no raw-socket privileges needed).
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemPing;

#[async_trait]
impl Prober for SystemPing {
    async fn echo(
        &self,
        address: &str,
        settings: &ProbeSettings,
    ) -> Result<ProbeResult, ProbeError> {
        if !is_valid_address(address) {
            return Err(ProbeError::InvalidAddress(address.to_string()));
        }
        // dropping this future on timeout kills the child
        let output = Command::new("ping")
            .args(ping_args(address, settings))
            .kill_on_drop(true)
            .output()
            .await?;
        if !output.status.success() {
            return Ok(ProbeResult::dead());
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_latency_ms(&stdout)
            .map(ProbeResult::alive)
            .ok_or(ProbeError::UnparseableOutput)
    }
}

/// Hostnames, IPv4 and IPv6 literals only; a leading '-' would be read as a flag.
pub(crate) fn is_valid_address(address: &str) -> bool {
    !address.is_empty()
        && address.len() <= 253
        && !address.starts_with('-')
        && address
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == ':' || c == '-')
}

#[cfg(windows)]
fn ping_args(address: &str, settings: &ProbeSettings) -> Vec<String> {
    vec![
        "-n".into(),
        "1".into(),
        "-w".into(),
        (settings.timeout_secs * 1000).to_string(),
        address.into(),
    ]
}

#[cfg(target_os = "macos")]
fn ping_args(address: &str, settings: &ProbeSettings) -> Vec<String> {
    vec![
        "-c".into(),
        "1".into(),
        "-t".into(),
        settings.timeout_secs.to_string(),
        "-i".into(),
        settings.interval_secs.to_string(),
        address.into(),
    ]
}

#[cfg(not(any(windows, target_os = "macos")))]
fn ping_args(address: &str, settings: &ProbeSettings) -> Vec<String> {
    vec![
        "-c".into(),
        "1".into(),
        "-W".into(),
        settings.timeout_secs.to_string(),
        "-i".into(),
        settings.interval_secs.to_string(),
        address.into(),
    ]
}

/// Extracts the first reply time, e.g. `time=0.045 ms`, `time<1ms`, `tempo=3ms`.
pub(crate) fn parse_latency_ms(output: &str) -> Option<f64> {
    for marker in ["time=", "time<", "tempo=", "tempo<"] {
        let Some(idx) = output.find(marker) else {
            continue;
        };
        let number: String = output[idx + marker.len()..]
            .chars()
            .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
            .collect();
        if let Ok(ms) = number.replace(',', ".").parse::<f64>() {
            return Some(ms);
        }
    }
    None
}
