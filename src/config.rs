use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    pub publishing: PublishingConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
    pub max_pool_size: u32,
    #[serde(default = "default_history_retention_days")]
    pub history_retention_days: u32,
    #[serde(default = "default_prune_interval_secs")]
    pub prune_interval_secs: u64,
    /// Cron expression for VACUUM (local time); when unset, vacuum_interval_secs applies.
    #[serde(default)]
    pub vacuum_schedule: Option<String>,
    #[serde(default = "default_vacuum_interval_secs")]
    pub vacuum_interval_secs: u64,
}

fn default_history_retention_days() -> u32 {
    30
}

fn default_prune_interval_secs() -> u64 {
    3600
}

fn default_vacuum_interval_secs() -> u64 {
    86_400
}

/// Poll period and probe limits. Fixed for the lifetime of the process.
#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
    /// Minimum spacing between individual echo requests.
    #[serde(default = "default_probe_interval_secs")]
    pub probe_interval_secs: u64,
    /// Upper bound on probes in flight across the whole cycle.
    #[serde(default = "default_max_concurrent_probes")]
    pub max_concurrent_probes: usize,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            probe_timeout_secs: default_probe_timeout_secs(),
            probe_interval_secs: default_probe_interval_secs(),
            max_concurrent_probes: default_max_concurrent_probes(),
        }
    }
}

fn default_interval_secs() -> u64 {
    10
}

fn default_probe_timeout_secs() -> u64 {
    2
}

fn default_probe_interval_secs() -> u64 {
    1
}

fn default_max_concurrent_probes() -> usize {
    64
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublishingConfig {
    /// Max number of events kept in the broadcast channel for /ws (slow clients may lag).
    pub broadcast_capacity: usize,
    /// Send the cached snapshot to a client as soon as it connects.
    #[serde(default)]
    pub replay_on_connect: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    /// How often to log app stats (ws clients, cycles, history entries) at INFO level.
    pub stats_log_interval_secs: u64,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            !self.database.path.is_empty(),
            "database.path must be non-empty"
        );
        anyhow::ensure!(
            self.database.max_pool_size > 0,
            "database.max_pool_size must be > 0, got {}",
            self.database.max_pool_size
        );
        anyhow::ensure!(
            self.database.history_retention_days > 0,
            "database.history_retention_days must be > 0, got {}",
            self.database.history_retention_days
        );
        anyhow::ensure!(
            self.database.prune_interval_secs > 0,
            "database.prune_interval_secs must be > 0, got {}",
            self.database.prune_interval_secs
        );
        anyhow::ensure!(
            self.database.vacuum_interval_secs > 0,
            "database.vacuum_interval_secs must be > 0, got {}",
            self.database.vacuum_interval_secs
        );
        anyhow::ensure!(
            self.polling.interval_secs > 0,
            "polling.interval_secs must be > 0, got {}",
            self.polling.interval_secs
        );
        anyhow::ensure!(
            self.polling.probe_timeout_secs > 0,
            "polling.probe_timeout_secs must be > 0, got {}",
            self.polling.probe_timeout_secs
        );
        anyhow::ensure!(
            self.polling.probe_timeout_secs < self.polling.interval_secs,
            "polling.probe_timeout_secs ({}) must be shorter than polling.interval_secs ({})",
            self.polling.probe_timeout_secs,
            self.polling.interval_secs
        );
        anyhow::ensure!(
            self.polling.probe_interval_secs > 0,
            "polling.probe_interval_secs must be > 0, got {}",
            self.polling.probe_interval_secs
        );
        anyhow::ensure!(
            self.polling.max_concurrent_probes > 0,
            "polling.max_concurrent_probes must be > 0, got {}",
            self.polling.max_concurrent_probes
        );
        anyhow::ensure!(
            self.publishing.broadcast_capacity > 0,
            "publishing.broadcast_capacity must be > 0, got {}",
            self.publishing.broadcast_capacity
        );
        anyhow::ensure!(
            self.monitoring.stats_log_interval_secs > 0,
            "monitoring.stats_log_interval_secs must be > 0, got {}",
            self.monitoring.stats_log_interval_secs
        );
        Ok(())
    }
}
