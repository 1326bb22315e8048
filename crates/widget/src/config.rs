use std::time::Duration;

/// Deployment mode, selects how the visitor's address is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployMode {
    /// Production: the connecting socket address is the visitor's address.
    Live,
    /// Local or staging: the server looks up its own public address, since
    /// the connecting address is a loopback or private one.
    Development,
}

impl DeployMode {
    /// `APP_ENV=production` selects [`DeployMode::Live`]; anything else is
    /// development.
    pub fn from_app_env(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("production") => Self::Live,
            _ => Self::Development,
        }
    }
}

/// Widget service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct WidgetConfig {
    pub deploy_mode: DeployMode,
    /// Timeout for each geolocation HTTP call (default: `5`).
    pub geo_timeout_secs: u64,
    /// "What is my IP" endpoint, returns `{ "ip": "..." }`.
    pub ip_lookup_url: String,
    /// IP geolocation base URL, queried as `{base}/{ip}/json`.
    pub geo_lookup_url: String,
    /// How long shutdown waits for background work (default: `5`).
    pub task_drain_timeout_secs: u64,
}

impl WidgetConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default               |
    /// |---------------------------|-----------------------|
    /// | `APP_ENV`                 | development           |
    /// | `GEO_TIMEOUT_SECS`        | `5`                   |
    /// | `IP_LOOKUP_URL`           | `https://jsonip.com`  |
    /// | `GEO_LOOKUP_URL`          | `http://ipinfo.io`    |
    /// | `TASK_DRAIN_TIMEOUT_SECS` | `5`                   |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let deploy_mode = DeployMode::from_app_env(std::env::var("APP_ENV").ok().as_deref());

        let geo_timeout_secs = std::env::var("GEO_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.geo_timeout_secs);

        let task_drain_timeout_secs = std::env::var("TASK_DRAIN_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.task_drain_timeout_secs);

        Self {
            deploy_mode,
            geo_timeout_secs,
            ip_lookup_url: std::env::var("IP_LOOKUP_URL").unwrap_or(defaults.ip_lookup_url),
            geo_lookup_url: std::env::var("GEO_LOOKUP_URL").unwrap_or(defaults.geo_lookup_url),
            task_drain_timeout_secs,
        }
    }

    pub fn geo_timeout(&self) -> Duration {
        Duration::from_secs(self.geo_timeout_secs)
    }

    pub fn task_drain_timeout(&self) -> Duration {
        Duration::from_secs(self.task_drain_timeout_secs)
    }
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            deploy_mode: DeployMode::Development,
            geo_timeout_secs: 5,
            ip_lookup_url: "https://jsonip.com".to_string(),
            geo_lookup_url: "http://ipinfo.io".to_string(),
            task_drain_timeout_secs: 5,
        }
    }
}
