/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    /// The widget is embedded on customer sites, so this is usually a list
    /// of those sites.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Graceful shutdown timeout in seconds (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Take the visitor address from `X-Forwarded-For` / `X-Real-IP`
    /// (default: `false`). Only enable behind a proxy that sets them.
    pub trust_proxy: bool,
}

/// Error raised when an environment variable holds an unusable value.
#[derive(Debug, thiserror::Error)]
#[error("{name} must be a valid {expected}, got '{value}'")]
pub struct ConfigError {
    pub name: &'static str,
    pub expected: &'static str,
    pub value: String,
}

fn parse_env<T: std::str::FromStr>(
    name: &'static str,
    default: &str,
    expected: &'static str,
) -> Result<T, ConfigError> {
    let value = std::env::var(name).unwrap_or_else(|_| default.to_string());
    value.parse().map_err(|_| ConfigError {
        name,
        expected,
        value,
    })
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                 |
    /// |-------------------------|-------------------------|
    /// | `HOST`                  | `0.0.0.0`               |
    /// | `PORT`                  | `3000`                  |
    /// | `CORS_ORIGINS`          | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `30`                    |
    /// | `TRUST_PROXY`           | `false`                 |
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let cors_origins = parse_origins(
            &std::env::var("CORS_ORIGINS").unwrap_or_else(|_| "http://localhost:5173".into()),
        );

        Ok(Self {
            host,
            port: parse_env("PORT", "3000", "u16")?,
            cors_origins,
            request_timeout_secs: parse_env("REQUEST_TIMEOUT_SECS", "30", "u64")?,
            shutdown_timeout_secs: parse_env("SHUTDOWN_TIMEOUT_SECS", "30", "u64")?,
            trust_proxy: parse_env("TRUST_PROXY", "false", "bool")?,
        })
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origins_are_trimmed_and_empty_entries_dropped() {
        assert_eq!(
            parse_origins(" https://a.test, ,https://b.test "),
            vec!["https://a.test".to_string(), "https://b.test".to_string()]
        );
    }

    #[test]
    fn config_error_names_the_variable() {
        let err = ConfigError {
            name: "PORT",
            expected: "u16",
            value: "http".to_string(),
        };
        assert_eq!(err.to_string(), "PORT must be a valid u16, got 'http'");
    }
}
