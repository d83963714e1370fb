//! Client configuration.

use std::time::Duration;

use crate::error::ConfigError;
use crate::log::LogState;

/// Environment variable selecting the default [`LogState`].
pub const LOGS_ENV: &str = "REQUEST_CLIENT_LOGS";
/// Environment variable holding the transport timeout in whole seconds.
pub const TIMEOUT_ENV: &str = "REQUEST_CLIENT_TIMEOUT_SECS";

/// Settings shared by a client and its transport.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientConfig {
    /// Log state for operations that take no per-call override.
    pub logs: LogState,
    /// Global request timeout; `None` keeps the transport's default.
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    /// Read settings from the process environment. Unset variables keep
    /// their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`, which maps a variable name to its
    /// value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(LOGS_ENV) {
            config.logs = parse_log_state(&value).ok_or(ConfigError::InvalidValue {
                key: LOGS_ENV,
                value,
            })?;
        }

        if let Some(value) = lookup(TIMEOUT_ENV) {
            let secs: u64 = value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: TIMEOUT_ENV,
                value: value.clone(),
            })?;
            config.timeout = Some(Duration::from_secs(secs));
        }

        Ok(config)
    }
}

fn parse_log_state(value: &str) -> Option<LogState> {
    match value.trim().to_ascii_lowercase().as_str() {
        "enabled" | "on" | "1" | "true" => Some(LogState::Enabled),
        "disabled" | "off" | "0" | "false" => Some(LogState::Disabled),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.logs, LogState::Enabled);
        assert!(config.timeout.is_none());
    }

    #[test]
    fn reads_logs_and_timeout() {
        let config =
            ClientConfig::from_lookup(lookup(&[(LOGS_ENV, "Off"), (TIMEOUT_ENV, "15")])).unwrap();
        assert_eq!(config.logs, LogState::Disabled);
        assert_eq!(config.timeout, Some(Duration::from_secs(15)));
    }

    #[test]
    fn rejects_unknown_log_state() {
        let err = ClientConfig::from_lookup(lookup(&[(LOGS_ENV, "verbose")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                key: LOGS_ENV,
                value: "verbose".to_string()
            }
        );
    }

    #[test]
    fn rejects_non_numeric_timeout() {
        let err = ClientConfig::from_lookup(lookup(&[(TIMEOUT_ENV, "soon")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: TIMEOUT_ENV, .. }));
    }
}
