//! Fleet configuration: a TOML file, overridden by flags and `FLEET_*` environment variables.

use clap::Parser;
use fleet_framework::GateConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const DEFAULT_CHANNEL_CAPACITY: usize = 32;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Settings shared by every service of the fleet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetConfig {
    /// Bound of each actor's request queue.
    pub channel_capacity: usize,
    /// Breaker settings applied to every (service, dependency) pair.
    pub gate: GateConfig,
    /// Base URLs of peers running out of process, keyed by service name (`"clinic"`).
    /// Services not listed here are reached in-process.
    pub peers: BTreeMap<String, String>,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            gate: GateConfig::default(),
            peers: BTreeMap::new(),
        }
    }
}

impl FleetConfig {
    pub fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        let CliArgs {
            config,
            channel_capacity,
            call_timeout_ms,
            cooldown_ms,
        } = args;

        let mut fleet = match config.as_deref() {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };

        if let Some(capacity) = channel_capacity {
            fleet.channel_capacity = capacity;
        }
        if let Some(timeout) = call_timeout_ms {
            fleet.gate.call_timeout_ms = timeout;
        }
        if let Some(cooldown) = cooldown_ms {
            fleet.gate.cooldown_ms = cooldown;
        }

        fleet.validate()?;
        Ok(fleet)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channel_capacity == 0 {
            return Err(ConfigError::Invalid(
                "channel_capacity must be at least 1".to_string(),
            ));
        }
        self.gate.validate().map_err(ConfigError::Invalid)?;
        if let Some((service, url)) = self
            .peers
            .iter()
            .find(|(_, url)| !(url.starts_with("http://") || url.starts_with("https://")))
        {
            return Err(ConfigError::Invalid(format!(
                "peer {service} has no http(s) base url: {url}"
            )));
        }
        Ok(())
    }
}

#[derive(Parser, Debug, Default, Clone)]
#[command(name = "clinic-fleet", about = "Runs the clinic fleet demo scenario")]
pub struct CliArgs {
    #[arg(long, value_name = "FILE", help = "Path to a TOML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        env = "FLEET_CHANNEL_CAPACITY",
        value_name = "N",
        help = "Bound of each actor's request queue"
    )]
    pub channel_capacity: Option<usize>,

    #[arg(
        long,
        env = "FLEET_CALL_TIMEOUT_MS",
        value_name = "MS",
        help = "Upper bound for a single remote call"
    )]
    pub call_timeout_ms: Option<u64>,

    #[arg(
        long,
        env = "FLEET_COOLDOWN_MS",
        value_name = "MS",
        help = "How long an open breaker waits before a trial call"
    )]
    pub cooldown_ms: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults_for_the_rest() {
        let config = FleetConfig::parse(
            r#"
            channel_capacity = 8

            [gate]
            failure_threshold = 2

            [peers]
            clinic = "http://clinic.internal:8080"
            "#,
        )
        .unwrap();
        assert_eq!(config.channel_capacity, 8);
        assert_eq!(config.gate.failure_threshold, 2);
        assert_eq!(config.gate.window_ms, GateConfig::default().window_ms);
        assert_eq!(config.peers["clinic"], "http://clinic.internal:8080");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn flags_override_the_file() {
        let dir = std::env::temp_dir().join(format!("clinic-fleet-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("fleet.toml");
        fs::write(&path, "channel_capacity = 4\n[gate]\ncooldown_ms = 9000\n").unwrap();

        let config = FleetConfig::from_args(CliArgs {
            config: Some(path),
            channel_capacity: Some(16),
            call_timeout_ms: None,
            cooldown_ms: None,
        })
        .unwrap();
        assert_eq!(config.channel_capacity, 16);
        assert_eq!(config.gate.cooldown_ms, 9000);
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn timeout_not_shorter_than_window_is_rejected() {
        let err = FleetConfig::from_args(CliArgs {
            call_timeout_ms: Some(20_000),
            ..CliArgs::default()
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("call_timeout_ms")));
    }

    #[test]
    fn peer_without_scheme_is_rejected() {
        let mut config = FleetConfig::default();
        config.peers.insert("duty".into(), "duty.internal".into());
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = FleetConfig::load(Path::new("/nonexistent/fleet.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
