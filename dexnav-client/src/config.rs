//! Configuration loading for the dexnav client.
//!
//! All fields are required unless explicitly marked optional. No defaults;
//! [`ClientConfig::recommended`] spells out the values the browser ships with.

use dexnav_core::{
    BuildMode, PartitionRange, DEFAULT_PRELOAD_DELAY, DEFAULT_UPGRADE_DELAY, PARTITION_TTL,
    POSITION_TTL, SCROLL_SAVE_DEBOUNCE,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming the config file when `--config` is absent.
pub const CONFIG_ENV: &str = "DEXNAV_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub request_timeout_ms: u64,
    /// Forces the build mode; resolved from the environment when absent.
    #[serde(default)]
    pub build_mode: Option<BuildMode>,
    pub upgrade_delay_ms: u64,
    pub scroll_debounce_ms: u64,
    pub preload_enabled: bool,
    pub preload_delay_ms: u64,
    pub partition_ttl_secs: u64,
    pub position_ttl_secs: u64,
    /// Caps the number of saved scroll positions; unbounded when absent.
    #[serde(default)]
    pub position_max_entries: Option<usize>,
    pub partitions: PartitionsConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartitionsConfig {
    pub first: u32,
    pub last: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing configuration file path (use --config or DEXNAV_CONFIG)")]
    MissingConfigPath,
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl ClientConfig {
    /// The shipped timings against the given data source.
    pub fn recommended(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            request_timeout_ms: 5_000,
            build_mode: None,
            upgrade_delay_ms: DEFAULT_UPGRADE_DELAY.as_millis() as u64,
            scroll_debounce_ms: SCROLL_SAVE_DEBOUNCE.as_millis() as u64,
            preload_enabled: true,
            preload_delay_ms: DEFAULT_PRELOAD_DELAY.as_millis() as u64,
            partition_ttl_secs: PARTITION_TTL.as_secs(),
            position_ttl_secs: POSITION_TTL.as_secs(),
            position_max_entries: None,
            partitions: PartitionsConfig { first: 1, last: 9 },
        }
    }

    /// Load and validate the config at `explicit`, or at `DEXNAV_CONFIG` when absent.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = explicit
            .map(Path::to_path_buf)
            .or_else(config_path_from_env)
            .ok_or(ConfigError::MissingConfigPath)?;
        let config = Self::from_path(&path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: ClientConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "api_base_url",
                reason: "must not be empty".to_string(),
            });
        }
        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                field: "api_base_url",
                reason: "must be an http(s) URL".to_string(),
            });
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.scroll_debounce_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scroll_debounce_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.partition_ttl_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "partition_ttl_secs",
                reason: "must be > 0".to_string(),
            });
        }
        if self.position_ttl_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "position_ttl_secs",
                reason: "must be > 0".to_string(),
            });
        }
        if self.position_max_entries == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "position_max_entries",
                reason: "must be > 0 when set".to_string(),
            });
        }
        if self.partitions.first > self.partitions.last {
            return Err(ConfigError::InvalidValue {
                field: "partitions",
                reason: "first must be <= last".to_string(),
            });
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn upgrade_delay(&self) -> Duration {
        Duration::from_millis(self.upgrade_delay_ms)
    }

    pub fn scroll_debounce(&self) -> Duration {
        Duration::from_millis(self.scroll_debounce_ms)
    }

    pub fn preload_delay(&self) -> Duration {
        Duration::from_millis(self.preload_delay_ms)
    }

    pub fn partition_ttl(&self) -> Duration {
        Duration::from_secs(self.partition_ttl_secs)
    }

    pub fn position_ttl(&self) -> Duration {
        Duration::from_secs(self.position_ttl_secs)
    }

    pub fn partition_range(&self) -> PartitionRange {
        PartitionRange::new(self.partitions.first, self.partitions.last)
    }

    /// Configured build mode, falling back to the process-wide resolution.
    pub fn build_mode(&self) -> BuildMode {
        self.build_mode.unwrap_or_else(BuildMode::resolve)
    }
}

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var(CONFIG_ENV).ok().map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recommended_config_is_valid() {
        let config = ClientConfig::recommended("http://localhost:3000");
        config.validate().unwrap();
        assert_eq!(config.upgrade_delay(), Duration::from_millis(2000));
        assert_eq!(config.scroll_debounce(), Duration::from_millis(150));
        assert_eq!(config.partition_ttl(), Duration::from_secs(1800));
        assert_eq!(config.partition_range(), PartitionRange::new(1, 9));
    }

    #[test]
    fn test_rejects_inverted_partition_range() {
        let mut config = ClientConfig::recommended("http://localhost:3000");
        config.partitions = PartitionsConfig { first: 5, last: 2 };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "partitions", .. })
        ));
    }

    #[test]
    fn test_rejects_non_http_base_url() {
        let config = ClientConfig::recommended("ftp://dex.example");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_explicit_build_mode_wins() {
        let mut config = ClientConfig::recommended("http://localhost:3000");
        config.build_mode = Some(BuildMode::Static);
        assert_eq!(config.build_mode(), BuildMode::Static);
    }
}
