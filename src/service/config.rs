use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{AppError, AppResult};

/// Sizing and bounds for the framing layer and the I/O buffer pool.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct NetworkConfig {
    /// Smallest decoded payload length a channel accepts.
    pub min_message_size: usize,
    /// Largest decoded payload length a channel accepts.
    pub max_message_size: usize,
    /// Size of each pooled receive buffer.
    pub buffer_size: usize,
    /// Number of receive buffers carved out of the pool's slab; also the
    /// maximum number of concurrently served connections.
    pub pool_size: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        NetworkConfig {
            min_message_size: 2,
            max_message_size: 127,
            buffer_size: 4096,
            pool_size: 1024,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Wheel tick interval. One slot is advanced per tick.
    pub tick_millis: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig { tick_millis: 1000 }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct MonitorConfig {
    /// Interval between liveness sweeps.
    pub sweep_period_secs: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        MonitorConfig {
            sweep_period_secs: 60,
        }
    }
}

/// Top-level configuration. Loaded by the embedding server and handed to the
/// toolkit's constructors explicitly; servkit keeps no global config state.
#[derive(Debug, Default, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ServkitConfig {
    pub network: NetworkConfig,
    pub scheduler: SchedulerConfig,
    pub monitor: MonitorConfig,
}

impl ServkitConfig {
    pub fn set_up_config<P: AsRef<Path>>(path: P) -> AppResult<ServkitConfig> {
        let path_str = path
            .as_ref()
            .to_str()
            .ok_or(AppError::InvalidValue(format!(
                "config file path: {}",
                path.as_ref().to_string_lossy()
            )))?;
        let config = config::Config::builder()
            .add_source(config::File::with_name(path_str))
            .build()?;

        let servkit_config: ServkitConfig = config.try_deserialize()?;

        Ok(servkit_config)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServkitConfig::default();
        assert_eq!(config.network.min_message_size, 2);
        assert_eq!(config.network.max_message_size, 127);
        assert_eq!(config.scheduler.tick_millis, 1000);
        assert_eq!(config.monitor.sweep_period_secs, 60);
    }

    #[test]
    fn test_set_up_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("servkit.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[network]\nmax_message_size = 65535\npool_size = 64\n\n[monitor]\nsweep_period_secs = 30"
        )
        .unwrap();

        let config = ServkitConfig::set_up_config(&path).unwrap();
        assert_eq!(config.network.max_message_size, 65535);
        assert_eq!(config.network.pool_size, 64);
        // untouched sections keep their defaults
        assert_eq!(config.network.min_message_size, 2);
        assert_eq!(config.monitor.sweep_period_secs, 30);
    }
}
