//! # samspel-config
//!
//! Configuration consumed by the time-management core. The core itself owns
//! no file format; this crate merges YAML files and environment variables
//! into validated parameter structs.

#![warn(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

mod error;
mod scheduler;
mod validation;
mod watchdog;

pub use error::ConfigError;
pub use scheduler::{SchedulerConfig, SchedulingStrategy};
pub use watchdog::WatchdogConfig;

/// Top-level configuration container for a simulation run.
#[derive(Debug, Serialize, Deserialize, Validate, Default)]
pub struct RtiConfig {
    /// Time-management parameters (end time, threads, realtime factor).
    #[validate(nested)]
    pub scheduler: SchedulerConfig,

    /// Liveness monitoring parameters.
    #[validate(nested)]
    pub watchdog: WatchdogConfig,
}

impl RtiConfig {
    /// Load configuration from default files and environment.
    ///
    /// Hierarchy:
    /// 1. Default values
    /// 2. `config/samspel.yaml` - base settings. If missing, defaults are used.
    /// 3. `SAMSPEL_*` environment variables (`__` separates nesting levels).
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(RtiConfig::default()));

        if Path::new("config/samspel.yaml").exists() {
            figment = figment.merge(Yaml::file("config/samspel.yaml"));
        }

        figment
            .merge(Env::prefixed("SAMSPEL_").split("__"))
            .extract()
            .map_err(ConfigError::from)
            .and_then(|config: Self| {
                config.validate()?;
                Ok(config)
            })
    }

    /// Load configuration from a specific path.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(PathBuf::from(path)));
        }

        Figment::from(Serialized::defaults(RtiConfig::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed("SAMSPEL_").split("__"))
            .extract()
            .map_err(ConfigError::from)
            .and_then(|config: Self| {
                config.validate()?;
                Ok(config)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = RtiConfig::default();
        config.validate().expect("default config should validate");
    }

    #[test]
    fn environment_override() {
        std::env::set_var("SAMSPEL_SCHEDULER__THREADS", "3");
        let config = RtiConfig::load().unwrap();
        assert_eq!(config.scheduler.threads, 3);
        std::env::remove_var("SAMSPEL_SCHEDULER__THREADS");
    }
}
