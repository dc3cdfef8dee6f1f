use crate::logging::default_log_level;
use crate::storage::{default_data_dir, DataLocation};
use anyhow::Result;
use std::path::PathBuf;

/// Runtime settings resolved once at startup from flags, environment and
/// platform defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub data: DataLocation,
    pub log_level: String,
}

impl Config {
    pub fn resolve(data_dir: Option<PathBuf>, log_level: Option<String>) -> Result<Self> {
        let root = match data_dir {
            Some(dir) => dir,
            None => default_data_dir()?,
        };
        Ok(Config {
            data: DataLocation::new(root),
            log_level: log_level.unwrap_or_else(|| default_log_level().to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_values_win() {
        let config = Config::resolve(Some(PathBuf::from("/tmp/friday")), Some("warn".into()))
            .unwrap();
        assert_eq!(config.data.root, PathBuf::from("/tmp/friday"));
        assert_eq!(
            config.data.snapshot_path(),
            PathBuf::from("/tmp/friday/friday_visionboard_v1.yml")
        );
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn log_level_defaults_by_build() {
        let config = Config::resolve(Some(PathBuf::from("/tmp/friday")), None).unwrap();
        assert_eq!(config.log_level, default_log_level());
    }
}
