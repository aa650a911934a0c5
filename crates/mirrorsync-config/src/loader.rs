//! Configuration loader utilities

use crate::{Config, ConfigBuilder, ConfigError, ConfigResult};
use std::path::Path;

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "MIRRORSYNC";

/// Configuration loader with common loading patterns
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load defaults and `MIRRORSYNC__*` environment overrides, with an
    /// optional configuration file in between, then validate
    pub fn load(config_file: Option<&Path>) -> ConfigResult<Config> {
        Self::load_with(config_file, |_| {})
    }

    /// Like [`ConfigLoader::load`], but `overrides` is applied on top of
    /// every source before validation
    ///
    /// The command line goes through here so that its values win over a file
    /// or environment value that would not pass validation on its own.
    pub fn load_with<F>(config_file: Option<&Path>, overrides: F) -> ConfigResult<Config>
    where
        F: FnOnce(&mut Config),
    {
        let mut builder = ConfigBuilder::new();

        if let Some(path) = config_file {
            if !path.exists() {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        "Configuration file not found",
                    ),
                });
            }
            builder = builder.add_source_file(path);
        }

        let mut config = builder.add_env_prefix(ENV_PREFIX).build()?;
        overrides(&mut config);
        config.validate()?;

        Ok(config)
    }

    /// Render a configuration as YAML
    pub fn to_yaml(config: &Config) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(config)?)
    }
}
