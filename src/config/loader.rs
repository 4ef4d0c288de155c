//! Configuration Loader
//!
//! Environment-aware configuration loading: file discovery, environment
//! detection and layering through the `config` crate.

use config::{Config, Environment, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use super::error::ConfigResult;
use super::LifecycleConfig;
use crate::constants::{CONFIG_ENV_PREFIX, CONFIG_FILE_STEM};

/// Loaded, validated lifecycle configuration
#[derive(Debug)]
pub struct ConfigManager {
    config: LifecycleConfig,
    environment: String,
    config_directory: PathBuf,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        Self::load_from_directory(None)
    }

    /// Load configuration from a specific directory
    pub fn load_from_directory(config_dir: Option<PathBuf>) -> ConfigResult<Arc<ConfigManager>> {
        let environment = crate::logging::get_environment();
        Self::load_from_directory_with_env(config_dir, &environment)
    }

    /// Load configuration from a specific directory with explicit environment.
    ///
    /// Environment variables are read from the process environment.
    pub fn load_from_directory_with_env(
        config_dir: Option<PathBuf>,
        environment: &str,
    ) -> ConfigResult<Arc<ConfigManager>> {
        Self::load_with_sources(config_dir, environment, None)
    }

    /// Load configuration with an explicit set of environment variables
    /// instead of the process environment. Useful for testing.
    pub fn load_with_env_vars(
        config_dir: Option<PathBuf>,
        environment: &str,
        vars: config::Map<String, String>,
    ) -> ConfigResult<Arc<ConfigManager>> {
        Self::load_with_sources(config_dir, environment, Some(vars))
    }

    fn load_with_sources(
        config_dir: Option<PathBuf>,
        environment: &str,
        vars: Option<config::Map<String, String>>,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let config_directory = config_dir.unwrap_or_else(Self::default_config_directory);

        debug!(
            "Loading lifecycle configuration for environment '{}' from directory: {}",
            environment,
            config_directory.display()
        );

        let base_file = Self::base_config_path(&config_directory);
        let env_file = Self::environment_config_path(&config_directory, environment);

        let config: LifecycleConfig = Config::builder()
            .add_source(File::from(base_file).required(false))
            .add_source(File::from(env_file).required(false))
            .add_source(
                Environment::with_prefix(CONFIG_ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("activation.capabilities")
                    .try_parsing(true)
                    .source(vars),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;

        tracing::info!(
            environment = %environment,
            capabilities = ?config.activation.capabilities,
            setup_prompt_mode = %config.activation.setup_prompt_mode,
            "Lifecycle configuration loaded"
        );

        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory,
        }))
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn config_directory(&self) -> &Path {
        &self.config_directory
    }

    fn default_config_directory() -> PathBuf {
        std::env::var("LIFECYCLE_CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config"))
    }

    fn base_config_path(dir: &Path) -> PathBuf {
        dir.join(format!("{CONFIG_FILE_STEM}.toml"))
    }

    fn environment_config_path(dir: &Path, environment: &str) -> PathBuf {
        dir.join(format!("{CONFIG_FILE_STEM}.{environment}.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registration::Capability;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_directory_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::load_with_env_vars(
            Some(dir.path().join("absent")),
            "test",
            config::Map::new(),
        )
        .unwrap();

        assert_eq!(manager.config(), &LifecycleConfig::default());
        assert_eq!(manager.environment(), "test");
    }

    #[test]
    fn test_environment_file_overrides_base_file() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("lifecycle.toml"),
            "[activation]\nsetup_prompt_mode = \"status_bar\"\n\n[ledger]\ntrace_events = false\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("lifecycle.test.toml"),
            "[activation]\nsetup_prompt_mode = \"notification\"\n",
        )
        .unwrap();

        let manager =
            ConfigManager::load_with_env_vars(Some(dir.path().into()), "test", config::Map::new())
                .unwrap();

        assert_eq!(manager.config().activation.setup_prompt_mode, "notification");
        assert!(!manager.config().ledger.trace_events);
        assert_eq!(manager.config().activation.capabilities.len(), 3);
    }

    #[test]
    fn test_env_vars_override_files() {
        let dir = TempDir::new().unwrap();
        let mut vars = config::Map::new();
        vars.insert(
            "LIFECYCLE__ACTIVATION__CAPABILITIES".to_string(),
            "tools,participant".to_string(),
        );
        vars.insert(
            "LIFECYCLE__EVENTS__CHANNEL_CAPACITY".to_string(),
            "16".to_string(),
        );

        let manager =
            ConfigManager::load_with_env_vars(Some(dir.path().into()), "test", vars).unwrap();

        assert_eq!(
            manager.config().activation.capabilities,
            vec![Capability::Tools, Capability::Participant]
        );
        assert_eq!(manager.config().events.channel_capacity, 16);
    }

    #[test]
    fn test_invalid_file_values_fail_validation() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("lifecycle.toml"),
            "[events]\nchannel_capacity = 0\n",
        )
        .unwrap();

        let err =
            ConfigManager::load_with_env_vars(Some(dir.path().into()), "test", config::Map::new())
                .unwrap_err();
        assert!(err.to_string().contains("events.channel_capacity"));
    }

    #[test]
    fn test_oversized_capacity_override_fails_validation() {
        let dir = TempDir::new().unwrap();
        let mut vars = config::Map::new();
        vars.insert(
            "LIFECYCLE__EVENTS__CHANNEL_CAPACITY".to_string(),
            "1000000000".to_string(),
        );

        let err = ConfigManager::load_with_env_vars(Some(dir.path().into()), "test", vars)
            .unwrap_err();
        assert!(err.to_string().contains("must not exceed"));
    }
}
