//! # Lifecycle Bootstrap
//!
//! One call that loads configuration, installs structured logging and builds
//! the process-wide [`ActivationManager`]. Hosts that manage their own
//! logging or configuration can call [`ActivationManager::with_config`]
//! directly instead.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::config::ConfigManager;
use crate::error::Result;
use crate::host::ActivationCollaborators;
use crate::logging::init_structured_logging_with_level;
use crate::state_machine::ActivationManager;

/// Options for [`LifecycleBootstrap::bootstrap`]
#[derive(Debug, Clone, Default)]
pub struct BootstrapConfig {
    /// Directory holding `lifecycle.toml`; `LIFECYCLE_CONFIG_DIR` or `config/` when unset
    pub config_directory: Option<PathBuf>,
    /// Environment name; auto-detected when unset
    pub environment_override: Option<String>,
    /// Install the global tracing subscriber
    pub init_logging: bool,
}

/// Manager plus the configuration it was built from
#[derive(Debug, Clone)]
pub struct LifecycleHandle {
    pub manager: Arc<ActivationManager>,
    pub config_manager: Arc<ConfigManager>,
}

pub struct LifecycleBootstrap;

impl LifecycleBootstrap {
    pub fn bootstrap(
        config: BootstrapConfig,
        collaborators: ActivationCollaborators,
    ) -> Result<LifecycleHandle> {
        let config_manager = match &config.environment_override {
            Some(env) => {
                ConfigManager::load_from_directory_with_env(config.config_directory.clone(), env)?
            }
            None => ConfigManager::load_from_directory(config.config_directory.clone())?,
        };

        if config.init_logging {
            init_structured_logging_with_level(config_manager.config().logging.level.as_deref());
        }

        let manager = Arc::new(ActivationManager::with_config(
            collaborators,
            config_manager.config(),
        ));

        info!(
            environment = %config_manager.environment(),
            config_directory = %config_manager.config_directory().display(),
            "Lifecycle manager ready"
        );

        Ok(LifecycleHandle {
            manager,
            config_manager,
        })
    }

    /// Bootstrap for tests: `test` environment, no global subscriber
    pub fn bootstrap_testing(
        config_directory: Option<PathBuf>,
        collaborators: ActivationCollaborators,
    ) -> Result<LifecycleHandle> {
        Self::bootstrap(
            BootstrapConfig {
                config_directory,
                environment_override: Some("test".to_string()),
                init_logging: false,
            },
            collaborators,
        )
    }
}
