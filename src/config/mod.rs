//! # Lifecycle Configuration
//!
//! Layered configuration for the activation lifecycle: built-in defaults,
//! then `config/lifecycle.toml`, then `config/lifecycle.<env>.toml`, then
//! `LIFECYCLE__*` environment variables.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use lifecycle_core::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let capabilities = &manager.config().activation.capabilities;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::constants::{
    DEFAULT_EVENT_CHANNEL_CAPACITY, DEFAULT_SETUP_PROMPT_MODE, MAX_EVENT_CHANNEL_CAPACITY,
};
use crate::registration::Capability;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// Root configuration structure mirroring lifecycle.toml
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Activation behavior
    pub activation: ActivationConfig,

    /// Diagnostic ledger settings
    pub ledger: LedgerConfig,

    /// Lifecycle event channel settings
    pub events: EventsConfig,

    /// Logging overrides
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ActivationConfig {
    /// Capabilities registered, in order, when a workspace is ready
    pub capabilities: Vec<Capability>,
    /// `mode` recorded on setup-required prompt events
    pub setup_prompt_mode: String,
}

impl Default for ActivationConfig {
    fn default() -> Self {
        Self {
            capabilities: Capability::ALL.to_vec(),
            setup_prompt_mode: DEFAULT_SETUP_PROMPT_MODE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Mirror every appended ledger event to `tracing` at debug level
    pub trace_events: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self { trace_events: true }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EventsConfig {
    pub channel_capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Overrides the environment's default filter when set
    pub level: Option<String>,
}

impl LifecycleConfig {
    /// Validate configuration values
    pub fn validate(&self) -> ConfigResult<()> {
        if self.activation.capabilities.is_empty() {
            return Err(ConfigurationError::missing_required_field(
                "activation.capabilities",
                "activation configuration",
            ));
        }

        let mut seen = HashSet::new();
        for capability in &self.activation.capabilities {
            if !seen.insert(*capability) {
                return Err(ConfigurationError::invalid_value(
                    "activation.capabilities",
                    capability.as_str(),
                    "capability listed more than once",
                ));
            }
        }

        if self.activation.setup_prompt_mode.trim().is_empty() {
            return Err(ConfigurationError::missing_required_field(
                "activation.setup_prompt_mode",
                "activation configuration",
            ));
        }

        if self.events.channel_capacity == 0 {
            return Err(ConfigurationError::invalid_value(
                "events.channel_capacity",
                "0",
                "channel capacity must be greater than 0",
            ));
        }

        if self.events.channel_capacity > MAX_EVENT_CHANNEL_CAPACITY {
            return Err(ConfigurationError::invalid_value(
                "events.channel_capacity",
                self.events.channel_capacity.to_string(),
                format!("channel capacity must not exceed {MAX_EVENT_CHANNEL_CAPACITY}"),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = LifecycleConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(
            config.activation.capabilities,
            vec![
                Capability::Commands,
                Capability::Tools,
                Capability::Participant
            ]
        );
        assert_eq!(config.activation.setup_prompt_mode, "activation");
    }

    #[test]
    fn test_duplicate_capability_rejected() {
        let mut config = LifecycleConfig::default();
        config.activation.capabilities = vec![Capability::Tools, Capability::Tools];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("listed more than once"));
    }

    #[test]
    fn test_empty_capabilities_rejected() {
        let mut config = LifecycleConfig::default();
        config.activation.capabilities.clear();
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::MissingRequiredField { .. })
        ));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let mut config = LifecycleConfig::default();
        config.events.channel_capacity = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_oversized_capacity_rejected() {
        let mut config = LifecycleConfig::default();
        config.events.channel_capacity = MAX_EVENT_CHANNEL_CAPACITY;
        assert!(config.validate().is_ok());

        config.events.channel_capacity = MAX_EVENT_CHANNEL_CAPACITY + 1;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidValue { .. }));
        assert!(err.to_string().contains("must not exceed"));
    }
}
