use thiserror::Error;

use crate::config::ConfigurationError;
use crate::state_machine::errors::StateMachineError;
use crate::workspace::ProbeError;

/// Top-level error for lifecycle operations
#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("Workspace probe failed: {0}")]
    Probe(#[from] ProbeError),

    #[error("State machine error: {0}")]
    StateMachine(#[from] StateMachineError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
}

impl LifecycleError {
    /// Whether the error came from one of the workspace probes
    pub fn is_probe_failure(&self) -> bool {
        matches!(self, Self::Probe(_))
    }
}

pub type Result<T> = std::result::Result<T, LifecycleError>;
