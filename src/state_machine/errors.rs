use thiserror::Error;

use super::events::ActivationEvent;
use super::states::ActivationState;

/// Error types for activation state machine operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateMachineError {
    #[error("Invalid state transition from {from} on {event:?}")]
    InvalidTransition {
        from: ActivationState,
        event: ActivationEvent,
    },
}

/// Result type alias for state machine operations
pub type StateMachineResult<T> = Result<T, StateMachineError>;
