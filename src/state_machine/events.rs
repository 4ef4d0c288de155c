use serde::{Deserialize, Serialize};

/// Events that drive activation state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationEvent {
    /// Host invoked the activation entry point
    Activate,
    /// Workspace ready; capabilities registered and heavy client initialized
    Ready,
    /// Workspace needs setup; activation completes inert
    SetupRequired,
    /// A workspace probe raised; roll back so the next activation can retry
    Abort,
    /// Host invoked deactivation
    Deactivate,
    /// Teardown finished
    Release,
}

impl ActivationEvent {
    /// Get a string representation of the event type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Activate => "activate",
            Self::Ready => "ready",
            Self::SetupRequired => "setup_required",
            Self::Abort => "abort",
            Self::Deactivate => "deactivate",
            Self::Release => "release",
        }
    }
}
