use serde::{Deserialize, Serialize};
use std::fmt;

/// Activation lifecycle states
///
/// The cycle is `Inactive → Activating → Active → Deactivating → Inactive`;
/// there is no terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationState {
    /// Initial state, and the state after every deactivation
    Inactive,
    /// Probing the workspace and registering capabilities
    Activating,
    /// Running; possibly inert if the workspace needs setup
    Active,
    /// Resetting guards and releasing the current context
    Deactivating,
}

impl ActivationState {
    /// Check if the component is running for the current workspace
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// Check if a new activation must be turned away
    pub fn blocks_activation(&self) -> bool {
        matches!(self, Self::Activating | Self::Active)
    }
}

impl fmt::Display for ActivationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inactive => write!(f, "inactive"),
            Self::Activating => write!(f, "activating"),
            Self::Active => write!(f, "active"),
            Self::Deactivating => write!(f, "deactivating"),
        }
    }
}

impl std::str::FromStr for ActivationState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inactive" => Ok(Self::Inactive),
            "activating" => Ok(Self::Activating),
            "active" => Ok(Self::Active),
            "deactivating" => Ok(Self::Deactivating),
            _ => Err(format!("Invalid activation state: {s}")),
        }
    }
}

impl Default for ActivationState {
    fn default() -> Self {
        Self::Inactive
    }
}
