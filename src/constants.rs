//! # Lifecycle Constants
//!
//! Names shared between the state machine, the ledger and the event
//! publisher. Anything that ends up in a log line, a ledger payload or a
//! published event name lives here so collaborators can match on it.

/// Lifecycle events published through [`crate::events::EventPublisher`]
pub mod events {
    pub const ACTIVATION_STARTED: &str = "activation.started";
    pub const ACTIVATION_READY: &str = "activation.ready";
    pub const ACTIVATION_SETUP_REQUIRED: &str = "activation.setup_required";
    pub const ACTIVATION_FAILED: &str = "activation.failed";
    pub const ACTIVATION_SKIPPED: &str = "activation.skipped";
    pub const ACTIVATION_SUPERSEDED: &str = "activation.superseded";
    pub const DEACTIVATION_COMPLETED: &str = "deactivation.completed";
    pub const REGISTRATION_ANOMALY: &str = "registration.anomaly";
}

/// Intent kinds used when pushing disposables
pub mod intents {
    /// A host capability (commands, tools, participant)
    pub const CAPABILITY: &str = "capability";
}

/// Prompt reasons recorded in the ledger when setup is required
pub mod prompt_reasons {
    pub const WORKSPACE_UNHEALTHY: &str = "workspace_unhealthy";
    pub const REQUIREMENTS_MISMATCH: &str = "requirements_mismatch";
}

/// Default prompt mode for setup-required prompts
pub const DEFAULT_SETUP_PROMPT_MODE: &str = "activation";

/// Default capacity of the lifecycle event channel
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Largest accepted lifecycle event channel capacity
pub const MAX_EVENT_CHANNEL_CAPACITY: usize = 65_536;

/// Environment variable prefix for configuration overrides
pub const CONFIG_ENV_PREFIX: &str = "LIFECYCLE";

/// Base name of the configuration file (without extension)
pub const CONFIG_FILE_STEM: &str = "lifecycle";
