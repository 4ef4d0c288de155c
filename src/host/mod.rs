//! # Host Collaborators
//!
//! Interfaces for the pieces the lifecycle core drives but does not
//! implement: host registration APIs, the heavy backend client and the UI
//! surface that shows "setup required".

use async_trait::async_trait;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::registration::Capability;
use crate::resources::Disposable;
use crate::workspace::{NotReadyReason, WorkspaceHealthGate};

/// Host registration APIs, one call per capability.
///
/// These calls are not idempotent. The lifecycle core guarantees at most one
/// successful call per capability per activation.
#[async_trait]
pub trait CapabilityRegistrar: Send + Sync {
    /// Register the capability and return the handle that unregisters it
    async fn register(&self, capability: Capability) -> anyhow::Result<Box<dyn Disposable>>;
}

/// Client for the heavy backend process
#[async_trait]
pub trait HeavyClient: Send + Sync {
    async fn initialize(&self) -> anyhow::Result<()>;
}

/// Visible "setup required" signal owned by the UI layer
pub trait SetupSignal: Send + Sync {
    fn setup_required(&self, workspace_root: &Path, reason: &NotReadyReason);
}

/// Everything the activation manager calls out to
#[derive(Clone)]
pub struct ActivationCollaborators {
    pub health_gate: Arc<dyn WorkspaceHealthGate>,
    pub registrar: Arc<dyn CapabilityRegistrar>,
    pub heavy_client: Arc<dyn HeavyClient>,
    pub setup_signal: Arc<dyn SetupSignal>,
}

impl ActivationCollaborators {
    pub fn new(
        health_gate: Arc<dyn WorkspaceHealthGate>,
        registrar: Arc<dyn CapabilityRegistrar>,
        heavy_client: Arc<dyn HeavyClient>,
        setup_signal: Arc<dyn SetupSignal>,
    ) -> Self {
        Self {
            health_gate,
            registrar,
            heavy_client,
            setup_signal,
        }
    }
}

impl fmt::Debug for ActivationCollaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActivationCollaborators")
            .field("health_gate", &"WorkspaceHealthGate")
            .field("registrar", &"CapabilityRegistrar")
            .field("heavy_client", &"HeavyClient")
            .field("setup_signal", &"SetupSignal")
            .finish()
    }
}
