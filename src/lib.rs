#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Lifecycle Core
//!
//! Activation and registration lifecycle manager for a host-loaded
//! component: an editor extension, a plugin, anything the host activates and
//! deactivates repeatedly inside one long-lived process.
//!
//! ## Overview
//!
//! The host calls `activate` with a workspace and a disposal container, and
//! `deactivate` when the component unloads. Activations can overlap, the
//! container can already be torn down when a registration arrives, and the
//! host's registration APIs are not idempotent. This crate serializes all of
//! that:
//!
//! - At most one activation is in flight or active at a time
//! - Workspace health and requirements are probed before anything heavy runs
//! - Each capability is registered with the host at most once per activation
//! - Disposables always land somewhere, either the live container or a
//!   process-local fallback list
//! - Every registration, anomaly and prompt is appended to a diagnostic ledger
//!
//! ## Module Organization
//!
//! - [`state_machine`] - [`ActivationManager`] and the activation states
//! - [`registration`] - Guard latches and safe-push
//! - [`ledger`] - Append-only activation ledger
//! - [`resources`] - Host container contract and the fallback list
//! - [`workspace`] - Health/requirements probe boundary
//! - [`host`] - Registrar, heavy client and setup-signal collaborators
//! - [`events`] - Broadcast of lifecycle events
//! - [`config`] - Layered configuration
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lifecycle_core::{ActivationCollaborators, ActivationContext, ActivationManager, SubscriptionList};
//! use std::sync::Arc;
//!
//! # async fn example(collaborators: ActivationCollaborators) -> lifecycle_core::Result<()> {
//! let manager = ActivationManager::new(collaborators);
//! let container = Arc::new(SubscriptionList::new());
//!
//! let outcome = manager
//!     .activate(ActivationContext::new(container.clone(), "/path/to/workspace"))
//!     .await?;
//! println!("activation finished: {outcome:?}");
//!
//! manager.deactivate();
//! container.dispose_all();
//! # Ok(())
//! # }
//! ```

pub mod bootstrap;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod host;
pub mod ledger;
pub mod logging;
pub mod registration;
pub mod resources;
pub mod state_machine;
pub mod workspace;

pub use bootstrap::{BootstrapConfig, LifecycleBootstrap, LifecycleHandle};
pub use config::{ConfigManager, ConfigurationError, LifecycleConfig};
pub use error::{LifecycleError, Result};
pub use events::{EventPublisher, LifecycleEvent};
pub use host::{ActivationCollaborators, CapabilityRegistrar, HeavyClient, SetupSignal};
pub use ledger::{
    ActivationLedger, LedgerDetails, LedgerEvent, LedgerEventType, LedgerSnapshot, LedgerSummary,
    RegistrationIntent, RegistrationResult,
};
pub use registration::{Capability, RegistrationGuardSet, SafePushOutcome};
pub use resources::{
    ContainerError, Disposable, FallbackDisposables, FnDisposable, ResourceContainer,
    SubscriptionList,
};
pub use state_machine::{
    ActivationContext, ActivationManager, ActivationOutcome, ActivationState, ClientStatus,
    RegistrationReport, StateMachineError,
};
pub use workspace::{
    HealthIssue, HealthVerdict, NotReadyReason, ProbeError, RequirementsVerdict,
    WorkspaceHealthGate, WorkspaceReadiness,
};
