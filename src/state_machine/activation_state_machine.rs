use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Weak};
use uuid::Uuid;

use super::{
    actions::{LogTransitionAction, PublishTransitionEventAction, StateAction, Transition},
    errors::{StateMachineError, StateMachineResult},
    events::ActivationEvent,
    states::ActivationState,
};
use crate::config::{ActivationConfig, LifecycleConfig};
use crate::constants::events;
use crate::error::Result;
use crate::events::{EventPublisher, LifecycleEvent};
use crate::host::ActivationCollaborators;
use crate::ledger::{
    ActivationLedger, LedgerDetails, LedgerEvent, LedgerSnapshot, RegistrationIntent,
    RegistrationResult,
};
use crate::logging::{log_error, log_registration_operation};
use crate::registration::safe_push::{retain_in_fallback, safe_push};
use crate::registration::{Capability, RegistrationGuardSet, SafePushOutcome};
use crate::resources::{Disposable, FallbackDisposables, ResourceContainer};
use crate::workspace::{evaluate_readiness, NotReadyReason, ProbeError, WorkspaceReadiness};

/// What the host hands to `activate`
#[derive(Clone)]
pub struct ActivationContext {
    /// Host-owned disposal list; only referenced, never torn down here
    pub container: Arc<dyn ResourceContainer>,
    pub workspace_root: PathBuf,
}

impl ActivationContext {
    pub fn new(container: Arc<dyn ResourceContainer>, workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            container,
            workspace_root: workspace_root.into(),
        }
    }
}

impl fmt::Debug for ActivationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActivationContext")
            .field("container_disposed", &self.container.is_disposed())
            .field("workspace_root", &self.workspace_root)
            .finish()
    }
}

/// Per-capability results of one registration pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationReport {
    /// Registered with the host and pushed into the live container
    pub registered: Vec<Capability>,
    /// Already latched, host API not called
    pub skipped: Vec<Capability>,
    /// Registered with the host, but the container was gone
    pub fallback: Vec<Capability>,
    /// Host registration API failed; guard left unset
    pub failed: Vec<(Capability, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientStatus {
    Initialized,
    Failed(String),
}

/// Result of a call to [`ActivationManager::activate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationOutcome {
    /// Already activating or active; nothing was done
    AlreadyActive,
    /// Workspace ready; capabilities registered, heavy client initialized
    Ready {
        registrations: RegistrationReport,
        client: ClientStatus,
    },
    /// Activation completed inert; the UI was told setup is required
    SetupRequired(NotReadyReason),
    /// `deactivate` ran while this activation was suspended
    Superseded,
}

impl ActivationOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }

    pub fn is_setup_required(&self) -> bool {
        matches!(self, Self::SetupRequired(_))
    }
}

#[derive(Default)]
struct Lifecycle {
    state: ActivationState,
    context: Option<Weak<dyn ResourceContainer>>,
    workspace_root: Option<PathBuf>,
    activation_id: Option<Uuid>,
    /// Bumped by every deactivation; stale tickets must not mutate state
    epoch: u64,
}

/// Identity of one in-flight activation
struct ActivationTicket {
    activation_id: Uuid,
    epoch: u64,
    workspace_root: PathBuf,
}

enum Latch {
    Superseded,
    Latched(Option<Arc<dyn ResourceContainer>>),
}

/// Process-wide activation controller.
///
/// Construct one per process and share it by `Arc`. It exclusively owns the
/// registration guards, the ledger and the fallback list; only it transitions
/// the guards or triggers teardown.
pub struct ActivationManager {
    lifecycle: Mutex<Lifecycle>,
    guards: RegistrationGuardSet,
    ledger: ActivationLedger,
    fallback: FallbackDisposables,
    collaborators: ActivationCollaborators,
    publisher: EventPublisher,
    actions: Vec<Box<dyn StateAction>>,
    config: ActivationConfig,
}

impl ActivationManager {
    /// Create a manager with default configuration
    pub fn new(collaborators: ActivationCollaborators) -> Self {
        Self::with_config(collaborators, &LifecycleConfig::default())
    }

    pub fn with_config(collaborators: ActivationCollaborators, config: &LifecycleConfig) -> Self {
        let publisher = EventPublisher::new(config.events.channel_capacity);
        let actions: Vec<Box<dyn StateAction>> = vec![
            Box::new(LogTransitionAction),
            Box::new(PublishTransitionEventAction::new(publisher.clone())),
        ];

        Self {
            lifecycle: Mutex::new(Lifecycle::default()),
            guards: RegistrationGuardSet::new(),
            ledger: ActivationLedger::with_tracing(config.ledger.trace_events),
            fallback: FallbackDisposables::new(),
            collaborators,
            publisher,
            actions,
            config: config.activation.clone(),
        }
    }

    /// Activate for the workspace in `context`.
    ///
    /// A call made while another activation is in flight or complete is a
    /// no-op. Otherwise both workspace probes are awaited before any
    /// registration happens. An unhealthy workspace still completes the
    /// activation; only a probe that raises produces an `Err`.
    pub async fn activate(&self, context: ActivationContext) -> Result<ActivationOutcome> {
        let Some(ticket) = self.begin_activation(&context)? else {
            return Ok(ActivationOutcome::AlreadyActive);
        };

        let readiness =
            match evaluate_readiness(self.collaborators.health_gate.as_ref(), &ticket.workspace_root)
                .await
            {
                Ok(readiness) => readiness,
                Err(err) => {
                    self.abort_activation(&ticket, &err)?;
                    return Err(err.into());
                }
            };

        if !self.is_current(&ticket) {
            return Ok(self.superseded(&ticket));
        }

        match readiness {
            WorkspaceReadiness::Ready => self.initialize_ready_workspace(&ticket).await,
            WorkspaceReadiness::NotReady(reason) => self.complete_setup_required(&ticket, reason),
        }
    }

    /// Tear down the current activation.
    ///
    /// Resets every registration guard and releases the current context in a
    /// single critical section. Safe to call repeatedly and from any state.
    /// The ledger is kept.
    pub fn deactivate(&self) {
        let transitions = {
            let mut lifecycle = self.lifecycle.lock();
            let mut transitions = Vec::with_capacity(2);

            match Self::apply(&mut lifecycle, ActivationEvent::Deactivate) {
                Ok(transition) => transitions.push(transition),
                Err(err) => tracing::error!(error = %err, "Deactivation entered from unexpected state"),
            }

            self.guards.reset_all();
            lifecycle.context = None;
            lifecycle.epoch += 1;

            match Self::apply(&mut lifecycle, ActivationEvent::Release) {
                Ok(transition) => transitions.push(transition),
                Err(_) => lifecycle.state = ActivationState::Inactive,
            }

            lifecycle.workspace_root = None;
            lifecycle.activation_id = None;
            transitions
        };

        for transition in &transitions {
            self.run_actions(transition);
        }
    }

    pub fn state(&self) -> ActivationState {
        self.lifecycle.lock().state
    }

    pub fn is_active(&self) -> bool {
        self.state().is_active()
    }

    pub fn is_registered(&self, capability: Capability) -> bool {
        self.guards.is_registered(capability)
    }

    pub fn are_tools_registered(&self) -> bool {
        self.guards.is_registered(Capability::Tools)
    }

    pub fn is_participant_registered(&self) -> bool {
        self.guards.is_registered(Capability::Participant)
    }

    /// Registration latches, for collaborators that register on their own
    pub fn guards(&self) -> &RegistrationGuardSet {
        &self.guards
    }

    /// Workspace of the activation in flight or active, if any
    pub fn current_workspace(&self) -> Option<PathBuf> {
        self.lifecycle.lock().workspace_root.clone()
    }

    /// Whether a current context is set and the host still holds it
    pub fn has_live_context(&self) -> bool {
        self.lifecycle
            .lock()
            .context
            .as_ref()
            .and_then(Weak::upgrade)
            .is_some_and(|container| !container.is_disposed())
    }

    /// Register a disposable with `container`, falling back when it is disposed
    pub fn safe_push(
        &self,
        container: &dyn ResourceContainer,
        disposable: Box<dyn Disposable>,
        intent: RegistrationIntent,
    ) -> SafePushOutcome {
        let outcome = safe_push(
            container,
            disposable,
            intent.clone(),
            &self.ledger,
            &self.fallback,
        );
        if outcome == SafePushOutcome::Fallback {
            self.publish_anomaly(&intent);
        }
        outcome
    }

    /// Safe-push into the current activation's container.
    ///
    /// With no current context, or one the host already dropped, the
    /// disposable goes straight to the fallback list.
    pub fn push_to_current_context(
        &self,
        disposable: Box<dyn Disposable>,
        intent: RegistrationIntent,
    ) -> SafePushOutcome {
        let container = self
            .lifecycle
            .lock()
            .context
            .as_ref()
            .and_then(Weak::upgrade);

        match container {
            Some(container) => self.safe_push(container.as_ref(), disposable, intent),
            None => self.fallback_push(disposable, intent),
        }
    }

    pub fn activation_ledger_snapshot(&self) -> LedgerSnapshot {
        self.ledger.snapshot()
    }

    pub fn ledger(&self) -> &ActivationLedger {
        &self.ledger
    }

    pub fn record_prompt_event(
        &self,
        reason: impl Into<String>,
        mode: impl Into<String>,
        extra: Map<String, Value>,
    ) -> LedgerEvent {
        self.ledger.record_prompt_event(reason, mode, extra)
    }

    /// Number of disposables waiting in the fallback list
    pub fn fallback_len(&self) -> usize {
        self.fallback.len()
    }

    /// Dispose everything in the fallback list now instead of at exit
    pub fn release_fallbacks(&self) -> usize {
        self.fallback.release_all()
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<LifecycleEvent> {
        self.publisher.subscribe()
    }

    /// Return every piece of state to its initial value, ledger included.
    ///
    /// Diagnostic and test use only; production teardown is [`deactivate`](Self::deactivate).
    pub fn reset_diagnostic_state(&self) {
        {
            let mut lifecycle = self.lifecycle.lock();
            self.guards.reset_all();
            let epoch = lifecycle.epoch + 1;
            *lifecycle = Lifecycle {
                epoch,
                ..Lifecycle::default()
            };
        }
        self.ledger.reset();
        self.fallback.release_all();
        tracing::debug!("Lifecycle diagnostic state reset");
    }

    fn begin_activation(
        &self,
        context: &ActivationContext,
    ) -> StateMachineResult<Option<ActivationTicket>> {
        let mut lifecycle = self.lifecycle.lock();

        if lifecycle.state.blocks_activation() {
            let state = lifecycle.state;
            let activation_id = lifecycle.activation_id;
            drop(lifecycle);

            tracing::debug!(
                state = %state,
                workspace = %context.workspace_root.display(),
                "Activation requested while already {state}; skipping"
            );
            self.publisher.publish(
                events::ACTIVATION_SKIPPED,
                activation_id,
                json!({ "state": state, "workspace": context.workspace_root }),
            );
            return Ok(None);
        }

        let activation_id = Uuid::new_v4();
        lifecycle.activation_id = Some(activation_id);
        lifecycle.workspace_root = Some(context.workspace_root.clone());
        let transition = Self::apply(&mut lifecycle, ActivationEvent::Activate)?;
        lifecycle.context = Some(Arc::downgrade(&context.container));

        let ticket = ActivationTicket {
            activation_id,
            epoch: lifecycle.epoch,
            workspace_root: context.workspace_root.clone(),
        };
        drop(lifecycle);

        self.run_actions(&transition);
        Ok(Some(ticket))
    }

    async fn initialize_ready_workspace(
        &self,
        ticket: &ActivationTicket,
    ) -> Result<ActivationOutcome> {
        let Some(registrations) = self.register_capabilities(ticket).await else {
            return Ok(self.superseded(ticket));
        };

        let client = match self.collaborators.heavy_client.initialize().await {
            Ok(()) => ClientStatus::Initialized,
            Err(err) => {
                let message = format!("{err:#}");
                log_error(
                    "activation_manager",
                    "initialize_heavy_client",
                    &message,
                    Some(&ticket.workspace_root.display().to_string()),
                );
                ClientStatus::Failed(message)
            }
        };

        if !self.complete_activation(ticket, ActivationEvent::Ready)? {
            return Ok(self.superseded(ticket));
        }

        tracing::info!(
            activation_id = %ticket.activation_id,
            workspace = %ticket.workspace_root.display(),
            registered = ?registrations.registered,
            client = ?client,
            "Activation complete"
        );

        Ok(ActivationOutcome::Ready {
            registrations,
            client,
        })
    }

    /// Register every configured capability at most once.
    ///
    /// Returns `None` if the activation was superseded mid-way; any handle
    /// obtained after that point is disposed immediately.
    async fn register_capabilities(&self, ticket: &ActivationTicket) -> Option<RegistrationReport> {
        let mut report = RegistrationReport::default();

        for &capability in &self.config.capabilities {
            let intent = RegistrationIntent::capability(capability);

            if self.guards.is_registered(capability) {
                log_registration_operation(
                    "register_capability",
                    &intent,
                    "skipped",
                    Some("already registered"),
                );
                self.ledger.record(LedgerDetails::registration(
                    intent,
                    RegistrationResult::Skipped,
                ));
                report.skipped.push(capability);
                continue;
            }

            let handle = match self.collaborators.registrar.register(capability).await {
                Ok(handle) => handle,
                Err(err) => {
                    let message = format!("{err:#}");
                    log_error(
                        "activation_manager",
                        "register_capability",
                        &message,
                        Some(capability.as_str()),
                    );
                    report.failed.push((capability, message));
                    continue;
                }
            };

            let outcome = match self.latch_registration(ticket, capability) {
                Latch::Superseded => {
                    handle.dispose();
                    return None;
                }
                Latch::Latched(Some(container)) => {
                    self.safe_push(container.as_ref(), handle, intent)
                }
                Latch::Latched(None) => self.fallback_push(handle, intent),
            };

            match outcome {
                SafePushOutcome::Pushed => report.registered.push(capability),
                SafePushOutcome::Fallback => report.fallback.push(capability),
            }
        }

        Some(report)
    }

    /// Latch a capability for the ticket's activation and resolve its container
    fn latch_registration(&self, ticket: &ActivationTicket, capability: Capability) -> Latch {
        let lifecycle = self.lifecycle.lock();
        if lifecycle.epoch != ticket.epoch {
            return Latch::Superseded;
        }
        self.guards.set_registered(capability, true);
        Latch::Latched(lifecycle.context.as_ref().and_then(Weak::upgrade))
    }

    fn complete_setup_required(
        &self,
        ticket: &ActivationTicket,
        reason: NotReadyReason,
    ) -> Result<ActivationOutcome> {
        if !self.complete_activation(ticket, ActivationEvent::SetupRequired)? {
            return Ok(self.superseded(ticket));
        }

        self.collaborators
            .setup_signal
            .setup_required(&ticket.workspace_root, &reason);

        let mut extra = Map::new();
        extra.insert(
            "workspace".to_string(),
            json!(ticket.workspace_root.display().to_string()),
        );
        extra.insert("detail".to_string(), json!(reason.to_string()));
        self.ledger.record_prompt_event(
            reason.prompt_reason(),
            self.config.setup_prompt_mode.clone(),
            extra,
        );

        tracing::warn!(
            activation_id = %ticket.activation_id,
            workspace = %ticket.workspace_root.display(),
            reason = %reason,
            "Workspace setup required; heavy initialization skipped"
        );

        Ok(ActivationOutcome::SetupRequired(reason))
    }

    /// Move the ticket's activation to `Active`; false if it was superseded
    fn complete_activation(
        &self,
        ticket: &ActivationTicket,
        event: ActivationEvent,
    ) -> StateMachineResult<bool> {
        let transition = {
            let mut lifecycle = self.lifecycle.lock();
            if lifecycle.epoch != ticket.epoch {
                return Ok(false);
            }
            Self::apply(&mut lifecycle, event)?
        };
        self.run_actions(&transition);
        Ok(true)
    }

    fn abort_activation(&self, ticket: &ActivationTicket, err: &ProbeError) -> StateMachineResult<()> {
        log_error(
            "activation_manager",
            "evaluate_readiness",
            &err.to_string(),
            Some(&ticket.workspace_root.display().to_string()),
        );

        let transition = {
            let mut lifecycle = self.lifecycle.lock();
            if lifecycle.epoch != ticket.epoch {
                return Ok(());
            }
            let transition = Self::apply(&mut lifecycle, ActivationEvent::Abort)?;
            lifecycle.context = None;
            lifecycle.workspace_root = None;
            lifecycle.activation_id = None;
            transition
        };
        self.run_actions(&transition);
        Ok(())
    }

    fn is_current(&self, ticket: &ActivationTicket) -> bool {
        self.lifecycle.lock().epoch == ticket.epoch
    }

    fn superseded(&self, ticket: &ActivationTicket) -> ActivationOutcome {
        tracing::info!(
            activation_id = %ticket.activation_id,
            workspace = %ticket.workspace_root.display(),
            "Activation superseded by deactivation"
        );
        self.publisher.publish(
            events::ACTIVATION_SUPERSEDED,
            Some(ticket.activation_id),
            json!({ "workspace": ticket.workspace_root }),
        );
        ActivationOutcome::Superseded
    }

    fn fallback_push(
        &self,
        disposable: Box<dyn Disposable>,
        intent: RegistrationIntent,
    ) -> SafePushOutcome {
        let outcome = retain_in_fallback(disposable, intent.clone(), &self.ledger, &self.fallback);
        self.publish_anomaly(&intent);
        outcome
    }

    fn publish_anomaly(&self, intent: &RegistrationIntent) {
        let activation_id = self.lifecycle.lock().activation_id;
        self.publisher.publish(
            events::REGISTRATION_ANOMALY,
            activation_id,
            json!({ "intent": intent, "disposed": true, "fallback_used": true }),
        );
    }

    fn apply(lifecycle: &mut Lifecycle, event: ActivationEvent) -> StateMachineResult<Transition> {
        let from = lifecycle.state;
        let to = determine_target_state(from, event)?;
        lifecycle.state = to;
        Ok(Transition {
            activation_id: lifecycle.activation_id,
            from,
            to,
            event,
            workspace: lifecycle.workspace_root.clone(),
        })
    }

    fn run_actions(&self, transition: &Transition) {
        for action in &self.actions {
            tracing::trace!(action = action.description(), "Executing transition action");
            action.execute(transition);
        }
    }
}

impl fmt::Debug for ActivationManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lifecycle = self.lifecycle.lock();
        f.debug_struct("ActivationManager")
            .field("state", &lifecycle.state)
            .field("workspace_root", &lifecycle.workspace_root)
            .field("epoch", &lifecycle.epoch)
            .field("registered", &self.guards.registered())
            .field("ledger_events", &self.ledger.len())
            .field("fallback", &self.fallback.len())
            .finish()
    }
}

/// Determine the target state based on current state and event
pub fn determine_target_state(
    current_state: ActivationState,
    event: ActivationEvent,
) -> StateMachineResult<ActivationState> {
    let target = match (current_state, event) {
        (ActivationState::Inactive, ActivationEvent::Activate) => ActivationState::Activating,

        // Completion, inert or not
        (ActivationState::Activating, ActivationEvent::Ready)
        | (ActivationState::Activating, ActivationEvent::SetupRequired) => ActivationState::Active,

        // Probe failure rolls back
        (ActivationState::Activating, ActivationEvent::Abort) => ActivationState::Inactive,

        // Deactivation is accepted from anywhere but mid-teardown
        (ActivationState::Inactive, ActivationEvent::Deactivate)
        | (ActivationState::Activating, ActivationEvent::Deactivate)
        | (ActivationState::Active, ActivationEvent::Deactivate) => ActivationState::Deactivating,

        (ActivationState::Deactivating, ActivationEvent::Release) => ActivationState::Inactive,

        (from, event) => return Err(StateMachineError::InvalidTransition { from, event }),
    };

    Ok(target)
}
