use serde_json::json;
use std::path::PathBuf;
use uuid::Uuid;

use super::events::ActivationEvent;
use super::states::ActivationState;
use crate::constants::events;
use crate::events::EventPublisher;
use crate::logging::log_lifecycle_operation;

/// A state change that has already been applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub activation_id: Option<Uuid>,
    pub from: ActivationState,
    pub to: ActivationState,
    pub event: ActivationEvent,
    pub workspace: Option<PathBuf>,
}

/// Trait for implementing post-transition actions
pub trait StateAction: Send + Sync {
    /// Execute the action
    fn execute(&self, transition: &Transition);

    /// Get a description of this action for logging
    fn description(&self) -> &'static str;
}

/// Structured log line for every transition
pub struct LogTransitionAction;

impl StateAction for LogTransitionAction {
    fn execute(&self, transition: &Transition) {
        let workspace = transition
            .workspace
            .as_ref()
            .map(|path| path.display().to_string());
        log_lifecycle_operation(
            transition.event.event_type(),
            workspace.as_deref(),
            &transition.from.to_string(),
            &transition.to.to_string(),
            None,
        );
    }

    fn description(&self) -> &'static str {
        "Log lifecycle transition"
    }
}

/// Publish lifecycle events for transitions collaborators care about
pub struct PublishTransitionEventAction {
    event_publisher: EventPublisher,
}

impl PublishTransitionEventAction {
    pub fn new(event_publisher: EventPublisher) -> Self {
        Self { event_publisher }
    }
}

impl StateAction for PublishTransitionEventAction {
    fn execute(&self, transition: &Transition) {
        if let Some(event_name) = determine_event_name(transition) {
            let context = json!({
                "from_state": transition.from,
                "to_state": transition.to,
                "event": transition.event,
                "workspace": transition.workspace,
            });
            self.event_publisher
                .publish(event_name, transition.activation_id, context);
        }
    }

    fn description(&self) -> &'static str {
        "Publish lifecycle event for transition"
    }
}

/// Map a transition to the lifecycle event it publishes, if any
pub fn determine_event_name(transition: &Transition) -> Option<&'static str> {
    match (transition.from, transition.to, transition.event) {
        (ActivationState::Inactive, ActivationState::Activating, _) => {
            Some(events::ACTIVATION_STARTED)
        }
        (ActivationState::Activating, ActivationState::Active, ActivationEvent::Ready) => {
            Some(events::ACTIVATION_READY)
        }
        (ActivationState::Activating, ActivationState::Active, ActivationEvent::SetupRequired) => {
            Some(events::ACTIVATION_SETUP_REQUIRED)
        }
        (ActivationState::Activating, ActivationState::Inactive, ActivationEvent::Abort) => {
            Some(events::ACTIVATION_FAILED)
        }
        (ActivationState::Deactivating, ActivationState::Inactive, _) => {
            Some(events::DEACTIVATION_COMPLETED)
        }
        _ => None,
    }
}
