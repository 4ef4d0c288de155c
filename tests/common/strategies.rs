//! Proptest strategies for activation sequences

use lifecycle_core::{HealthIssue, HealthVerdict, RequirementsVerdict};
use proptest::prelude::*;

/// One step of a host session
#[derive(Debug, Clone)]
pub enum HostStep {
    Activate {
        workspace: usize,
        health: HealthVerdict,
        requirements: RequirementsVerdict,
    },
    Deactivate,
}

impl HostStep {
    /// Whether this step would run heavy initialization from an inactive state
    pub fn is_ready(&self) -> bool {
        matches!(
            self,
            HostStep::Activate {
                health: HealthVerdict::Valid,
                requirements: RequirementsVerdict::Match,
                ..
            }
        )
    }
}

pub fn health_verdict_strategy() -> impl Strategy<Value = HealthVerdict> {
    prop_oneof![
        3 => Just(HealthVerdict::Valid),
        1 => Just(HealthVerdict::Invalid(HealthIssue::NoWorkspace)),
        1 => Just(HealthVerdict::Invalid(HealthIssue::MissingEnvironment)),
        1 => "[a-z ]{1,16}".prop_map(|detail| HealthVerdict::Invalid(HealthIssue::BrokenEnvironment(detail))),
    ]
}

pub fn requirements_verdict_strategy() -> impl Strategy<Value = RequirementsVerdict> {
    prop_oneof![
        2 => Just(RequirementsVerdict::Match),
        1 => Just(RequirementsVerdict::Mismatch),
    ]
}

pub fn host_step_strategy() -> impl Strategy<Value = HostStep> {
    prop_oneof![
        3 => (0usize..4, health_verdict_strategy(), requirements_verdict_strategy()).prop_map(
            |(workspace, health, requirements)| HostStep::Activate {
                workspace,
                health,
                requirements,
            }
        ),
        2 => Just(HostStep::Deactivate),
    ]
}

pub fn host_session_strategy() -> impl Strategy<Value = Vec<HostStep>> {
    prop::collection::vec(host_step_strategy(), 1..24)
}
