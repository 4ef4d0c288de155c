use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Why a workspace failed its structural health probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "issue", content = "detail", rename_all = "snake_case")]
pub enum HealthIssue {
    /// No workspace folder is open
    NoWorkspace,
    /// The backing environment has not been created yet
    MissingEnvironment,
    /// The environment exists but cannot be used
    BrokenEnvironment(String),
    Other(String),
}

impl fmt::Display for HealthIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoWorkspace => write!(f, "no workspace folder"),
            Self::MissingEnvironment => write!(f, "environment missing"),
            Self::BrokenEnvironment(detail) => write!(f, "environment broken: {detail}"),
            Self::Other(detail) => write!(f, "{detail}"),
        }
    }
}

/// Structural health verdict for a workspace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthVerdict {
    Valid,
    Invalid(HealthIssue),
}

impl HealthVerdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Whether installed requirements match what the workspace declares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementsVerdict {
    Match,
    Mismatch,
}

/// Both probe results for one activation attempt. Never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceVerdict {
    pub health: HealthVerdict,
    pub requirements: RequirementsVerdict,
}

impl WorkspaceVerdict {
    /// Fold both probe results into a single readiness decision.
    ///
    /// Structural health wins: an invalid workspace is `Unhealthy` whatever
    /// the requirements probe said.
    pub fn readiness(&self) -> WorkspaceReadiness {
        match (&self.health, self.requirements) {
            (HealthVerdict::Invalid(issue), _) => {
                WorkspaceReadiness::NotReady(NotReadyReason::Unhealthy(issue.clone()))
            }
            (HealthVerdict::Valid, RequirementsVerdict::Mismatch) => {
                WorkspaceReadiness::NotReady(NotReadyReason::RequirementsMismatch)
            }
            (HealthVerdict::Valid, RequirementsVerdict::Match) => WorkspaceReadiness::Ready,
        }
    }
}

/// Why heavy initialization was skipped for a workspace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotReadyReason {
    Unhealthy(HealthIssue),
    RequirementsMismatch,
}

impl NotReadyReason {
    /// Reason string recorded on the setup prompt ledger event
    pub fn prompt_reason(&self) -> &'static str {
        match self {
            Self::Unhealthy(_) => crate::constants::prompt_reasons::WORKSPACE_UNHEALTHY,
            Self::RequirementsMismatch => crate::constants::prompt_reasons::REQUIREMENTS_MISMATCH,
        }
    }
}

impl fmt::Display for NotReadyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unhealthy(issue) => write!(f, "workspace unhealthy: {issue}"),
            Self::RequirementsMismatch => write!(f, "installed requirements out of date"),
        }
    }
}

/// Combined readiness of a workspace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkspaceReadiness {
    Ready,
    NotReady(NotReadyReason),
}

impl WorkspaceReadiness {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

/// A workspace probe raised instead of returning a verdict
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Health probe failed for {}: {source}", .workspace.display())]
    Health {
        workspace: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Requirements probe failed for {}: {source}", .workspace.display())]
    Requirements {
        workspace: PathBuf,
        #[source]
        source: anyhow::Error,
    },
}

/// External probes deciding whether a workspace can be initialized.
///
/// Implementations own any timeout policy; the lifecycle core waits for as
/// long as a probe takes.
#[async_trait]
pub trait WorkspaceHealthGate: Send + Sync {
    /// Structural health of the workspace
    async fn probe_health(&self, workspace_root: &Path) -> anyhow::Result<HealthVerdict>;

    /// Freshness of installed requirements
    async fn probe_requirements(
        &self,
        workspace_root: &Path,
    ) -> anyhow::Result<RequirementsVerdict>;
}

/// Run both probes, health first, and return the combined verdict.
///
/// Both probes always run and are fully awaited before anything else happens.
pub async fn probe_workspace(
    gate: &dyn WorkspaceHealthGate,
    workspace_root: &Path,
) -> Result<WorkspaceVerdict, ProbeError> {
    let health = gate
        .probe_health(workspace_root)
        .await
        .map_err(|source| ProbeError::Health {
            workspace: workspace_root.to_path_buf(),
            source,
        })?;

    let requirements = gate
        .probe_requirements(workspace_root)
        .await
        .map_err(|source| ProbeError::Requirements {
            workspace: workspace_root.to_path_buf(),
            source,
        })?;

    tracing::debug!(
        workspace = %workspace_root.display(),
        ?health,
        ?requirements,
        "Workspace probes resolved"
    );

    Ok(WorkspaceVerdict {
        health,
        requirements,
    })
}

/// Evaluate workspace readiness in one step
pub async fn evaluate_readiness(
    gate: &dyn WorkspaceHealthGate,
    workspace_root: &Path,
) -> Result<WorkspaceReadiness, ProbeError> {
    Ok(probe_workspace(gate, workspace_root).await?.readiness())
}
