//! # Workspace Health Gate
//!
//! Boundary to the external probes that judge a workspace. The lifecycle core
//! only consumes their verdicts.

pub mod health_gate;

pub use health_gate::{
    evaluate_readiness, probe_workspace, HealthIssue, HealthVerdict, NotReadyReason, ProbeError,
    RequirementsVerdict, WorkspaceHealthGate, WorkspaceReadiness, WorkspaceVerdict,
};
