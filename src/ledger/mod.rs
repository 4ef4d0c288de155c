//! # Activation Ledger
//!
//! Append-only diagnostic log of registrations, anomalies and prompts. The
//! ledger outlives individual activations so cross-workspace behavior can be
//! inspected after the fact.

pub mod activation_ledger;
pub mod event;

pub use activation_ledger::{ActivationLedger, LedgerSnapshot, LedgerSummary};
pub use event::{
    ContextState, LedgerDetails, LedgerEvent, LedgerEventType, RegistrationIntent,
    RegistrationResult,
};
