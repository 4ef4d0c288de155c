//! # Registration
//!
//! Guard latches for non-idempotent host registration APIs and the
//! idempotent safe-push wrapper that hands disposables to the host container.

pub mod guards;
pub mod safe_push;

pub use guards::{Capability, RegistrationGuardSet};
pub use safe_push::{safe_push, SafePushOutcome};
