//! # Activation State Machine
//!
//! Serialized activation lifecycle: `Inactive -> Activating -> Active`,
//! torn down through `Deactivating`. The [`ActivationManager`] owns the
//! transitions together with the registration guards, the ledger and the
//! fallback list.

pub mod actions;
pub mod activation_state_machine;
pub mod errors;
pub mod events;
pub mod states;

pub use actions::{StateAction, Transition};
pub use activation_state_machine::{
    determine_target_state, ActivationContext, ActivationManager, ActivationOutcome,
    ClientStatus, RegistrationReport,
};
pub use errors::{StateMachineError, StateMachineResult};
pub use events::ActivationEvent;
pub use states::ActivationState;
