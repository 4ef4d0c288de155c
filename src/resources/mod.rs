//! # Resource Container Adapter
//!
//! The host hands every activation a container that collects disposable
//! resources and tears them down when the component unloads. This module
//! models that contract with exactly the two operations the lifecycle core
//! needs (`push` and `is_disposed`) plus the process-local fallback list used
//! when the container is already gone.

pub mod container;
pub mod fallback;

pub use container::{
    ContainerError, Disposable, FnDisposable, ResourceContainer, SubscriptionList,
};
pub use fallback::FallbackDisposables;
