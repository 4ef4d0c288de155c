use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

/// A resource the host must release when the component unloads
pub trait Disposable: Send + Sync {
    /// Release the resource
    fn dispose(&self);
}

/// Disposable backed by a closure, run at most once
pub struct FnDisposable {
    on_dispose: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl FnDisposable {
    pub fn new(on_dispose: impl FnOnce() + Send + 'static) -> Self {
        Self {
            on_dispose: Mutex::new(Some(Box::new(on_dispose))),
        }
    }

    /// Boxed form, ready to hand to a container
    pub fn boxed(on_dispose: impl FnOnce() + Send + 'static) -> Box<dyn Disposable> {
        Box::new(Self::new(on_dispose))
    }
}

impl Disposable for FnDisposable {
    fn dispose(&self) {
        if let Some(callback) = self.on_dispose.lock().take() {
            callback();
        }
    }
}

impl fmt::Debug for FnDisposable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnDisposable")
            .field("pending", &self.on_dispose.lock().is_some())
            .finish()
    }
}

/// Errors raised by a resource container
#[derive(Error)]
pub enum ContainerError {
    /// The container was torn down; the rejected resource is handed back
    #[error("Resource container is already disposed")]
    Disposed { rejected: Box<dyn Disposable> },
}

impl ContainerError {
    /// Take back the resource the container refused
    pub fn into_rejected(self) -> Box<dyn Disposable> {
        match self {
            Self::Disposed { rejected } => rejected,
        }
    }
}

impl fmt::Debug for ContainerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disposed { .. } => f.write_str("ContainerError::Disposed"),
        }
    }
}

/// Host-provided disposal registration list
///
/// Implementations wrap whatever shape the real host API has. `push` on a
/// disposed container must fail and return the resource rather than drop it.
pub trait ResourceContainer: Send + Sync {
    /// Register a resource for disposal when the container is torn down
    fn push(&self, disposable: Box<dyn Disposable>) -> Result<(), ContainerError>;

    /// Whether the container has already been torn down
    fn is_disposed(&self) -> bool;
}

/// In-process subscription list, the default [`ResourceContainer`] adapter
#[derive(Default)]
pub struct SubscriptionList {
    entries: Mutex<Vec<Box<dyn Disposable>>>,
    disposed: AtomicBool,
}

impl SubscriptionList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of resources currently held
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Tear the container down, disposing held resources newest first.
    ///
    /// Returns the number of resources released. Calling it again is a no-op.
    pub fn dispose_all(&self) -> usize {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return 0;
        }

        let drained: Vec<_> = self.entries.lock().drain(..).collect();
        let released = drained.len();
        for disposable in drained.into_iter().rev() {
            disposable.dispose();
        }

        tracing::debug!(released = released, "Subscription list disposed");
        released
    }
}

impl ResourceContainer for SubscriptionList {
    fn push(&self, disposable: Box<dyn Disposable>) -> Result<(), ContainerError> {
        let mut entries = self.entries.lock();
        // Checked under the entries lock so a racing dispose_all cannot strand it
        if self.disposed.load(Ordering::SeqCst) {
            return Err(ContainerError::Disposed {
                rejected: disposable,
            });
        }
        entries.push(disposable);
        Ok(())
    }

    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for SubscriptionList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionList")
            .field("len", &self.len())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
