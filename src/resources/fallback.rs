use parking_lot::Mutex;
use std::fmt;

use super::container::Disposable;

/// Process-local holding area for resources a disposed container refused.
///
/// Everything retained here is released by [`FallbackDisposables::release_all`]
/// or, at the latest, when the list is dropped at process exit.
#[derive(Default)]
pub struct FallbackDisposables {
    retained: Mutex<Vec<Box<dyn Disposable>>>,
}

impl FallbackDisposables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep a resource until the process releases the fallback list
    pub fn retain(&self, disposable: Box<dyn Disposable>) {
        self.retained.lock().push(disposable);
    }

    /// Number of resources waiting for release
    pub fn len(&self) -> usize {
        self.retained.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.retained.lock().is_empty()
    }

    /// Dispose every retained resource, oldest first
    pub fn release_all(&self) -> usize {
        let drained: Vec<_> = self.retained.lock().drain(..).collect();
        let released = drained.len();
        for disposable in drained {
            disposable.dispose();
        }
        if released > 0 {
            tracing::debug!(released = released, "Released fallback disposables");
        }
        released
    }
}

impl Drop for FallbackDisposables {
    fn drop(&mut self) {
        self.release_all();
    }
}

impl fmt::Debug for FallbackDisposables {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FallbackDisposables")
            .field("retained", &self.len())
            .finish()
    }
}
