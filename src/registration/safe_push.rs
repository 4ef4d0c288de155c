use crate::ledger::{ActivationLedger, LedgerDetails, RegistrationIntent, RegistrationResult};
use crate::logging::log_registration_operation;
use crate::resources::{Disposable, FallbackDisposables, ResourceContainer};

/// Where a safely pushed resource ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafePushOutcome {
    /// Registered with the host container
    Pushed,
    /// Container was disposed; retained in the process-local fallback list
    Fallback,
}

/// Register a disposable with the host container without ever failing.
///
/// Exactly one ledger event is appended per call: `registration/pushed` when
/// the container accepted the resource, otherwise an `anomaly` with
/// `{disposed: true, fallback_used: true}`.
pub fn safe_push(
    container: &dyn ResourceContainer,
    disposable: Box<dyn Disposable>,
    intent: RegistrationIntent,
    ledger: &ActivationLedger,
    fallback: &FallbackDisposables,
) -> SafePushOutcome {
    if container.is_disposed() {
        return retain_in_fallback(disposable, intent, ledger, fallback);
    }

    match container.push(disposable) {
        Ok(()) => {
            log_registration_operation("safe_push", &intent, "pushed", None);
            ledger.record(LedgerDetails::registration(
                intent,
                RegistrationResult::Pushed,
            ));
            SafePushOutcome::Pushed
        }
        // Torn down between the check and the push
        Err(err) => retain_in_fallback(err.into_rejected(), intent, ledger, fallback),
    }
}

/// Account for a resource whose container is gone
pub(crate) fn retain_in_fallback(
    disposable: Box<dyn Disposable>,
    intent: RegistrationIntent,
    ledger: &ActivationLedger,
    fallback: &FallbackDisposables,
) -> SafePushOutcome {
    fallback.retain(disposable);
    tracing::warn!(
        intent = %intent,
        fallback_size = fallback.len(),
        "Resource container disposed; retained disposable in fallback list"
    );
    ledger.record(LedgerDetails::disposed_container(intent));
    SafePushOutcome::Fallback
}
