//! Scripted collaborators for activation tests.
//!
//! Each mock counts its calls so tests can assert on exactly which host APIs
//! were touched by an activation.

use async_trait::async_trait;
use lifecycle_core::{
    ActivationCollaborators, ActivationContext, ActivationManager, Capability,
    CapabilityRegistrar, Disposable, FnDisposable, HealthVerdict, HeavyClient, LifecycleConfig,
    NotReadyReason, RequirementsVerdict, SetupSignal, SubscriptionList, WorkspaceHealthGate,
};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Lets a test park the health probe mid-activation
#[derive(Default)]
pub struct ProbeHold {
    pub entered: Notify,
    pub release: Notify,
}

/// Health gate with per-workspace verdicts; unknown workspaces are healthy
#[derive(Default)]
pub struct ScriptedHealthGate {
    verdicts: Mutex<HashMap<PathBuf, (HealthVerdict, RequirementsVerdict)>>,
    failing: Mutex<HashSet<PathBuf>>,
    hold: Mutex<Option<Arc<ProbeHold>>>,
    pub health_calls: AtomicUsize,
    pub requirements_calls: AtomicUsize,
}

impl ScriptedHealthGate {
    pub fn script(&self, root: impl Into<PathBuf>, health: HealthVerdict, requirements: RequirementsVerdict) {
        self.verdicts.lock().insert(root.into(), (health, requirements));
    }

    /// Make the health probe for `root` raise
    pub fn fail(&self, root: impl Into<PathBuf>) {
        self.failing.lock().insert(root.into());
    }

    pub fn heal(&self, root: &Path) {
        self.failing.lock().remove(root);
    }

    /// Park the next health probe until `release` is notified
    pub fn hold(&self) -> Arc<ProbeHold> {
        let hold = Arc::new(ProbeHold::default());
        *self.hold.lock() = Some(Arc::clone(&hold));
        hold
    }

    pub fn probe_calls(&self) -> usize {
        self.health_calls.load(Ordering::SeqCst) + self.requirements_calls.load(Ordering::SeqCst)
    }

    fn verdict(&self, root: &Path) -> (HealthVerdict, RequirementsVerdict) {
        self.verdicts
            .lock()
            .get(root)
            .cloned()
            .unwrap_or((HealthVerdict::Valid, RequirementsVerdict::Match))
    }
}

#[async_trait]
impl WorkspaceHealthGate for ScriptedHealthGate {
    async fn probe_health(&self, root: &Path) -> anyhow::Result<HealthVerdict> {
        self.health_calls.fetch_add(1, Ordering::SeqCst);

        let hold = self.hold.lock().take();
        if let Some(hold) = hold {
            hold.entered.notify_one();
            hold.release.notified().await;
        }

        if self.failing.lock().contains(root) {
            anyhow::bail!("health probe crashed for {}", root.display());
        }
        Ok(self.verdict(root).0)
    }

    async fn probe_requirements(&self, root: &Path) -> anyhow::Result<RequirementsVerdict> {
        self.requirements_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.verdict(root).1)
    }
}

/// Host registration APIs that count calls and disposals per capability
#[derive(Default)]
pub struct RecordingRegistrar {
    calls: Mutex<Vec<Capability>>,
    failing: Mutex<HashSet<Capability>>,
    pub disposed: Arc<AtomicUsize>,
}

impl RecordingRegistrar {
    pub fn fail(&self, capability: Capability) {
        self.failing.lock().insert(capability);
    }

    pub fn calls(&self) -> Vec<Capability> {
        self.calls.lock().clone()
    }

    pub fn calls_for(&self, capability: Capability) -> usize {
        self.calls.lock().iter().filter(|c| **c == capability).count()
    }

    pub fn disposed(&self) -> usize {
        self.disposed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CapabilityRegistrar for RecordingRegistrar {
    async fn register(&self, capability: Capability) -> anyhow::Result<Box<dyn Disposable>> {
        self.calls.lock().push(capability);
        if self.failing.lock().contains(&capability) {
            anyhow::bail!("host rejected {capability} registration");
        }
        let disposed = Arc::clone(&self.disposed);
        Ok(FnDisposable::boxed(move || {
            disposed.fetch_add(1, Ordering::SeqCst);
        }))
    }
}

#[derive(Default)]
pub struct CountingHeavyClient {
    pub initializations: AtomicUsize,
    fail: Mutex<bool>,
}

impl CountingHeavyClient {
    pub fn fail_with_error(&self) {
        *self.fail.lock() = true;
    }

    pub fn count(&self) -> usize {
        self.initializations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HeavyClient for CountingHeavyClient {
    async fn initialize(&self) -> anyhow::Result<()> {
        self.initializations.fetch_add(1, Ordering::SeqCst);
        if *self.fail.lock() {
            anyhow::bail!("backend process exited during startup");
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingSetupSignal {
    signals: Mutex<Vec<(PathBuf, NotReadyReason)>>,
}

impl RecordingSetupSignal {
    pub fn signals(&self) -> Vec<(PathBuf, NotReadyReason)> {
        self.signals.lock().clone()
    }
}

impl SetupSignal for RecordingSetupSignal {
    fn setup_required(&self, workspace_root: &Path, reason: &NotReadyReason) {
        self.signals
            .lock()
            .push((workspace_root.to_path_buf(), reason.clone()));
    }
}

/// A fresh manager wired to fresh mocks
pub struct TestHarness {
    pub manager: Arc<ActivationManager>,
    pub gate: Arc<ScriptedHealthGate>,
    pub registrar: Arc<RecordingRegistrar>,
    pub client: Arc<CountingHeavyClient>,
    pub signal: Arc<RecordingSetupSignal>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_config(&LifecycleConfig::default())
    }

    pub fn with_config(config: &LifecycleConfig) -> Self {
        let gate = Arc::new(ScriptedHealthGate::default());
        let registrar = Arc::new(RecordingRegistrar::default());
        let client = Arc::new(CountingHeavyClient::default());
        let signal = Arc::new(RecordingSetupSignal::default());

        let manager = Arc::new(ActivationManager::with_config(
            collaborators(&gate, &registrar, &client, &signal),
            config,
        ));

        Self {
            manager,
            gate,
            registrar,
            client,
            signal,
        }
    }

    pub fn collaborators(&self) -> ActivationCollaborators {
        collaborators(&self.gate, &self.registrar, &self.client, &self.signal)
    }
}

fn collaborators(
    gate: &Arc<ScriptedHealthGate>,
    registrar: &Arc<RecordingRegistrar>,
    client: &Arc<CountingHeavyClient>,
    signal: &Arc<RecordingSetupSignal>,
) -> ActivationCollaborators {
    ActivationCollaborators::new(
        gate.clone(),
        registrar.clone(),
        client.clone(),
        signal.clone(),
    )
}

/// New container plus the activation context that references it
pub fn context_for(root: &str) -> (Arc<SubscriptionList>, ActivationContext) {
    let container = Arc::new(SubscriptionList::new());
    let context = ActivationContext::new(container.clone(), root);
    (container, context)
}
