//! Step lifecycle: one live SDK object per active step.
//!
//! [`StepLifecycle`] owns the shared skeleton every editor/viewer step runs:
//! 1. Wait for the mount target to be connected and laid out
//! 2. Reuse a live handle, or drop it if the target was remounted empty
//! 3. Prepare the step's artifact (session, document, exported bytes)
//! 4. Clear and stabilize the target, let a few frames pass
//! 5. Create the editor/viewer, retrying once after a backoff
//! 6. Store the handle, unless the step was left in the meantime
//!
//! A [`StepBinding`] supplies what differs between steps.

mod bindings;

pub use bindings::{
    DataEditorBinding, DocxEditorBinding, EditorArtifact, PdfViewerBinding, TemplateEditorBinding,
};

use crate::options::LifecycleOptions;
use crate::services::MountTarget;
use crate::state::{Action, WizardState};
use crate::steps::StepId;
use crate::store::WizardStore;
use crate::types::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Result of one [`StepLifecycle::ensure`] call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitOutcome {
    /// A new handle was created and stored
    Created,
    /// A live handle already existed
    Reused,
    /// The step is not the active one
    Inactive,
    /// Required upstream artifact is absent
    Skipped,
    /// Mount target never became ready
    NotReady,
    /// Another initialization is in flight
    Busy,
    /// The step was left while initializing; nothing was kept
    Stale,
    /// Unrecoverable failure, also written to `WizardState::error`
    Failed(String),
}

impl InitOutcome {
    pub fn is_live(&self) -> bool {
        matches!(self, InitOutcome::Created | InitOutcome::Reused)
    }
}

/// What a concrete step plugs into the lifecycle skeleton
#[async_trait]
pub trait StepBinding: Send + Sync {
    type Handle: Clone + Send + Sync + 'static;
    type Artifact: Send + Sync;

    fn step(&self) -> StepId;

    /// Human-readable name used in error messages, e.g. "the template editor"
    fn describe(&self) -> &'static str;

    fn handle(&self, state: &WizardState) -> Option<Self::Handle>;

    fn store_handle(&self, handle: Option<Self::Handle>) -> Action;

    fn upstream_ready(&self, state: &WizardState) -> bool;

    /// Produce the primary artifact, writing intermediate results to the store.
    /// `live` must be checked after every await before the next SDK call or
    /// store write. `Ok(None)` means the upstream changed or the step went stale.
    async fn prepare(
        &self,
        store: &WizardStore,
        live: Liveness<'_>,
    ) -> Result<Option<Self::Artifact>>;

    async fn create(
        &self,
        target: &Arc<dyn MountTarget>,
        artifact: &Self::Artifact,
    ) -> Result<Self::Handle>;

    /// Release a handle. Handles that need their mount target keep it themselves.
    async fn destroy(&self, handle: Self::Handle) -> Result<()>;
}

/// Still attached, connected and on the active step
pub type Liveness<'a> = &'a (dyn Fn() -> bool + Send + Sync);

struct InitGuard<'a>(&'a AtomicBool);

impl Drop for InitGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

fn same_target(a: &Arc<dyn MountTarget>, b: &Arc<dyn MountTarget>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

pub struct StepLifecycle<B: StepBinding> {
    binding: B,
    store: WizardStore,
    options: LifecycleOptions,
    target: Mutex<Option<Arc<dyn MountTarget>>>,
    initializing: AtomicBool,
}

impl<B: StepBinding> StepLifecycle<B> {
    pub fn new(binding: B, store: WizardStore, options: LifecycleOptions) -> Self {
        Self {
            binding,
            store,
            options,
            target: Mutex::new(None),
            initializing: AtomicBool::new(false),
        }
    }

    pub fn binding(&self) -> &B {
        &self.binding
    }

    pub fn step(&self) -> StepId {
        self.binding.step()
    }

    /// Point the lifecycle at a (possibly not yet laid out) mount target
    pub fn attach(&self, target: Option<Arc<dyn MountTarget>>) {
        *self.target.lock().unwrap_or_else(PoisonError::into_inner) = target;
    }

    fn target(&self) -> Option<Arc<dyn MountTarget>> {
        self.target
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_initializing(&self) -> bool {
        self.initializing.load(Ordering::SeqCst)
    }

    /// Make sure the step has exactly one live handle.
    ///
    /// Never returns an error: failures are written to the store and
    /// reported as [`InitOutcome::Failed`].
    pub async fn ensure(&self) -> InitOutcome {
        if self.initializing.swap(true, Ordering::SeqCst) {
            log::debug!("{:?}: initialization already in flight", self.step());
            return InitOutcome::Busy;
        }
        let _guard = InitGuard(&self.initializing);

        match self.run().await {
            Ok(outcome) => {
                log::debug!("{:?}: {:?}", self.step(), outcome);
                outcome
            }
            Err(e) => {
                let message = format!("Could not open {}: {}", self.binding.describe(), e);
                log::error!("{message}");
                self.store.dispatch(Action::SetError(Some(message.clone())));
                InitOutcome::Failed(message)
            }
        }
    }

    async fn run(&self) -> Result<InitOutcome> {
        let step = self.step();
        let (active, upstream_ready) = self.store.read(|s| {
            (
                s.current_step() == step,
                self.binding.upstream_ready(s),
            )
        });
        if !active {
            return Ok(InitOutcome::Inactive);
        }
        if !upstream_ready {
            return Ok(InitOutcome::Skipped);
        }

        let Some(target) = self.wait_until_ready().await else {
            log::debug!("{:?}: mount target never became ready", step);
            return Ok(InitOutcome::NotReady);
        };

        if self.store.read(|s| self.binding.handle(s)).is_some() {
            if target.child_count() > 0 {
                return Ok(InitOutcome::Reused);
            }
            log::info!("{:?}: mount target was remounted empty, recreating", step);
            self.store.dispatch(self.binding.store_handle(None));
        }

        self.store.dispatch(Action::SetLoading(true));
        let result = self.build(&target).await;
        self.store.dispatch(Action::SetLoading(false));
        result
    }

    async fn build(&self, target: &Arc<dyn MountTarget>) -> Result<InitOutcome> {
        let live = || self.is_current(target);
        let Some(artifact) = self.binding.prepare(&self.store, &live).await? else {
            return Ok(InitOutcome::Stale);
        };
        if !self.is_current(target) {
            return Ok(InitOutcome::Stale);
        }

        target.clear_children();
        self.stabilize(target.as_ref()).await;
        if !self.is_current(target) {
            return Ok(InitOutcome::Stale);
        }

        let handle = self.create_with_retry(target, &artifact).await?;

        if !self.is_current(target) {
            log::info!("{:?}: step left during creation, discarding handle", self.step());
            if let Err(e) = self.binding.destroy(handle).await {
                log::warn!("{:?}: failed to destroy discarded handle: {}", self.step(), e);
            }
            return Ok(InitOutcome::Stale);
        }

        self.store.dispatch(self.binding.store_handle(Some(handle)));
        Ok(InitOutcome::Created)
    }

    /// Poll until the target is attached, connected and has a non-zero size
    async fn wait_until_ready(&self) -> Option<Arc<dyn MountTarget>> {
        let mut saw_zero_size = false;
        for attempt in 0..self.options.readiness_attempts {
            if let Some(target) = self.target() {
                if target.is_connected() {
                    if !target.size().is_empty() {
                        return Some(target);
                    }
                    saw_zero_size = true;
                }
            }
            log::trace!("{:?}: mount target not ready (attempt {})", self.step(), attempt + 1);
            tokio::time::sleep(self.options.readiness_interval()).await;
        }

        if saw_zero_size {
            tokio::time::sleep(self.options.zero_size_settle()).await;
            if let Some(target) = self.target() {
                if target.is_connected() && !target.size().is_empty() {
                    return Some(target);
                }
            }
        }
        None
    }

    async fn stabilize(&self, target: &dyn MountTarget) {
        if target.id().is_none() {
            target.set_id(&format!("{}-mount", self.step().slug()));
        }
        target.stabilize();
        for _ in 0..self.options.frame_ticks {
            target.next_frame().await;
        }
        tokio::time::sleep(self.options.settle_delay()).await;
    }

    async fn create_with_retry(
        &self,
        target: &Arc<dyn MountTarget>,
        artifact: &B::Artifact,
    ) -> Result<B::Handle> {
        match self.binding.create(target, artifact).await {
            Ok(handle) => Ok(handle),
            Err(first) => {
                log::warn!(
                    "{:?}: creation failed, retrying once: {}",
                    self.step(),
                    first
                );
                tokio::time::sleep(self.options.retry_backoff()).await;
                if !target.is_connected() {
                    return Err(first);
                }
                self.binding.create(target, artifact).await
            }
        }
    }

    /// Connected, still the attached target, and the step is still active
    fn is_current(&self, target: &Arc<dyn MountTarget>) -> bool {
        if !target.is_connected() {
            return false;
        }
        let attached = self
            .target()
            .is_some_and(|current| same_target(&current, target));
        attached && self.store.read(|s| s.current_step() == self.step())
    }

    /// Destroy the step's handle, if any. Destroy errors are logged only.
    pub async fn teardown(&self) {
        let Some(handle) = self.store.read(|s| self.binding.handle(s)) else {
            return;
        };
        if let Err(e) = self.binding.destroy(handle).await {
            log::warn!("{:?}: teardown failed: {}", self.step(), e);
        }
        self.store.dispatch(self.binding.store_handle(None));
    }
}
