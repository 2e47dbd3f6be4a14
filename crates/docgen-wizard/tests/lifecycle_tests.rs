mod common;

use async_trait::async_trait;
use common::FakeTarget;
use docgen_wizard::services::*;
use docgen_wizard::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::{Instant, sleep};

struct CountingEditor;

#[async_trait]
impl DocumentEditor for CountingEditor {
    async fn destroy(&self) -> Result<()> {
        Ok(())
    }
}

/// Binds the template-editor slot and counts every SDK call
#[derive(Default)]
struct CountingBinding {
    creations: AtomicUsize,
    attempts: AtomicUsize,
    destroys: AtomicUsize,
    failures: AtomicUsize,
    fail_destroy: bool,
    create_delay: Duration,
    /// Disconnected between the awaits of `prepare`
    detach_in_prepare: Option<Arc<FakeTarget>>,
}

#[async_trait]
impl StepBinding for CountingBinding {
    type Handle = Arc<dyn DocumentEditor>;
    type Artifact = ();

    fn step(&self) -> StepId {
        StepId::EditTemplate
    }

    fn describe(&self) -> &'static str {
        "the counting editor"
    }

    fn handle(&self, state: &WizardState) -> Option<Self::Handle> {
        state.template_editor.clone()
    }

    fn store_handle(&self, handle: Option<Self::Handle>) -> Action {
        Action::SetTemplateEditor(handle)
    }

    fn upstream_ready(&self, state: &WizardState) -> bool {
        state.template.is_some()
    }

    async fn prepare(&self, _store: &WizardStore, live: Liveness<'_>) -> Result<Option<()>> {
        if let Some(target) = &self.detach_in_prepare {
            target.set_connected(false);
        }
        tokio::task::yield_now().await;
        Ok(live().then_some(()))
    }

    async fn create(&self, _target: &Arc<dyn MountTarget>, _artifact: &()) -> Result<Self::Handle> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        sleep(self.create_delay).await;
        let failed = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(WizardError::sdk("mount target not stable"));
        }
        self.creations.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(CountingEditor))
    }

    async fn destroy(&self, _handle: Self::Handle) -> Result<()> {
        self.destroys.fetch_add(1, Ordering::SeqCst);
        if self.fail_destroy {
            return Err(WizardError::sdk("already gone"));
        }
        Ok(())
    }
}

struct Fixture {
    lifecycle: Arc<StepLifecycle<CountingBinding>>,
    store: WizardStore,
    target: Arc<FakeTarget>,
}

fn fixture(binding: CountingBinding) -> Fixture {
    let store = WizardStore::new();
    store.dispatch(Action::SelectTemplate(TemplateId::Invoice));
    store.dispatch(Action::GoTo(StepId::EditTemplate.index()));

    let target = FakeTarget::ready("edit-template");
    let lifecycle = Arc::new(StepLifecycle::new(
        binding,
        store.clone(),
        LifecycleOptions::default(),
    ));
    lifecycle.attach(Some(target.clone() as Arc<dyn MountTarget>));
    Fixture {
        lifecycle,
        store,
        target,
    }
}

#[tokio::test(start_paused = true)]
async fn test_second_ensure_reuses_handle() {
    let f = fixture(CountingBinding::default());

    assert_eq!(f.lifecycle.ensure().await, InitOutcome::Created);
    // The SDK would have rendered into the target
    f.target.fill();
    assert_eq!(f.lifecycle.ensure().await, InitOutcome::Reused);

    assert_eq!(f.lifecycle.binding().creations.load(Ordering::SeqCst), 1);
    assert!(f.target.stabilized.load(Ordering::SeqCst));
    assert!(!f.store.read(|s| s.loading));
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_ensure_is_rejected() {
    let f = fixture(CountingBinding {
        create_delay: Duration::from_millis(300),
        ..Default::default()
    });

    let (first, second) = tokio::join!(f.lifecycle.ensure(), f.lifecycle.ensure());
    let mut outcomes = [first, second];
    outcomes.sort_by_key(|o| o == &InitOutcome::Busy);
    assert_eq!(outcomes, [InitOutcome::Created, InitOutcome::Busy]);
    assert_eq!(f.lifecycle.binding().attempts.load(Ordering::SeqCst), 1);
    assert!(!f.lifecycle.is_initializing());
}

#[tokio::test(start_paused = true)]
async fn test_missing_upstream_skips_without_creation() {
    let f = fixture(CountingBinding::default());
    f.store.dispatch(Action::Reset);
    f.store.dispatch(Action::GoTo(StepId::EditTemplate.index()));

    assert_eq!(f.lifecycle.ensure().await, InitOutcome::Skipped);
    assert_eq!(f.lifecycle.binding().attempts.load(Ordering::SeqCst), 0);
    assert!(!f.store.read(|s| s.loading));
}

#[tokio::test(start_paused = true)]
async fn test_inactive_step_does_nothing() {
    let f = fixture(CountingBinding::default());
    f.store.dispatch(Action::GoTo(0));

    assert_eq!(f.lifecycle.ensure().await, InitOutcome::Inactive);
    assert_eq!(f.lifecycle.binding().attempts.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_detached_target_gives_up_after_polling() {
    let f = fixture(CountingBinding::default());
    f.target.set_connected(false);
    let start = Instant::now();

    assert_eq!(f.lifecycle.ensure().await, InitOutcome::NotReady);
    assert!(start.elapsed() >= Duration::from_millis(2000));
    assert_eq!(f.lifecycle.binding().attempts.load(Ordering::SeqCst), 0);
    // Not ready is silent
    assert!(f.store.read(|s| s.error.is_none()));
}

#[tokio::test(start_paused = true)]
async fn test_zero_size_target_gets_extra_settle() {
    let f = fixture(CountingBinding::default());
    f.target.set_size(0.0, 0.0);

    let target = f.target.clone();
    tokio::spawn(async move {
        sleep(Duration::from_millis(2100)).await;
        target.set_size(640.0, 480.0);
    });

    assert_eq!(f.lifecycle.ensure().await, InitOutcome::Created);
}

#[tokio::test(start_paused = true)]
async fn test_zero_size_target_never_laid_out() {
    let f = fixture(CountingBinding::default());
    f.target.set_size(0.0, 0.0);
    let start = Instant::now();

    assert_eq!(f.lifecycle.ensure().await, InitOutcome::NotReady);
    assert!(start.elapsed() >= Duration::from_millis(2200));
}

#[tokio::test(start_paused = true)]
async fn test_retry_is_bounded_to_one() {
    let f = fixture(CountingBinding {
        failures: AtomicUsize::new(5),
        ..Default::default()
    });

    let outcome = f.lifecycle.ensure().await;
    assert!(matches!(outcome, InitOutcome::Failed(_)), "{outcome:?}");
    assert_eq!(f.lifecycle.binding().attempts.load(Ordering::SeqCst), 2);

    let error = f.store.read(|s| s.error.clone()).unwrap();
    assert!(error.starts_with("Could not open the counting editor"), "{error}");
    assert!(f.store.read(|s| s.template_editor.is_none()));
    assert!(!f.lifecycle.is_initializing());
}

#[tokio::test(start_paused = true)]
async fn test_leaving_step_discards_new_handle() {
    let f = fixture(CountingBinding {
        create_delay: Duration::from_secs(1),
        ..Default::default()
    });

    let store = f.store.clone();
    let (outcome, _) = tokio::join!(f.lifecycle.ensure(), async move {
        sleep(Duration::from_millis(200)).await;
        store.dispatch(Action::GoTo(StepId::FillData.index()));
    });

    assert_eq!(outcome, InitOutcome::Stale);
    assert_eq!(f.lifecycle.binding().creations.load(Ordering::SeqCst), 1);
    assert_eq!(f.lifecycle.binding().destroys.load(Ordering::SeqCst), 1);
    assert!(f.store.read(|s| s.template_editor.is_none()));
    assert!(!f.store.read(|s| s.loading));
}

#[tokio::test(start_paused = true)]
async fn test_reattached_target_discards_new_handle() {
    let f = fixture(CountingBinding {
        create_delay: Duration::from_secs(1),
        ..Default::default()
    });

    let lifecycle = f.lifecycle.clone();
    let (outcome, _) = tokio::join!(f.lifecycle.ensure(), async move {
        sleep(Duration::from_millis(200)).await;
        lifecycle.attach(Some(FakeTarget::ready("edit-template") as Arc<dyn MountTarget>));
    });

    assert_eq!(outcome, InitOutcome::Stale);
    assert!(f.store.read(|s| s.template_editor.is_none()));
}

#[tokio::test(start_paused = true)]
async fn test_empty_target_recreates() {
    let f = fixture(CountingBinding::default());
    assert_eq!(f.lifecycle.ensure().await, InitOutcome::Created);

    // Remounted without the SDK's children
    f.target.empty();
    assert_eq!(f.lifecycle.ensure().await, InitOutcome::Created);
    assert_eq!(f.lifecycle.binding().creations.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_teardown_swallows_destroy_errors() {
    let f = fixture(CountingBinding {
        fail_destroy: true,
        ..Default::default()
    });
    assert_eq!(f.lifecycle.ensure().await, InitOutcome::Created);

    f.lifecycle.teardown().await;
    assert_eq!(f.lifecycle.binding().destroys.load(Ordering::SeqCst), 1);
    assert!(f.store.read(|s| s.template_editor.is_none()));

    // Nothing left to destroy
    f.lifecycle.teardown().await;
    assert_eq!(f.lifecycle.binding().destroys.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_unnamed_target_gets_stable_id() {
    let f = fixture(CountingBinding::default());
    let target = FakeTarget::ready("placeholder");
    target.clear_id();
    f.lifecycle.attach(Some(target.clone() as Arc<dyn MountTarget>));

    assert_eq!(f.lifecycle.ensure().await, InitOutcome::Created);
    assert_eq!(target.id().as_deref(), Some("edit-template-mount"));
}

#[tokio::test(start_paused = true)]
async fn test_target_detached_while_preparing_is_stale() {
    let target = FakeTarget::ready("edit-template");
    let f = fixture(CountingBinding {
        detach_in_prepare: Some(target.clone()),
        ..Default::default()
    });
    f.lifecycle.attach(Some(target.clone() as Arc<dyn MountTarget>));

    assert_eq!(f.lifecycle.ensure().await, InitOutcome::Stale);
    assert_eq!(f.lifecycle.binding().attempts.load(Ordering::SeqCst), 0);
    assert!(!target.stabilized.load(Ordering::SeqCst));
    assert!(f.store.read(|s| s.template_editor.is_none() && !s.loading));
}
