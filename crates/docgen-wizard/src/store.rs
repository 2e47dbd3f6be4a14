use crate::state::{Action, WizardState, reduce};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Shared handle to the wizard state.
///
/// All writes go through [`WizardStore::dispatch`]; reads borrow the state
/// for the duration of a closure and never across a suspension point.
#[derive(Clone, Default)]
pub struct WizardStore {
    inner: Arc<Mutex<WizardState>>,
}

impl WizardStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, WizardState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn dispatch(&self, action: Action) {
        log::debug!("dispatch {:?}", action);
        reduce(&mut self.lock(), action);
    }

    pub fn read<R>(&self, f: impl FnOnce(&WizardState) -> R) -> R {
        f(&self.lock())
    }

    pub fn snapshot(&self) -> WizardState {
        self.lock().clone()
    }
}
