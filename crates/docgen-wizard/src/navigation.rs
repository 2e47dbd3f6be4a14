//! Guarded step transitions.
//!
//! Every transition here is synchronous against the store. Work that has to
//! finish before advancing (validating data, exporting a document) is awaited
//! by the caller before calling in.

use crate::state::{Action, WizardState};
use crate::store::WizardStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    Other,
}

/// Where keyboard focus was when the key was pressed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    TextInput,
    CodeEditor,
    Elsewhere,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInput {
    pub key: Key,
    pub focus: Focus,
}

impl KeyInput {
    pub fn new(key: Key, focus: Focus) -> Self {
        Self { key, focus }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavIntent {
    Next,
    Previous,
}

/// Arrow keys map to next/previous unless focus is inside an editable field
pub fn intent_for_key(input: KeyInput) -> Option<NavIntent> {
    if input.focus != Focus::Elsewhere {
        return None;
    }
    match input.key {
        Key::ArrowRight => Some(NavIntent::Next),
        Key::ArrowLeft => Some(NavIntent::Previous),
        Key::Other => None,
    }
}

/// `blocked` carries step-local vetoes such as an invalid data payload.
pub fn can_go_next(state: &WizardState, blocked: bool) -> bool {
    !blocked
        && !state.loading
        && state.error.is_none()
        && !state.is_last_step()
        && state.is_step_complete(state.current_step())
}

pub fn can_go_previous(state: &WizardState) -> bool {
    !state.loading && state.error.is_none() && !state.is_first_step()
}

pub fn can_go_to(state: &WizardState, index: usize) -> bool {
    !state.loading && state.error.is_none() && index < state.steps.len()
}

pub fn next(store: &WizardStore, blocked: bool) -> bool {
    if !store.read(|s| can_go_next(s, blocked)) {
        log::debug!("next ignored: guard failed");
        return false;
    }
    store.dispatch(Action::Next);
    true
}

pub fn previous(store: &WizardStore) -> bool {
    if !store.read(can_go_previous) {
        log::debug!("previous ignored: guard failed");
        return false;
    }
    store.dispatch(Action::Previous);
    true
}

pub fn go_to(store: &WizardStore, index: usize) -> bool {
    if !store.read(|s| can_go_to(s, index)) {
        log::debug!("go_to({index}) ignored: guard failed");
        return false;
    }
    store.dispatch(Action::GoTo(index));
    true
}
