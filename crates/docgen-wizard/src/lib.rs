pub mod catalog;
pub mod data;
pub mod lifecycle;
pub mod navigation;
mod options;
pub mod services;
mod state;
mod steps;
mod store;
mod types;
mod wizard;

pub use catalog::BundledCatalog;
pub use data::{DataEntry, DataPayload, Delimiter};
pub use lifecycle::{InitOutcome, Liveness, StepBinding, StepLifecycle};
pub use navigation::{Focus, Key, KeyInput};
pub use options::LifecycleOptions;
pub use state::{Action, WizardState, reduce};
pub use steps::{StepDescriptor, StepId, default_steps};
pub use store::WizardStore;
pub use types::*;
pub use wizard::{Services, Wizard};
