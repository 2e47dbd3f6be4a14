//! Text comparison of two documents shown side by side.
//!
//! The comparison primitive answers per page with hunks of
//! `delete`/`insert`/`equal` operations. [`ComparisonSession`] folds them
//! into [`ChangeRecord`]s (a delete directly followed by an insert is one
//! replacement), highlights them in both viewers and navigates between them.
//! [`ViewSync`] keeps the two viewers' scroll and zoom aligned.

pub mod fold;
pub mod replay;
mod session;
mod sync;
mod types;
mod viewer;

pub use fold::{ChangeSet, PlannedChange, plan_operations, plan_page};
pub use replay::{MemoryViewer, RecordedComparison, RecordedPage, ReplayComparator};
pub use session::{ComparisonSession, DEFAULT_PAGE_SPACING};
pub use sync::ViewSync;
pub use types::*;
pub use viewer::{ComparisonViewer, TextComparator, page_offset};
