//! Page objects: business flows over the wait and polling layers.
//!
//! Control flows strictly downward: tests call page objects, page objects
//! call [`crate::wait`] / [`crate::status`], which call the driver. Page
//! objects own no state beyond a borrow of the session page; anything a test
//! needs to pass to a later test travels in [`RunContext`].

mod home;
mod login;
mod statement;

pub use home::{ExtractionOption, HomePage, Section, Tab};
pub use login::LoginPage;
pub use statement::{HistoryEntry, RunContext, StatementPage, UploadDetails};
