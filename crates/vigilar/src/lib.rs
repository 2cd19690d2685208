//! Vigilar: browser-driven E2E automation for the DocIQ platform.
//!
//! The suite exercises DocIQ's document-processing workflows (bank-statement
//! extraction, classification, redaction, cash-flow analysis) through a real
//! browser, verifying UI state transitions, asynchronous backend processing
//! status, and downloadable output artifacts.
//!
//! # Architecture
//!
//! ```text
//! tests ──► page objects ──► wait / diagnose / status ──► PageDriver ──► browser
//! ```
//!
//! Control flows strictly downward. The two load-bearing layers are:
//!
//! - [`wait`] + [`diagnose`]: element-resolution diagnostics. When an
//!   interaction cannot proceed, classify *why* (absent / stale / invisible /
//!   disabled / covered) instead of surfacing a generic timeout.
//! - [`status`]: the file-processing status poller. Observe a server-side
//!   extraction job through its history row to a terminal state, with
//!   per-state retry budgets and UI-refresh recovery.
//!
//! Everything touches the browser through the [`probe::PageDriver`] seam;
//! enable the `browser` feature for real CDP control via chromiumoxide, or
//! use [`session::MockPage`] to test flows without a browser.

#![warn(missing_docs)]
// Lints are configured in the workspace Cargo.toml [workspace.lints]

/// Suite configuration (base URL, credentials, browser selection)
pub mod config;
/// Element-state classification and the ordered diagnostic sub-routine
pub mod diagnose;
/// Moving, renaming and unpacking downloaded artifacts
pub mod downloads;
/// Locator and selector abstractions
pub mod locator;
/// Selector tables for the DocIQ pages
pub mod locators;
/// Page objects (login, home, statement section)
pub mod pages;
/// Driver trait seams over the automation primitives
pub mod probe;
/// Dashboard and JUnit rendering from a results file
pub mod report;
/// Result and error types
pub mod result;
/// Browser session management (CDP or mock)
pub mod session;
/// File-processing status poller
pub mod status;
/// Per-test-module structured input data
pub mod testdata;
/// Explicit waits with failure classification
pub mod wait;

pub use config::{Credentials, SuiteConfig};
pub use diagnose::{element_state, CheckOutcome, ElementState};
pub use locator::{BoundingBox, Locator, Point, Selector};
pub use pages::{
    ExtractionOption, HistoryEntry, HomePage, LoginPage, RunContext, Section, StatementPage, Tab,
    UploadDetails,
};
pub use probe::{ElementProbe, HitTest, PageContext, PageDriver};
pub use result::{VigilarError, VigilarResult};
pub use session::{Browser, BrowserConfig, BrowserKind, MockElement, MockPage, Page};
pub use status::{FileStatus, PollOutcome, PollPolicy, StatusPoller, StatusSource};
pub use testdata::{CaseData, TestDataFile};
