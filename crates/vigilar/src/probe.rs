//! Trait seams over the browser automation primitives.
//!
//! [`ElementProbe`] is the narrow surface the diagnostic layer needs; it is
//! implemented by the real CDP page (feature `browser`) and by
//! [`MockPage`](crate::session::MockPage) so the classification logic is unit
//! testable without a browser. [`PageDriver`] extends it with the actions the
//! page objects use.
//!
//! Native waits report timeout as `Ok(false)` rather than an error: a timeout
//! is the expected trigger for diagnosis, not a failure of the probe itself.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;

use crate::locator::Selector;
use crate::result::VigilarResult;

/// Snapshot of page identity, attached to every diagnostic error
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageContext {
    /// Current page URL
    pub url: String,
    /// Current page title
    pub title: String,
}

/// Result of hit-testing the element's center point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTest {
    /// The selector has no match to hit-test
    NoMatch,
    /// `elementFromPoint` returned nothing
    Nothing,
    /// The target element (or a node inside it) occupies the point
    Target,
    /// A different element occupies the point
    Other,
}

impl HitTest {
    /// Whether the outcome means the target would receive the click
    #[must_use]
    pub const fn is_clear(&self) -> bool {
        matches!(self, Self::Target)
    }
}

/// State queries needed by the element-resolution diagnostics
#[async_trait]
pub trait ElementProbe: Send + Sync {
    /// Current page URL and title
    async fn context(&self) -> PageContext;

    /// Number of elements matching the selector
    async fn count(&self, selector: &Selector) -> VigilarResult<usize>;

    /// Wait for the first match to be attached to the DOM.
    /// `Ok(true)` on success, `Ok(false)` on timeout.
    async fn wait_attached(&self, selector: &Selector, timeout: Duration) -> VigilarResult<bool>;

    /// Wait for the first match to be visible.
    /// `Ok(true)` on success, `Ok(false)` on timeout.
    async fn wait_visible(&self, selector: &Selector, timeout: Duration) -> VigilarResult<bool>;

    /// Visibility of the first match; `None` when there is no match
    async fn is_visible(&self, selector: &Selector) -> VigilarResult<Option<bool>>;

    /// Enabled/interactable state of the first match; `None` when no match
    async fn is_enabled(&self, selector: &Selector) -> VigilarResult<Option<bool>>;

    /// What occupies the first match's center point
    async fn hit_test(&self, selector: &Selector) -> VigilarResult<HitTest>;
}

/// Actions and queries used by the page objects
#[async_trait]
pub trait PageDriver: ElementProbe {
    /// Navigate to a URL
    async fn goto(&self, url: &str) -> VigilarResult<()>;

    /// Wait until the page URL contains the fragment.
    /// `Ok(true)` on success, `Ok(false)` on timeout.
    async fn wait_for_url_contains(
        &self,
        fragment: &str,
        timeout: Duration,
    ) -> VigilarResult<bool>;

    /// Click the first match
    async fn click(&self, selector: &Selector) -> VigilarResult<()>;

    /// Replace the value of the first match with the given text
    async fn fill(&self, selector: &Selector, text: &str) -> VigilarResult<()>;

    /// Select a `<select>` option by its value attribute
    async fn select_value(&self, selector: &Selector, value: &str) -> VigilarResult<()>;

    /// Scroll the first match into view
    async fn scroll_into_view(&self, selector: &Selector) -> VigilarResult<()>;

    /// Read an attribute of the first match
    async fn attribute(&self, selector: &Selector, name: &str) -> VigilarResult<Option<String>>;

    /// Read the text content of the first match
    async fn text(&self, selector: &Selector) -> VigilarResult<Option<String>>;

    /// Collect an attribute across all matches
    async fn attribute_all(
        &self,
        selector: &Selector,
        name: &str,
    ) -> VigilarResult<Vec<Option<String>>>;

    /// Collect text content across all matches
    async fn text_all(&self, selector: &Selector) -> VigilarResult<Vec<String>>;

    /// Attach a local file to a file input element
    async fn set_input_files(&self, selector: &Selector, path: &Path) -> VigilarResult<()>;

    /// Click the first match and wait for the resulting download, saving it
    /// under `dest_dir` with the server-suggested filename. Returns the path
    /// the file was saved to.
    async fn download_via(&self, selector: &Selector, dest_dir: &Path) -> VigilarResult<PathBuf>;

    /// Capture a screenshot to the given path
    async fn screenshot(&self, path: &Path) -> VigilarResult<()>;

    /// Whether a radio/checkbox input's first match is currently checked
    async fn is_checked(&self, selector: &Selector) -> VigilarResult<bool>;

    /// Evaluate a JavaScript expression and return its JSON value
    async fn evaluate(&self, expr: &str) -> VigilarResult<serde_json::Value>;
}
