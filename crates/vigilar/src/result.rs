//! Result and error types for Vigilar.
//!
//! The element-resolution layer raises the most specific classification it
//! can determine; a generic [`VigilarError::Timeout`] is the fallback, never
//! the first choice. Every element-level variant carries the locator text and
//! page context (URL, title, match count) so a failing test is diagnosable
//! from the error alone.

use thiserror::Error;

/// Result type for Vigilar operations
pub type VigilarResult<T> = Result<T, VigilarError>;

/// Errors that can occur while driving the browser
#[derive(Debug, Error)]
pub enum VigilarError {
    /// Element not found in the DOM
    #[error(
        "element not found in DOM\n  locator: {locator}\n  url: {url}\n  page title: {title}"
    )]
    NotFound {
        /// Locator text
        locator: String,
        /// Current page URL
        url: String,
        /// Current page title
        title: String,
    },

    /// Element reference no longer corresponds to a live DOM node
    #[error("stale element reference\n  locator: {locator}\n  url: {url}\n  detail: {detail}")]
    Stale {
        /// Locator text
        locator: String,
        /// Current page URL
        url: String,
        /// What made the reference stale (navigation, DOM replacement, re-render)
        detail: String,
    },

    /// Element found in the DOM but not visible
    #[error(
        "element found in DOM but not visible\n  locator: {locator}\n  url: {url}\n  matches: {matches}\n  likely: zero-size box, display:none, hidden ancestor, or occlusion"
    )]
    NotVisible {
        /// Locator text
        locator: String,
        /// Current page URL
        url: String,
        /// Number of matching elements
        matches: usize,
    },

    /// Element visible but not interactable
    #[error(
        "element visible but not interactable\n  locator: {locator}\n  url: {url}\n  likely: disabled/readonly attribute, or scripts have not initialized it yet"
    )]
    NotInteractable {
        /// Locator text
        locator: String,
        /// Current page URL
        url: String,
    },

    /// Another element occupies the click point
    #[error(
        "click intercepted by another element\n  locator: {locator}\n  url: {url}\n  detail: {detail}\n  likely: modal/overlay, loading spinner, or fixed header covering the target"
    )]
    ClickIntercepted {
        /// Locator text
        locator: String,
        /// Current page URL
        url: String,
        /// Diagnostic detail
        detail: String,
    },

    /// Locator syntax rejected by the query engine
    #[error("invalid selector syntax\n  locator: {locator}\n  detail: {detail}")]
    InvalidSelector {
        /// Locator text
        locator: String,
        /// Parser error detail
        detail: String,
    },

    /// Wait deadline elapsed without a more specific diagnosis
    #[error(
        "timed out after {elapsed_ms}ms waiting for element\n  locator: {locator}\n  url: {url}"
    )]
    Timeout {
        /// Locator text
        locator: String,
        /// Current page URL
        url: String,
        /// Elapsed wait in milliseconds
        elapsed_ms: u64,
    },

    /// Browser executable not found or failed to start
    #[error("failed to launch browser: {message}")]
    BrowserLaunch {
        /// Error message
        message: String,
    },

    /// Page-level automation error (evaluation, query, action)
    #[error("page error: {message}")]
    Page {
        /// Error message
        message: String,
    },

    /// Navigation failed
    #[error("navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// A flow-level assertion failed (expected UI state not observed)
    #[error("assertion failed: {message}")]
    Assertion {
        /// Error message
        message: String,
    },

    /// Configuration could not be loaded or is incomplete
    #[error("configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Download did not complete or produced no file
    #[error("download failed: {message}")]
    Download {
        /// Error message
        message: String,
    },

    /// Anything the layer could not classify, with full context
    #[error("unexpected automation error\n  locator: {locator}\n  url: {url}\n  detail: {message}")]
    Unexpected {
        /// Locator text
        locator: String,
        /// Current page URL
        url: String,
        /// Underlying error text
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Archive error
    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

impl VigilarError {
    /// Whether this error is one of the element-resolution classifications
    /// (as opposed to infrastructure: launch, config, I/O).
    #[must_use]
    pub const fn is_element_diagnosis(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::Stale { .. }
                | Self::NotVisible { .. }
                | Self::NotInteractable { .. }
                | Self::ClickIntercepted { .. }
                | Self::InvalidSelector { .. }
                | Self::Timeout { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message_carries_context() {
        let err = VigilarError::NotFound {
            locator: "#missing".to_string(),
            url: "https://app.dociq.test/extraction".to_string(),
            title: "DocIQ".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("#missing"));
        assert!(text.contains("extraction"));
        assert!(text.contains("DocIQ"));
    }

    #[test]
    fn test_element_diagnosis_classification() {
        let stale = VigilarError::Stale {
            locator: "a".into(),
            url: "b".into(),
            detail: "c".into(),
        };
        assert!(stale.is_element_diagnosis());

        let launch = VigilarError::BrowserLaunch {
            message: "no chromium".into(),
        };
        assert!(!launch.is_element_diagnosis());
    }

    #[test]
    fn test_io_error_converts() {
        fn read() -> VigilarResult<String> {
            Ok(std::fs::read_to_string("/nonexistent/vigilar")?)
        }
        assert!(matches!(read(), Err(VigilarError::Io(_))));
    }
}
