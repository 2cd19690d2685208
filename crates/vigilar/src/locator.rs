//! Locator abstraction for element selection.
//!
//! A [`Locator`] names zero or more UI elements through a [`Selector`] (CSS or
//! XPath). There is no uniqueness requirement: callers expect at most one
//! meaningful match, and the layer operates on the first match when several
//! exist. State queries are rendered as JavaScript expressions and evaluated
//! in the page, so CSS and XPath selectors go through one code path.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default timeout for waits (10 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Secondary timeout used by the diagnostic sub-routine (2 seconds)
pub const DIAGNOSE_TIMEOUT_SECS: u64 = 2;

/// Default polling interval while waiting (100ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// CSS selector (e.g., `button[type='submit']`)
    Css(String),
    /// XPath selector (e.g., `//button[text()='Sign In']`)
    XPath(String),
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create an XPath selector
    #[must_use]
    pub fn xpath(selector: impl Into<String>) -> Self {
        Self::XPath(selector.into())
    }

    /// Detect the selector flavor from the raw string.
    ///
    /// Locator tables mix CSS and XPath; anything that starts with `/`, `//`
    /// or `(` is treated as XPath, the rest as CSS.
    #[must_use]
    pub fn auto(selector: impl Into<String>) -> Self {
        let s = selector.into();
        if s.starts_with('/') || s.starts_with("(/") {
            Self::XPath(s)
        } else {
            Self::Css(s)
        }
    }

    /// The raw selector text, for error messages
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Css(s) | Self::XPath(s) => s,
        }
    }

    /// JavaScript expression resolving to the first match (or null)
    #[must_use]
    pub fn to_query(&self) -> String {
        match self {
            Self::Css(s) => format!("document.querySelector({s:?})"),
            Self::XPath(s) => format!(
                "document.evaluate({s:?}, document, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue"
            ),
        }
    }

    /// JavaScript expression resolving to the match count
    #[must_use]
    pub fn to_count_query(&self) -> String {
        match self {
            Self::Css(s) => format!("document.querySelectorAll({s:?}).length"),
            Self::XPath(s) => format!(
                "document.evaluate({s:?}, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null).snapshotLength"
            ),
        }
    }

    /// JavaScript expression: is the first match visible?
    ///
    /// Returns `null` when there is no match, otherwise a boolean combining
    /// box size and computed style (the same definition the original UI
    /// library applies before allowing an interaction).
    #[must_use]
    pub fn to_visibility_query(&self) -> String {
        format!(
            "(() => {{ const el = {q}; if (!el) return null; \
             const r = el.getBoundingClientRect(); const s = window.getComputedStyle(el); \
             return r.width > 0 && r.height > 0 && s.display !== 'none' && s.visibility !== 'hidden'; }})()",
            q = self.to_query()
        )
    }

    /// JavaScript expression: is the first match enabled/interactable?
    #[must_use]
    pub fn to_enabled_query(&self) -> String {
        format!(
            "(() => {{ const el = {q}; if (!el) return null; \
             return !el.disabled && !el.hasAttribute('readonly') && el.getAttribute('aria-disabled') !== 'true'; }})()",
            q = self.to_query()
        )
    }

    /// JavaScript expression resolving to the first match's bounding box
    /// as `{x, y, width, height}`, or null when there is no match.
    #[must_use]
    pub fn to_bounding_box_query(&self) -> String {
        format!(
            "(() => {{ const el = {q}; if (!el) return null; \
             const r = el.getBoundingClientRect(); \
             return {{x: r.x, y: r.y, width: r.width, height: r.height}}; }})()",
            q = self.to_query()
        )
    }

    /// JavaScript expression probing what occupies the element's center point.
    ///
    /// Resolves to `"target"` when the hit-test returns the element itself (or
    /// a node inside it), `"other"` for a different element, `"none"` when the
    /// hit-test returns nothing, and null when the selector has no match.
    #[must_use]
    pub fn to_hit_test_query(&self) -> String {
        format!(
            "(() => {{ const el = {q}; if (!el) return null; \
             const r = el.getBoundingClientRect(); \
             const hit = document.elementFromPoint(r.x + r.width / 2, r.y + r.height / 2); \
             if (!hit) return 'none'; \
             return el === hit || el.contains(hit) || hit.contains(el) ? 'target' : 'other'; }})()",
            q = self.to_query()
        )
    }

    /// JavaScript expression reading an attribute of the first match
    #[must_use]
    pub fn to_attribute_query(&self, name: &str) -> String {
        format!(
            "(() => {{ const el = {q}; return el ? el.getAttribute({name:?}) : null; }})()",
            q = self.to_query()
        )
    }

    /// JavaScript expression reading the text content of the first match
    #[must_use]
    pub fn to_text_query(&self) -> String {
        format!(
            "(() => {{ const el = {q}; return el ? el.textContent : null; }})()",
            q = self.to_query()
        )
    }

    /// JavaScript expression collecting an attribute across all matches
    #[must_use]
    pub fn to_attribute_all_query(&self, name: &str) -> String {
        match self {
            Self::Css(s) => format!(
                "Array.from(document.querySelectorAll({s:?})).map(el => el.getAttribute({name:?}))"
            ),
            Self::XPath(s) => format!(
                "(() => {{ const snap = document.evaluate({s:?}, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); \
                 const out = []; for (let i = 0; i < snap.snapshotLength; i++) out.push(snap.snapshotItem(i).getAttribute({name:?})); \
                 return out; }})()"
            ),
        }
    }

    /// JavaScript expression collecting text content across all matches
    #[must_use]
    pub fn to_text_all_query(&self) -> String {
        match self {
            Self::Css(s) => {
                format!("Array.from(document.querySelectorAll({s:?})).map(el => el.textContent)")
            }
            Self::XPath(s) => format!(
                "(() => {{ const snap = document.evaluate({s:?}, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); \
                 const out = []; for (let i = 0; i < snap.snapshotLength; i++) out.push(snap.snapshotItem(i).textContent); \
                 return out; }})()"
            ),
        }
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wait options for a locator
#[derive(Debug, Clone)]
pub struct WaitOptions {
    /// Timeout for the primary wait
    pub timeout: Duration,
    /// Polling interval
    pub poll_interval: Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

/// A locator: selector plus wait options
#[derive(Debug, Clone)]
pub struct Locator {
    selector: Selector,
    options: WaitOptions,
}

impl Locator {
    /// Create a locator, auto-detecting CSS vs XPath
    #[must_use]
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: Selector::auto(selector),
            options: WaitOptions::default(),
        }
    }

    /// Create a locator from an explicit selector
    #[must_use]
    pub fn from_selector(selector: Selector) -> Self {
        Self {
            selector,
            options: WaitOptions::default(),
        }
    }

    /// Override the wait timeout (seconds)
    #[must_use]
    pub const fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.options.timeout = Duration::from_secs(secs);
        self
    }

    /// Override the wait timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = timeout;
        self
    }

    /// Get the selector
    #[must_use]
    pub const fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Get the wait options
    #[must_use]
    pub const fn options(&self) -> &WaitOptions {
        &self.options
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.selector.as_str())
    }
}

/// A point in page coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl Point {
    /// Create a new point
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Bounding box of an element
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// X position
    pub x: f64,
    /// Y position
    pub y: f64,
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
}

impl BoundingBox {
    /// Center point, where a click would land
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}
