//! Browser session management.
//!
//! One browser, one page, one sequential thread of control for the whole run.
//! With the `browser` feature enabled this module drives a real
//! chromium-family browser over CDP via chromiumoxide; without it,
//! [`MockPage`] stands in so everything above the driver seam stays unit
//! testable.

use std::str::FromStr;

use crate::result::{VigilarError, VigilarResult};

/// Supported browser engines.
///
/// The run accepts exactly one of these names; anything else is rejected up
/// front rather than silently defaulting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserKind {
    /// Plain Chromium, auto-detected by the CDP layer
    Chromium,
    /// Branded Google Chrome
    Chrome,
    /// Microsoft Edge (chromium-based)
    Edge,
}

impl BrowserKind {
    /// Canonical name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Chromium => "chromium",
            Self::Chrome => "chrome",
            Self::Edge => "edge",
        }
    }

    /// Well-known executable locations for branded builds; chromiumoxide
    /// auto-detects plain chromium on its own.
    #[must_use]
    pub fn executable_candidates(&self) -> &'static [&'static str] {
        match self {
            Self::Chromium => &[],
            Self::Chrome => &[
                "/usr/bin/google-chrome",
                "/usr/bin/google-chrome-stable",
                "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            ],
            Self::Edge => &[
                "/usr/bin/microsoft-edge",
                "/usr/bin/microsoft-edge-stable",
                "/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge",
            ],
        }
    }

    /// First candidate executable that exists on this machine
    #[must_use]
    pub fn resolve_executable(&self) -> Option<String> {
        self.executable_candidates()
            .iter()
            .find(|p| std::path::Path::new(p).exists())
            .map(|p| (*p).to_string())
    }
}

impl FromStr for BrowserKind {
    type Err = VigilarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "chromium" => Ok(Self::Chromium),
            "chrome" => Ok(Self::Chrome),
            "edge" | "msedge" => Ok(Self::Edge),
            other => Err(VigilarError::Config {
                message: format!(
                    "unknown browser {other:?}; expected one of: chromium, chrome, edge"
                ),
            }),
        }
    }
}

impl std::fmt::Display for BrowserKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Browser launch configuration
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Engine to launch
    pub kind: BrowserKind,
    /// Run without a visible window
    pub headless: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Explicit executable path (None = resolve from the kind)
    pub executable: Option<String>,
    /// Sandbox mode (disable for containers/CI)
    pub sandbox: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            kind: BrowserKind::Chromium,
            headless: true,
            viewport_width: 1920,
            viewport_height: 1080,
            executable: None,
            sandbox: true,
        }
    }
}

impl BrowserConfig {
    /// Configuration for a specific engine
    #[must_use]
    pub fn for_kind(kind: BrowserKind) -> Self {
        Self {
            kind,
            executable: kind.resolve_executable(),
            ..Self::default()
        }
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set viewport dimensions
    #[must_use]
    pub const fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Set an explicit executable path
    #[must_use]
    pub fn with_executable(mut self, path: impl Into<String>) -> Self {
        self.executable = Some(path.into());
        self
    }

    /// Disable the sandbox (containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }
}

// ============================================================================
// Real CDP implementation (when the `browser` feature is enabled)
// ============================================================================

#[cfg(feature = "browser")]
mod cdp {
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use async_trait::async_trait;
    use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
    use chromiumoxide::cdp::browser_protocol::dom::SetFileInputFilesParams;
    use chromiumoxide::cdp::browser_protocol::page::{
        CaptureScreenshotFormat, CaptureScreenshotParams, SetDownloadBehaviorBehavior,
        SetDownloadBehaviorParams,
    };
    use chromiumoxide::page::Page as CdpPage;
    use futures::StreamExt;
    use tokio::sync::Mutex;
    use tracing::debug;

    use super::BrowserConfig;
    use crate::locator::Selector;
    use crate::probe::{ElementProbe, HitTest, PageContext, PageDriver};
    use crate::result::{VigilarError, VigilarResult};

    /// How often state queries are re-evaluated while waiting
    const POLL_INTERVAL: Duration = Duration::from_millis(100);

    /// How long a triggered download may take to land on disk
    const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

    /// Browser instance with a live CDP connection
    #[derive(Debug)]
    pub struct Browser {
        config: BrowserConfig,
        inner: Arc<Mutex<CdpBrowser>>,
        #[allow(dead_code)]
        handle: tokio::task::JoinHandle<()>,
    }

    impl Browser {
        /// Launch the configured browser
        pub async fn launch(config: BrowserConfig) -> VigilarResult<Self> {
            let mut builder = CdpConfig::builder()
                .window_size(config.viewport_width, config.viewport_height);

            if !config.headless {
                builder = builder.with_head();
            }

            if !config.sandbox {
                builder = builder.no_sandbox();
            }

            if let Some(ref path) = config.executable {
                builder = builder.chrome_executable(path);
            }

            let cdp_config = builder
                .build()
                .map_err(|e| VigilarError::BrowserLaunch { message: e })?;

            let (browser, mut handler) =
                CdpBrowser::launch(cdp_config)
                    .await
                    .map_err(|e| VigilarError::BrowserLaunch {
                        message: e.to_string(),
                    })?;

            // Drive the CDP event loop for the life of the session
            let handle = tokio::spawn(async move {
                while let Some(h) = handler.next().await {
                    if h.is_err() {
                        break;
                    }
                }
            });

            Ok(Self {
                config,
                inner: Arc::new(Mutex::new(browser)),
                handle,
            })
        }

        /// Create the session's page
        pub async fn page(&self) -> VigilarResult<Page> {
            let browser = self.inner.lock().await;
            let cdp_page =
                browser
                    .new_page("about:blank")
                    .await
                    .map_err(|e| VigilarError::Page {
                        message: e.to_string(),
                    })?;

            Ok(Page {
                inner: Arc::new(Mutex::new(cdp_page)),
            })
        }

        /// The launch configuration
        #[must_use]
        pub const fn config(&self) -> &BrowserConfig {
            &self.config
        }

        /// Close the browser
        pub async fn close(self) -> VigilarResult<()> {
            let mut browser = self.inner.lock().await;
            browser
                .close()
                .await
                .map_err(|e| VigilarError::BrowserLaunch {
                    message: e.to_string(),
                })?;
            Ok(())
        }
    }

    /// A page backed by a live CDP connection
    #[derive(Debug, Clone)]
    pub struct Page {
        inner: Arc<Mutex<CdpPage>>,
    }

    impl Page {
        async fn eval(&self, expr: &str) -> VigilarResult<serde_json::Value> {
            let page = self.inner.lock().await;
            let result = page.evaluate(expr).await.map_err(|e| VigilarError::Page {
                message: e.to_string(),
            })?;
            Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
        }

        async fn poll_until_true(&self, expr: &str, timeout: Duration) -> VigilarResult<bool> {
            let started = Instant::now();
            loop {
                if self.eval(expr).await?.as_bool() == Some(true) {
                    return Ok(true);
                }
                if started.elapsed() >= timeout {
                    return Ok(false);
                }
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        }

        fn js_click(selector: &Selector) -> String {
            format!(
                "(() => {{ const el = {q}; if (!el) return 'missing'; \
                 el.scrollIntoView({{block: 'center'}}); el.click(); return 'ok'; }})()",
                q = selector.to_query()
            )
        }
    }

    #[async_trait]
    impl ElementProbe for Page {
        async fn context(&self) -> PageContext {
            let page = self.inner.lock().await;
            let url = page
                .url()
                .await
                .ok()
                .flatten()
                .unwrap_or_else(|| "about:blank".to_string());
            let title = page.get_title().await.ok().flatten().unwrap_or_default();
            PageContext { url, title }
        }

        async fn count(&self, selector: &Selector) -> VigilarResult<usize> {
            let value = self.eval(&selector.to_count_query()).await?;
            Ok(value.as_u64().unwrap_or(0) as usize)
        }

        async fn wait_attached(
            &self,
            selector: &Selector,
            timeout: Duration,
        ) -> VigilarResult<bool> {
            let expr = format!(
                "(() => {{ const el = {q}; return !!el && el.isConnected; }})()",
                q = selector.to_query()
            );
            self.poll_until_true(&expr, timeout).await
        }

        async fn wait_visible(
            &self,
            selector: &Selector,
            timeout: Duration,
        ) -> VigilarResult<bool> {
            let expr = format!(
                "({q}) === true",
                q = selector.to_visibility_query()
            );
            self.poll_until_true(&expr, timeout).await
        }

        async fn is_visible(&self, selector: &Selector) -> VigilarResult<Option<bool>> {
            Ok(self.eval(&selector.to_visibility_query()).await?.as_bool())
        }

        async fn is_enabled(&self, selector: &Selector) -> VigilarResult<Option<bool>> {
            Ok(self.eval(&selector.to_enabled_query()).await?.as_bool())
        }

        async fn hit_test(&self, selector: &Selector) -> VigilarResult<HitTest> {
            let value = self.eval(&selector.to_hit_test_query()).await?;
            Ok(match value.as_str() {
                Some("target") => HitTest::Target,
                Some("other") => HitTest::Other,
                Some("none") => HitTest::Nothing,
                _ => HitTest::NoMatch,
            })
        }
    }

    #[async_trait]
    impl PageDriver for Page {
        async fn goto(&self, url: &str) -> VigilarResult<()> {
            let page = self.inner.lock().await;
            page.goto(url)
                .await
                .map_err(|e| VigilarError::Navigation {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;
            Ok(())
        }

        async fn wait_for_url_contains(
            &self,
            fragment: &str,
            timeout: Duration,
        ) -> VigilarResult<bool> {
            let started = Instant::now();
            loop {
                if self.context().await.url.contains(fragment) {
                    return Ok(true);
                }
                if started.elapsed() >= timeout {
                    return Ok(false);
                }
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        }

        async fn click(&self, selector: &Selector) -> VigilarResult<()> {
            // CSS selectors get a native trusted click; XPath falls back to a
            // synthesized DOM click, which the application accepts everywhere
            // the suite touches.
            if let Selector::Css(css) = selector {
                let page = self.inner.lock().await;
                if let Ok(element) = page.find_element(css.clone()).await {
                    element.click().await.map_err(|e| VigilarError::Page {
                        message: e.to_string(),
                    })?;
                    return Ok(());
                }
            }
            match self.eval(&Self::js_click(selector)).await?.as_str() {
                Some("ok") => Ok(()),
                _ => Err(VigilarError::Page {
                    message: format!("no such element to click: {selector}"),
                }),
            }
        }

        async fn fill(&self, selector: &Selector, text: &str) -> VigilarResult<()> {
            let expr = format!(
                "(() => {{ const el = {q}; if (!el) return 'missing'; \
                 el.focus(); el.value = {text:?}; \
                 el.dispatchEvent(new Event('input', {{bubbles: true}})); \
                 el.dispatchEvent(new Event('change', {{bubbles: true}})); return 'ok'; }})()",
                q = selector.to_query()
            );
            match self.eval(&expr).await?.as_str() {
                Some("ok") => Ok(()),
                _ => Err(VigilarError::Page {
                    message: format!("no such element to fill: {selector}"),
                }),
            }
        }

        async fn select_value(&self, selector: &Selector, value: &str) -> VigilarResult<()> {
            let expr = format!(
                "(() => {{ const el = {q}; if (!el) return 'missing'; \
                 el.value = {value:?}; \
                 el.dispatchEvent(new Event('change', {{bubbles: true}})); return 'ok'; }})()",
                q = selector.to_query()
            );
            match self.eval(&expr).await?.as_str() {
                Some("ok") => Ok(()),
                _ => Err(VigilarError::Page {
                    message: format!("no such select element: {selector}"),
                }),
            }
        }

        async fn scroll_into_view(&self, selector: &Selector) -> VigilarResult<()> {
            let expr = format!(
                "(() => {{ const el = {q}; if (el) el.scrollIntoView({{block: 'center'}}); return true; }})()",
                q = selector.to_query()
            );
            self.eval(&expr).await?;
            Ok(())
        }

        async fn attribute(
            &self,
            selector: &Selector,
            name: &str,
        ) -> VigilarResult<Option<String>> {
            let value = self.eval(&selector.to_attribute_query(name)).await?;
            Ok(value.as_str().map(str::to_string))
        }

        async fn text(&self, selector: &Selector) -> VigilarResult<Option<String>> {
            let value = self.eval(&selector.to_text_query()).await?;
            Ok(value.as_str().map(str::to_string))
        }

        async fn attribute_all(
            &self,
            selector: &Selector,
            name: &str,
        ) -> VigilarResult<Vec<Option<String>>> {
            let value = self.eval(&selector.to_attribute_all_query(name)).await?;
            Ok(value
                .as_array()
                .map(|items| {
                    items
                        .iter()
                        .map(|v| v.as_str().map(str::to_string))
                        .collect()
                })
                .unwrap_or_default())
        }

        async fn text_all(&self, selector: &Selector) -> VigilarResult<Vec<String>> {
            let value = self.eval(&selector.to_text_all_query()).await?;
            Ok(value
                .as_array()
                .map(|items| {
                    items
                        .iter()
                        .filter_map(|v| v.as_str().map(str::to_string))
                        .collect()
                })
                .unwrap_or_default())
        }

        async fn set_input_files(&self, selector: &Selector, path: &Path) -> VigilarResult<()> {
            let css = match selector {
                Selector::Css(css) => css.clone(),
                Selector::XPath(_) => {
                    return Err(VigilarError::Page {
                        message: "file inputs must be addressed with a CSS selector".to_string(),
                    })
                }
            };
            let page = self.inner.lock().await;
            let element = page
                .find_element(css)
                .await
                .map_err(|e| VigilarError::Page {
                    message: e.to_string(),
                })?;
            let params = SetFileInputFilesParams::builder()
                .files(vec![path.display().to_string()])
                .backend_node_id(element.backend_node_id)
                .build()
                .map_err(|e| VigilarError::Page { message: e })?;
            page.execute(params)
                .await
                .map_err(|e| VigilarError::Page {
                    message: e.to_string(),
                })?;
            Ok(())
        }

        async fn download_via(
            &self,
            selector: &Selector,
            dest_dir: &Path,
        ) -> VigilarResult<PathBuf> {
            std::fs::create_dir_all(dest_dir)?;

            {
                let page = self.inner.lock().await;
                let params = SetDownloadBehaviorParams::builder()
                    .behavior(SetDownloadBehaviorBehavior::Allow)
                    .download_path(dest_dir.display().to_string())
                    .build()
                    .map_err(|e| VigilarError::Page { message: e })?;
                page.execute(params)
                    .await
                    .map_err(|e| VigilarError::Page {
                        message: e.to_string(),
                    })?;
            }

            let before: std::collections::HashSet<PathBuf> = list_files(dest_dir)?;
            self.click(selector).await?;

            // The browser writes `.crdownload` files while transferring; a
            // download counts once a new, fully named file shows up.
            let started = Instant::now();
            loop {
                for path in list_files(dest_dir)? {
                    let partial = path
                        .extension()
                        .is_some_and(|ext| ext.eq_ignore_ascii_case("crdownload"));
                    if !before.contains(&path) && !partial {
                        debug!(path = %path.display(), "download landed");
                        return Ok(path);
                    }
                }
                if started.elapsed() >= DOWNLOAD_TIMEOUT {
                    return Err(VigilarError::Download {
                        message: format!(
                            "no file appeared in {} within {}s",
                            dest_dir.display(),
                            DOWNLOAD_TIMEOUT.as_secs()
                        ),
                    });
                }
                tokio::time::sleep(Duration::from_millis(250)).await;
            }
        }

        async fn screenshot(&self, path: &Path) -> VigilarResult<()> {
            let page = self.inner.lock().await;
            let params = CaptureScreenshotParams::builder()
                .format(CaptureScreenshotFormat::Png)
                .build();
            let shot = page
                .execute(params)
                .await
                .map_err(|e| VigilarError::Page {
                    message: e.to_string(),
                })?;
            use base64::Engine;
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(&shot.data)
                .map_err(|e| VigilarError::Page {
                    message: e.to_string(),
                })?;
            std::fs::write(path, bytes)?;
            Ok(())
        }

        async fn is_checked(&self, selector: &Selector) -> VigilarResult<bool> {
            let expr = format!(
                "(() => {{ const el = {q}; return el ? !!el.checked : false; }})()",
                q = selector.to_query()
            );
            Ok(self.eval(&expr).await?.as_bool().unwrap_or(false))
        }

        async fn evaluate(&self, expr: &str) -> VigilarResult<serde_json::Value> {
            self.eval(expr).await
        }
    }

    fn list_files(dir: &Path) -> VigilarResult<std::collections::HashSet<PathBuf>> {
        let mut out = std::collections::HashSet::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                out.insert(entry.path());
            }
        }
        Ok(out)
    }
}

#[cfg(feature = "browser")]
pub use cdp::{Browser, Page};

// ============================================================================
// Mock implementation (always compiled; the session page without `browser`)
// ============================================================================

mod mock {
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::BrowserConfig;
    use crate::locator::Selector;
    use crate::probe::{ElementProbe, HitTest, PageContext, PageDriver};
    use crate::result::{VigilarError, VigilarResult};

    /// A scriptable element in the mock DOM
    #[derive(Debug, Clone)]
    pub struct MockElement {
        /// How many elements the selector matches
        pub count: usize,
        attached: bool,
        visible: bool,
        enabled: bool,
        covered: bool,
        checked: bool,
        text: String,
        texts: Vec<String>,
        attributes: HashMap<String, String>,
    }

    impl MockElement {
        fn base() -> Self {
            Self {
                count: 1,
                attached: true,
                visible: true,
                enabled: true,
                covered: false,
                checked: false,
                text: String::new(),
                texts: Vec::new(),
                attributes: HashMap::new(),
            }
        }

        /// Attached, visible, enabled, unobstructed
        #[must_use]
        pub fn interactable() -> Self {
            Self::base()
        }

        /// Attached but not visible (display:none and friends)
        #[must_use]
        pub fn hidden() -> Self {
            Self {
                visible: false,
                ..Self::base()
            }
        }

        /// Visible but disabled
        #[must_use]
        pub fn disabled() -> Self {
            Self {
                enabled: false,
                ..Self::base()
            }
        }

        /// Visible and enabled but covered by another element
        #[must_use]
        pub fn covered() -> Self {
            Self {
                covered: true,
                ..Self::base()
            }
        }

        /// Matched but never stably attached (churning DOM)
        #[must_use]
        pub fn detached() -> Self {
            Self {
                attached: false,
                visible: false,
                ..Self::base()
            }
        }

        /// Set an attribute
        #[must_use]
        pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
            self.attributes.insert(name.into(), value.into());
            self
        }

        /// Set the text content
        #[must_use]
        pub fn with_text(mut self, text: impl Into<String>) -> Self {
            self.text = text.into();
            self
        }

        /// Set per-match text contents (for multi-match selectors)
        #[must_use]
        pub fn with_texts(mut self, texts: Vec<String>) -> Self {
            self.count = texts.len();
            self.texts = texts;
            self
        }

        /// Set the match count
        #[must_use]
        pub fn with_count(mut self, count: usize) -> Self {
            self.count = count;
            self
        }

        /// Mark a radio/checkbox as checked
        #[must_use]
        pub fn with_checked(mut self, checked: bool) -> Self {
            self.checked = checked;
            self
        }
    }

    #[derive(Debug, Default)]
    struct MockState {
        url: String,
        title: String,
        elements: HashMap<String, MockElement>,
        query_failures: HashMap<String, String>,
        clicks: HashMap<String, u32>,
        fills: HashMap<String, String>,
        selections: HashMap<String, String>,
        uploads: Vec<(String, PathBuf)>,
        downloads: HashMap<String, (String, Vec<u8>)>,
        visited: Vec<String>,
    }

    /// Mock state is static over time, so timed waits prove nothing by
    /// sleeping longer; they are compressed to this bound.
    const MOCK_WAIT_CAP: Duration = Duration::from_millis(20);

    /// In-memory page with a scriptable DOM, for tests and the no-browser build
    #[derive(Debug, Default)]
    pub struct MockPage {
        state: Mutex<MockState>,
    }

    impl MockPage {
        /// Create a mock page at the given URL/title
        #[must_use]
        pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
            let page = Self::default();
            {
                let mut state = page.state.lock().unwrap();
                state.url = url.into();
                state.title = title.into();
            }
            page
        }

        /// Script an element for a selector
        pub fn insert(&self, selector: &str, element: MockElement) {
            self.state
                .lock()
                .unwrap()
                .elements
                .insert(selector.to_string(), element);
        }

        /// Remove an element
        pub fn remove(&self, selector: &str) {
            self.state.lock().unwrap().elements.remove(selector);
        }

        /// Make every query against the selector fail with the given text
        pub fn fail_queries_with(&self, selector: &str, message: &str) {
            self.state
                .lock()
                .unwrap()
                .query_failures
                .insert(selector.to_string(), message.to_string());
        }

        /// Script the payload a download click produces
        pub fn script_download(&self, selector: &str, filename: &str, contents: Vec<u8>) {
            self.state
                .lock()
                .unwrap()
                .downloads
                .insert(selector.to_string(), (filename.to_string(), contents));
        }

        /// Number of clicks recorded against the selector
        #[must_use]
        pub fn clicks(&self, selector: &str) -> u32 {
            *self
                .state
                .lock()
                .unwrap()
                .clicks
                .get(selector)
                .unwrap_or(&0)
        }

        /// The last text filled into the selector
        #[must_use]
        pub fn filled(&self, selector: &str) -> Option<String> {
            self.state.lock().unwrap().fills.get(selector).cloned()
        }

        /// The last option value selected on the selector
        #[must_use]
        pub fn selected(&self, selector: &str) -> Option<String> {
            self.state
                .lock()
                .unwrap()
                .selections
                .get(selector)
                .cloned()
        }

        /// Files attached to inputs, in order
        #[must_use]
        pub fn uploads(&self) -> Vec<(String, PathBuf)> {
            self.state.lock().unwrap().uploads.clone()
        }

        /// URLs navigated to, in order
        #[must_use]
        pub fn visited(&self) -> Vec<String> {
            self.state.lock().unwrap().visited.clone()
        }

        /// Point the page at a new URL without going through `goto`
        pub fn set_url(&self, url: &str) {
            self.state.lock().unwrap().url = url.to_string();
        }

        fn failure_for(&self, selector: &Selector) -> Option<VigilarError> {
            self.state
                .lock()
                .unwrap()
                .query_failures
                .get(selector.as_str())
                .map(|message| VigilarError::Page {
                    message: message.clone(),
                })
        }

        fn element(&self, selector: &Selector) -> Option<MockElement> {
            self.state
                .lock()
                .unwrap()
                .elements
                .get(selector.as_str())
                .cloned()
        }
    }

    #[async_trait]
    impl ElementProbe for MockPage {
        async fn context(&self) -> PageContext {
            let state = self.state.lock().unwrap();
            PageContext {
                url: state.url.clone(),
                title: state.title.clone(),
            }
        }

        async fn count(&self, selector: &Selector) -> VigilarResult<usize> {
            if let Some(err) = self.failure_for(selector) {
                return Err(err);
            }
            Ok(self.element(selector).map_or(0, |el| el.count))
        }

        async fn wait_attached(
            &self,
            selector: &Selector,
            timeout: Duration,
        ) -> VigilarResult<bool> {
            if let Some(err) = self.failure_for(selector) {
                return Err(err);
            }
            if self.element(selector).is_some_and(|el| el.attached) {
                return Ok(true);
            }
            tokio::time::sleep(timeout.min(MOCK_WAIT_CAP)).await;
            Ok(self.element(selector).is_some_and(|el| el.attached))
        }

        async fn wait_visible(
            &self,
            selector: &Selector,
            timeout: Duration,
        ) -> VigilarResult<bool> {
            if let Some(err) = self.failure_for(selector) {
                return Err(err);
            }
            if self
                .element(selector)
                .is_some_and(|el| el.attached && el.visible)
            {
                return Ok(true);
            }
            tokio::time::sleep(timeout.min(MOCK_WAIT_CAP)).await;
            Ok(self
                .element(selector)
                .is_some_and(|el| el.attached && el.visible))
        }

        async fn is_visible(&self, selector: &Selector) -> VigilarResult<Option<bool>> {
            if let Some(err) = self.failure_for(selector) {
                return Err(err);
            }
            Ok(self.element(selector).map(|el| el.visible))
        }

        async fn is_enabled(&self, selector: &Selector) -> VigilarResult<Option<bool>> {
            if let Some(err) = self.failure_for(selector) {
                return Err(err);
            }
            Ok(self.element(selector).map(|el| el.enabled))
        }

        async fn hit_test(&self, selector: &Selector) -> VigilarResult<HitTest> {
            if let Some(err) = self.failure_for(selector) {
                return Err(err);
            }
            Ok(match self.element(selector) {
                None => HitTest::NoMatch,
                Some(el) if el.covered => HitTest::Other,
                Some(_) => HitTest::Target,
            })
        }
    }

    #[async_trait]
    impl PageDriver for MockPage {
        async fn goto(&self, url: &str) -> VigilarResult<()> {
            let mut state = self.state.lock().unwrap();
            state.url = url.to_string();
            state.visited.push(url.to_string());
            Ok(())
        }

        async fn wait_for_url_contains(
            &self,
            fragment: &str,
            timeout: Duration,
        ) -> VigilarResult<bool> {
            if self.state.lock().unwrap().url.contains(fragment) {
                return Ok(true);
            }
            tokio::time::sleep(timeout.min(MOCK_WAIT_CAP)).await;
            Ok(self.state.lock().unwrap().url.contains(fragment))
        }

        async fn click(&self, selector: &Selector) -> VigilarResult<()> {
            if let Some(err) = self.failure_for(selector) {
                return Err(err);
            }
            if self.element(selector).is_none() {
                return Err(VigilarError::Page {
                    message: format!("no such element to click: {selector}"),
                });
            }
            *self
                .state
                .lock()
                .unwrap()
                .clicks
                .entry(selector.as_str().to_string())
                .or_insert(0) += 1;
            Ok(())
        }

        async fn fill(&self, selector: &Selector, text: &str) -> VigilarResult<()> {
            if self.element(selector).is_none() {
                return Err(VigilarError::Page {
                    message: format!("no such element to fill: {selector}"),
                });
            }
            self.state
                .lock()
                .unwrap()
                .fills
                .insert(selector.as_str().to_string(), text.to_string());
            Ok(())
        }

        async fn select_value(&self, selector: &Selector, value: &str) -> VigilarResult<()> {
            if self.element(selector).is_none() {
                return Err(VigilarError::Page {
                    message: format!("no such select element: {selector}"),
                });
            }
            self.state
                .lock()
                .unwrap()
                .selections
                .insert(selector.as_str().to_string(), value.to_string());
            Ok(())
        }

        async fn scroll_into_view(&self, _selector: &Selector) -> VigilarResult<()> {
            Ok(())
        }

        async fn attribute(
            &self,
            selector: &Selector,
            name: &str,
        ) -> VigilarResult<Option<String>> {
            Ok(self
                .element(selector)
                .and_then(|el| el.attributes.get(name).cloned()))
        }

        async fn text(&self, selector: &Selector) -> VigilarResult<Option<String>> {
            Ok(self.element(selector).map(|el| el.text))
        }

        async fn attribute_all(
            &self,
            selector: &Selector,
            name: &str,
        ) -> VigilarResult<Vec<Option<String>>> {
            Ok(self.element(selector).map_or_else(Vec::new, |el| {
                vec![el.attributes.get(name).cloned(); el.count]
            }))
        }

        async fn text_all(&self, selector: &Selector) -> VigilarResult<Vec<String>> {
            Ok(self.element(selector).map_or_else(Vec::new, |el| {
                if el.texts.is_empty() {
                    vec![el.text; el.count]
                } else {
                    el.texts
                }
            }))
        }

        async fn set_input_files(&self, selector: &Selector, path: &Path) -> VigilarResult<()> {
            if self.element(selector).is_none() {
                return Err(VigilarError::Page {
                    message: format!("no such file input: {selector}"),
                });
            }
            self.state
                .lock()
                .unwrap()
                .uploads
                .push((selector.as_str().to_string(), path.to_path_buf()));
            Ok(())
        }

        async fn download_via(
            &self,
            selector: &Selector,
            dest_dir: &Path,
        ) -> VigilarResult<PathBuf> {
            self.click(selector).await?;
            let scripted = self
                .state
                .lock()
                .unwrap()
                .downloads
                .get(selector.as_str())
                .cloned();
            let (filename, contents) = scripted.ok_or_else(|| VigilarError::Download {
                message: format!("no download scripted for {selector}"),
            })?;
            std::fs::create_dir_all(dest_dir)?;
            let path = dest_dir.join(filename);
            std::fs::write(&path, contents)?;
            Ok(path)
        }

        async fn screenshot(&self, path: &Path) -> VigilarResult<()> {
            std::fs::write(path, b"")?;
            Ok(())
        }

        async fn is_checked(&self, selector: &Selector) -> VigilarResult<bool> {
            Ok(self.element(selector).is_some_and(|el| el.checked))
        }

        async fn evaluate(&self, _expr: &str) -> VigilarResult<serde_json::Value> {
            Ok(serde_json::Value::Null)
        }
    }

    /// Browser stand-in when the `browser` feature is off
    #[derive(Debug)]
    pub struct MockBrowser {
        config: BrowserConfig,
    }

    impl MockBrowser {
        /// "Launch" the mock browser
        pub fn launch(config: BrowserConfig) -> VigilarResult<Self> {
            Ok(Self { config })
        }

        /// Create a mock page
        pub fn page(&self) -> VigilarResult<MockPage> {
            Ok(MockPage::new("about:blank", ""))
        }

        /// The launch configuration
        #[must_use]
        pub const fn config(&self) -> &BrowserConfig {
            &self.config
        }
    }
}

pub use mock::{MockBrowser, MockElement, MockPage};

#[cfg(not(feature = "browser"))]
pub use mock::{MockBrowser as Browser, MockPage as Page};

#[cfg(test)]
mod tests {
    use super::*;

    mod kind_tests {
        use super::*;

        #[test]
        fn test_parse_known_kinds() {
            assert_eq!(
                "chromium".parse::<BrowserKind>().unwrap(),
                BrowserKind::Chromium
            );
            assert_eq!("Chrome".parse::<BrowserKind>().unwrap(), BrowserKind::Chrome);
            assert_eq!("msedge".parse::<BrowserKind>().unwrap(), BrowserKind::Edge);
        }

        #[test]
        fn test_parse_unknown_kind_is_config_error() {
            let err = "netscape".parse::<BrowserKind>().unwrap_err();
            assert!(matches!(err, VigilarError::Config { .. }));
        }

        #[test]
        fn test_display_round_trips() {
            for kind in [BrowserKind::Chromium, BrowserKind::Chrome, BrowserKind::Edge] {
                assert_eq!(kind.as_str().parse::<BrowserKind>().unwrap(), kind);
            }
        }
    }

    mod config_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let config = BrowserConfig::default();
            assert!(config.headless);
            assert!(config.sandbox);
            assert_eq!(config.viewport_width, 1920);
        }

        #[test]
        fn test_builder_chain() {
            let config = BrowserConfig::for_kind(BrowserKind::Chromium)
                .with_headless(false)
                .with_viewport(1280, 720)
                .with_no_sandbox();
            assert!(!config.headless);
            assert!(!config.sandbox);
            assert_eq!(config.viewport_height, 720);
        }
    }

    mod mock_page_tests {
        use super::*;
        use crate::locator::Selector;
        use crate::probe::{ElementProbe, PageDriver};

        #[tokio::test]
        async fn test_count_and_visibility() {
            let page = MockPage::new("https://app.dociq.test", "DocIQ");
            page.insert("#a", MockElement::interactable().with_count(3));
            let sel = Selector::css("#a");
            assert_eq!(page.count(&sel).await.unwrap(), 3);
            assert_eq!(page.is_visible(&sel).await.unwrap(), Some(true));
            assert_eq!(
                page.is_visible(&Selector::css("#nope")).await.unwrap(),
                None
            );
        }

        #[tokio::test]
        async fn test_scripted_failure_surfaces_as_page_error() {
            let page = MockPage::new("https://app.dociq.test", "DocIQ");
            page.fail_queries_with("#bad", "Selector parse error");
            let err = page.count(&Selector::css("#bad")).await.unwrap_err();
            assert!(err.to_string().contains("Selector parse error"));
        }

        #[tokio::test]
        async fn test_fill_and_select_recorded() {
            let page = MockPage::new("https://app.dociq.test", "DocIQ");
            page.insert("#search", MockElement::interactable());
            page.insert("#page-size", MockElement::interactable());
            page.fill(&Selector::css("#search"), "statement.pdf")
                .await
                .unwrap();
            page.select_value(&Selector::css("#page-size"), "100")
                .await
                .unwrap();
            assert_eq!(page.filled("#search").as_deref(), Some("statement.pdf"));
            assert_eq!(page.selected("#page-size").as_deref(), Some("100"));
        }

        #[tokio::test]
        async fn test_scripted_download_writes_file() {
            let dir = tempfile::tempdir().unwrap();
            let page = MockPage::new("https://app.dociq.test", "DocIQ");
            page.insert("#dl", MockElement::interactable());
            page.script_download("#dl", "output.zip", b"PK".to_vec());
            let path = page
                .download_via(&Selector::css("#dl"), dir.path())
                .await
                .unwrap();
            assert!(path.ends_with("output.zip"));
            assert_eq!(std::fs::read(path).unwrap(), b"PK");
        }
    }
}
