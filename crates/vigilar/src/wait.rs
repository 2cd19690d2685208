//! Explicit waits with failure classification.
//!
//! [`clickable`] and [`present`] wrap the driver's native waits: on success
//! they hand back a [`ReadyElement`] bound to the first match; on timeout they
//! run the diagnostic sub-routine from [`crate::diagnose`] with a short
//! secondary timeout and raise the most specific classification available.
//! Only when every diagnostic step is inconclusive does the caller see a
//! generic [`VigilarError::Timeout`], and even that carries the locator,
//! current URL and elapsed time.

use std::time::{Duration, Instant};

use tracing::warn;

use crate::diagnose::{classify_error_text, diagnose};
use crate::locator::{Locator, DIAGNOSE_TIMEOUT_SECS};
use crate::probe::PageDriver;
use crate::result::{VigilarError, VigilarResult};

/// Wait for the locator's first match to be visible and interaction-ready.
///
/// On timeout the diagnostic sub-routine classifies the root cause; on a
/// non-timeout driver error the error text is inspected for the covered /
/// detached / selector markers.
pub async fn clickable<'d, D: PageDriver + ?Sized>(
    page: &'d D,
    locator: &Locator,
) -> VigilarResult<ReadyElement<'d, D>> {
    let timeout = locator.options().timeout;
    let started = Instant::now();

    match page.wait_visible(locator.selector(), timeout).await {
        Ok(true) => {
            // Visibility alone does not make a click land: gate on the two
            // conditions the click itself would trip over. Inconclusive gate
            // queries pass through (best-effort, same as the diagnostic
            // steps).
            if let Ok(Some(false)) = page.is_enabled(locator.selector()).await {
                let ctx = page.context().await;
                return Err(VigilarError::NotInteractable {
                    locator: locator.to_string(),
                    url: ctx.url,
                });
            }
            match page.hit_test(locator.selector()).await {
                Ok(crate::probe::HitTest::Nothing) => {
                    let ctx = page.context().await;
                    return Err(VigilarError::ClickIntercepted {
                        locator: locator.to_string(),
                        url: ctx.url,
                        detail: "hit-test at the element's center point returned no element"
                            .to_string(),
                    });
                }
                Ok(crate::probe::HitTest::Other) => {
                    let ctx = page.context().await;
                    return Err(VigilarError::ClickIntercepted {
                        locator: locator.to_string(),
                        url: ctx.url,
                        detail: "another element occupies the element's center point".to_string(),
                    });
                }
                _ => {}
            }
            Ok(ReadyElement {
                page,
                locator: locator.clone(),
            })
        }
        Ok(false) => {
            warn!(locator = %locator, timeout_secs = timeout.as_secs(), "timed out waiting for element; diagnosing");
            let secondary = Duration::from_secs(DIAGNOSE_TIMEOUT_SECS);
            if let Some(err) = diagnose(page, locator, secondary).await {
                return Err(err);
            }
            let ctx = page.context().await;
            Err(VigilarError::Timeout {
                locator: locator.to_string(),
                url: ctx.url,
                elapsed_ms: started.elapsed().as_millis() as u64,
            })
        }
        Err(err) => {
            let ctx = page.context().await;
            let text = err.to_string();
            Err(
                classify_error_text(&text, locator, &ctx).unwrap_or(VigilarError::Unexpected {
                    locator: locator.to_string(),
                    url: ctx.url,
                    message: text,
                }),
            )
        }
    }
}

/// Wait for the locator's first match to be attached to the DOM.
///
/// On timeout, a fresh match count distinguishes "genuinely absent" from
/// "present but never stabilized" (reported as a stale reference).
pub async fn present<'d, D: PageDriver + ?Sized>(
    page: &'d D,
    locator: &Locator,
) -> VigilarResult<ReadyElement<'d, D>> {
    let timeout = locator.options().timeout;
    let started = Instant::now();

    match page.wait_attached(locator.selector(), timeout).await {
        Ok(true) => Ok(ReadyElement {
            page,
            locator: locator.clone(),
        }),
        Ok(false) => {
            warn!(locator = %locator, timeout_secs = timeout.as_secs(), "timed out waiting for element in DOM");
            let ctx = page.context().await;
            match page.count(locator.selector()).await {
                Ok(0) => Err(VigilarError::NotFound {
                    locator: locator.to_string(),
                    url: ctx.url,
                    title: ctx.title,
                }),
                Ok(n) => Err(VigilarError::Stale {
                    locator: locator.to_string(),
                    url: ctx.url,
                    detail: format!(
                        "found {n} matching element(s) but they never reached attached state"
                    ),
                }),
                Err(err) => {
                    let text = err.to_string();
                    if text.to_lowercase().contains("selector")
                        || text.to_lowercase().contains("parsing")
                    {
                        Err(VigilarError::InvalidSelector {
                            locator: locator.to_string(),
                            detail: text,
                        })
                    } else {
                        Err(VigilarError::Timeout {
                            locator: locator.to_string(),
                            url: ctx.url,
                            elapsed_ms: started.elapsed().as_millis() as u64,
                        })
                    }
                }
            }
        }
        Err(err) => {
            let ctx = page.context().await;
            let text = err.to_string();
            Err(
                classify_error_text(&text, locator, &ctx).unwrap_or(VigilarError::Unexpected {
                    locator: locator.to_string(),
                    url: ctx.url,
                    message: text,
                }),
            )
        }
    }
}

/// Wait until the page URL contains the fragment
pub async fn url_contains<D: PageDriver + ?Sized>(
    page: &D,
    fragment: &str,
    timeout: Duration,
) -> VigilarResult<()> {
    if page.wait_for_url_contains(fragment, timeout).await? {
        Ok(())
    } else {
        let ctx = page.context().await;
        Err(VigilarError::Navigation {
            url: ctx.url,
            message: format!(
                "expected URL to contain {fragment:?} within {}s",
                timeout.as_secs()
            ),
        })
    }
}

/// A locator that passed its readiness wait, bound to the page it came from.
///
/// All actions still address the first match by selector, so a re-render
/// between the wait and the action resolves to the fresh node rather than a
/// dead handle.
#[derive(Debug)]
pub struct ReadyElement<'d, D: PageDriver + ?Sized> {
    page: &'d D,
    locator: Locator,
}

impl<D: PageDriver + ?Sized> ReadyElement<'_, D> {
    /// Click the element
    pub async fn click(&self) -> VigilarResult<()> {
        self.page.click(self.locator.selector()).await
    }

    /// Replace the element's value with the given text
    pub async fn fill(&self, text: &str) -> VigilarResult<()> {
        self.page.fill(self.locator.selector(), text).await
    }

    /// Read an attribute
    pub async fn attribute(&self, name: &str) -> VigilarResult<Option<String>> {
        self.page.attribute(self.locator.selector(), name).await
    }

    /// Read the text content (empty string when the element has none)
    pub async fn text_content(&self) -> VigilarResult<String> {
        Ok(self
            .page
            .text(self.locator.selector())
            .await?
            .unwrap_or_default())
    }

    /// Whether a radio/checkbox input is currently checked
    pub async fn is_checked(&self) -> VigilarResult<bool> {
        self.page.is_checked(self.locator.selector()).await
    }

    /// The locator this element was resolved from
    #[must_use]
    pub const fn locator(&self) -> &Locator {
        &self.locator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{MockElement, MockPage};

    fn fast(s: &str) -> Locator {
        Locator::new(s).with_timeout(Duration::from_millis(20))
    }

    mod clickable_tests {
        use super::*;

        #[tokio::test]
        async fn test_missing_element_raises_not_found_never_timeout() {
            let page = MockPage::new("https://app.dociq.test/home", "DocIQ");
            let err = clickable(&page, &fast("#missing")).await.unwrap_err();
            assert!(matches!(err, VigilarError::NotFound { .. }), "{err}");
        }

        #[tokio::test]
        async fn test_hidden_element_raises_not_visible() {
            let page = MockPage::new("https://app.dociq.test/home", "DocIQ");
            page.insert("#hidden", MockElement::hidden());
            let err = clickable(&page, &fast("#hidden")).await.unwrap_err();
            assert!(matches!(err, VigilarError::NotVisible { .. }), "{err}");
        }

        #[tokio::test]
        async fn test_disabled_element_raises_not_interactable() {
            // Visible but disabled: the visible-wait succeeds and the
            // enablement gate rejects it.
            let page = MockPage::new("https://app.dociq.test/home", "DocIQ");
            page.insert("#submit", MockElement::disabled());
            let err = clickable(&page, &fast("#submit")).await.unwrap_err();
            assert!(matches!(err, VigilarError::NotInteractable { .. }), "{err}");
        }

        #[tokio::test]
        async fn test_ready_element_clicks() {
            let page = MockPage::new("https://app.dociq.test/home", "DocIQ");
            page.insert("#go", MockElement::interactable());
            clickable(&page, &fast("#go"))
                .await
                .unwrap()
                .click()
                .await
                .unwrap();
            assert_eq!(page.clicks("#go"), 1);
        }

        #[tokio::test]
        async fn test_driver_error_text_classified() {
            let page = MockPage::new("https://app.dociq.test/home", "DocIQ");
            page.fail_queries_with("#boom", "node is detached from the document");
            let err = clickable(&page, &fast("#boom")).await.unwrap_err();
            assert!(matches!(err, VigilarError::Stale { .. }), "{err}");
        }
    }

    mod present_tests {
        use super::*;

        #[tokio::test]
        async fn test_absent_element_raises_not_found() {
            let page = MockPage::new("https://app.dociq.test/home", "DocIQ");
            let err = present(&page, &fast("#missing")).await.unwrap_err();
            assert!(matches!(err, VigilarError::NotFound { .. }), "{err}");
        }

        #[tokio::test]
        async fn test_never_stabilized_raises_stale() {
            let page = MockPage::new("https://app.dociq.test/home", "DocIQ");
            page.insert("#churn", MockElement::detached());
            let err = present(&page, &fast("#churn")).await.unwrap_err();
            assert!(matches!(err, VigilarError::Stale { .. }), "{err}");
        }

        #[tokio::test]
        async fn test_hidden_element_is_still_present() {
            // Presence targets DOM attachment, not visibility.
            let page = MockPage::new("https://app.dociq.test/home", "DocIQ");
            page.insert("#hidden", MockElement::hidden());
            assert!(present(&page, &fast("#hidden")).await.is_ok());
        }

        #[tokio::test]
        async fn test_present_reads_attribute() {
            let page = MockPage::new("https://app.dociq.test/home", "DocIQ");
            page.insert(
                "#row",
                MockElement::interactable().with_attribute("data-testid", "statement.pdf"),
            );
            let got = present(&page, &fast("#row"))
                .await
                .unwrap()
                .attribute("data-testid")
                .await
                .unwrap();
            assert_eq!(got.as_deref(), Some("statement.pdf"));
        }
    }

    mod url_tests {
        use super::*;

        #[tokio::test]
        async fn test_url_contains_passes() {
            let page = MockPage::new("https://app.dociq.test/extraction", "DocIQ");
            url_contains(&page, "extraction", Duration::from_millis(20))
                .await
                .unwrap();
        }

        #[tokio::test]
        async fn test_url_contains_times_out_with_context() {
            let page = MockPage::new("https://app.dociq.test/home", "DocIQ");
            let err = url_contains(&page, "extraction", Duration::from_millis(20))
                .await
                .unwrap_err();
            assert!(matches!(err, VigilarError::Navigation { .. }), "{err}");
        }
    }
}
