//! Element-resolution diagnostics.
//!
//! The automation layer gives a single generic timeout when an interaction
//! cannot proceed. This module trades a little extra polling for an answer to
//! *why*: the element is absent, stale, invisible, disabled, or covered. The
//! checks run in order of increasing specificity and cost (existence →
//! attachment → visibility → enablement → occlusion), so cheap checks
//! short-circuit before expensive ones.
//!
//! Each step produces a [`CheckOutcome`]: a definitive pass, a definitive
//! failure carrying the classified error, or inconclusive. Inconclusive is a
//! modeled outcome: a step that cannot answer (its own query failed, or the
//! element vanished mid-check) moves on to the next step and never masks an
//! earlier definitive finding.

use std::time::Duration;

use crate::locator::{Locator, DIAGNOSE_TIMEOUT_SECS};
use crate::probe::{ElementProbe, HitTest, PageContext};
use crate::result::{VigilarError, VigilarResult};

/// Classification of an element at a moment in time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementState {
    /// No match in the DOM
    Absent,
    /// Matched, but the reference never stabilized as attached
    Stale,
    /// Attached but not visible
    Invisible,
    /// Visible but disabled/readonly
    Disabled,
    /// Visible and enabled, but another element occupies its click point
    Covered,
    /// Ready for interaction
    Interactable,
}

/// Outcome of a single diagnostic step
#[derive(Debug)]
pub enum CheckOutcome {
    /// The step's condition holds; move to the next step
    Pass,
    /// Definitive diagnosis; stop here
    Fail(VigilarError),
    /// The step could not answer; move on without concluding anything
    Inconclusive,
}

/// Classify a driver error by its message text.
///
/// The automation backend reports interaction failures as free text; the
/// substrings here are the stable markers for covered, detached and
/// selector-syntax failures. Returns `None` when the text matches none of
/// them (caller wraps as [`VigilarError::Unexpected`]).
#[must_use]
pub fn classify_error_text(
    text: &str,
    locator: &Locator,
    ctx: &PageContext,
) -> Option<VigilarError> {
    let lowered = text.to_lowercase();
    if lowered.contains("intercept") || lowered.contains("covered") {
        Some(VigilarError::ClickIntercepted {
            locator: locator.to_string(),
            url: ctx.url.clone(),
            detail: text.to_string(),
        })
    } else if lowered.contains("detached") || lowered.contains("stale") {
        Some(VigilarError::Stale {
            locator: locator.to_string(),
            url: ctx.url.clone(),
            detail: text.to_string(),
        })
    } else if lowered.contains("selector") || lowered.contains("parsing") {
        Some(VigilarError::InvalidSelector {
            locator: locator.to_string(),
            detail: text.to_string(),
        })
    } else {
        None
    }
}

/// Step 1: does anything match the selector?
async fn check_exists<P: ElementProbe + ?Sized>(
    probe: &P,
    locator: &Locator,
    ctx: &PageContext,
) -> (CheckOutcome, usize) {
    match probe.count(locator.selector()).await {
        Ok(0) => (
            CheckOutcome::Fail(VigilarError::NotFound {
                locator: locator.to_string(),
                url: ctx.url.clone(),
                title: ctx.title.clone(),
            }),
            0,
        ),
        Ok(n) => (CheckOutcome::Pass, n),
        Err(err) => {
            let text = err.to_string();
            let lowered = text.to_lowercase();
            if lowered.contains("selector") || lowered.contains("parsing") {
                (
                    CheckOutcome::Fail(VigilarError::InvalidSelector {
                        locator: locator.to_string(),
                        detail: text,
                    }),
                    0,
                )
            } else {
                // A count query that fails for any other reason still means
                // the element cannot be resolved.
                (
                    CheckOutcome::Fail(VigilarError::NotFound {
                        locator: locator.to_string(),
                        url: ctx.url.clone(),
                        title: ctx.title.clone(),
                    }),
                    0,
                )
            }
        }
    }
}

/// Step 2: is the first match stably attached?
async fn check_attached<P: ElementProbe + ?Sized>(
    probe: &P,
    locator: &Locator,
    ctx: &PageContext,
    timeout: Duration,
) -> CheckOutcome {
    match probe.wait_attached(locator.selector(), timeout).await {
        Ok(true) => CheckOutcome::Pass,
        Ok(false) => CheckOutcome::Fail(VigilarError::Stale {
            locator: locator.to_string(),
            url: ctx.url.clone(),
            detail: "element never reached attached state; the page may have navigated, \
                     replaced the node, or re-rendered it dynamically"
                .to_string(),
        }),
        Err(err) => {
            let text = err.to_string().to_lowercase();
            if text.contains("detached") || text.contains("stale") {
                CheckOutcome::Fail(VigilarError::Stale {
                    locator: locator.to_string(),
                    url: ctx.url.clone(),
                    detail: err.to_string(),
                })
            } else {
                CheckOutcome::Inconclusive
            }
        }
    }
}

/// Step 3: is the first match visible?
async fn check_visible<P: ElementProbe + ?Sized>(
    probe: &P,
    locator: &Locator,
    ctx: &PageContext,
    matches: usize,
) -> CheckOutcome {
    match probe.is_visible(locator.selector()).await {
        Ok(Some(true)) => CheckOutcome::Pass,
        Ok(Some(false)) => CheckOutcome::Fail(VigilarError::NotVisible {
            locator: locator.to_string(),
            url: ctx.url.clone(),
            matches,
        }),
        // Vanished between steps, or the query failed: not our call to make.
        Ok(None) | Err(_) => CheckOutcome::Inconclusive,
    }
}

/// Step 4: is the first match enabled?
async fn check_enabled<P: ElementProbe + ?Sized>(
    probe: &P,
    locator: &Locator,
    ctx: &PageContext,
) -> CheckOutcome {
    match probe.is_enabled(locator.selector()).await {
        Ok(Some(true)) => CheckOutcome::Pass,
        Ok(Some(false)) => CheckOutcome::Fail(VigilarError::NotInteractable {
            locator: locator.to_string(),
            url: ctx.url.clone(),
        }),
        Ok(None) | Err(_) => CheckOutcome::Inconclusive,
    }
}

/// Step 5: does the element actually occupy its own click point?
async fn check_occlusion<P: ElementProbe + ?Sized>(
    probe: &P,
    locator: &Locator,
    ctx: &PageContext,
) -> CheckOutcome {
    match probe.hit_test(locator.selector()).await {
        Ok(HitTest::Target) => CheckOutcome::Pass,
        Ok(HitTest::Nothing) => CheckOutcome::Fail(VigilarError::ClickIntercepted {
            locator: locator.to_string(),
            url: ctx.url.clone(),
            detail: "hit-test at the element's center point returned no element".to_string(),
        }),
        Ok(HitTest::Other) => CheckOutcome::Fail(VigilarError::ClickIntercepted {
            locator: locator.to_string(),
            url: ctx.url.clone(),
            detail: "another element occupies the element's center point".to_string(),
        }),
        Ok(HitTest::NoMatch) | Err(_) => CheckOutcome::Inconclusive,
    }
}

/// Run the ordered diagnostic sub-routine.
///
/// Returns the most specific classified error, or `None` when every step
/// passed or was inconclusive (the caller then falls back to a generic
/// timeout carrying its own context).
pub async fn diagnose<P: ElementProbe + ?Sized>(
    probe: &P,
    locator: &Locator,
    timeout: Duration,
) -> Option<VigilarError> {
    let ctx = probe.context().await;

    let (outcome, matches) = check_exists(probe, locator, &ctx).await;
    match outcome {
        CheckOutcome::Fail(err) => return Some(err),
        CheckOutcome::Pass | CheckOutcome::Inconclusive => {}
    }

    match check_attached(probe, locator, &ctx, timeout).await {
        CheckOutcome::Fail(err) => return Some(err),
        CheckOutcome::Pass | CheckOutcome::Inconclusive => {}
    }

    match check_visible(probe, locator, &ctx, matches).await {
        CheckOutcome::Fail(err) => return Some(err),
        CheckOutcome::Pass | CheckOutcome::Inconclusive => {}
    }

    match check_enabled(probe, locator, &ctx).await {
        CheckOutcome::Fail(err) => return Some(err),
        CheckOutcome::Pass | CheckOutcome::Inconclusive => {}
    }

    match check_occlusion(probe, locator, &ctx).await {
        CheckOutcome::Fail(err) => Some(err),
        CheckOutcome::Pass | CheckOutcome::Inconclusive => None,
    }
}

/// Classify the element's current state without raising.
///
/// Runs the same ordered checks as [`diagnose`] with the short secondary
/// timeout, mapping the result onto [`ElementState`]. An inconclusive run
/// reports [`ElementState::Interactable`]; the layer never invents a failure
/// it could not observe.
pub async fn element_state<P: ElementProbe + ?Sized>(
    probe: &P,
    locator: &Locator,
) -> VigilarResult<ElementState> {
    let timeout = Duration::from_secs(DIAGNOSE_TIMEOUT_SECS);
    let state = match diagnose(probe, locator, timeout).await {
        None => ElementState::Interactable,
        Some(VigilarError::NotFound { .. } | VigilarError::InvalidSelector { .. }) => {
            ElementState::Absent
        }
        Some(VigilarError::Stale { .. }) => ElementState::Stale,
        Some(VigilarError::NotVisible { .. }) => ElementState::Invisible,
        Some(VigilarError::NotInteractable { .. }) => ElementState::Disabled,
        Some(VigilarError::ClickIntercepted { .. }) => ElementState::Covered,
        Some(other) => return Err(other),
    };
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::Locator;
    use crate::session::{MockElement, MockPage};

    fn loc(s: &str) -> Locator {
        Locator::new(s)
    }

    const SHORT: Duration = Duration::from_millis(10);

    mod classify_text_tests {
        use super::*;

        fn ctx() -> PageContext {
            PageContext {
                url: "https://app.dociq.test/home".into(),
                title: "DocIQ".into(),
            }
        }

        #[test]
        fn test_intercepted_text() {
            let err = classify_error_text("click intercepted by overlay", &loc("#x"), &ctx());
            assert!(matches!(err, Some(VigilarError::ClickIntercepted { .. })));
        }

        #[test]
        fn test_detached_text() {
            let err = classify_error_text("node is detached from document", &loc("#x"), &ctx());
            assert!(matches!(err, Some(VigilarError::Stale { .. })));
        }

        #[test]
        fn test_selector_text() {
            let err = classify_error_text("Selector parsing error near '['", &loc("#x"), &ctx());
            assert!(matches!(err, Some(VigilarError::InvalidSelector { .. })));
        }

        #[test]
        fn test_unrelated_text() {
            assert!(classify_error_text("connection reset", &loc("#x"), &ctx()).is_none());
        }
    }

    mod diagnose_tests {
        use super::*;

        #[tokio::test]
        async fn test_zero_matches_is_not_found() {
            let page = MockPage::new("https://app.dociq.test/extraction", "DocIQ");
            let err = diagnose(&page, &loc("#missing"), SHORT).await;
            assert!(matches!(err, Some(VigilarError::NotFound { .. })));
        }

        #[tokio::test]
        async fn test_hidden_element_is_not_visible_not_generic() {
            let page = MockPage::new("https://app.dociq.test/extraction", "DocIQ");
            page.insert("#hidden", MockElement::hidden());
            let err = diagnose(&page, &loc("#hidden"), SHORT).await;
            assert!(matches!(err, Some(VigilarError::NotVisible { .. })));
        }

        #[tokio::test]
        async fn test_disabled_element_is_not_interactable() {
            let page = MockPage::new("https://app.dociq.test/extraction", "DocIQ");
            page.insert("#submit", MockElement::disabled());
            let err = diagnose(&page, &loc("#submit"), SHORT).await;
            assert!(matches!(err, Some(VigilarError::NotInteractable { .. })));
        }

        #[tokio::test]
        async fn test_covered_element_is_intercepted() {
            let page = MockPage::new("https://app.dociq.test/extraction", "DocIQ");
            page.insert("#behind-modal", MockElement::covered());
            let err = diagnose(&page, &loc("#behind-modal"), SHORT).await;
            assert!(matches!(err, Some(VigilarError::ClickIntercepted { .. })));
        }

        #[tokio::test]
        async fn test_detached_element_is_stale() {
            let page = MockPage::new("https://app.dociq.test/extraction", "DocIQ");
            page.insert("#flaky", MockElement::detached());
            let err = diagnose(&page, &loc("#flaky"), SHORT).await;
            assert!(matches!(err, Some(VigilarError::Stale { .. })));
        }

        #[tokio::test]
        async fn test_interactable_element_diagnoses_clean() {
            let page = MockPage::new("https://app.dociq.test/extraction", "DocIQ");
            page.insert("#ok", MockElement::interactable());
            assert!(diagnose(&page, &loc("#ok"), SHORT).await.is_none());
        }

        #[tokio::test]
        async fn test_selector_syntax_error_beats_not_found() {
            let page = MockPage::new("https://app.dociq.test/extraction", "DocIQ");
            page.fail_queries_with("#bad[", "Selector parsing failure");
            let err = diagnose(&page, &loc("#bad["), SHORT).await;
            assert!(matches!(err, Some(VigilarError::InvalidSelector { .. })));
        }
    }

    mod element_state_tests {
        use super::*;

        #[tokio::test]
        async fn test_states_map_from_diagnosis() {
            let page = MockPage::new("https://app.dociq.test/home", "DocIQ");
            page.insert("#hidden", MockElement::hidden());
            page.insert("#off", MockElement::disabled());
            page.insert("#ok", MockElement::interactable());

            assert_eq!(
                element_state(&page, &loc("#nope")).await.unwrap(),
                ElementState::Absent
            );
            assert_eq!(
                element_state(&page, &loc("#hidden")).await.unwrap(),
                ElementState::Invisible
            );
            assert_eq!(
                element_state(&page, &loc("#off")).await.unwrap(),
                ElementState::Disabled
            );
            assert_eq!(
                element_state(&page, &loc("#ok")).await.unwrap(),
                ElementState::Interactable
            );
        }
    }
}
