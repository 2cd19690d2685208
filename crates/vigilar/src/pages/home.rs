//! Home page: section navigation, upload surface, tabs, sidebar.

use std::str::FromStr;

use tracing::info;

use crate::locator::Locator;
use crate::locators::home;
use crate::probe::PageDriver;
use crate::result::{VigilarError, VigilarResult};
use crate::wait;

/// The application sections reachable from the home page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    /// Generic extraction
    Extraction,
    /// Bank statement extraction
    BankStatement,
    /// Cash-flow analysis
    CashFlowAnalysis,
    /// Conversational AI
    ConversationalAi,
    /// Rent roll
    RentRoll,
    /// Predictive analytics
    PredictiveAnalytics,
    /// Redaction
    Redaction,
    /// Recognition
    Recognition,
    /// Classification (below the fold)
    Classification,
}

impl Section {
    /// The section's home-page card locator
    #[must_use]
    pub const fn locator(&self) -> &'static str {
        match self {
            Self::Extraction => home::EXTRACTION_SECTION,
            Self::BankStatement => home::BANK_STATEMENT_SECTION,
            Self::CashFlowAnalysis => home::CASH_FLOW_SECTION,
            Self::ConversationalAi => home::CONVERSATIONAL_AI_SECTION,
            Self::RentRoll => home::RENT_ROLL_SECTION,
            Self::PredictiveAnalytics => home::PREDICTIVE_ANALYTICS_SECTION,
            Self::Redaction => home::REDACTION_SECTION,
            Self::Recognition => home::RECOGNITION_SECTION,
            Self::Classification => home::CLASSIFICATION_SECTION,
        }
    }

    /// Per-section wait budget; the heavier sections render slowly
    #[must_use]
    pub const fn wait_secs(&self) -> u64 {
        match self {
            Self::Extraction | Self::BankStatement => 20,
            Self::CashFlowAnalysis => 60,
            _ => 10,
        }
    }

    /// Whether the card sits below the fold and needs a scroll first
    #[must_use]
    pub const fn needs_scroll(&self) -> bool {
        matches!(self, Self::Classification)
    }

    /// Canonical name, as used in test data files
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Extraction => "extraction",
            Self::BankStatement => "bank_statement",
            Self::CashFlowAnalysis => "cash_flow_analysis",
            Self::ConversationalAi => "conversational_ai",
            Self::RentRoll => "rent_roll",
            Self::PredictiveAnalytics => "predictive_analytics",
            Self::Redaction => "redaction",
            Self::Recognition => "recognition",
            Self::Classification => "classification",
        }
    }
}

impl FromStr for Section {
    type Err = VigilarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "extraction" => Ok(Self::Extraction),
            "bank_statement" => Ok(Self::BankStatement),
            "cash_flow_analysis" => Ok(Self::CashFlowAnalysis),
            "conversational_ai" => Ok(Self::ConversationalAi),
            "rent_roll" => Ok(Self::RentRoll),
            "predictive_analytics" => Ok(Self::PredictiveAnalytics),
            "redaction" => Ok(Self::Redaction),
            "recognition" => Ok(Self::Recognition),
            "classification" => Ok(Self::Classification),
            other => Err(VigilarError::Config {
                message: format!("unknown section {other:?}"),
            }),
        }
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tabs within a section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    /// Upload File tab (default)
    UploadFile,
    /// History tab
    History,
}

impl Tab {
    /// The tab header's locator
    #[must_use]
    pub const fn locator(&self) -> &'static str {
        match self {
            Self::UploadFile => home::UPLOAD_FILE_TAB,
            Self::History => home::HISTORY_TAB,
        }
    }

    /// Display name as rendered in the tablist
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::UploadFile => "upload file",
            Self::History => "history",
        }
    }
}

impl FromStr for Tab {
    type Err = VigilarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "upload_file" | "upload file" => Ok(Self::UploadFile),
            "history" => Ok(Self::History),
            other => Err(VigilarError::Config {
                message: format!("unknown tab {other:?}"),
            }),
        }
    }
}

/// Radio options on the statement extraction screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionOption {
    /// Bank statement extraction
    BankStatement,
    /// Credit card statement extraction
    CreditCard,
}

impl ExtractionOption {
    /// The option's radio-button locator
    #[must_use]
    pub const fn radio_locator(&self) -> &'static str {
        match self {
            Self::BankStatement => crate::locators::statement::BANK_STATEMENT_RADIO,
            Self::CreditCard => crate::locators::statement::CREDIT_CARD_RADIO,
        }
    }
}

impl FromStr for ExtractionOption {
    type Err = VigilarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bank_statement" => Ok(Self::BankStatement),
            "credit_card" => Ok(Self::CreditCard),
            other => Err(VigilarError::Config {
                message: format!("unknown extraction option {other:?}"),
            }),
        }
    }
}

/// Maximum PDF pages selected per upload
const MAX_SELECTED_PAGES: usize = 4;

/// Home page flows
#[derive(Debug)]
pub struct HomePage<'d, D: PageDriver> {
    page: &'d D,
}

impl<'d, D: PageDriver> HomePage<'d, D> {
    /// Bind to the session page
    #[must_use]
    pub const fn new(page: &'d D) -> Self {
        Self { page }
    }

    /// Navigate to a section from the home page
    pub async fn select_section(&self, section: Section) -> VigilarResult<()> {
        let locator = Locator::new(section.locator()).with_timeout_secs(section.wait_secs());
        if section.needs_scroll() {
            self.page.scroll_into_view(locator.selector()).await?;
        }
        wait::clickable(self.page, &locator).await?.click().await?;
        info!(%section, "section selected");
        Ok(())
    }

    /// Toggle the sidebar and verify it flips between expanded and collapsed
    pub async fn verify_side_bar(&self) -> VigilarResult<()> {
        let toggle = Locator::new(home::SIDE_BAR_TOGGLE);
        let before = wait::clickable(self.page, &toggle)
            .await?
            .attribute("data-icon")
            .await?
            .unwrap_or_default();
        info!(state = %before, "sidebar before toggle");

        wait::clickable(self.page, &toggle).await?.click().await?;

        let after = wait::clickable(self.page, &toggle)
            .await?
            .attribute("data-icon")
            .await?
            .unwrap_or_default();
        if after == before {
            return Err(VigilarError::Assertion {
                message: format!(
                    "sidebar did not toggle: data-icon stayed {before:?} after click"
                ),
            });
        }
        info!(state = %after, "sidebar after toggle");
        Ok(())
    }

    /// Attach a file to the upload input
    pub async fn upload_file(&self, path: &std::path::Path) -> VigilarResult<()> {
        let input = Locator::new(home::UPLOAD_FILE_INPUT);
        wait::present(self.page, &input).await?;
        self.page.set_input_files(input.selector(), path).await?;
        info!(file = %path.display(), "file attached to upload input");
        Ok(())
    }

    /// Click the Next button
    pub async fn click_next(&self) -> VigilarResult<()> {
        let next = Locator::new(home::NEXT_BUTTON);
        self.page.scroll_into_view(next.selector()).await?;
        wait::clickable(self.page, &next).await?.click().await
    }

    /// Click the Submit button
    pub async fn click_submit(&self) -> VigilarResult<()> {
        let submit = Locator::new(home::SUBMIT_BUTTON);
        self.page.scroll_into_view(submit.selector()).await?;
        wait::clickable(self.page, &submit).await?.click().await
    }

    /// Verify the validation message shown when a required option is missing
    pub async fn verify_validation_error(&self, expected: &str) -> VigilarResult<()> {
        let actual = wait::clickable(self.page, &Locator::new(home::VALIDATION_ERROR))
            .await?
            .text_content()
            .await?;
        if actual.trim() != expected {
            return Err(VigilarError::Assertion {
                message: format!(
                    "validation message mismatch: expected {expected:?}, found {actual:?}"
                ),
            });
        }
        Ok(())
    }

    /// Select pages in the PDF preview (at most four), submit, and dismiss
    /// the disclaimer. Returns the document's page count.
    pub async fn select_pages(&self) -> VigilarResult<usize> {
        let thumbnails = Locator::new(home::PAGE_THUMBNAILS).with_timeout_secs(20);
        wait::present(self.page, &thumbnails).await?;
        let total = self.page.count(thumbnails.selector()).await?;
        info!(total, "pages available for selection");

        for index in 1..=total.min(MAX_SELECTED_PAGES) {
            let thumb = Locator::new(format!("({})[{index}]", home::PAGE_THUMBNAILS));
            self.page.click(thumb.selector()).await?;
        }

        self.click_submit().await?;
        wait::clickable(self.page, &Locator::new(home::DISCLAIMER_OKAY))
            .await?
            .click()
            .await?;
        Ok(total)
    }

    /// Verify both tabs are present in the section tablist
    pub async fn verify_tablist(&self) -> VigilarResult<()> {
        let names = self
            .page
            .text_all(Locator::new(home::TAB_NAMES).selector())
            .await?;
        if names.is_empty() {
            return Err(VigilarError::Assertion {
                message: format!("no tabs found (locator: {})", home::TAB_NAMES),
            });
        }
        let lowered: Vec<String> = names.iter().map(|n| n.trim().to_lowercase()).collect();
        for tab in [Tab::UploadFile, Tab::History] {
            if !lowered.iter().any(|n| n == tab.label()) {
                return Err(VigilarError::Assertion {
                    message: format!("expected tab {:?} not in {lowered:?}", tab.label()),
                });
            }
        }
        info!(?lowered, "both tabs present");
        Ok(())
    }

    /// Verify the Upload File tab is selected by default
    pub async fn verify_default_tab(&self) -> VigilarResult<()> {
        let names = self
            .page
            .text_all(Locator::new(home::TAB_NAMES).selector())
            .await?;
        let first = names
            .first()
            .map(|n| n.trim().to_lowercase())
            .unwrap_or_default();
        if first != Tab::UploadFile.label() {
            return Err(VigilarError::Assertion {
                message: format!(
                    "default tab mismatch: expected {:?} first, found {first:?} (all: {names:?})",
                    Tab::UploadFile.label()
                ),
            });
        }
        self.verify_tab_selected(Tab::UploadFile).await
    }

    /// Assert the tab header carries the selected-state attributes
    pub async fn verify_tab_selected(&self, tab: Tab) -> VigilarResult<()> {
        let header = wait::clickable(self.page, &Locator::new(tab.locator())).await?;
        let aria = header.attribute("aria-selected").await?.unwrap_or_default();
        let class = header.attribute("class").await?.unwrap_or_default();
        if aria.trim() != "true" || !class.contains("active") {
            return Err(VigilarError::Assertion {
                message: format!(
                    "{:?} tab not selected: aria-selected={aria:?}, class={class:?}",
                    tab.label()
                ),
            });
        }
        Ok(())
    }

    /// Open the History tab via the right-most tab header and verify it
    pub async fn open_history_tab(&self) -> VigilarResult<()> {
        let last = Locator::new(home::LAST_TAB).with_timeout_secs(15);
        wait::clickable(self.page, &last).await?;
        self.page.scroll_into_view(last.selector()).await?;
        wait::clickable(self.page, &last).await?.click().await?;

        let name = wait::clickable(self.page, &last.clone().with_timeout_secs(30))
            .await?
            .text_content()
            .await?;
        if name.trim().to_lowercase() != Tab::History.label() {
            return Err(VigilarError::Assertion {
                message: format!("last tab is {name:?}, expected History"),
            });
        }
        self.verify_tab_selected(Tab::History).await?;
        info!("history tab open");
        Ok(())
    }

    /// Click a tab and assert it becomes selected
    pub async fn click_tab(&self, tab: Tab) -> VigilarResult<()> {
        wait::clickable(self.page, &Locator::new(tab.locator()))
            .await?
            .click()
            .await?;
        self.verify_tab_selected(tab).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{MockElement, MockPage};

    fn page_with_tabs() -> MockPage {
        let page = MockPage::new("https://app.dociq.test/extraction", "DocIQ");
        page.insert(
            home::TAB_NAMES,
            MockElement::interactable()
                .with_texts(vec!["Upload File".to_string(), "History".to_string()]),
        );
        page.insert(
            home::UPLOAD_FILE_TAB,
            MockElement::interactable()
                .with_attribute("aria-selected", "true")
                .with_attribute("class", "nav-link active"),
        );
        page.insert(
            home::HISTORY_TAB,
            MockElement::interactable()
                .with_attribute("aria-selected", "false")
                .with_attribute("class", "nav-link"),
        );
        page
    }

    mod section_tests {
        use super::*;

        #[test]
        fn test_parse_round_trip() {
            for name in [
                "extraction",
                "bank_statement",
                "cash_flow_analysis",
                "conversational_ai",
                "rent_roll",
                "predictive_analytics",
                "redaction",
                "recognition",
                "classification",
            ] {
                let section: Section = name.parse().unwrap();
                assert_eq!(section.as_str(), name);
            }
        }

        #[test]
        fn test_unknown_section_rejected() {
            assert!("payroll".parse::<Section>().is_err());
        }

        #[test]
        fn test_classification_needs_scroll() {
            assert!(Section::Classification.needs_scroll());
            assert!(!Section::BankStatement.needs_scroll());
        }

        #[test]
        fn test_wait_budgets() {
            assert_eq!(Section::CashFlowAnalysis.wait_secs(), 60);
            assert_eq!(Section::BankStatement.wait_secs(), 20);
            assert_eq!(Section::Redaction.wait_secs(), 10);
        }
    }

    mod flow_tests {
        use super::*;

        #[tokio::test]
        async fn test_select_section_clicks_card() {
            let page = MockPage::new("https://app.dociq.test/home", "DocIQ");
            page.insert(home::BANK_STATEMENT_SECTION, MockElement::interactable());
            HomePage::new(&page)
                .select_section(Section::BankStatement)
                .await
                .unwrap();
            assert_eq!(page.clicks(home::BANK_STATEMENT_SECTION), 1);
        }

        #[tokio::test]
        async fn test_verify_tablist_passes_with_both_tabs() {
            let page = page_with_tabs();
            HomePage::new(&page).verify_tablist().await.unwrap();
        }

        #[tokio::test]
        async fn test_verify_tablist_fails_when_history_missing() {
            let page = MockPage::new("https://app.dociq.test/extraction", "DocIQ");
            page.insert(
                home::TAB_NAMES,
                MockElement::interactable().with_texts(vec!["Upload File".to_string()]),
            );
            let err = HomePage::new(&page).verify_tablist().await.unwrap_err();
            assert!(matches!(err, VigilarError::Assertion { .. }));
        }

        #[tokio::test]
        async fn test_verify_default_tab_checks_selection_attributes() {
            let page = page_with_tabs();
            HomePage::new(&page).verify_default_tab().await.unwrap();
        }

        #[tokio::test]
        async fn test_tab_selection_mismatch_is_assertion() {
            let page = page_with_tabs();
            let err = HomePage::new(&page)
                .verify_tab_selected(Tab::History)
                .await
                .unwrap_err();
            assert!(matches!(err, VigilarError::Assertion { .. }));
        }

        #[tokio::test]
        async fn test_upload_attaches_file() {
            let page = MockPage::new("https://app.dociq.test/extraction", "DocIQ");
            page.insert(home::UPLOAD_FILE_INPUT, MockElement::interactable());
            HomePage::new(&page)
                .upload_file(std::path::Path::new("/tmp/statement.pdf"))
                .await
                .unwrap();
            let uploads = page.uploads();
            assert_eq!(uploads.len(), 1);
            assert!(uploads[0].1.ends_with("statement.pdf"));
        }

        #[tokio::test]
        async fn test_select_pages_caps_at_four() {
            let page = MockPage::new("https://app.dociq.test/extraction", "DocIQ");
            page.insert(
                home::PAGE_THUMBNAILS,
                MockElement::interactable().with_count(9),
            );
            for index in 1..=4 {
                page.insert(
                    &format!("({})[{index}]", home::PAGE_THUMBNAILS),
                    MockElement::interactable(),
                );
            }
            page.insert(home::SUBMIT_BUTTON, MockElement::interactable());
            page.insert(home::DISCLAIMER_OKAY, MockElement::interactable());

            let total = HomePage::new(&page).select_pages().await.unwrap();
            assert_eq!(total, 9);
            for index in 1..=4 {
                assert_eq!(
                    page.clicks(&format!("({})[{index}]", home::PAGE_THUMBNAILS)),
                    1
                );
            }
        }
    }
}
