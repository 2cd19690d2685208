//! Selector tables for the DocIQ pages the suite touches.
//!
//! Kept in one place so UI churn is a one-file fix. Selectors are raw
//! strings; [`crate::locator::Selector::auto`] sorts out CSS vs XPath.

/// Login screen
pub mod login {
    /// Sign In entry button
    pub const SIGN_IN: &str = "//button[text()='Sign In']";
    /// Email input
    pub const EMAIL_INPUT: &str = "//input[@type='email']";
    /// Password input
    pub const PASSWORD_INPUT: &str = "//input[@name='password']";
    /// Terms checkbox (last checkbox on the form)
    pub const TERMS_CHECKBOX: &str = "(//div//input[@type='checkbox'])[last()]";
    /// Form submit button (shared by the email and password steps)
    pub const SUBMIT: &str = "//button[@type='submit']";
    /// Profile dropdown trigger
    pub const PROFILE_ICON: &str = "[id='dropdown-basic']";
    /// Logout entry in the profile dropdown
    pub const LOGOUT: &str = "//span[text()='Logout']";
}

/// Home page and shared chrome
pub mod home {
    /// Extraction section card
    pub const EXTRACTION_SECTION: &str = "//div[@data-section='extraction']";
    /// Bank Statement section card
    pub const BANK_STATEMENT_SECTION: &str = "//div[@data-section='bank-statement']";
    /// Cash Flow Analysis section card
    pub const CASH_FLOW_SECTION: &str = "//div[@data-section='cash-flow-analysis']";
    /// Conversational AI section card
    pub const CONVERSATIONAL_AI_SECTION: &str = "//div[@data-section='conversational-ai']";
    /// Rent Roll section card
    pub const RENT_ROLL_SECTION: &str = "//div[@data-section='rent-roll']";
    /// Predictive Analytics section card
    pub const PREDICTIVE_ANALYTICS_SECTION: &str = "//div[@data-section='predictive-analytics']";
    /// Redaction section card
    pub const REDACTION_SECTION: &str = "//div[@data-section='redaction']";
    /// Recognition section card
    pub const RECOGNITION_SECTION: &str = "//div[@data-section='recognition']";
    /// Classification section card (below the fold; scroll first)
    pub const CLASSIFICATION_SECTION: &str = "//div[@data-section='classification']";

    /// Sidebar expand/collapse toggle
    pub const SIDE_BAR_TOGGLE: &str = "[data-testid='sidebar-toggle']";
    /// File input for uploads
    pub const UPLOAD_FILE_INPUT: &str = "input[type='file']";
    /// Next button on the upload screen
    pub const NEXT_BUTTON: &str = "//button[text()='Next']";
    /// Submit button on the upload screen
    pub const SUBMIT_BUTTON: &str = "//button[text()='Submit']";
    /// Validation error shown when a required option is missing
    pub const VALIDATION_ERROR: &str = "//div[@class='error-message']";
    /// Upload success toast
    pub const SUCCESS_MESSAGE: &str = "//div[contains(@class,'toast-success')]";
    /// Disclaimer popup confirm button
    pub const DISCLAIMER_OKAY: &str = "//button[text()='Okay']";
    /// Selectable page thumbnails in the PDF preview
    pub const PAGE_THUMBNAILS: &str =
        "//button[@class='select_pdf_page_container']//canvas[contains(@class,'canvas')]";

    /// Upload File tab header
    pub const UPLOAD_FILE_TAB: &str = "[data-testid='upload-file-tab']";
    /// History tab header
    pub const HISTORY_TAB: &str = "[data-testid='history-tab']";
    /// All tab headers in the section tablist
    pub const TAB_NAMES: &str = "//ul[@role='tablist']//button";
    /// Right-most tab header (History)
    pub const LAST_TAB: &str = "(//ul[@role='tablist']//button)[last()]";

    /// Rendered source document in the output screen
    pub const OUTPUT_VIEWER: &str = "//div[@class='pdf-viewer']//canvas";
    /// Error banner on the output screen
    pub const OUTPUT_ERROR_BANNER: &str = "[data-testid='output-error']";
}

/// Statement extraction section and its history table
pub mod statement {
    /// Bank Statement radio button
    pub const BANK_STATEMENT_RADIO: &str = "input[value='bank-statement']";
    /// Credit Card radio button
    pub const CREDIT_CARD_RADIO: &str = "input[value='credit-card']";

    /// History table header
    pub const HISTORY_HEADER: &str = "//div[@class='module-history']//div[@class='header-row']";
    /// File-name cell of every history row
    pub const HISTORY_FILE_NAMES: &str =
        "//div[@class='module-history']//div[@class='row-data']//div[@aria-label='filename']";
    /// File-name cell of the first (newest) history row
    pub const HISTORY_FIRST_FILE_NAME: &str =
        "(//div[@class='module-history']//div[@class='row-data']//div[@aria-label='filename'])[1]";
    /// Date-time cell of the first history row
    pub const HISTORY_FIRST_DATETIME: &str =
        "(//div[@class='module-history']//div[@class='row-data']//div[@aria-label='datetime'])[1]";
    /// Search-by-file-name input above the history table
    pub const HISTORY_SEARCH_BAR: &str = "[data-testid='history-search']";
    /// Any row whose status shows processing
    pub const STATUS_PROCESSING: &str =
        "//div[@class='row-data']//div[@aria-label='status'][@data-testid='processing']";
    /// First preview button in its enabled form
    pub const FIRST_ENABLED_PREVIEW: &str =
        "(//div[@class='row-data']//div[@aria-label='preview'][@data-testid='preview-enabled'])[1]";

    /// Back button on the output screen
    pub const OUTPUT_BACK_BUTTON: &str = "//button[@aria-label='back']";
    /// History button on the output screen
    pub const OUTPUT_HISTORY_BUTTON: &str = "//button[@aria-label='history']";
    /// Extracted-table column headers on the output screen
    pub const OUTPUT_TABLE_HEADERS: &str = "//div[@class='output-table']//th";
    /// Extracted-table body on the output screen
    pub const OUTPUT_TABLE_BODY: &str = "//div[@class='output-table']//tbody";
    /// Confirmation button of the submit dialog
    pub const PROCEED_BUTTON: &str = "//button[text()='Proceed']";

    /// Page-size select in the support portal
    pub const PORTAL_PAGE_SIZE: &str = "select[name='page-size']";
    /// Search input in the support portal
    pub const PORTAL_SEARCH_BAR: &str = "[data-testid='portal-search']";

    /// History row for a specific file: status cell
    #[must_use]
    pub fn row_status(filename: &str, date_time: &str) -> String {
        row_cell(filename, date_time, "status")
    }

    /// History row for a specific file: download control
    #[must_use]
    pub fn row_download(filename: &str, date_time: &str) -> String {
        row_cell(filename, date_time, "download")
    }

    /// History row for a specific file: preview control
    #[must_use]
    pub fn row_preview(filename: &str, date_time: &str) -> String {
        row_cell(filename, date_time, "preview")
    }

    fn row_cell(filename: &str, date_time: &str, label: &str) -> String {
        format!(
            "(//div[@class='row-data'][.//div[@data-testid='{filename}'] and \
             .//div[contains(text(), '{date_time}')]]//div[@aria-label='{label}'])"
        )
    }

    /// Support-portal row for a completed file, matched by name and timestamp
    #[must_use]
    pub fn portal_completed_row(filename: &str, date_time: &str) -> String {
        format!(
            "//tr[.//td[@data-testid='{filename}'] and .//td[@data-testid='{date_time}'] \
             and .//td[@data-testid='completed']]"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::Selector;

    #[test]
    fn test_row_locators_embed_both_keys() {
        let loc = statement::row_status("acct_0321.pdf", "06-12-2025 11:42:03");
        assert!(loc.contains("acct_0321.pdf"));
        assert!(loc.contains("06-12-2025 11:42:03"));
        assert!(loc.contains("aria-label='status'"));
    }

    #[test]
    fn test_portal_row_requires_completed() {
        let loc = statement::portal_completed_row("acct_0321.pdf", "06-12-2025 11:42:03");
        assert!(loc.contains("data-testid='completed'"));
    }

    #[test]
    fn test_selector_flavor_detection_on_tables() {
        assert!(matches!(
            Selector::auto(login::SIGN_IN),
            Selector::XPath(_)
        ));
        assert!(matches!(
            Selector::auto(login::PROFILE_ICON),
            Selector::Css(_)
        ));
        assert!(matches!(
            Selector::auto(statement::HISTORY_FIRST_FILE_NAME),
            Selector::XPath(_)
        ));
    }
}
