//! Statement extraction section: upload flow, history table, status polling,
//! output verification, and the support portal.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{Local, NaiveDate, NaiveTime};
use tracing::{info, warn};

use crate::locator::Locator;
use crate::locators::{home, statement};
use crate::pages::home::{ExtractionOption, HomePage, Tab};
use crate::probe::PageDriver;
use crate::result::{VigilarError, VigilarResult};
use crate::status::{PollOutcome, StatusPoller, StatusSource};
use crate::wait;

/// Details of an uploaded input file
#[derive(Debug, Clone)]
pub struct UploadDetails {
    /// File name as uploaded
    pub file_name: String,
    /// File extension (lowercased)
    pub extension: String,
    /// Page count (1 for images)
    pub pages: u32,
}

/// Identity of the uploaded file's history row
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    /// File name shown in the row
    pub filename: String,
    /// Raw date-time cell text, used to key the dynamic row locators
    pub date_time: String,
}

/// State passed explicitly between dependent test cases in a flow
#[derive(Debug, Default)]
pub struct RunContext {
    /// The last upload performed
    pub upload: Option<UploadDetails>,
    /// The history row it landed in
    pub history: Option<HistoryEntry>,
}

/// How many tab-switch refreshes to try before concluding the row is missing
const HISTORY_REFRESH_LIMIT: u32 = 5;

/// Rows the history table shows at most
const HISTORY_PAGE_SIZE: usize = 30;

/// Statement extraction flows
#[derive(Debug)]
pub struct StatementPage<'d, D: PageDriver> {
    page: &'d D,
}

impl<'d, D: PageDriver> StatementPage<'d, D> {
    /// Bind to the session page
    #[must_use]
    pub const fn new(page: &'d D) -> Self {
        Self { page }
    }

    fn home(&self) -> HomePage<'d, D> {
        HomePage::new(self.page)
    }

    /// Ensure the extraction option's radio button is selected
    pub async fn select_extraction_option(&self, option: ExtractionOption) -> VigilarResult<()> {
        let radio = Locator::new(option.radio_locator());
        wait::present(self.page, &radio).await?;
        if self.page.is_checked(radio.selector()).await? {
            info!(?option, "radio already selected");
        } else {
            warn!(?option, "radio not selected by default; clicking");
            wait::clickable(self.page, &radio.clone().with_timeout_secs(20))
                .await?
                .click()
                .await?;
        }
        Ok(())
    }

    /// Upload a file for extraction and walk the screen to submission.
    ///
    /// PDFs go through page selection (capped by the home page); images skip
    /// straight to the disclaimer.
    pub async fn upload_for_extraction(
        &self,
        option: ExtractionOption,
        filepath: &Path,
    ) -> VigilarResult<UploadDetails> {
        self.select_extraction_option(option).await?;

        let home_page = self.home();
        home_page.upload_file(filepath).await?;
        home_page.click_next().await?;

        let file_name = filepath
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let extension = filepath
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        let pages = match extension.as_str() {
            "pdf" => home_page.select_pages().await? as u32,
            "jpg" | "jpeg" | "png" => {
                wait::clickable(self.page, &Locator::new(home::DISCLAIMER_OKAY))
                    .await?
                    .click()
                    .await?;
                1
            }
            other => {
                return Err(VigilarError::Config {
                    message: format!("unsupported input extension {other:?}"),
                })
            }
        };

        info!(%file_name, pages, "file submitted for extraction");
        Ok(UploadDetails {
            file_name,
            extension,
            pages,
        })
    }

    /// Assert the upload success toast carries the expected message
    pub async fn verify_upload_message(&self, expected: &str) -> VigilarResult<()> {
        let toast = Locator::new(home::SUCCESS_MESSAGE).with_timeout_secs(60);
        let actual = wait::clickable(self.page, &toast)
            .await?
            .text_content()
            .await?;
        if !actual.contains(expected.trim()) {
            return Err(VigilarError::Assertion {
                message: format!(
                    "upload message mismatch: expected to contain {expected:?}, found {actual:?}"
                ),
            });
        }
        info!(message = %actual.trim(), "upload success message verified");
        Ok(())
    }

    /// All file names currently listed in the history table (newest first)
    pub async fn history_file_names(&self) -> VigilarResult<Vec<String>> {
        wait::present(
            self.page,
            &Locator::new(statement::HISTORY_HEADER).with_timeout_secs(20),
        )
        .await?;
        let rows = Locator::new(statement::HISTORY_FILE_NAMES).with_timeout_secs(20);
        wait::present(self.page, &rows).await?;

        let names: Vec<String> = self
            .page
            .attribute_all(rows.selector(), "data-testid")
            .await?
            .into_iter()
            .flatten()
            .collect();

        if names.is_empty() {
            return Err(VigilarError::Assertion {
                message: format!(
                    "no files found in the History tab (locator: {}); upload a file first",
                    statement::HISTORY_FILE_NAMES
                ),
            });
        }
        info!(count = names.len(), "history rows listed");
        Ok(names)
    }

    /// Verify the uploaded file tops the history table and has started
    /// processing. Rows that fail to appear get a bounded number of
    /// tab-switch refreshes before the mismatch is raised.
    pub async fn verify_uploaded_file_on_history(
        &self,
        expected_name: &str,
        refresh_tabs: (Tab, Tab),
    ) -> VigilarResult<HistoryEntry> {
        let home_page = self.home();
        home_page.open_history_tab().await?;

        let first_name_loc =
            Locator::new(statement::HISTORY_FIRST_FILE_NAME).with_timeout_secs(30);
        wait::present(self.page, &first_name_loc).await?;

        let mut refreshes = 0;
        let filename = loop {
            let shown = wait::present(self.page, &first_name_loc)
                .await?
                .attribute("data-testid")
                .await?
                .unwrap_or_default();
            if shown.trim().eq_ignore_ascii_case(expected_name.trim()) {
                info!(%shown, "uploaded file is the newest history row");
                break shown;
            }
            if refreshes >= HISTORY_REFRESH_LIMIT {
                return Err(VigilarError::Assertion {
                    message: format!(
                        "after {HISTORY_REFRESH_LIMIT} refreshes, newest history row is {shown:?}, \
                         expected {expected_name:?}"
                    ),
                });
            }
            refreshes += 1;
            warn!(refreshes, "uploaded file not on top yet; refreshing via tab switch");
            self.switch_tabs(refresh_tabs).await?;
        };

        let date_time = wait::present(
            self.page,
            &Locator::new(statement::HISTORY_FIRST_DATETIME),
        )
        .await?
        .text_content()
        .await?
        .trim()
        .to_string();
        info!(%date_time, "first row timestamp");

        self.verify_row_date_is_today(&date_time)?;

        wait::present(
            self.page,
            &Locator::new(statement::STATUS_PROCESSING).with_timeout_secs(10),
        )
        .await?;
        info!("uploaded file verified and processing");

        Ok(HistoryEntry {
            filename,
            date_time,
        })
    }

    /// Row timestamps render as `MM-DD-YYYY HH:MM:SS`; the date half must be
    /// today for a file uploaded moments ago.
    fn verify_row_date_is_today(&self, date_time: &str) -> VigilarResult<()> {
        let mut parts = date_time.split_whitespace();
        let date_str = parts.next().unwrap_or_default();
        let time_str = parts.next_back().unwrap_or_default();

        let date = NaiveDate::parse_from_str(date_str, "%m-%d-%Y").map_err(|e| {
            VigilarError::Assertion {
                message: format!("cannot parse row date {date_str:?}: {e}"),
            }
        })?;
        NaiveTime::parse_from_str(time_str, "%H:%M:%S").map_err(|e| VigilarError::Assertion {
            message: format!("cannot parse row time {time_str:?}: {e}"),
        })?;

        let today = Local::now().date_naive();
        if date != today {
            return Err(VigilarError::Assertion {
                message: format!("row date {date} is not today ({today})"),
            });
        }
        Ok(())
    }

    async fn switch_tabs(&self, (away, back): (Tab, Tab)) -> VigilarResult<()> {
        // Recovery path: plain clicks, no selected-state assertions; a
        // lagging tab attribute must not fail the run here.
        self.page
            .click(Locator::new(away.locator()).selector())
            .await?;
        self.page
            .click(Locator::new(back.locator()).selector())
            .await?;
        Ok(())
    }

    /// Poll the uploaded file's row to a terminal status, downloading the
    /// output on completion. Stalls and failures are reported in the
    /// [`PollOutcome`], not raised.
    pub async fn poll_file_status(
        &self,
        entry: &HistoryEntry,
        pages: u32,
        refresh_tabs: (Tab, Tab),
        download_dir: &Path,
    ) -> VigilarResult<PollOutcome> {
        let status_loc = statement::row_status(&entry.filename, &entry.date_time);
        let download_loc = statement::row_download(&entry.filename, &entry.date_time);
        let preview_loc = statement::row_preview(&entry.filename, &entry.date_time);
        info!(%status_loc, "dynamic row locators built");

        for loc in [&status_loc, &download_loc, &preview_loc] {
            wait::present(self.page, &Locator::new(loc.clone()).with_timeout_secs(50)).await?;
        }

        let mut source = HistoryRowSource {
            page: self.page,
            status: Locator::new(status_loc),
            download: Locator::new(download_loc),
            preview: Locator::new(preview_loc),
            refresh_tabs,
            download_dir: download_dir.to_path_buf(),
        };

        StatusPoller::new(pages).run(&mut source).await
    }

    /// Search the history table by file name and assert the row is listed
    pub async fn search_history(&self, file_name: &str) -> VigilarResult<()> {
        wait::clickable(
            self.page,
            &Locator::new(statement::HISTORY_SEARCH_BAR).with_timeout_secs(20),
        )
        .await?
        .fill(file_name)
        .await?;

        let rows = Locator::new(statement::HISTORY_FILE_NAMES).with_timeout_secs(10);
        wait::present(self.page, &rows).await?;
        let names = self
            .page
            .attribute_all(rows.selector(), "data-testid")
            .await?;

        let found = names.iter().flatten().any(|shown| {
            shown.trim().eq_ignore_ascii_case(file_name.trim())
        });
        if !found {
            return Err(VigilarError::Assertion {
                message: format!("searched file {file_name:?} not listed; rows: {names:?}"),
            });
        }
        info!(%file_name, "search result verified");
        Ok(())
    }

    /// Verify the extraction output screen: either a definite failure banner
    /// (raised as an assertion) or the rendered document plus data table.
    pub async fn verify_extraction_output(&self) -> VigilarResult<()> {
        let banner = Locator::new(home::OUTPUT_ERROR_BANNER);
        if self.page.count(banner.selector()).await.unwrap_or(0) > 0 {
            let message = self
                .page
                .text(banner.selector())
                .await?
                .unwrap_or_default();
            if message.contains("File processing unsuccessful") {
                return Err(VigilarError::Assertion {
                    message: format!("extraction failed; UI reports {:?}", message.trim()),
                });
            }
        }

        wait::present(
            self.page,
            &Locator::new(home::OUTPUT_VIEWER).with_timeout_secs(60),
        )
        .await?;
        info!("rendered source document present");

        wait::present(self.page, &Locator::new(statement::OUTPUT_TABLE_HEADERS)).await?;
        let headers = self
            .page
            .text_all(Locator::new(statement::OUTPUT_TABLE_HEADERS).selector())
            .await?;
        info!(count = headers.len(), ?headers, "output table headers present");

        wait::present(self.page, &Locator::new(statement::OUTPUT_TABLE_BODY)).await?;
        info!("output table body present");
        Ok(())
    }

    /// From the history table, open the first enabled preview and verify the
    /// Back button returns to the upload screen.
    pub async fn verify_back_button_from_output(&self) -> VigilarResult<()> {
        wait::clickable(
            self.page,
            &Locator::new(statement::FIRST_ENABLED_PREVIEW).with_timeout_secs(80),
        )
        .await?
        .click()
        .await?;
        self.verify_extraction_output().await?;

        wait::clickable(
            self.page,
            &Locator::new(statement::OUTPUT_BACK_BUTTON).with_timeout_secs(30),
        )
        .await?
        .click()
        .await?;
        wait::present(
            self.page,
            &Locator::new(home::UPLOAD_FILE_INPUT).with_timeout_secs(100),
        )
        .await?;
        info!("back button returned to the upload screen");
        Ok(())
    }

    /// From the history table, open the first enabled preview and verify the
    /// History button returns to a fully populated history table.
    pub async fn verify_history_button_from_output(&self) -> VigilarResult<()> {
        wait::clickable(
            self.page,
            &Locator::new(statement::FIRST_ENABLED_PREVIEW).with_timeout_secs(80),
        )
        .await?
        .click()
        .await?;
        self.verify_extraction_output().await?;

        wait::clickable(
            self.page,
            &Locator::new(statement::OUTPUT_HISTORY_BUTTON).with_timeout_secs(30),
        )
        .await?
        .click()
        .await?;

        let rows = Locator::new(statement::HISTORY_FILE_NAMES).with_timeout_secs(100);
        wait::present(self.page, &rows).await?;
        let shown = self.page.count(rows.selector()).await?;
        if shown != HISTORY_PAGE_SIZE {
            return Err(VigilarError::Assertion {
                message: format!(
                    "history shows {shown} rows, expected the full page of {HISTORY_PAGE_SIZE}"
                ),
            });
        }
        info!("history button returned to a full history table");
        Ok(())
    }

    /// Submit the file from the output screen, confirming the dialog
    pub async fn submit_from_output(&self) -> VigilarResult<()> {
        wait::clickable(
            self.page,
            &Locator::new(home::SUBMIT_BUTTON).with_timeout_secs(50),
        )
        .await?;
        wait::clickable(
            self.page,
            &Locator::new(home::SUBMIT_BUTTON).with_timeout_secs(15),
        )
        .await?
        .click()
        .await?;
        wait::clickable(self.page, &Locator::new(statement::PROCEED_BUTTON))
            .await?
            .click()
            .await?;
        Ok(())
    }

    /// Jump to the support portal by swapping the URL's section segment
    pub async fn go_to_support_portal(&self) -> VigilarResult<()> {
        wait::url_contains(self.page, "extraction", std::time::Duration::from_secs(60)).await?;
        let current = self.page.context().await.url;
        let portal = current.replace("extraction", "history");
        info!(from = %current, to = %portal, "switching to the support portal");
        self.page.goto(&portal).await
    }

    /// Search the support portal for the uploaded file's completed row and
    /// open it. Returns whether the row was found; absence is logged, not
    /// raised, because portal indexing can lag the module history.
    pub async fn search_in_support_portal(
        &self,
        filename: &str,
        date_time: &str,
    ) -> VigilarResult<bool> {
        wait::present(
            self.page,
            &Locator::new(statement::PORTAL_PAGE_SIZE).with_timeout_secs(40),
        )
        .await?;
        self.page
            .select_value(Locator::new(statement::PORTAL_PAGE_SIZE).selector(), "100")
            .await?;

        wait::clickable(
            self.page,
            &Locator::new(statement::PORTAL_SEARCH_BAR).with_timeout_secs(20),
        )
        .await?
        .fill(filename)
        .await?;

        let row = statement::portal_completed_row(filename, date_time);
        info!(%row, "portal row locator built");
        match self.page.click(Locator::new(row).selector()).await {
            Ok(()) => {
                info!("uploaded file found in the support portal");
                Ok(true)
            }
            Err(err) => {
                warn!(%err, "uploaded file not found in the support portal");
                Ok(false)
            }
        }
    }
}

/// [`StatusSource`] over the uploaded file's history row
struct HistoryRowSource<'d, D: PageDriver> {
    page: &'d D,
    status: Locator,
    download: Locator,
    preview: Locator,
    refresh_tabs: (Tab, Tab),
    download_dir: PathBuf,
}

#[async_trait]
impl<D: PageDriver> StatusSource for HistoryRowSource<'_, D> {
    async fn read_status(&mut self) -> VigilarResult<String> {
        Ok(self
            .page
            .attribute(self.status.selector(), "data-testid")
            .await?
            .unwrap_or_default())
    }

    async fn read_download_marker(&mut self) -> VigilarResult<String> {
        Ok(self
            .page
            .attribute(self.download.selector(), "data-testid")
            .await?
            .unwrap_or_default())
    }

    async fn read_preview_marker(&mut self) -> VigilarResult<String> {
        Ok(self
            .page
            .attribute(self.preview.selector(), "data-testid")
            .await?
            .unwrap_or_default())
    }

    async fn refresh(&mut self) -> VigilarResult<()> {
        let (away, back) = self.refresh_tabs;
        self.page.click(Locator::new(away.locator()).selector()).await?;
        self.page.click(Locator::new(back.locator()).selector()).await?;
        Ok(())
    }

    async fn download(&mut self) -> VigilarResult<PathBuf> {
        self.page
            .download_via(self.download.selector(), &self.download_dir)
            .await
    }
}
