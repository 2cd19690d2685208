//! File-processing status poller.
//!
//! Server-side extraction jobs surface their state through a status attribute
//! on the history row. The poller re-reads that attribute until it reaches a
//! terminal state, applying a different wait/retry policy per intermediate
//! state, and periodically forces a UI refresh (tab switch away and back) to
//! defeat rows that fail to auto-refresh.
//!
//! Stalling (waiting too long in `in-queue` or `processing`) is reported in
//! the [`PollOutcome`], never raised: the caller decides whether a stalled or
//! `failed` job fails the test. Marker assertions on the terminal states are
//! the exception; a completed job whose download/preview controls are not in
//! their enabled form is a hard assertion failure.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{error, info};

use crate::result::{VigilarError, VigilarResult};

/// Observed processing state of a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    /// Job accepted, not yet started
    InQueue,
    /// Job running
    Processing,
    /// Finished, but the row's controls are still disabled
    PartiallyDone,
    /// Finished, controls enabled
    Completed,
    /// Job failed
    Failed,
    /// A status value outside the known set
    Unknown(String),
}

impl FileStatus {
    /// Parse the raw attribute value (trimmed, case-insensitive)
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "in-queue" => Self::InQueue,
            "processing" => Self::Processing,
            "partially-done" => Self::PartiallyDone,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Whether no further transition is expected
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::PartiallyDone | Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InQueue => f.write_str("in-queue"),
            Self::Processing => f.write_str("processing"),
            Self::PartiallyDone => f.write_str("partially-done"),
            Self::Completed => f.write_str("completed"),
            Self::Failed => f.write_str("failed"),
            Self::Unknown(raw) => write!(f, "unknown({raw})"),
        }
    }
}

/// Expected marker values on the row's download/preview controls
pub mod markers {
    /// Download control, enabled form
    pub const DOWNLOAD_ENABLED: &str = "download-enabled";
    /// Download control, disabled form
    pub const DOWNLOAD_DISABLED: &str = "download-disabled";
    /// Preview control, enabled form
    pub const PREVIEW_ENABLED: &str = "preview-enabled";
    /// Preview control, disabled form
    pub const PREVIEW_DISABLED: &str = "preview-disabled";
}

/// Per-state wait/retry policy
#[derive(Debug, Clone)]
pub struct PollPolicy {
    /// Sleep before every status read
    pub pre_read_sleep: Duration,
    /// Sleep applied in the in-queue and processing states
    pub state_sleep: Duration,
    /// Maximum polls tolerated in the in-queue state
    pub in_queue_limit: u32,
    /// Seconds of processing budget granted per document page
    pub per_page_secs: u64,
    /// Iterations before the UI-refresh recovery kicks in
    pub refresh_after: u32,
    /// Maximum consecutive unrecognized status reads before giving up
    pub unknown_limit: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            pre_read_sleep: Duration::from_secs(2),
            state_sleep: Duration::from_secs(5),
            in_queue_limit: 6,
            per_page_secs: 55,
            refresh_after: 2,
            unknown_limit: 3,
        }
    }
}

impl PollPolicy {
    /// Policy with all sleeps zeroed, for unit tests
    #[must_use]
    pub fn immediate() -> Self {
        Self {
            pre_read_sleep: Duration::ZERO,
            state_sleep: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Processing-poll budget for a document of `pages` pages
    #[must_use]
    pub fn processing_limit(&self, pages: u32) -> u32 {
        let budget_secs = u64::from(pages.max(1)) * self.per_page_secs;
        (budget_secs / self.state_sleep.as_secs().max(1)) as u32
    }
}

/// The row being observed: status and marker reads, UI refresh, download
#[async_trait]
pub trait StatusSource: Send {
    /// Read the raw status attribute
    async fn read_status(&mut self) -> VigilarResult<String>;

    /// Read the download control's marker attribute
    async fn read_download_marker(&mut self) -> VigilarResult<String>;

    /// Read the preview control's marker attribute
    async fn read_preview_marker(&mut self) -> VigilarResult<String>;

    /// Force a UI refresh (switch away from and back to the tab)
    async fn refresh(&mut self) -> VigilarResult<()>;

    /// Trigger the download and persist it; returns the saved path
    async fn download(&mut self) -> VigilarResult<PathBuf>;
}

/// Result of a polling run
#[derive(Debug)]
pub struct PollOutcome {
    /// Final observed status
    pub status: FileStatus,
    /// Raw attribute value of the last read
    pub raw: String,
    /// Total status reads performed
    pub polls: u32,
    /// True when the loop gave up waiting rather than reaching a terminal state
    pub stalled: bool,
    /// Where the output archive was saved, when the job completed
    pub downloaded_to: Option<PathBuf>,
}

impl PollOutcome {
    /// Whether the job reached `completed`
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == FileStatus::Completed
    }
}

/// Drives the status state machine over a [`StatusSource`]
#[derive(Debug)]
pub struct StatusPoller {
    policy: PollPolicy,
    pages: u32,
}

impl StatusPoller {
    /// Poller for a document with the given page count, default policy
    #[must_use]
    pub fn new(pages: u32) -> Self {
        Self {
            policy: PollPolicy::default(),
            pages,
        }
    }

    /// Override the policy (tests zero the sleeps)
    #[must_use]
    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Observe the job to a terminal state or a stall.
    ///
    /// Never returns an error for a stalled or failed job, only for driver
    /// failures and for terminal-state marker assertions.
    pub async fn run<S: StatusSource>(&self, source: &mut S) -> VigilarResult<PollOutcome> {
        let processing_limit = self.policy.processing_limit(self.pages);
        let mut waits: u32 = 0;
        let mut unknown_reads: u32 = 0;
        let mut polls: u32 = 0;

        loop {
            if polls >= self.policy.refresh_after {
                source.refresh().await?;
            }

            sleep(self.policy.pre_read_sleep).await;
            let raw = source.read_status().await?;
            polls += 1;
            let status = FileStatus::parse(&raw);
            info!(%status, polls, "file status read");

            match status {
                FileStatus::Failed => {
                    error!("file processing failed");
                    return Ok(PollOutcome {
                        status,
                        raw,
                        polls,
                        stalled: false,
                        downloaded_to: None,
                    });
                }

                FileStatus::InQueue => {
                    sleep(self.policy.state_sleep).await;
                    waits += 1;
                    if waits > self.policy.in_queue_limit {
                        error!(waits, "file still in queue; giving up");
                        return Ok(PollOutcome {
                            status,
                            raw,
                            polls,
                            stalled: true,
                            downloaded_to: None,
                        });
                    }
                }

                FileStatus::Processing => {
                    sleep(self.policy.state_sleep).await;
                    waits += 1;
                    if waits > processing_limit {
                        error!(
                            waits,
                            budget_secs = u64::from(processing_limit) * self.policy.state_sleep.as_secs(),
                            "file not processed within budget; giving up"
                        );
                        return Ok(PollOutcome {
                            status,
                            raw,
                            polls,
                            stalled: true,
                            downloaded_to: None,
                        });
                    }
                }

                FileStatus::PartiallyDone => {
                    // Finished but the UI has not enabled the controls yet;
                    // both markers must be in their disabled form and no
                    // download is attempted.
                    self.assert_marker(
                        source.read_download_marker().await?,
                        markers::DOWNLOAD_DISABLED,
                    )?;
                    self.assert_marker(
                        source.read_preview_marker().await?,
                        markers::PREVIEW_DISABLED,
                    )?;
                    info!("processing finished; controls still disabled");
                    return Ok(PollOutcome {
                        status,
                        raw,
                        polls,
                        stalled: false,
                        downloaded_to: None,
                    });
                }

                FileStatus::Completed => {
                    self.assert_marker(
                        source.read_download_marker().await?,
                        markers::DOWNLOAD_ENABLED,
                    )?;
                    self.assert_marker(
                        source.read_preview_marker().await?,
                        markers::PREVIEW_ENABLED,
                    )?;
                    let saved = source.download().await?;
                    info!(path = %saved.display(), "output downloaded");
                    return Ok(PollOutcome {
                        status,
                        raw,
                        polls,
                        stalled: false,
                        downloaded_to: Some(saved),
                    });
                }

                FileStatus::Unknown(ref value) => {
                    // Not one of the known states; without this branch the
                    // loop would spin forever on a malformed value.
                    unknown_reads += 1;
                    error!(value, unknown_reads, "unrecognized file status");
                    if unknown_reads >= self.policy.unknown_limit {
                        return Ok(PollOutcome {
                            status,
                            raw,
                            polls,
                            stalled: true,
                            downloaded_to: None,
                        });
                    }
                    sleep(self.policy.state_sleep).await;
                }
            }
        }
    }

    fn assert_marker(&self, actual: String, expected: &str) -> VigilarResult<()> {
        if actual.trim().to_lowercase() == expected {
            Ok(())
        } else {
            Err(VigilarError::Assertion {
                message: format!("expected control marker {expected:?}, found {actual:?}"),
            })
        }
    }
}

async fn sleep(d: Duration) {
    if !d.is_zero() {
        tokio::time::sleep(d).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Scripted source: plays back a fixed sequence of status reads
    struct Scripted {
        statuses: Vec<&'static str>,
        cursor: usize,
        download_marker: &'static str,
        preview_marker: &'static str,
        refreshes: u32,
        downloads: u32,
    }

    impl Scripted {
        fn new(statuses: Vec<&'static str>) -> Self {
            Self {
                statuses,
                cursor: 0,
                download_marker: markers::DOWNLOAD_ENABLED,
                preview_marker: markers::PREVIEW_ENABLED,
                refreshes: 0,
                downloads: 0,
            }
        }

        fn with_markers(mut self, download: &'static str, preview: &'static str) -> Self {
            self.download_marker = download;
            self.preview_marker = preview;
            self
        }
    }

    #[async_trait]
    impl StatusSource for Scripted {
        async fn read_status(&mut self) -> VigilarResult<String> {
            let idx = self.cursor.min(self.statuses.len() - 1);
            self.cursor += 1;
            Ok((*self.statuses[idx]).to_string())
        }

        async fn read_download_marker(&mut self) -> VigilarResult<String> {
            Ok(self.download_marker.to_string())
        }

        async fn read_preview_marker(&mut self) -> VigilarResult<String> {
            Ok(self.preview_marker.to_string())
        }

        async fn refresh(&mut self) -> VigilarResult<()> {
            self.refreshes += 1;
            Ok(())
        }

        async fn download(&mut self) -> VigilarResult<PathBuf> {
            self.downloads += 1;
            Ok(PathBuf::from("/tmp/output.zip"))
        }
    }

    fn poller(pages: u32) -> StatusPoller {
        StatusPoller::new(pages).with_policy(PollPolicy::immediate())
    }

    mod parse_tests {
        use super::*;

        #[test]
        fn test_known_statuses() {
            assert_eq!(FileStatus::parse("in-queue"), FileStatus::InQueue);
            assert_eq!(FileStatus::parse(" Processing "), FileStatus::Processing);
            assert_eq!(
                FileStatus::parse("partially-done"),
                FileStatus::PartiallyDone
            );
            assert_eq!(FileStatus::parse("COMPLETED"), FileStatus::Completed);
            assert_eq!(FileStatus::parse("failed"), FileStatus::Failed);
        }

        #[test]
        fn test_unknown_status() {
            assert_eq!(
                FileStatus::parse("queued-weird"),
                FileStatus::Unknown("queued-weird".to_string())
            );
        }

        #[test]
        fn test_terminality() {
            assert!(FileStatus::Completed.is_terminal());
            assert!(FileStatus::Failed.is_terminal());
            assert!(FileStatus::PartiallyDone.is_terminal());
            assert!(!FileStatus::InQueue.is_terminal());
            assert!(!FileStatus::Processing.is_terminal());
            assert!(!FileStatus::Unknown("x".into()).is_terminal());
        }
    }

    mod policy_tests {
        use super::*;

        #[test]
        fn test_processing_limit_scales_with_pages() {
            let policy = PollPolicy::default();
            // pages * 55s of budget at one poll per 5s
            assert_eq!(policy.processing_limit(1), 11);
            assert_eq!(policy.processing_limit(4), 44);
        }

        #[test]
        fn test_processing_limit_zero_pages_clamped() {
            let policy = PollPolicy::default();
            assert_eq!(policy.processing_limit(0), policy.processing_limit(1));
        }
    }

    mod poller_tests {
        use super::*;

        #[tokio::test]
        async fn test_in_queue_stalls_after_sixth_increment_without_raising() {
            let mut source = Scripted::new(vec![
                "in-queue", "in-queue", "in-queue", "in-queue", "in-queue", "in-queue", "in-queue",
            ]);
            let outcome = poller(1).run(&mut source).await.unwrap();
            assert!(outcome.stalled);
            assert_eq!(outcome.status, FileStatus::InQueue);
            assert_eq!(outcome.polls, 7);
            assert_eq!(source.downloads, 0);
        }

        #[tokio::test]
        async fn test_completed_asserts_markers_then_downloads() {
            let mut source = Scripted::new(vec!["processing", "processing", "completed"]);
            let outcome = poller(1).run(&mut source).await.unwrap();
            assert!(outcome.is_completed());
            assert!(!outcome.stalled);
            assert_eq!(source.downloads, 1);
            assert_eq!(
                outcome.downloaded_to.as_deref(),
                Some(std::path::Path::new("/tmp/output.zip"))
            );
        }

        #[tokio::test]
        async fn test_completed_with_disabled_marker_is_assertion_failure() {
            let mut source = Scripted::new(vec!["completed"])
                .with_markers(markers::DOWNLOAD_DISABLED, markers::PREVIEW_ENABLED);
            let err = poller(1).run(&mut source).await.unwrap_err();
            assert!(matches!(err, VigilarError::Assertion { .. }));
            assert_eq!(source.downloads, 0);
        }

        #[tokio::test]
        async fn test_partially_done_asserts_disabled_and_never_downloads() {
            let mut source = Scripted::new(vec!["processing", "partially-done"])
                .with_markers(markers::DOWNLOAD_DISABLED, markers::PREVIEW_DISABLED);
            let outcome = poller(1).run(&mut source).await.unwrap();
            assert_eq!(outcome.status, FileStatus::PartiallyDone);
            assert_eq!(source.downloads, 0);
        }

        #[tokio::test]
        async fn test_failed_returns_normally() {
            let mut source = Scripted::new(vec!["in-queue", "processing", "failed"]);
            let outcome = poller(1).run(&mut source).await.unwrap();
            assert_eq!(outcome.status, FileStatus::Failed);
            assert!(!outcome.stalled);
        }

        #[tokio::test]
        async fn test_processing_budget_scales_with_page_count() {
            // 2 pages => 22-poll budget; a 30-read processing sequence stalls.
            let mut source = Scripted::new(vec!["processing"; 30]);
            let outcome = poller(2).run(&mut source).await.unwrap();
            assert!(outcome.stalled);
            assert_eq!(outcome.status, FileStatus::Processing);
            assert_eq!(outcome.polls, 23);
        }

        #[tokio::test]
        async fn test_unknown_status_escapes_after_bounded_retries() {
            let mut source = Scripted::new(vec!["something-new"; 10]);
            let outcome = poller(1).run(&mut source).await.unwrap();
            assert!(outcome.stalled);
            assert_eq!(
                outcome.status,
                FileStatus::Unknown("something-new".to_string())
            );
            assert_eq!(outcome.polls, 3);
        }

        #[tokio::test]
        async fn test_refresh_kicks_in_after_first_two_reads() {
            let mut source = Scripted::new(vec![
                "processing",
                "processing",
                "processing",
                "completed",
            ]);
            let _ = poller(1).run(&mut source).await.unwrap();
            // Iterations 3 and 4 refresh before reading.
            assert_eq!(source.refreshes, 2);
        }
    }
}
