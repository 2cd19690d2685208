//! Suite configuration: base URL, credentials, browser selection, directories.
//!
//! Loaded from a JSON file (`config.json` by default, `VIGILAR_CONFIG` to
//! override the path). The browser selection and headless flag can also be
//! overridden from the environment so the CLI can export them to the test
//! process.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::result::{VigilarError, VigilarResult};
use crate::session::BrowserKind;

/// Environment variable naming the config file
pub const CONFIG_PATH_ENV: &str = "VIGILAR_CONFIG";
/// Environment variable overriding the browser selection
pub const BROWSER_ENV: &str = "VIGILAR_BROWSER";
/// Environment variable overriding headless mode ("0" disables)
pub const HEADLESS_ENV: &str = "VIGILAR_HEADLESS";

/// Login credentials for the tested deployment
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    /// Account email
    pub email: String,
    /// Account password
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Configuration for one suite run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteConfig {
    /// Base URL of the deployment under test
    pub base_url: String,
    /// Login credentials
    pub login: Credentials,
    /// Browser engine name (chromium | chrome | edge)
    #[serde(default = "default_browser")]
    pub browser: String,
    /// Run the browser headless
    #[serde(default = "default_headless")]
    pub headless: bool,
    /// OS downloads directory (defaults to `$HOME/Downloads`)
    #[serde(default)]
    pub downloads_dir: Option<PathBuf>,
    /// Working directory for downloaded output archives
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Directory holding per-option input files
    #[serde(default = "default_testdata_dir")]
    pub testdata_dir: PathBuf,
}

fn default_browser() -> String {
    "chromium".to_string()
}

const fn default_headless() -> bool {
    true
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("download_output_file")
}

fn default_testdata_dir() -> PathBuf {
    PathBuf::from("testdata")
}

impl SuiteConfig {
    /// Load from the default location (`VIGILAR_CONFIG` or `config.json`),
    /// applying environment overrides.
    pub fn load() -> VigilarResult<Self> {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "config.json".to_string());
        Self::from_path(Path::new(&path))
    }

    /// Load from an explicit path, applying environment overrides
    pub fn from_path(path: &Path) -> VigilarResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| VigilarError::Config {
            message: format!("cannot read {}: {e}", path.display()),
        })?;
        let mut config: Self = serde_json::from_str(&raw).map_err(|e| VigilarError::Config {
            message: format!("cannot parse {}: {e}", path.display()),
        })?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(browser) = std::env::var(BROWSER_ENV) {
            if !browser.is_empty() {
                self.browser = browser;
            }
        }
        if let Ok(headless) = std::env::var(HEADLESS_ENV) {
            self.headless = headless != "0";
        }
    }

    /// The parsed browser selection
    pub fn browser_kind(&self) -> VigilarResult<BrowserKind> {
        self.browser.parse()
    }

    /// The OS downloads directory
    #[must_use]
    pub fn downloads_dir(&self) -> PathBuf {
        self.downloads_dir.clone().unwrap_or_else(|| {
            let home = std::env::var("HOME")
                .or_else(|_| std::env::var("USERPROFILE"))
                .unwrap_or_else(|_| ".".to_string());
            Path::new(&home).join("Downloads")
        })
    }

    /// Working directory for a section/option pair
    #[must_use]
    pub fn section_output_dir(&self, section: &str, option: &str) -> PathBuf {
        self.output_dir.join(section).join(option)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_json() -> &'static str {
        r#"{
            "base_url": "https://app.dociq.test",
            "login": {"email": "qa@dociq.test", "password": "hunter2"},
            "browser": "chrome"
        }"#
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(sample_json().as_bytes()).unwrap();
        let config = SuiteConfig::from_path(file.path()).unwrap();
        assert_eq!(config.base_url, "https://app.dociq.test");
        assert_eq!(config.browser_kind().unwrap(), BrowserKind::Chrome);
        assert!(config.headless);
        assert_eq!(config.output_dir, PathBuf::from("download_output_file"));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = SuiteConfig::from_path(Path::new("/nonexistent/config.json")).unwrap_err();
        assert!(matches!(err, VigilarError::Config { .. }));
    }

    #[test]
    fn test_debug_redacts_password() {
        let creds = Credentials {
            email: "qa@dociq.test".into(),
            password: "hunter2".into(),
        };
        let debug = format!("{creds:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("qa@dociq.test"));
    }

    #[test]
    fn test_section_output_dir_layout() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(sample_json().as_bytes()).unwrap();
        let config = SuiteConfig::from_path(file.path()).unwrap();
        assert_eq!(
            config.section_output_dir("bank_statement", "bank_statement"),
            PathBuf::from("download_output_file/bank_statement/bank_statement")
        );
    }
}
