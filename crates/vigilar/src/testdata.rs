//! Per-test-module structured input data.
//!
//! Each e2e test module ships a JSON file named after the module (without the
//! `test_` prefix), keyed by test function name (also without the prefix):
//!
//! ```json
//! {
//!     "verify_statement_side_bar_expanded": {
//!         "section": "bank_statement"
//!     },
//!     "verify_uploaded_file_on_history_tab": {
//!         "section": "bank_statement",
//!         "option": "bank_statement",
//!         "file_extn": "pdf",
//!         "success_msg": "File uploaded successfully"
//!     }
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::result::{VigilarError, VigilarResult};

/// Input values for one test case
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CaseData {
    /// Section to navigate to
    #[serde(default)]
    pub section: Option<String>,
    /// Extraction option within the section
    #[serde(default)]
    pub option: Option<String>,
    /// Input file extension filter
    #[serde(default)]
    pub file_extn: Option<String>,
    /// Expected upload success message
    #[serde(default)]
    pub success_msg: Option<String>,
    /// Expected validation error message
    #[serde(default)]
    pub error_msg: Option<String>,
    /// Tab switched away to during UI-refresh recovery
    #[serde(default)]
    pub tab_name1: Option<String>,
    /// Tab switched back to during UI-refresh recovery
    #[serde(default)]
    pub tab_name2: Option<String>,
    /// Anything else the test wants to carry
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl CaseData {
    /// Required field accessor with a useful failure message
    pub fn require<'a>(&self, field: &str, value: &'a Option<String>) -> VigilarResult<&'a str> {
        value.as_deref().ok_or_else(|| VigilarError::Config {
            message: format!("test data is missing the {field:?} field"),
        })
    }

    /// The `section` field, required
    pub fn section(&self) -> VigilarResult<&str> {
        self.require("section", &self.section)
    }

    /// The `option` field, required
    pub fn option(&self) -> VigilarResult<&str> {
        self.require("option", &self.option)
    }

    /// The `success_msg` field, required
    pub fn success_msg(&self) -> VigilarResult<&str> {
        self.require("success_msg", &self.success_msg)
    }
}

/// All cases for one test module
#[derive(Debug, Clone, Deserialize)]
pub struct TestDataFile {
    #[serde(flatten)]
    cases: HashMap<String, CaseData>,
}

impl TestDataFile {
    /// Load the data file for a module: `<dir>/<module>.json`, where `module`
    /// has any `test_` prefix stripped.
    pub fn load(dir: &Path, module: &str) -> VigilarResult<Self> {
        let name = module.strip_prefix("test_").unwrap_or(module);
        let path = dir.join(format!("{name}.json"));
        let raw = std::fs::read_to_string(&path).map_err(|e| VigilarError::Config {
            message: format!("cannot read test data {}: {e}", path.display()),
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Data for one test function (`test_` prefix stripped from the key)
    pub fn case(&self, test_name: &str) -> VigilarResult<&CaseData> {
        let key = test_name.strip_prefix("test_").unwrap_or(test_name);
        self.cases.get(key).ok_or_else(|| VigilarError::Config {
            message: format!("no test data entry for {key:?}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_module(dir: &Path, name: &str, body: &str) {
        let mut f = std::fs::File::create(dir.join(name)).unwrap();
        f.write_all(body.as_bytes()).unwrap();
    }

    #[test]
    fn test_load_and_key_by_function_name() {
        let dir = tempfile::tempdir().unwrap();
        write_module(
            dir.path(),
            "statement.json",
            r#"{
                "verify_tablist": {"section": "bank_statement"},
                "verify_upload": {
                    "section": "bank_statement",
                    "option": "credit_card",
                    "file_extn": "pdf",
                    "success_msg": "File uploaded successfully"
                }
            }"#,
        );

        let data = TestDataFile::load(dir.path(), "test_statement").unwrap();
        let case = data.case("test_verify_upload").unwrap();
        assert_eq!(case.section().unwrap(), "bank_statement");
        assert_eq!(case.option().unwrap(), "credit_card");
        assert_eq!(case.file_extn.as_deref(), Some("pdf"));
    }

    #[test]
    fn test_missing_case_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        write_module(dir.path(), "statement.json", r#"{"a": {}}"#);
        let data = TestDataFile::load(dir.path(), "statement").unwrap();
        assert!(matches!(
            data.case("nope"),
            Err(VigilarError::Config { .. })
        ));
    }

    #[test]
    fn test_missing_required_field_reports_field_name() {
        let case = CaseData::default();
        let err = case.section().unwrap_err();
        assert!(err.to_string().contains("section"));
    }

    #[test]
    fn test_extra_fields_flatten() {
        let case: CaseData = serde_json::from_str(
            r#"{"section": "redaction", "expected_rows": 30}"#,
        )
        .unwrap();
        assert_eq!(case.extra.get("expected_rows").and_then(|v| v.as_u64()), Some(30));
    }
}
