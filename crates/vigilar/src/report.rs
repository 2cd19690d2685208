//! Static dashboard generation from a machine-readable results file.
//!
//! Pure presentation: deserialize the results JSON the runner wrote,
//! aggregate per module, render HTML for humans and JUnit XML for CI.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::result::VigilarResult;

/// Outcome of one test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    /// Test passed
    Passed,
    /// Test failed
    Failed,
    /// Test was skipped
    Skipped,
}

impl TestStatus {
    /// Whether this outcome counts as passing
    #[must_use]
    pub const fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }
}

/// One test's result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestRecord {
    /// Test name
    pub name: String,
    /// Module the test belongs to
    pub module: String,
    /// Outcome
    pub status: TestStatus,
    /// Wall-clock duration in milliseconds
    #[serde(default)]
    pub duration_ms: u64,
    /// Error message, for failures
    #[serde(default)]
    pub error: Option<String>,
}

/// Per-module aggregate
#[derive(Debug, Clone, Serialize)]
pub struct ModuleSummary {
    /// Module name
    pub module: String,
    /// Total tests
    pub total: usize,
    /// Passed tests
    pub passed: usize,
    /// Failed tests
    pub failed: usize,
    /// Skipped tests
    pub skipped: usize,
    /// Summed duration in milliseconds
    pub duration_ms: u64,
}

/// All results from one run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuiteReport {
    /// Report title
    #[serde(default = "default_title")]
    pub title: String,
    /// Individual results
    #[serde(default)]
    pub records: Vec<TestRecord>,
}

fn default_title() -> String {
    "DocIQ Automation Report".to_string()
}

impl SuiteReport {
    /// Empty report with the default title
    #[must_use]
    pub fn new() -> Self {
        Self {
            title: default_title(),
            records: Vec::new(),
        }
    }

    /// Load from a results JSON file
    pub fn from_json_file(path: &Path) -> VigilarResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write as results JSON
    pub fn write_json(&self, path: &Path) -> VigilarResult<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Add a result
    pub fn add(&mut self, record: TestRecord) {
        self.records.push(record);
    }

    /// Count of passing tests
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.records.iter().filter(|r| r.status.is_passed()).count()
    }

    /// Count of failing tests
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.status == TestStatus::Failed)
            .count()
    }

    /// Total test count
    #[must_use]
    pub fn total(&self) -> usize {
        self.records.len()
    }

    /// Pass rate in [0.0, 1.0]; an empty report passes vacuously
    #[must_use]
    pub fn pass_rate(&self) -> f64 {
        if self.records.is_empty() {
            return 1.0;
        }
        self.passed_count() as f64 / self.records.len() as f64
    }

    /// Whether nothing failed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failed_count() == 0
    }

    /// One-line summary
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{}: {}/{} passed ({:.1}%)",
            self.title,
            self.passed_count(),
            self.total(),
            self.pass_rate() * 100.0
        )
    }

    /// Aggregate results per module, sorted by module name
    #[must_use]
    pub fn module_summaries(&self) -> Vec<ModuleSummary> {
        let mut modules: BTreeMap<&str, ModuleSummary> = BTreeMap::new();
        for record in &self.records {
            let entry = modules
                .entry(record.module.as_str())
                .or_insert_with(|| ModuleSummary {
                    module: record.module.clone(),
                    total: 0,
                    passed: 0,
                    failed: 0,
                    skipped: 0,
                    duration_ms: 0,
                });
            entry.total += 1;
            entry.duration_ms += record.duration_ms;
            match record.status {
                TestStatus::Passed => entry.passed += 1,
                TestStatus::Failed => entry.failed += 1,
                TestStatus::Skipped => entry.skipped += 1,
            }
        }
        modules.into_values().collect()
    }

    /// Write the HTML dashboard
    pub fn write_html(&self, path: &Path) -> VigilarResult<()> {
        std::fs::write(path, self.render_html())?;
        Ok(())
    }

    /// Render the HTML dashboard
    #[must_use]
    pub fn render_html(&self) -> String {
        let mut html = String::new();

        html.push_str(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>DocIQ Automation Dashboard</title>
    <style>
        body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; margin: 20px; }
        .summary { background: #f5f5f5; padding: 20px; border-radius: 8px; margin-bottom: 20px; }
        .progress-bar { background: #ddd; height: 20px; border-radius: 10px; overflow: hidden; }
        .passed { background: #4caf50; height: 100%; }
        table { border-collapse: collapse; width: 100%; margin-bottom: 20px; }
        th, td { text-align: left; padding: 8px 12px; border-bottom: 1px solid #ddd; }
        .test { padding: 10px; margin: 5px 0; border-radius: 4px; }
        .test.pass { background: #e8f5e9; border-left: 4px solid #4caf50; }
        .test.fail { background: #ffebee; border-left: 4px solid #f44336; }
        .test.skip { background: #fff3e0; border-left: 4px solid #ff9800; }
        .error { color: #d32f2f; font-family: monospace; white-space: pre-wrap; }
    </style>
</head>
<body>
"#,
        );

        html.push_str(&format!(
            r#"<div class="summary">
    <h1>{}</h1>
    <h2>Results: {}/{} passed ({:.1}%)</h2>
    <div class="progress-bar">
        <div class="passed" style="width: {:.1}%"></div>
    </div>
    <p>Generated {}</p>
</div>
"#,
            self.title,
            self.passed_count(),
            self.total(),
            self.pass_rate() * 100.0,
            self.pass_rate() * 100.0,
            Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
        ));

        html.push_str("<h2>Modules</h2>\n<table>\n<tr><th>Module</th><th>Total</th><th>Passed</th><th>Failed</th><th>Skipped</th><th>Duration</th></tr>\n");
        for module in self.module_summaries() {
            html.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{:.2}s</td></tr>\n",
                module.module,
                module.total,
                module.passed,
                module.failed,
                module.skipped,
                module.duration_ms as f64 / 1000.0
            ));
        }
        html.push_str("</table>\n");

        html.push_str("<h2>Tests</h2>\n");
        for record in &self.records {
            let class = match record.status {
                TestStatus::Passed => "pass",
                TestStatus::Failed => "fail",
                TestStatus::Skipped => "skip",
            };
            html.push_str(&format!(
                r#"<div class="test {}">
    <strong>{}</strong> - {:?} ({:.2}s)
"#,
                class,
                record.name,
                record.status,
                record.duration_ms as f64 / 1000.0
            ));
            if let Some(error) = &record.error {
                html.push_str(&format!(r#"    <div class="error">{error}</div>"#));
            }
            html.push_str("</div>\n");
        }

        html.push_str("\n</body>\n</html>\n");
        html
    }

    /// Write JUnit XML for CI integration
    pub fn write_junit(&self, path: &Path) -> VigilarResult<()> {
        std::fs::write(path, self.render_junit())?;
        Ok(())
    }

    /// Render JUnit XML
    #[must_use]
    pub fn render_junit(&self) -> String {
        let mut xml = String::new();
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        xml.push('\n');
        let total_secs: f64 = self
            .records
            .iter()
            .map(|r| r.duration_ms as f64 / 1000.0)
            .sum();
        xml.push_str(&format!(
            r#"<testsuite name="{}" tests="{}" failures="{}" time="{total_secs:.3}">"#,
            self.title,
            self.total(),
            self.failed_count(),
        ));
        xml.push('\n');

        for record in &self.records {
            xml.push_str(&format!(
                r#"  <testcase classname="{}" name="{}" time="{:.3}">"#,
                record.module,
                record.name,
                record.duration_ms as f64 / 1000.0
            ));
            match record.status {
                TestStatus::Failed => {
                    let message = record.error.as_deref().unwrap_or("test failed");
                    xml.push_str(&format!(
                        "\n    <failure message=\"{}\"/>\n  ",
                        xml_escape(message)
                    ));
                }
                TestStatus::Skipped => {
                    xml.push_str("\n    <skipped/>\n  ");
                }
                TestStatus::Passed => {}
            }
            xml.push_str("</testcase>\n");
        }

        xml.push_str("</testsuite>\n");
        xml
    }
}

fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
