//! Check results and the per-run compliance report.

use crate::core::output;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt::Write as _;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CheckResult {
    pub ok: bool,
    pub errors: Vec<String>,
    pub details: Map<String, Value>,
}

impl CheckResult {
    pub fn passed() -> Self {
        CheckResult {
            ok: true,
            ..Default::default()
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        CheckResult {
            ok: false,
            errors: vec![error.into()],
            details: Map::new(),
        }
    }

    pub fn with_detail(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckKind {
    Html,
    Js,
}

impl CheckKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CheckKind::Html => "html",
            CheckKind::Js => "js",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportSource {
    pub spec: String,
    pub html: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReportResults {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<CheckResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub js: Option<CheckResult>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceReport {
    pub abi: Option<String>,
    pub contract_id: Option<String>,
    pub run_id: String,
    pub source: ReportSource,
    pub results: ReportResults,
    pub ok: bool,
}

impl ComplianceReport {
    pub fn new(
        abi: Option<String>,
        contract_id: Option<String>,
        run_id: String,
        spec_path: &Path,
        html_path: &Path,
    ) -> Self {
        ComplianceReport {
            abi,
            contract_id,
            run_id,
            source: ReportSource {
                spec: spec_path.display().to_string(),
                html: html_path.display().to_string(),
            },
            results: ReportResults::default(),
            ok: true,
        }
    }

    /// Record one check kind. Overall pass only ever narrows.
    pub fn record(&mut self, kind: CheckKind, result: CheckResult) {
        self.ok = self.ok && result.ok;
        match kind {
            CheckKind::Html => self.results.html = Some(result),
            CheckKind::Js => self.results.js = Some(result),
        }
    }

    pub fn result(&self, kind: CheckKind) -> Option<&CheckResult> {
        match kind {
            CheckKind::Html => self.results.html.as_ref(),
            CheckKind::Js => self.results.js.as_ref(),
        }
    }

    pub fn to_json_pretty(&self) -> String {
        // Every field is a plain string, bool, or JSON value.
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn render_text(&self) -> String {
        use colored::Colorize;

        let verdict = |ok: bool| {
            if ok {
                "PASS".bright_green().to_string()
            } else {
                "FAIL".bright_red().bold().to_string()
            }
        };

        let mut out = String::new();
        let _ = writeln!(
            out,
            "SFWA Harness Report: {}",
            self.contract_id.as_deref().unwrap_or("None")
        );
        for (kind, label) in [(CheckKind::Html, "HTML: "), (CheckKind::Js, "JS:   ")] {
            let Some(result) = self.result(kind) else {
                continue;
            };
            let _ = writeln!(out, "  {}{}", label, verdict(result.ok));
            for error in &result.errors {
                let _ = writeln!(out, "    - {}", output::indent_continuation(error, 6));
            }
        }
        let _ = writeln!(out, "Overall: {}", verdict(self.ok));
        out
    }
}
