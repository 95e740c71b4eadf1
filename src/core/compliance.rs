//! Compliance runner: loads the contract and artifact once, then runs the
//! requested checks in sequence and folds them into one report.

use crate::core::document::Document;
use crate::core::error::HarnessError;
use crate::core::html_check;
use crate::core::js_bridge::{BehaviorCheck, BehaviorRequest};
use crate::core::report::{CheckKind, ComplianceReport};
use crate::core::spec::Spec;
use clap::ValueEnum;
use std::path::Path;
use tracing::{debug, info};
use ulid::Ulid;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum CheckMode {
    /// Structural HTML checks only.
    #[value(alias = "html")]
    Structural,
    /// Behavioral JS checks only.
    #[value(alias = "js")]
    Behavioral,
    /// Both check kinds.
    #[default]
    #[value(alias = "all")]
    Both,
}

impl CheckMode {
    pub fn includes(self, kind: CheckKind) -> bool {
        matches!(
            (self, kind),
            (CheckMode::Both, _)
                | (CheckMode::Structural, CheckKind::Html)
                | (CheckMode::Behavioral, CheckKind::Js)
        )
    }
}

/// Run the checks selected by `mode`.
///
/// Errors are harness-level only (unreadable inputs, unsupported dialect) and
/// are raised before any checker runs. Check failures land in the report.
pub fn run(
    spec_path: &Path,
    html_path: &Path,
    mode: CheckMode,
    behavior: &dyn BehaviorCheck,
) -> Result<ComplianceReport, HarnessError> {
    let spec = Spec::load(spec_path)?;
    spec.ensure_supported_abi()?;
    let html_text = Document::read_text(html_path)?;

    let run_id = Ulid::new().to_string();
    info!(
        %run_id,
        contract = spec.contract_id.as_deref().unwrap_or("-"),
        ?mode,
        "compliance run started"
    );

    let mut report = ComplianceReport::new(
        spec.abi.clone(),
        spec.contract_id.clone(),
        run_id,
        spec_path,
        html_path,
    );

    if mode.includes(CheckKind::Html) {
        let result = html_check::check_html_text(&spec, &html_text);
        debug!(ok = result.ok, errors = result.errors.len(), "html check done");
        report.record(CheckKind::Html, result);
    }

    if mode.includes(CheckKind::Js) {
        let result = behavior.check(&BehaviorRequest {
            spec_path,
            html_path,
        });
        debug!(ok = result.ok, errors = result.errors.len(), "js check done");
        report.record(CheckKind::Js, result);
    }

    info!(ok = report.ok, "compliance run finished");
    Ok(report)
}
