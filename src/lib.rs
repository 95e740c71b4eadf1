//! sfwa-harness: conformance checks for generated web artifacts.
//!
//! Validates an HTML document and its script against an `sfwa-abi-1`
//! contract and produces an objective pass/fail report for automated
//! pipelines.
//!
//! # Checks
//!
//! - **Structural** (`html`): required ids (exactly once), a fixed selector
//!   vocabulary, and opt-in data-attribute values, evaluated on the parsed
//!   document tree.
//! - **Behavioral** (`js`): delegated to an external Node.js checker invoked
//!   as `node <harness> --spec <path> --html <path>`, which answers with a
//!   JSON object `{ok, errors?, details?}`.
//!
//! # Exit codes
//!
//! - `0`: every requested check passed
//! - `1`: at least one requested check failed
//! - `2`: harness error (unreadable inputs, unsupported contract dialect,
//!   bad configuration)
//!
//! # Examples
//!
//! ```bash
//! sfwa-harness --spec app.sfwa-abi.json --html app.html
//! sfwa-harness --spec app.sfwa-abi.json --html app.html --mode html --json
//! ```
//!
//! # Crate Structure
//!
//! - [`core`]: engine modules (spec, document, html_check, js_bridge,
//!   compliance, report, config)

pub mod core;

pub use crate::core::compliance::{CheckMode, run as run_compliance};
pub use crate::core::error::HarnessError;
pub use crate::core::report::{CheckKind, CheckResult, ComplianceReport};

use clap::Parser;
use crate::core::config::{ConfigOverrides, HarnessConfig};
use crate::core::js_bridge::NodeBridge;
use std::path::PathBuf;
use tracing::debug;

#[derive(Parser, Debug)]
#[clap(
    name = "sfwa-harness",
    version = env!("CARGO_PKG_VERSION"),
    about = "Check a generated HTML/JS artifact against an sfwa-abi-1 contract"
)]
pub struct Cli {
    /// Path to the sfwa-abi-1 spec JSON.
    #[clap(long)]
    pub spec: PathBuf,
    /// Path to the HTML file under test.
    #[clap(long)]
    pub html: PathBuf,
    /// Which checks to run: structural (html), behavioral (js), or both (all).
    #[clap(long, value_enum, default_value = "both")]
    pub mode: CheckMode,
    /// Emit the machine-readable JSON report instead of text.
    #[clap(long)]
    pub json: bool,
    /// Optional TOML config file (node_bin, js_harness, js_timeout_secs).
    #[clap(long)]
    pub config: Option<PathBuf>,
    /// Node.js executable used for behavioral checks.
    #[clap(long)]
    pub node_bin: Option<String>,
    /// Path to the JS checker script.
    #[clap(long)]
    pub node_harness: Option<PathBuf>,
    /// Behavioral check timeout in seconds; 0 waits indefinitely.
    #[clap(long)]
    pub js_timeout_secs: Option<u64>,
}

impl Cli {
    fn config_overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            config_file: self.config.clone(),
            node_bin: self.node_bin.clone(),
            js_harness: self.node_harness.clone(),
            js_timeout_secs: self.js_timeout_secs,
        }
    }
}

/// Parse arguments, run the requested checks, print the report, and return
/// overall pass/fail. Harness-level problems come back as `Err`.
pub fn run() -> Result<bool, HarnessError> {
    let cli = Cli::parse();
    run_cli(&cli)
}

pub fn run_cli(cli: &Cli) -> Result<bool, HarnessError> {
    // Bridge settings are only read (and validated) when the JS check runs.
    let config = if cli.mode.includes(CheckKind::Js) {
        let config = HarnessConfig::resolve(&cli.config_overrides())?;
        debug!(?config, "resolved configuration");
        config
    } else {
        HarnessConfig::default()
    };

    let bridge = NodeBridge::from_config(&config);
    let report = run_compliance(&cli.spec, &cli.html, cli.mode, &bridge)?;

    if cli.json {
        println!("{}", report.to_json_pretty());
    } else {
        print!("{}", report.render_text());
    }
    Ok(report.ok)
}
