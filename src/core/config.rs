//! Harness configuration.
//!
//! Layers, later wins: built-in defaults, an optional TOML file, `SFWA_*`
//! environment variables, then explicit CLI flags.

use crate::core::error::HarnessError;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_NODE_BIN: &str = "node";
pub const DEFAULT_JS_HARNESS: &str = "sfwa_js_harness.mjs";
/// Bridge timeout when nothing overrides it. Zero disables the timeout.
pub const DEFAULT_JS_TIMEOUT_SECS: u64 = 120;

pub const ENV_NODE_BIN: &str = "SFWA_NODE_BIN";
pub const ENV_JS_HARNESS: &str = "SFWA_JS_HARNESS";
pub const ENV_JS_TIMEOUT_SECS: &str = "SFWA_JS_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    pub node_bin: String,
    pub js_harness: PathBuf,
    pub js_timeout: Option<Duration>,
}

/// On-disk shape of `--config <file>`. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub node_bin: Option<String>,
    pub js_harness: Option<PathBuf>,
    pub js_timeout_secs: Option<u64>,
}

/// Values given explicitly on the command line.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_file: Option<PathBuf>,
    pub node_bin: Option<String>,
    pub js_harness: Option<PathBuf>,
    pub js_timeout_secs: Option<u64>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        HarnessConfig {
            node_bin: DEFAULT_NODE_BIN.to_string(),
            js_harness: default_js_harness_path(),
            js_timeout: timeout_from_secs(DEFAULT_JS_TIMEOUT_SECS),
        }
    }
}

/// The checker script shipped next to the binary, or a cwd-relative path when
/// the executable location is unknown.
fn default_js_harness_path() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(DEFAULT_JS_HARNESS)))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_JS_HARNESS))
}

fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

impl HarnessConfig {
    pub fn resolve(overrides: &ConfigOverrides) -> Result<HarnessConfig, HarnessError> {
        let mut config = HarnessConfig::default();
        if let Some(path) = &overrides.config_file {
            config.apply_file(&load_config_file(path)?);
        }
        config.apply_env(|key| std::env::var(key).ok())?;
        config.apply_overrides(overrides);
        Ok(config)
    }

    pub fn apply_file(&mut self, file: &ConfigFile) {
        if let Some(bin) = &file.node_bin {
            self.node_bin = bin.clone();
        }
        if let Some(harness) = &file.js_harness {
            self.js_harness = harness.clone();
        }
        if let Some(secs) = file.js_timeout_secs {
            self.js_timeout = timeout_from_secs(secs);
        }
    }

    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), HarnessError> {
        if let Some(bin) = lookup(ENV_NODE_BIN).filter(|v| !v.trim().is_empty()) {
            self.node_bin = bin;
        }
        if let Some(harness) = lookup(ENV_JS_HARNESS).filter(|v| !v.trim().is_empty()) {
            self.js_harness = PathBuf::from(harness);
        }
        if let Some(raw) = lookup(ENV_JS_TIMEOUT_SECS) {
            let secs = raw.trim().parse::<u64>().map_err(|e| {
                HarnessError::Config(format!("{}='{}': {}", ENV_JS_TIMEOUT_SECS, raw, e))
            })?;
            self.js_timeout = timeout_from_secs(secs);
        }
        Ok(())
    }

    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(bin) = &overrides.node_bin {
            self.node_bin = bin.clone();
        }
        if let Some(harness) = &overrides.js_harness {
            self.js_harness = harness.clone();
        }
        if let Some(secs) = overrides.js_timeout_secs {
            self.js_timeout = timeout_from_secs(secs);
        }
    }
}

pub fn load_config_file(path: &Path) -> Result<ConfigFile, HarnessError> {
    let content = fs::read_to_string(path).map_err(|e| {
        HarnessError::Config(format!("cannot read {}: {}", path.display(), e))
    })?;
    toml::from_str(&content)
        .map_err(|e| HarnessError::Config(format!("invalid {}: {}", path.display(), e)))
}
