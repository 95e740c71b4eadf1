//! sfwa-abi contract model.
//!
//! Loading is deliberately lenient: every field is optional and `null` reads
//! as absent, so inspection tooling can load contracts of any dialect. The
//! dialect itself is checked by [`Spec::ensure_supported_abi`], which the
//! compliance runner calls before any check executes.

use crate::core::error::HarnessError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::Path;

/// The only contract dialect this harness understands.
pub const SUPPORTED_ABI: &str = "sfwa-abi-1";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Spec {
    #[serde(default)]
    pub abi: Option<String>,
    #[serde(default)]
    pub contract_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub html: HtmlSection,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct HtmlSection {
    #[serde(default, deserialize_with = "null_as_default")]
    pub requires: HtmlRequires,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HtmlRequires {
    #[serde(default, deserialize_with = "null_as_default")]
    pub ids: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub selectors: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub data_attributes: Vec<DataAttributeRequirement>,
}

/// One `dataAttributes` entry. Entries with no name or no values are not
/// enforced.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DataAttributeRequirement {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub values: Vec<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Spec {
    /// Read and parse a contract file. Does not validate the dialect.
    pub fn load(path: &Path) -> Result<Spec, HarnessError> {
        let content = fs::read_to_string(path).map_err(|e| HarnessError::SpecRead {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_json_str(&content).map_err(|reason| HarnessError::SpecRead {
            path: path.to_path_buf(),
            reason,
        })
    }

    pub fn from_json_str(content: &str) -> Result<Spec, String> {
        let value: serde_json::Value = serde_json::from_str(content).map_err(|e| e.to_string())?;
        if !value.is_object() {
            return Err("top-level value must be a JSON object".to_string());
        }
        serde_json::from_value(value).map_err(|e| e.to_string())
    }

    pub fn ensure_supported_abi(&self) -> Result<(), HarnessError> {
        if self.abi.as_deref() == Some(SUPPORTED_ABI) {
            return Ok(());
        }
        Err(HarnessError::UnsupportedAbi {
            found: self.abi.clone(),
            expected: SUPPORTED_ABI,
        })
    }

    pub fn requires(&self) -> &HtmlRequires {
        &self.html.requires
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_full_spec_parses() {
        let spec = Spec::from_json_str(
            r#"{
                "abi": "sfwa-abi-1",
                "contractId": "todo-app",
                "html": {"requires": {
                    "ids": ["app", "list"],
                    "selectors": ["title", "meta[charset]"],
                    "dataAttributes": [{"name": "data-role", "values": ["item"]}]
                }}
            }"#,
        )
        .unwrap();
        assert_eq!(spec.contract_id.as_deref(), Some("todo-app"));
        assert_eq!(spec.requires().ids, vec!["app", "list"]);
        assert_eq!(spec.requires().selectors.len(), 2);
        assert_eq!(
            spec.requires().data_attributes[0].name.as_deref(),
            Some("data-role")
        );
        assert!(spec.ensure_supported_abi().is_ok());
    }

    #[test]
    fn test_nulls_and_missing_sections_default_to_empty() {
        let spec = Spec::from_json_str(
            r#"{"abi": "sfwa-abi-1", "html": {"requires": {"ids": null,
                "dataAttributes": [{"name": "data-x", "values": null}]}}}"#,
        )
        .unwrap();
        assert!(spec.requires().ids.is_empty());
        assert!(spec.requires().selectors.is_empty());
        assert!(spec.requires().data_attributes[0].values.is_empty());

        let bare = Spec::from_json_str(r#"{"abi": "sfwa-abi-1", "html": null}"#).unwrap();
        assert!(bare.requires().ids.is_empty());
    }

    #[test]
    fn test_unsupported_abi_is_rejected() {
        let spec = Spec::from_json_str(r#"{"abi": "sfwa-abi-2"}"#).unwrap();
        let err = spec.ensure_supported_abi().unwrap_err();
        assert!(err.to_string().contains("sfwa-abi-2"));
        assert!(err.to_string().contains(SUPPORTED_ABI));

        let missing = Spec::from_json_str("{}").unwrap();
        assert!(matches!(
            missing.ensure_supported_abi(),
            Err(HarnessError::UnsupportedAbi { found: None, .. })
        ));
    }

    #[test]
    fn test_load_reports_unreadable_and_malformed_files() {
        let tmp = tempdir().unwrap();
        let missing = tmp.path().join("nope.json");
        assert!(matches!(
            Spec::load(&missing),
            Err(HarnessError::SpecRead { .. })
        ));

        let bad = tmp.path().join("bad.json");
        std::fs::write(&bad, "{not json").unwrap();
        assert!(matches!(Spec::load(&bad), Err(HarnessError::SpecRead { .. })));

        let list = tmp.path().join("list.json");
        std::fs::write(&list, "[1, 2]").unwrap();
        assert!(matches!(Spec::load(&list), Err(HarnessError::SpecRead { .. })));
    }
}
