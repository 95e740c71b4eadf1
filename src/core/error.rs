use std::path::PathBuf;
use thiserror::Error;

/// Harness-level failures. Any of these aborts the run before (or instead of)
/// producing a report; check failures are never represented here.
#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("cannot read spec {}: {reason}", path.display())]
    SpecRead { path: PathBuf, reason: String },
    #[error("cannot read HTML file {}: {reason}", path.display())]
    DocumentRead { path: PathBuf, reason: String },
    #[error("HTML parse error: {0}")]
    DocumentParse(String),
    #[error("unsupported abi '{}'. Expected '{expected}'.", found.as_deref().unwrap_or("None"))]
    UnsupportedAbi {
        found: Option<String>,
        expected: &'static str,
    },
    #[error("Configuration error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::load_config_file;
    use crate::core::document::Document;
    use crate::core::spec::Spec;
    use std::path::Path;

    #[test]
    fn test_io_failures_name_the_path() {
        let missing = Path::new("/nonexistent/sfwa/input");
        let errors = [
            Spec::load(missing).unwrap_err(),
            Document::read_text(missing).unwrap_err(),
            load_config_file(missing).unwrap_err(),
        ];
        for err in errors {
            let message = err.to_string();
            assert!(message.contains("/nonexistent/sfwa/input"), "{}", message);
        }
    }
}
