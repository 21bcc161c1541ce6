//! Document loading from files and strings.
//!
//! The enrichment core itself performs no I/O; these helpers are the
//! boundary used by the CLI and by callers that keep documents on disk.

use std::path::Path;

use crate::error::DocumentError;
use crate::schema::Document;

/// Load a document from a JSON file.
///
/// # Errors
///
/// Returns `DocumentError::FileNotFound` if the file doesn't exist,
/// or `DocumentError::InvalidJson` if it isn't a valid document.
pub fn load_document(path: &Path) -> Result<Document, DocumentError> {
    if !path.exists() {
        return Err(DocumentError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| DocumentError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    load_document_str(&content)
}

/// Load a document from a JSON string.
///
/// # Errors
///
/// Returns `DocumentError::InvalidJson` if the string isn't a valid
/// document.
pub fn load_document_str(content: &str) -> Result<Document, DocumentError> {
    serde_json::from_str(content).map_err(|source| DocumentError::InvalidJson { source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn load_document_valid_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"openapi":"3.0.3","components":{{"schemas":{{"A":{{"type":"object"}}}}}}}}"#
        )
        .unwrap();

        let document = load_document(file.path()).unwrap();
        assert!(document.component("A").is_some());
    }

    #[test]
    fn load_document_file_not_found() {
        let result = load_document(Path::new("/nonexistent/document.json"));
        assert!(matches!(result, Err(DocumentError::FileNotFound { .. })));
    }

    #[test]
    fn load_document_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not valid json").unwrap();

        let result = load_document(file.path());
        assert!(matches!(result, Err(DocumentError::InvalidJson { .. })));
    }

    #[test]
    fn load_document_str_valid() {
        let document = load_document_str(r#"{"paths":{}}"#).unwrap();
        assert!(document.paths.is_empty());
    }

    #[test]
    fn load_document_str_invalid() {
        let result = load_document_str("not json");
        assert!(matches!(result, Err(DocumentError::InvalidJson { .. })));
    }
}
