//! Error types for rule construction, document enrichment, and loading.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while constructing a validation rule.
///
/// These are configuration errors: they indicate a bug in the declared
/// rules, not a runtime condition, and surface at document-build time.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("string-length rule for \"{path}\" declares neither a minimum nor a maximum")]
    MissingLengthBounds { path: String },

    #[error("range rule for \"{path}\" declares neither a minimum nor a maximum")]
    MissingRangeBounds { path: String },

    #[error("pattern rule for \"{path}\" has an empty regex")]
    EmptyPattern { path: String },

    #[error("custom rule for \"{path}\" has an empty description")]
    EmptyCustomDescription { path: String },

    #[error("description rule for \"{path}\" has empty text")]
    EmptyText { path: String },

    #[error("range bound \"{value}\" for \"{path}\" is not a valid number")]
    InvalidDecimal { path: String, value: String },
}

/// Errors raised while enriching a document.
///
/// Every variant except `Cancelled` is a configuration error that aborts
/// the document build.
#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("alter operation for \"{path}\" matches no rule with message \"{message}\"")]
    AlterTargetMissing { path: String, message: String },

    #[error("remove operation for \"{path}\" matches no rule with message \"{message}\"")]
    RemoveTargetMissing { path: String, message: String },

    #[error("operation for \"{path}\" matches {count} rules with message \"{message}\"; expected exactly one")]
    AmbiguousMessage {
        path: String,
        message: String,
        count: usize,
    },

    #[error("remove-all operation for \"{path}\" applied to an empty rule list")]
    RemoveAllOnEmpty { path: String },

    #[error("enum constraint for \"{path}\" references an unregistered enum type")]
    UnknownEnumType { path: String },

    #[error("no type descriptor registered under the requested type id")]
    UnknownType,

    #[error(transparent)]
    Rule(#[from] RuleError),

    #[error("document build cancelled")]
    Cancelled,
}

/// Failure of a single rule-source provider for a single type.
///
/// Providers that cannot introspect a type report this; the aggregator logs
/// the omission and proceeds with the remaining providers. It never reaches
/// the document's consumers.
#[derive(Debug, Clone, Error)]
#[error("rule source \"{source_name}\" failed: {message}")]
pub struct SourceError {
    /// Name of the provider that failed.
    pub source_name: String,
    /// What went wrong, for the log line.
    pub message: String,
}

impl SourceError {
    pub fn new(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            message: message.into(),
        }
    }
}

/// Errors while loading a document from disk or a string.
#[derive(Debug, Error)]
pub enum DocumentError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid document: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },
}

impl DocumentError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            DocumentError::FileNotFound { .. } | DocumentError::ReadError { .. } => 3,
            DocumentError::InvalidJson { .. } => 2,
        }
    }
}
