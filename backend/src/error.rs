//! Error types for the analysis engine.
//!
//! Only failures that must reach the caller are errors. Rejected rows, empty
//! groups, empty selections and search-space fallbacks are recovered where they
//! happen and surface as log entries instead.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result type for analysis operations
pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// A single invalid field in a request, reported with a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldIssue {
    /// Name of the offending field as it appears in the request body
    pub field: String,
    pub message: String,
}

impl FieldIssue {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn join_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Error type for analysis operations
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// Request options failed validation; nothing was computed.
    #[error("Invalid configuration: {}", join_issues(.0))]
    ConfigurationInvalid(Vec<FieldIssue>),

    /// A chart endpoint was asked for a parameter outside the known set.
    #[error("Unknown parameter '{0}'")]
    UnknownParameter(String),

    /// An export table could not be encoded.
    #[error("Export encoding failed: {0}")]
    Export(String),
}

impl AnalysisError {
    /// Shorthand for a configuration error on a single field.
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigurationInvalid(vec![FieldIssue::new(field, message)])
    }

    /// Field-level issues, if this is a configuration error.
    pub fn field_issues(&self) -> Option<&[FieldIssue]> {
        match self {
            Self::ConfigurationInvalid(issues) => Some(issues),
            _ => None,
        }
    }
}

impl From<csv::Error> for AnalysisError {
    fn from(err: csv::Error) -> Self {
        AnalysisError::Export(err.to_string())
    }
}
