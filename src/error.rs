//! Error types.
//!
//! Resolution never fails loudly: dangling references come back as `None`
//! or empty sets. The types here cover the few paths that do report.

use thiserror::Error;

use crate::base::Name;

/// A long-running walk observed its cancellation token.
///
/// Not a failure of the data; callers treat it as "no answer".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation cancelled")]
pub struct Cancelled;

/// Why an include directive could not be substituted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubstitutionError {
    /// A `json-flat://` directive points at a fragment whose top node is not an array.
    #[error("flat include of '{path}' requires an array at the fragment top")]
    FlatTargetNotArray { path: Name },
}

/// Errors raised while turning external input into documents.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// JSON parsing error.
    #[cfg(feature = "json")]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The document path has no file name component.
    #[error("invalid document path: '{0}'")]
    InvalidPath(String),
}

impl DocumentError {
    /// Create an invalid path error.
    pub fn invalid_path(path: impl Into<String>) -> Self {
        Self::InvalidPath(path.into())
    }
}
