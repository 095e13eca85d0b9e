//! Edit failure taxonomy.

use thiserror::Error;

use crate::roundtrip::{MutateError, ParseError};

/// EditError is everything an update pass can fail with. Malformed
/// resources encountered during matching are silent non-matches, not
/// errors; only the terminal outcomes listed here surface.
#[derive(Debug, Clone, Error)]
pub enum EditError {
    /// The pass finished without finding the requested subject (the
    /// resource itself, or the named container inside it).
    #[error("no matching {subject} found")]
    NotFound { subject: String },

    /// A dotted path did not lead to an existing scalar value.
    #[error("path {path} does not lead to a scalar value")]
    UnresolvablePath { path: String },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Tree(#[from] MutateError),
}

impl EditError {
    /// Creates a not-found error for the named subject.
    pub fn not_found(subject: impl Into<String>) -> Self {
        EditError::NotFound {
            subject: subject.into(),
        }
    }

    /// Creates an unresolvable-path error.
    pub fn unresolvable_path(path: impl Into<String>) -> Self {
        EditError::UnresolvablePath { path: path.into() }
    }
}
