//! Error types for study-core.

use crate::list::ListId;
use thiserror::Error;

/// Result type alias using StudyError.
pub type Result<T> = std::result::Result<T, StudyError>;

/// Required item field that failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemField {
    Phrase,
    Meanings,
}

impl std::fmt::Display for ItemField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Phrase => f.write_str("phrase"),
            Self::Meanings => f.write_str("meanings"),
        }
    }
}

/// Errors raised by list mutation, scheduling and persistence.
#[derive(Debug, Error)]
pub enum StudyError {
    #[error("item is already owned by list {owner}")]
    OwnershipConflict { owner: ListId },

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("index {index} out of range for list of {len} items")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("format error: {0}")]
    Format(String),

    #[error("item {index} has an empty {field}")]
    Validation { index: usize, field: ItemField },

    #[error("import error at line {line}: {reason}")]
    Import { line: usize, reason: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("xml error: {0}")]
    Xml(#[from] quick_xml::Error),
}

impl StudyError {
    pub(crate) fn format(message: impl Into<String>) -> Self {
        Self::Format(message.into())
    }
}
