//! Error type shared by every floorplan crate.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FloorplanError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FloorplanError {
    /// A device with this id is already registered.
    #[error("device id already exists: {id}")]
    DuplicateId { id: String },

    /// A device id was empty after trimming.
    #[error("device id must not be blank")]
    BlankId,

    /// The document text could not be loaded.
    #[error("invalid document: {message}")]
    InvalidDocument { message: String },

    /// A device or indicator lookup failed.
    #[error("not found: {id}")]
    NotFound { id: String },

    /// A reorder or membership change was given a malformed index set.
    #[error("invalid indicator order: {message}")]
    InvalidOrder { message: String },
}

impl FloorplanError {
    #[must_use]
    pub fn invalid_document(message: impl Into<String>) -> Self {
        Self::InvalidDocument {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn invalid_order(message: impl Into<String>) -> Self {
        Self::InvalidOrder {
            message: message.into(),
        }
    }
}
