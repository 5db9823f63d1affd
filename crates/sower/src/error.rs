//! Error types for sower

use thiserror::Error;

/// Result type alias for sower operations
pub type Result<T> = std::result::Result<T, SeederError>;

/// Unified error type for all sower operations
#[derive(Error, Debug, Clone)]
pub enum SeederError {
    /// Driver, network or auth failure while establishing or using the connection
    #[error("Connection error: {0}")]
    Connection(String),

    /// An operation that requires a live connection was called while disconnected
    #[error("Not connected to MongoDB")]
    NotConnected,

    /// First per-document failure (lookup or insert) within a seed batch
    #[error("Seed error in collection '{collection}': {message}")]
    Seed {
        collection: String,
        message: String,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl SeederError {
    /// Returns true if the error came from the precondition guard rather
    /// than from the database itself
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            SeederError::NotConnected | SeederError::Validation(_)
        )
    }
}

impl From<mongodb::error::Error> for SeederError {
    fn from(err: mongodb::error::Error) -> Self {
        SeederError::Connection(err.to_string())
    }
}

impl From<bson::ser::Error> for SeederError {
    fn from(err: bson::ser::Error) -> Self {
        SeederError::Serialization(format!("BSON serialization error: {}", err))
    }
}
