//! Input validation for seed requests
//!
//! Security-focused validation of the two user-controlled names that end
//! up inside driver calls: the target collection name and the match-key
//! field name. Prevents NoSQL operator injection and access to system
//! collections before any I/O is issued.

use crate::error::{Result, SeederError};

/// Maximum allowed length for collection names (MongoDB limit is 255, we're more conservative)
const MAX_COLLECTION_NAME_LENGTH: usize = 120;

/// Maximum allowed length for field names
const MAX_FIELD_NAME_LENGTH: usize = 1024;

/// Validated collection name that prevents injection attacks
///
/// Guarantees: non-empty, at most 120 characters, no null bytes, no
/// `system.` prefix, no `$` characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedCollectionName {
    name: String,
}

impl ValidatedCollectionName {
    /// Creates a new validated collection name
    ///
    /// # Errors
    /// Returns `SeederError::Validation` if the name is empty, too long,
    /// contains null bytes or `$`, or targets a `system.` collection.
    pub fn new(name: &str) -> Result<Self> {
        if name.is_empty() {
            return Err(SeederError::Validation(
                "Collection name cannot be empty".to_string(),
            ));
        }

        if name.len() > MAX_COLLECTION_NAME_LENGTH {
            return Err(SeederError::Validation(format!(
                "Collection name exceeds maximum length of {} characters: '{}'",
                MAX_COLLECTION_NAME_LENGTH, name
            )));
        }

        if name.contains('\0') {
            return Err(SeederError::Validation(
                "Collection name cannot contain null bytes".to_string(),
            ));
        }

        // Reserved for system collections
        if name.starts_with("system.") {
            return Err(SeederError::Validation(format!(
                "Collection name cannot start with 'system.' (reserved): '{}'",
                name
            )));
        }

        // $ introduces special MongoDB operators
        if name.contains('$') {
            return Err(SeederError::Validation(format!(
                "Collection name cannot contain '$' character: '{}'",
                name
            )));
        }

        if name.contains("..") || name.contains("//") {
            tracing::warn!(collection = name, "Collection name contains suspicious pattern");
        }

        Ok(ValidatedCollectionName {
            name: name.to_string(),
        })
    }

    /// Returns the validated collection name as a string slice
    pub fn as_str(&self) -> &str {
        &self.name
    }

    /// Consumes the ValidatedCollectionName and returns the inner String
    pub fn into_string(self) -> String {
        self.name
    }
}

impl AsRef<str> for ValidatedCollectionName {
    fn as_ref(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for ValidatedCollectionName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Validates a field name used as a match key
///
/// # Errors
/// Returns `SeederError::Validation` if the field is empty, too long,
/// contains null bytes, or starts with `$` (operator injection).
pub fn validate_match_key(field: &str) -> Result<()> {
    if field.is_empty() {
        return Err(SeederError::Validation(
            "Match key field name cannot be empty".to_string(),
        ));
    }

    if field.len() > MAX_FIELD_NAME_LENGTH {
        return Err(SeederError::Validation(format!(
            "Match key field name exceeds maximum length of {} characters",
            MAX_FIELD_NAME_LENGTH
        )));
    }

    if field.contains('\0') {
        return Err(SeederError::Validation(
            "Match key field name cannot contain null bytes".to_string(),
        ));
    }

    if field.starts_with('$') {
        return Err(SeederError::Validation(format!(
            "Match key field name cannot start with '$': '{}'",
            field
        )));
    }

    Ok(())
}
