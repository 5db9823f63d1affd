//! Idempotent seeding of documents into a collection
//!
//! Each candidate document is matched against the collection by a single
//! key (an explicit per-request field, or the document's first declared
//! field) and inserted only when no record matches. Existing records are
//! never updated, even when non-key fields differ.

use bson::{Bson, Document as BsonDocument};
use futures::future::join_all;
use mongodb::Collection;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::connection::Connection;
use crate::error::{Result, SeederError};
use crate::validation::{validate_match_key, ValidatedCollectionName};

/// A batch of candidate documents for one collection
///
/// `BsonDocument` preserves key insertion order, which makes the
/// first-declared-field fallback well defined. Deserializes directly
/// from a JSON seed file:
///
/// ```json
/// {
///     "collection": "flimflam",
///     "documents": [
///         { "username": "DrPhil", "age": 7500 },
///         { "username": "Felix", "age": 14 }
///     ],
///     "matchKey": "username"
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedRequest {
    /// Target collection name
    pub collection: String,
    /// Candidate documents, in declaration order
    pub documents: Vec<BsonDocument>,
    /// Field used to decide whether a candidate already exists.
    /// When absent, each document's first declared field is used.
    #[serde(default)]
    pub match_key: Option<String>,
}

impl SeedRequest {
    pub fn new(collection: impl Into<String>, documents: Vec<BsonDocument>) -> Self {
        Self {
            collection: collection.into(),
            documents,
            match_key: None,
        }
    }

    /// Use an explicit match-key field instead of each document's first field
    pub fn match_key(mut self, field: impl Into<String>) -> Self {
        self.match_key = Some(field.into());
        self
    }

    /// Build a request from serializable values
    ///
    /// Struct field declaration order becomes document field order, so
    /// the first struct field is the fallback match key.
    pub fn from_serializable<T: Serialize>(
        collection: impl Into<String>,
        items: &[T],
    ) -> Result<Self> {
        let documents = items
            .iter()
            .map(bson::to_document)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self::new(collection, documents))
    }
}

/// Resolve the match key and value for one candidate document
///
/// The resolved key is validated whether it was given explicitly or
/// derived from the document's first field; a derived `$`-operator
/// field is as much an injection vector as an explicit one.
fn match_entry<'a>(
    request: &'a SeedRequest,
    candidate: &'a BsonDocument,
) -> Result<(&'a str, &'a Bson)> {
    let (key, value) = match &request.match_key {
        Some(key) => {
            let value = candidate.get(key).ok_or_else(|| {
                SeederError::Validation(format!(
                    "Document is missing match key field '{}'",
                    key
                ))
            })?;
            (key.as_str(), value)
        }
        None => candidate
            .iter()
            .next()
            .map(|(key, value)| (key.as_str(), value))
            .ok_or_else(|| {
                SeederError::Validation(
                    "Cannot derive a match key from an empty document".to_string(),
                )
            })?,
    };
    validate_match_key(key)?;
    Ok((key, value))
}

/// First error in document order, once every operation has completed
fn first_failure(results: Vec<Result<()>>) -> Result<()> {
    results.into_iter().collect()
}

/// Ensure every document in `request` exists in its collection
///
/// Precondition: `conn` must be connected; otherwise this fails with
/// [`SeederError::NotConnected`] and performs no work.
///
/// Per-document lookups and inserts run concurrently with no ordering
/// guarantee and no transactional grouping: every operation runs to
/// completion independently, so a failing document neither cancels its
/// siblings nor rolls back documents that succeeded, and no retries are
/// made. Returns `Ok(true)` only when every per-document operation
/// succeeds; otherwise the first error in document order.
pub async fn seed(conn: &Connection, request: &SeedRequest) -> Result<bool> {
    if !conn.is_connected() {
        return Err(SeederError::NotConnected);
    }

    let name = ValidatedCollectionName::new(&request.collection)?;
    if let Some(key) = &request.match_key {
        validate_match_key(key)?;
    }

    let collection = conn.collection(name.as_str())?;

    let ops = request
        .documents
        .iter()
        .map(|candidate| seed_one(&collection, request, candidate));
    first_failure(join_all(ops).await)?;

    info!(
        collection = %name,
        documents = request.documents.len(),
        "Seed batch complete"
    );

    Ok(true)
}

/// Find-or-create for a single candidate document
async fn seed_one(
    collection: &Collection<BsonDocument>,
    request: &SeedRequest,
    candidate: &BsonDocument,
) -> Result<()> {
    let (key, value) = match_entry(request, candidate)?;

    let mut filter = BsonDocument::new();
    filter.insert(key, value.clone());

    let existing = collection
        .find_one(filter)
        .await
        .map_err(|e| SeederError::Seed {
            collection: request.collection.clone(),
            message: format!("lookup failed: {}", e),
        })?;

    if existing.is_some() {
        debug!(collection = %request.collection, key, "Record already seeded, skipping");
        return Ok(());
    }

    collection
        .insert_one(candidate.clone())
        .await
        .map_err(|e| SeederError::Seed {
            collection: request.collection.clone(),
            message: format!("insert failed: {}", e),
        })?;

    debug!(collection = %request.collection, key, "Inserted seed document");
    Ok(())
}
