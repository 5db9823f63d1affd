//! Idempotent MongoDB seeding
//!
//! Persist a baseline set of documents into a collection on application
//! startup without duplicating records that already exist. A candidate
//! counts as already seeded when a record matches it on a single key
//! (an explicit per-request field, or the candidate's first declared
//! field); matched records are left untouched even when other fields
//! differ.
//!
//! # Example
//!
//! ```ignore
//! use bson::doc;
//! use sower::{seed, ConnectConfig, Connection, Event, SeedRequest};
//!
//! let mut conn = Connection::new();
//! conn.on(Event::Connected, || println!("connected"));
//! conn.connect(ConnectConfig::new("mongodb://localhost:27017/app")).await?;
//!
//! let request = SeedRequest::new(
//!     "flimflam",
//!     vec![
//!         doc! { "username": "DrPhil", "age": 7500 },
//!         doc! { "username": "Felix", "age": 14 },
//!     ],
//! );
//! seed(&conn, &request).await?;
//! conn.disconnect().await;
//! ```

pub mod connection;
pub mod error;
pub mod listener;
pub mod seed;
pub mod validation;

pub use connection::{ConnectConfig, ConnectOptions, Connection, ConnectionState};
pub use error::{Result, SeederError};
pub use listener::{Event, ListenerId, ListenerRegistry};
pub use seed::{seed, SeedRequest};
pub use validation::{validate_match_key, ValidatedCollectionName};
