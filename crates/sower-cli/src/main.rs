//! Sower CLI - seed MongoDB from a file
//!
//! Usage:
//!   sower seed --uri <URI> --file seeds.json       Seed from a file
//!   sower seed ... --match-key username            Explicit match key
//!   sower ping --uri <URI>                         Check a deployment
//!   sower seed ... --log-level debug               Verbose output

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use sower::{seed, ConnectConfig, Connection, Event, SeedRequest};

#[derive(Parser)]
#[command(name = "sower")]
#[command(about = "Idempotent MongoDB seeding", long_about = None)]
#[command(version)]
struct Cli {
    /// Log level (error, warn, info, debug, trace); RUST_LOG overrides
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed documents from a file into MongoDB
    Seed {
        /// MongoDB connection URI (must name a default database)
        #[arg(long)]
        uri: String,

        /// Seed file: a JSON seed request or an array of them
        #[arg(long)]
        file: PathBuf,

        /// Match-key field for requests that don't declare their own
        #[arg(long)]
        match_key: Option<String>,
    },
    /// Connect to a deployment and report reachability
    Ping {
        /// MongoDB connection URI (must name a default database)
        #[arg(long)]
        uri: String,
    },
}

/// Seed file payload: one request or a batch of them
#[derive(serde::Deserialize)]
#[serde(untagged)]
enum SeedFile {
    One(SeedRequest),
    Many(Vec<SeedRequest>),
}

impl SeedFile {
    fn into_requests(self) -> Vec<SeedRequest> {
        match self {
            SeedFile::One(request) => vec![request],
            SeedFile::Many(requests) => requests,
        }
    }
}

fn load_requests(path: &PathBuf, match_key: Option<&str>) -> Result<Vec<SeedRequest>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read seed file: {}", path.display()))?;

    let file: SeedFile = serde_json::from_str(&contents)
        .with_context(|| format!("Invalid seed file: {}", path.display()))?;

    let mut requests = file.into_requests();
    if let Some(key) = match_key {
        for request in requests.iter_mut() {
            if request.match_key.is_none() {
                request.match_key = Some(key.to_string());
            }
        }
    }
    Ok(requests)
}

async fn run_seed(uri: String, file: PathBuf, match_key: Option<String>) -> Result<()> {
    let requests = load_requests(&file, match_key.as_deref())?;
    if requests.is_empty() {
        println!("Nothing to seed: {} contains no requests", file.display());
        return Ok(());
    }

    let mut conn = Connection::new();
    conn.on(Event::Connected, || info!("Connection established"));
    conn.on(Event::Disconnected, || info!("Connection closed"));

    conn.connect(ConnectConfig::new(&uri))
        .await
        .context("Failed to connect to MongoDB")?;

    let mut result = Ok(());
    for request in &requests {
        match seed(&conn, request).await {
            Ok(_) => println!(
                "Seeded {} document(s) into '{}'",
                request.documents.len(),
                request.collection
            ),
            Err(e) => {
                result = Err(anyhow::Error::new(e))
                    .with_context(|| format!("Seeding '{}' failed", request.collection));
                break;
            }
        }
    }

    conn.disconnect().await;
    result
}

async fn run_ping(uri: String) -> Result<()> {
    let mut conn = Connection::new();
    conn.connect(ConnectConfig::new(&uri))
        .await
        .context("Deployment unreachable")?;
    println!("ok");
    conn.disconnect().await;
    Ok(())
}

/// Initialize logging based on log level
fn init_logging(level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .try_init()
        .ok(); // Ignore error if already initialized
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match cli.command {
        Commands::Seed {
            uri,
            file,
            match_key,
        } => run_seed(uri, file, match_key).await,
        Commands::Ping { uri } => run_ping(uri).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_file_single_object() {
        let json = r#"{
            "collection": "flimflam",
            "documents": [{ "username": "DrPhil", "age": 7500 }]
        }"#;
        let file: SeedFile = serde_json::from_str(json).unwrap();
        let requests = file.into_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].collection, "flimflam");
    }

    #[test]
    fn test_seed_file_array() {
        let json = r#"[
            { "collection": "users", "documents": [] },
            { "collection": "roles", "documents": [], "matchKey": "name" }
        ]"#;
        let file: SeedFile = serde_json::from_str(json).unwrap();
        let requests = file.into_requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].match_key.as_deref(), Some("name"));
    }

    #[test]
    fn test_cli_match_key_fills_only_unset_requests() {
        let dir = std::env::temp_dir();
        let path = dir.join("sower_cli_test_seeds.json");
        std::fs::write(
            &path,
            r#"[
                { "collection": "users", "documents": [] },
                { "collection": "roles", "documents": [], "matchKey": "name" }
            ]"#,
        )
        .unwrap();

        let requests = load_requests(&path, Some("email")).unwrap();
        assert_eq!(requests[0].match_key.as_deref(), Some("email"));
        assert_eq!(requests[1].match_key.as_deref(), Some("name"));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_load_requests_missing_file() {
        let path = PathBuf::from("/nonexistent/seeds.json");
        assert!(load_requests(&path, None).is_err());
    }
}
