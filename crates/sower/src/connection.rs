//! MongoDB connection lifecycle management
//!
//! A [`Connection`] is an explicit, caller-owned handle: it tracks a
//! [`ConnectionState`], owns the driver client for its lifetime, and
//! notifies registered listeners on state transitions. The seeder reads
//! the state as a precondition guard before issuing any writes.

use bson::{doc, Document as BsonDocument};
use mongodb::{
    options::{ClientOptions, ServerApi, ServerApiVersion},
    Client, Collection, Database,
};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{Result, SeederError};
use crate::listener::{Event, ListenerId, ListenerRegistry};

/// Connection state, mutated only by [`Connection`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

/// Optional driver options applied on top of the parsed connection URI
///
/// Unset fields keep whatever the URI (or the driver default) says.
#[derive(Debug, Clone, Default)]
pub struct ConnectOptions {
    /// Minimum number of connections in the driver pool
    pub min_pool_size: Option<u32>,
    /// Maximum number of connections in the driver pool
    pub max_pool_size: Option<u32>,
    /// Connection timeout
    pub connect_timeout: Option<Duration>,
    /// Server selection timeout; bounds how long connect() blocks on a dead server
    pub server_selection_timeout: Option<Duration>,
    /// Application name for server logs
    pub app_name: Option<String>,
}

/// Connect configuration: URI plus optional driver options
///
/// Replaces an overloaded connect signature with a single struct.
#[derive(Debug, Clone)]
pub struct ConnectConfig {
    uri: String,
    options: ConnectOptions,
}

impl ConnectConfig {
    /// Create a config for `uri` with pass-through (default) options
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            options: ConnectOptions {
                // A dead server should fail the connect, not hang it
                server_selection_timeout: Some(Duration::from_secs(30)),
                ..ConnectOptions::default()
            },
        }
    }

    /// Override the driver options
    pub fn options(mut self, options: ConnectOptions) -> Self {
        self.options = options;
        self
    }

    /// The connection URI
    pub fn uri(&self) -> &str {
        &self.uri
    }
}

/// MongoDB connection manager
///
/// Owns the driver client and the listener registry for its lifetime.
/// Constructed by the caller and passed to the seeder; there is no
/// process-wide instance.
#[derive(Default)]
pub struct Connection {
    client: Option<Client>,
    database: Option<Database>,
    connected: bool,
    listeners: ListenerRegistry,
}

impl Connection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Establish a connection to the deployment named by `config`
    ///
    /// Parses the URI, applies the config's driver options, verifies
    /// reachability with a `ping` command and resolves the default
    /// database from the URI. On success the state becomes
    /// [`ConnectionState::Connected`] and all [`Event::Connected`]
    /// listeners fire in registration order. On failure the state is
    /// left unchanged and the error is returned to the caller.
    ///
    /// Connecting while already connected is a no-op returning `Ok`.
    pub async fn connect(&mut self, config: ConnectConfig) -> Result<()> {
        if self.connected {
            debug!("connect() called while already connected, skipping");
            return Ok(());
        }

        let mut client_options = ClientOptions::parse(config.uri()).await?;

        let opts = &config.options;
        if let Some(min) = opts.min_pool_size {
            client_options.min_pool_size = Some(min);
        }
        if let Some(max) = opts.max_pool_size {
            client_options.max_pool_size = Some(max);
        }
        if let Some(connect) = opts.connect_timeout {
            client_options.connect_timeout = Some(connect);
        }
        if let Some(server_sel) = opts.server_selection_timeout {
            client_options.server_selection_timeout = Some(server_sel);
        }
        if let Some(app) = opts.app_name.clone() {
            client_options.app_name = Some(app);
        }

        // Set stable API version for compatibility
        let server_api = ServerApi::builder().version(ServerApiVersion::V1).build();
        client_options.server_api = Some(server_api);

        let client = Client::with_options(client_options)?;

        let database = client.default_database().ok_or_else(|| {
            SeederError::Connection(
                "No default database specified in connection string".to_string(),
            )
        })?;

        // The driver connects lazily; the ping is what makes connection
        // failures observable here instead of on the first seed write.
        database.run_command(doc! { "ping": 1 }).await?;

        info!(database = database.name(), "Connected to MongoDB");

        self.client = Some(client);
        self.database = Some(database);
        self.connected = true;
        self.listeners.fire(Event::Connected);

        Ok(())
    }

    /// Tear down the connection
    ///
    /// Idempotent: calling while already disconnected is a no-op and
    /// fires no listeners. Otherwise the state becomes
    /// [`ConnectionState::Disconnected`] and all [`Event::Disconnected`]
    /// listeners fire in registration order.
    pub async fn disconnect(&mut self) {
        if !self.connected {
            return;
        }

        self.database = None;
        if let Some(client) = self.client.take() {
            client.shutdown().await;
        }

        info!("Disconnected from MongoDB");

        self.connected = false;
        self.listeners.fire(Event::Disconnected);
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        if self.connected {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }

    /// True when a connection has been established and not torn down
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Get a reference to the connected database
    pub fn database(&self) -> Result<&Database> {
        self.database.as_ref().ok_or(SeederError::NotConnected)
    }

    /// Get a collection by name (untyped BsonDocument collection)
    pub fn collection(&self, name: &str) -> Result<Collection<BsonDocument>> {
        Ok(self.database()?.collection(name))
    }

    /// Register a listener for a lifecycle event
    ///
    /// Listeners fire synchronously in registration order; no
    /// deduplication is performed.
    pub fn on(&mut self, event: Event, effect: impl FnMut() + Send + 'static) -> ListenerId {
        self.listeners.add(event, effect)
    }

    /// Remove a previously registered listener
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("state", &self.state())
            .field("listeners", &self.listeners)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_new_connection_is_disconnected() {
        let conn = Connection::new();
        assert_eq!(conn.state(), ConnectionState::Disconnected);
        assert!(!conn.is_connected());
    }

    #[test]
    fn test_database_requires_connection() {
        let conn = Connection::new();
        assert!(matches!(conn.database(), Err(SeederError::NotConnected)));
        assert!(matches!(
            conn.collection("users"),
            Err(SeederError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn test_disconnect_while_disconnected_is_silent() {
        let fired = Arc::new(Mutex::new(false));
        let mut conn = Connection::new();

        let f = Arc::clone(&fired);
        conn.on(Event::Disconnected, move || *f.lock().unwrap() = true);

        conn.disconnect().await;
        assert!(!*fired.lock().unwrap());
        assert_eq!(conn.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_failed_connect_leaves_state_unchanged() {
        let fired = Arc::new(Mutex::new(false));
        let mut conn = Connection::new();

        let f = Arc::clone(&fired);
        conn.on(Event::Connected, move || *f.lock().unwrap() = true);

        // Malformed URI fails in ClientOptions::parse, before any network I/O
        let result = conn.connect(ConnectConfig::new("not-a-mongodb-uri")).await;
        assert!(result.is_err());
        assert_eq!(conn.state(), ConnectionState::Disconnected);
        assert!(!*fired.lock().unwrap());
    }

    #[test]
    fn test_connect_config_defaults() {
        let config = ConnectConfig::new("mongodb://localhost:27017/seeds");
        assert_eq!(config.uri(), "mongodb://localhost:27017/seeds");
        assert_eq!(
            config.options.server_selection_timeout,
            Some(Duration::from_secs(30))
        );
        assert_eq!(config.options.max_pool_size, None);
        assert_eq!(config.options.app_name, None);
    }

    #[test]
    fn test_connect_config_custom_options() {
        let config = ConnectConfig::new("mongodb://localhost:27017/seeds").options(ConnectOptions {
            min_pool_size: Some(1),
            max_pool_size: Some(5),
            connect_timeout: Some(Duration::from_secs(5)),
            server_selection_timeout: Some(Duration::from_secs(10)),
            app_name: Some("sower-test".to_string()),
        });
        assert_eq!(config.options.max_pool_size, Some(5));
        assert_eq!(config.options.app_name, Some("sower-test".to_string()));
    }

    #[test]
    fn test_listener_removal_via_connection() {
        let mut conn = Connection::new();
        let id = conn.on(Event::Connected, || {});
        assert!(conn.remove_listener(id));
        assert!(!conn.remove_listener(id));
    }
}
