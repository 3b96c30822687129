use std::{ffi::OsString, sync::Arc};

use anyhow::Context;
use tokio::net::{TcpListener, TcpStream};
use tracing::{error, info, warn};

use crate::{
    config::{ConfigError, ServerConfig},
    connection::{handle_client_connection, handle_primary_connection},
    handshake::{HandshakeError, perform_handshake},
    input::RespReader,
    key_value_store::KeyValueStore,
    rdb::{RdbError, load_snapshot_file, parse_snapshot},
    replication::{Role, shared_writer},
};

/// Everything connection tasks share: configuration, the keyspace and the
/// replication role.
#[derive(Debug)]
pub struct RedisServer {
    pub config: ServerConfig,
    pub store: KeyValueStore,
    pub role: Role,
}

impl RedisServer {
    pub fn new(config: ServerConfig) -> Result<Self, ConfigError> {
        let role = match config.primary_address()? {
            Some(primary_address) => Role::replica(primary_address),
            None => Role::primary(),
        };

        Ok(Self {
            config,
            store: KeyValueStore::new(),
            role,
        })
    }

    pub fn from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::new(ServerConfig::from_args(args)?)
    }

    /// Loads the configured snapshot file into the keyspace. A missing file
    /// leaves the keyspace empty.
    pub async fn load_snapshot(&self) {
        let Some(path) = self.config.snapshot_path() else {
            return;
        };

        match load_snapshot_file(&path).await {
            Ok(entries) => {
                let loaded = self.store.load(entries).await;
                info!(path = %path.display(), keys = loaded, "snapshot loaded");
            }
            Err(RdbError::Io(e)) => {
                info!(path = %path.display(), reason = %e, "no snapshot loaded, starting empty");
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "invalid snapshot file, starting empty");
            }
        }
    }

    /// Connects to the primary, runs the handshake, loads the snapshot it
    /// sends and spawns the task applying the replicated command stream.
    async fn start_replication(self: &Arc<Self>, listening_port: u16) -> Result<(), HandshakeError> {
        let Some(replica) = self.role.as_replica() else {
            return Ok(());
        };

        info!(primary = %replica.primary_address(), "connecting to primary");

        let stream = TcpStream::connect(replica.primary_address())
            .await
            .map_err(|e| HandshakeError::IoError(e.to_string()))?;
        let (reader, writer) = stream.into_split();
        let mut reader = RespReader::new(reader);
        let writer = shared_writer(writer);

        let resync = perform_handshake(&mut reader, &writer, listening_port).await?;

        match parse_snapshot(&resync.snapshot) {
            Ok(entries) => {
                let loaded = self.store.load(entries).await;
                info!(keys = loaded, "snapshot from primary loaded");
            }
            Err(e) => warn!(error = %e, "could not parse snapshot from primary"),
        }

        replica
            .start_stream(&resync.replication_id, resync.offset)
            .await;

        let server = Arc::clone(self);
        tokio::spawn(async move {
            handle_primary_connection(reader, writer, server).await;
        });

        Ok(())
    }

    /// Binds `127.0.0.1:<port>` and serves until the process exits.
    pub async fn run(self) -> anyhow::Result<()> {
        let port = self.config.port;
        let listener = TcpListener::bind(("127.0.0.1", port))
            .await
            .with_context(|| format!("failed to bind port {}", port))?;

        Arc::new(self).serve(listener).await
    }

    /// Serves connections from an already bound listener. A replica completes
    /// its handshake before the first client is accepted.
    pub async fn serve(self: Arc<Self>, listener: TcpListener) -> anyhow::Result<()> {
        let local_address = listener.local_addr()?;

        self.load_snapshot().await;

        if let Err(e) = self.start_replication(local_address.port()).await {
            error!(error = %e, "replication handshake failed");
        }

        info!(address = %local_address, role = self.role.name(), "listening");

        loop {
            let (stream, address) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!(error = %e, "failed to accept connection");
                    continue;
                }
            };

            info!(client = %address, "accepted connection");

            let server = Arc::clone(&self);
            tokio::spawn(async move {
                let (reader, writer) = stream.into_split();
                handle_client_connection(reader, writer, address.to_string(), server).await;
            });
        }
    }
}
