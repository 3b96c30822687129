//! Per-connection loops: one for ordinary client connections (which may turn
//! into replica links after PSYNC) and one for a replica's link to its primary.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info, warn};

use crate::{
    commands::{CommandHandler, CommandResult},
    input::{CommandReadError, RespReader},
    rdb::snapshot_payload,
    replication::{SharedWriter, shared_writer, thread_safe_write_to_stream},
    server::RedisServer,
    transactions::Transaction,
};

/// Who is on the other end of a connection, fixed when the connection is
/// created (or, for replicas, when PSYNC completes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionKind {
    Client,
    /// A replica that completed a full resynchronization with this primary.
    Replica,
    /// This replica's link to its primary.
    Primary,
}

#[derive(Debug)]
pub struct ConnectionContext {
    pub address: String,
    pub kind: ConnectionKind,
    /// Port announced through `REPLCONF listening-port`.
    pub listening_port: Option<u16>,
    pub transaction: Transaction,
}

impl ConnectionContext {
    pub fn new(address: impl Into<String>, kind: ConnectionKind) -> Self {
        Self {
            address: address.into(),
            kind,
            listening_port: None,
            transaction: Transaction::new(),
        }
    }
}

async fn full_resync(server: &RedisServer, connection: &mut ConnectionContext, writer: &SharedWriter) -> bool {
    let Some(primary) = server.role.as_primary() else {
        return true;
    };

    let snapshot_path = server.config.snapshot_path();
    let snapshot = snapshot_payload(snapshot_path.as_deref()).await;

    match primary
        .full_resync(&connection.address, Arc::clone(writer), &snapshot)
        .await
    {
        Ok(()) => {
            connection.kind = ConnectionKind::Replica;
            info!(
                replica = %connection.address,
                listening_port = ?connection.listening_port,
                snapshot_bytes = snapshot.len(),
                "full resynchronization sent"
            );
            true
        }
        Err(e) => {
            warn!(replica = %connection.address, error = %e, "failed to send snapshot");
            false
        }
    }
}

/// Serves one accepted connection until the peer closes it.
///
/// Frames are processed strictly in arrival order, and every reply is
/// written before the next frame is read.
pub async fn handle_client_connection<R, W>(reader: R, writer: W, address: String, server: Arc<RedisServer>)
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Send + Unpin + 'static,
{
    let mut reader = RespReader::new(reader);
    let writer = shared_writer(writer);
    let mut connection = ConnectionContext::new(address, ConnectionKind::Client);

    loop {
        let (input, _) = match reader.read_frame().await {
            Ok(frame) => frame,
            Err(CommandReadError::ConnectionClosed) => break,
            Err(e @ CommandReadError::RespParseError(_)) => {
                warn!(client = %connection.address, error = %e, "protocol error, closing connection");
                let _ = thread_safe_write_to_stream(&writer, e.as_string().as_bytes()).await;
                break;
            }
            Err(e) => {
                warn!(client = %connection.address, error = %e, "failed to read from connection");
                break;
            }
        };

        let response = match CommandHandler::new(input) {
            Ok(command_handler) => match command_handler.handle(&server, &mut connection).await {
                Ok(CommandResult::Response(response)) => Some(response),
                Ok(CommandResult::NoResponse) | Ok(CommandResult::Batch(_)) => None,
                Ok(CommandResult::FullResync) => {
                    if !full_resync(&server, &mut connection, &writer).await {
                        break;
                    }

                    None
                }
                Err(e) => {
                    debug!(client = %connection.address, command = %command_handler.name, error = %e, "command failed");
                    Some(e.as_string())
                }
            },
            Err(e) => Some(e.as_string()),
        };

        if let Some(response) = response {
            if let Err(e) = thread_safe_write_to_stream(&writer, response.as_bytes()).await {
                warn!(client = %connection.address, error = %e, "failed to write response");
                break;
            }
        }
    }

    if connection.kind == ConnectionKind::Replica {
        if let Some(primary) = server.role.as_primary() {
            primary.remove_replica(&connection.address).await;
        }
    }

    info!(client = %connection.address, "connection closed");
}

/// Applies the command stream a replica receives from its primary.
///
/// Replies are suppressed except for `REPLCONF GETACK`, which is answered
/// with the offset from before the GETACK itself. After each frame the
/// replica offset grows by the frame's exact size on the wire.
pub async fn handle_primary_connection<R>(mut reader: RespReader<R>, writer: SharedWriter, server: Arc<RedisServer>)
where
    R: AsyncRead + Unpin,
{
    let Some(replica) = server.role.as_replica() else {
        return;
    };

    let mut connection = ConnectionContext::new(replica.primary_address(), ConnectionKind::Primary);

    loop {
        let (input, length) = match reader.read_frame().await {
            Ok(frame) => frame,
            Err(CommandReadError::ConnectionClosed) => {
                info!(primary = %connection.address, "primary closed the replication link");
                break;
            }
            Err(e) => {
                warn!(primary = %connection.address, error = %e, "replication link failed");
                break;
            }
        };

        let reply = match CommandHandler::new(input) {
            Ok(command_handler) => match command_handler.handle(&server, &mut connection).await {
                Ok(CommandResult::Response(response)) if command_handler.name == "REPLCONF" => Some(response),
                Ok(_) => None,
                Err(e) => {
                    warn!(command = %command_handler.name, error = %e, "failed to apply replicated command");
                    None
                }
            },
            Err(e) => {
                warn!(error = %e, "ignoring malformed replicated command");
                None
            }
        };

        if let Some(reply) = reply {
            if let Err(e) = thread_safe_write_to_stream(&writer, reply.as_bytes()).await {
                warn!(primary = %connection.address, error = %e, "failed to answer primary");
                break;
            }
        }

        let offset = replica.advance(length);
        debug!(offset, bytes = length, "replica offset advanced");
    }
}
