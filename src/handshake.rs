//! The replica side of the replication handshake.
//!
//! ```text
//! None --PING--> SentPing --+PONG / REPLCONF listening-port--> SentReplconf1
//!   --+OK / REPLCONF capa psync2--> SentReplconf2 --+OK / PSYNC ? -1--> SentPsync
//!   --+FULLRESYNC <id> <offset>--> FullResyncReceived --snapshot--> Streaming
//! ```
//!
//! Any other reply aborts the handshake; the session never reaches
//! `Streaming` after a failed step.

use regex::Regex;
use thiserror::Error;
use tokio::io::AsyncRead;
use tracing::{debug, info};

use crate::{
    input::{CommandReadError, RespReader},
    replication::{SharedWriter, thread_safe_write_to_stream},
    resp::RespValue,
};

#[derive(Error, Debug, PartialEq)]
pub enum HandshakeError {
    #[error("I/O error during handshake: {0}")]
    IoError(String),
    #[error("failed to read from primary: {0}")]
    ReadError(#[from] CommandReadError),
    #[error("unexpected reply {reply:?} in state {state:?}")]
    UnexpectedReply {
        state: HandshakeState,
        reply: RespValue,
    },
    #[error("invalid FULLRESYNC line '{0}'")]
    InvalidFullResync(String),
    #[error("handshake step out of order in state {0:?}")]
    OutOfOrder(HandshakeState),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    None,
    SentPing,
    SentReplconf1,
    SentReplconf2,
    SentPsync,
    FullResyncReceived,
    Streaming,
}

/// What a completed handshake hands over to the streaming session.
#[derive(Debug, Clone, PartialEq)]
pub struct FullResync {
    pub replication_id: String,
    pub offset: u64,
    pub snapshot: Vec<u8>,
}

#[derive(Debug)]
pub struct Handshake {
    state: HandshakeState,
    listening_port: u16,
    resync: Option<(String, u64)>,
}

pub fn is_valid_repl_id(repl_id: &str) -> bool {
    Regex::new(r"^[a-zA-Z0-9]{40}$")
        .map(|re| re.is_match(repl_id))
        .unwrap_or(false)
}

impl Handshake {
    pub fn new(listening_port: u16) -> Self {
        Self {
            state: HandshakeState::None,
            listening_port,
            resync: None,
        }
    }

    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// `None -> SentPing`, returning the PING to send.
    pub fn start(&mut self) -> Result<RespValue, HandshakeError> {
        if self.state != HandshakeState::None {
            return Err(HandshakeError::OutOfOrder(self.state));
        }

        self.state = HandshakeState::SentPing;
        Ok(RespValue::command(&["PING"]))
    }

    /// Feeds one reply from the primary. Returns the next command to send, or
    /// `None` once `+FULLRESYNC` has been accepted and the snapshot is due.
    pub fn receive(&mut self, reply: RespValue) -> Result<Option<RespValue>, HandshakeError> {
        let unexpected = |state: HandshakeState,
                          reply: RespValue|
         -> Result<Option<RespValue>, HandshakeError> {
            Err(HandshakeError::UnexpectedReply { state, reply })
        };

        match (self.state, &reply) {
            (HandshakeState::SentPing, RespValue::SimpleString(s)) if s == "PONG" => {
                let port = self.listening_port.to_string();
                self.state = HandshakeState::SentReplconf1;
                Ok(Some(RespValue::command(&[
                    "REPLCONF",
                    "listening-port",
                    port.as_str(),
                ])))
            }
            (HandshakeState::SentReplconf1, RespValue::SimpleString(s)) if s == "OK" => {
                self.state = HandshakeState::SentReplconf2;
                Ok(Some(RespValue::command(&["REPLCONF", "capa", "psync2"])))
            }
            (HandshakeState::SentReplconf2, RespValue::SimpleString(s)) if s == "OK" => {
                self.state = HandshakeState::SentPsync;
                Ok(Some(RespValue::command(&["PSYNC", "?", "-1"])))
            }
            (HandshakeState::SentPsync, RespValue::SimpleString(line)) => {
                let parts: Vec<&str> = line.split_whitespace().collect();

                let ["FULLRESYNC", repl_id, offset] = parts.as_slice() else {
                    return unexpected(self.state, reply.clone());
                };

                let offset = offset
                    .parse::<u64>()
                    .map_err(|_| HandshakeError::InvalidFullResync(line.clone()))?;

                if !is_valid_repl_id(repl_id) {
                    return Err(HandshakeError::InvalidFullResync(line.clone()));
                }

                self.resync = Some((repl_id.to_string(), offset));
                self.state = HandshakeState::FullResyncReceived;
                Ok(None)
            }
            (state, _) => unexpected(state, reply.clone()),
        }
    }

    /// `FullResyncReceived -> Streaming`
    pub fn receive_snapshot(&mut self, snapshot: Vec<u8>) -> Result<FullResync, HandshakeError> {
        let (HandshakeState::FullResyncReceived, Some((replication_id, offset))) =
            (self.state, self.resync.take())
        else {
            return Err(HandshakeError::OutOfOrder(self.state));
        };

        self.state = HandshakeState::Streaming;

        Ok(FullResync {
            replication_id,
            offset,
            snapshot,
        })
    }
}

/// Runs the whole handshake over an established connection to the primary.
///
/// The reader keeps any bytes that follow the snapshot, so commands the
/// primary propagates right after the transfer are not lost.
pub async fn perform_handshake<R>(
    reader: &mut RespReader<R>,
    writer: &SharedWriter,
    listening_port: u16,
) -> Result<FullResync, HandshakeError>
where
    R: AsyncRead + Unpin,
{
    let mut handshake = Handshake::new(listening_port);
    let mut next_command = Some(handshake.start()?);

    while let Some(command) = next_command {
        thread_safe_write_to_stream(writer, command.encode().as_bytes())
            .await
            .map_err(|e| HandshakeError::IoError(e.to_string()))?;
        debug!(state = ?handshake.state(), "handshake command sent");

        let (reply, _) = reader.read_frame().await?;
        next_command = handshake.receive(reply)?;
    }

    let snapshot = reader.read_snapshot().await?;
    let resync = handshake.receive_snapshot(snapshot)?;

    info!(
        replication_id = %resync.replication_id,
        offset = resync.offset,
        snapshot_bytes = resync.snapshot.len(),
        "handshake completed"
    );

    Ok(resync)
}
