//! PSYNC, sent by a replica at the end of its handshake.
//!
//! Partial resynchronization is not supported: every PSYNC received by a
//! primary from a connection that announced its listening port is answered
//! with a full resynchronization.

use tracing::info;

use crate::{
    commands::{CommandError, command_handler::CommandResult},
    connection::ConnectionContext,
    replication::Role,
    resp::RespValue,
};

pub struct PsyncArguments {
    replication_id: String,
    offset: i64,
}

impl PsyncArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 2 {
            return Err(CommandError::InvalidPsyncCommand);
        }

        let offset = arguments[1]
            .parse::<i64>()
            .map_err(|_| CommandError::InvalidPsyncOffset)?;

        Ok(Self {
            replication_id: arguments[0].clone(),
            offset,
        })
    }
}

/// A primary hands the connection over to a full resynchronization; the
/// connection loop writes `+FULLRESYNC` and the snapshot. A replica replies
/// null.
pub fn psync(
    role: &Role,
    connection: &ConnectionContext,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let psync_arguments = PsyncArguments::parse(arguments)?;

    match role {
        Role::Primary(_) if connection.listening_port.is_none() => {
            Err(CommandError::PsyncWithoutListeningPort)
        }
        Role::Primary(_) => {
            info!(
                client = %connection.address,
                requested_id = %psync_arguments.replication_id,
                requested_offset = psync_arguments.offset,
                "full resynchronization requested"
            );
            Ok(CommandResult::FullResync)
        }
        Role::Replica(_) => Ok(CommandResult::Response(RespValue::Null.encode())),
    }
}
