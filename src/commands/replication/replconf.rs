//! REPLCONF, exchanged between a primary and its replicas.
//!
//! A replica announces itself with `listening-port` and `capa`, the primary
//! asks for progress with `GETACK *`, and the replica answers with
//! `ACK <offset>`.

use tracing::debug;

use crate::{
    commands::{CommandError, command_handler::CommandResult},
    connection::{ConnectionContext, ConnectionKind},
    replication::Role,
    resp::RespValue,
};

enum ReplconfConfiguration {
    ListeningPort(u16),
    Capabilities,
    GetAck,
    Ack(u64),
}

pub struct ReplconfArguments {
    configuration: ReplconfConfiguration,
}

impl ReplconfArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() < 2 {
            return Err(CommandError::InvalidReplconfCommand);
        }

        let configuration = match arguments[0].to_lowercase().as_str() {
            "listening-port" => {
                let port = arguments[1]
                    .parse::<u16>()
                    .map_err(|_| CommandError::InvalidReplconfOffset)?;

                ReplconfConfiguration::ListeningPort(port)
            }
            "capa" => ReplconfConfiguration::Capabilities,
            "getack" => ReplconfConfiguration::GetAck,
            "ack" => {
                let offset = arguments[1]
                    .parse::<u64>()
                    .map_err(|_| CommandError::InvalidReplconfOffset)?;

                ReplconfConfiguration::Ack(offset)
            }
            option => return Err(CommandError::InvalidReplconfOption(option.to_string())),
        };

        Ok(Self { configuration })
    }
}

pub async fn replconf(
    role: &Role,
    connection: &mut ConnectionContext,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let replconf_arguments = ReplconfArguments::parse(arguments)?;
    let ok = || CommandResult::Response(RespValue::SimpleString("OK".to_string()).encode());

    match (replconf_arguments.configuration, role) {
        (ReplconfConfiguration::ListeningPort(port), _) => {
            debug!(client = %connection.address, port, "replica candidate announced listening port");
            connection.listening_port = Some(port);
            Ok(ok())
        }
        (ReplconfConfiguration::Capabilities, _) => Ok(ok()),
        (ReplconfConfiguration::GetAck, Role::Replica(replica))
            if connection.kind == ConnectionKind::Primary =>
        {
            let offset = replica.offset().to_string();

            Ok(CommandResult::Response(
                RespValue::command(&["REPLCONF", "ACK", offset.as_str()]).encode(),
            ))
        }
        (ReplconfConfiguration::GetAck, _) => Ok(ok()),
        (ReplconfConfiguration::Ack(offset), Role::Primary(primary)) => {
            primary.acknowledge(&connection.address, offset).await;
            Ok(CommandResult::NoResponse)
        }
        (ReplconfConfiguration::Ack(_), Role::Replica(_)) => Ok(CommandResult::NoResponse),
    }
}
