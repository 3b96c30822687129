use std::time::Duration;

use crate::{
    commands::{CommandError, command_handler::CommandResult},
    replication::Role,
    resp::RespValue,
};

pub struct WaitArguments {
    pub number_of_replicas: usize,
    /// `None` waits without a limit.
    pub timeout: Option<Duration>,
}

impl WaitArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 2 {
            return Err(CommandError::InvalidWaitCommand);
        }

        let number_of_replicas = arguments[0]
            .parse::<usize>()
            .map_err(|_| CommandError::InvalidWaitCommandArgument)?;

        let timeout = arguments[1]
            .parse::<u64>()
            .map_err(|_| CommandError::InvalidWaitCommandArgument)?;

        Ok(Self {
            number_of_replicas,
            timeout: (timeout > 0).then(|| Duration::from_millis(timeout)),
        })
    }
}

/// Handles `WAIT numreplicas timeout`.
///
/// On a primary, replies with the number of replicas that acknowledged every
/// write propagated before the call, returning early once `numreplicas` have.
/// A replica has no replicas of its own and replies `0`.
pub async fn wait(role: &Role, arguments: Vec<String>) -> Result<CommandResult, CommandError> {
    let wait_arguments = WaitArguments::parse(arguments)?;

    let synced = match role {
        Role::Primary(primary) => {
            primary
                .wait(wait_arguments.number_of_replicas, wait_arguments.timeout)
                .await
        }
        Role::Replica(_) => 0,
    };

    Ok(CommandResult::Response(
        RespValue::Integer(synced as i64).encode(),
    ))
}
