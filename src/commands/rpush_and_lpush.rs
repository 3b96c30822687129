use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    key_value_store::KeyValueStore,
    resp::RespValue,
};

pub struct PushArrayOperations {
    key: String,
    values: Vec<String>,
}

impl PushArrayOperations {
    pub fn parse(arguments: Vec<String>, should_prepend: bool) -> Result<Self, CommandError> {
        if arguments.len() < 2 {
            return if should_prepend {
                Err(CommandError::InvalidLPushCommand)
            } else {
                Err(CommandError::InvalidRPushCommand)
            };
        }

        Ok(Self {
            key: arguments[0].clone(),
            values: arguments[1..].to_vec(),
        })
    }
}

pub async fn rpush(store: &KeyValueStore, arguments: Vec<String>) -> Result<CommandResult, CommandError> {
    push_array_operations(store, arguments, false).await
}

pub async fn lpush(store: &KeyValueStore, arguments: Vec<String>) -> Result<CommandResult, CommandError> {
    push_array_operations(store, arguments, true).await
}

/// Shared body of RPUSH and LPUSH. LPUSH inserts values one at a time at the
/// head, so `LPUSH l a b c` leaves the list as `c b a`.
async fn push_array_operations(
    store: &KeyValueStore,
    arguments: Vec<String>,
    should_prepend: bool,
) -> Result<CommandResult, CommandError> {
    let push_array_arguments = PushArrayOperations::parse(arguments, should_prepend)?;

    let length = store
        .push(
            &push_array_arguments.key,
            &push_array_arguments.values,
            should_prepend,
        )
        .await?;

    Ok(CommandResult::Response(
        RespValue::Integer(length as i64).encode(),
    ))
}
