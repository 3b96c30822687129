use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    key_value_store::KeyValueStore,
    resp::RespValue,
};

pub struct GetArguments {
    key: String,
}

impl GetArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 1 {
            return Err(CommandError::InvalidGetCommand);
        }

        Ok(Self {
            key: arguments[0].clone(),
        })
    }
}

/// Handles `GET key`.
///
/// Replies with the stored string as a bulk string, or the null reply when the
/// key is absent or its expiry has been reached. An expired key is removed as
/// part of the read. Lists and streams fail with `WRONGTYPE`.
pub async fn get(store: &KeyValueStore, arguments: Vec<String>) -> Result<CommandResult, CommandError> {
    let get_arguments = GetArguments::parse(arguments)?;

    let response = match store.get(&get_arguments.key).await? {
        Some(value) => RespValue::BulkString(value),
        None => RespValue::Null,
    };

    Ok(CommandResult::Response(response.encode()))
}
