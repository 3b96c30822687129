use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    key_value_store::KeyValueStore,
    resp::RespValue,
};

pub struct IncrArguments {
    key: String,
}

impl IncrArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 1 {
            return Err(CommandError::InvalidIncrCommand);
        }

        Ok(Self {
            key: arguments[0].clone(),
        })
    }
}

/// `INCR key`: a missing key starts from 0, so the first call yields 1.
pub async fn incr(store: &KeyValueStore, arguments: Vec<String>) -> Result<CommandResult, CommandError> {
    let incr_arguments = IncrArguments::parse(arguments)?;
    let value = store.incr(&incr_arguments.key).await?;

    Ok(CommandResult::Response(RespValue::Integer(value).encode()))
}
