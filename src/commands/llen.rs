use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    key_value_store::KeyValueStore,
    resp::RespValue,
};

pub struct LlenArguments {
    key: String,
}

impl LlenArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 1 {
            return Err(CommandError::InvalidLLenCommand);
        }

        Ok(Self {
            key: arguments[0].clone(),
        })
    }
}

pub async fn llen(store: &KeyValueStore, arguments: Vec<String>) -> Result<CommandResult, CommandError> {
    let llen_arguments = LlenArguments::parse(arguments)?;
    let length = store.len(&llen_arguments.key).await?;

    Ok(CommandResult::Response(
        RespValue::Integer(length as i64).encode(),
    ))
}
