use crate::{
    commands::{CommandError, CommandResult},
    key_value_store::KeyValueStore,
    resp::RespValue,
};

pub struct KeysArguments {
    pub pattern: String,
}

impl KeysArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 1 {
            return Err(CommandError::InvalidKeysCommand);
        }

        Ok(KeysArguments {
            pattern: arguments[0].clone(),
        })
    }
}

pub async fn keys(store: &KeyValueStore, arguments: Vec<String>) -> Result<CommandResult, CommandError> {
    let keys_arguments = KeysArguments::parse(arguments)?;
    let keys = store.keys(&keys_arguments.pattern).await?;

    Ok(CommandResult::Response(
        RespValue::encode_array_from_strings(keys),
    ))
}
