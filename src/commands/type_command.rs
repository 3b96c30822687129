use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    key_value_store::KeyValueStore,
    resp::RespValue,
};

pub struct TypeArguments {
    key: String,
}

impl TypeArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 1 {
            return Err(CommandError::InvalidTypeCommand);
        }

        Ok(Self {
            key: arguments[0].clone(),
        })
    }
}

/// `TYPE key` replies `string`, `list`, `stream` or `none`.
pub async fn type_command(
    store: &KeyValueStore,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let type_arguments = TypeArguments::parse(arguments)?;
    let type_name = store.data_type(&type_arguments.key).await;

    Ok(CommandResult::Response(
        RespValue::SimpleString(type_name.to_string()).encode(),
    ))
}
