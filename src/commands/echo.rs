use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    resp::RespValue,
};

pub struct EchoArguments {
    message: String,
}

impl EchoArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        let [message] = <[String; 1]>::try_from(arguments)
            .map_err(|_| CommandError::InvalidEchoCommand)?;

        Ok(Self { message })
    }
}

pub fn echo(arguments: Vec<String>) -> Result<CommandResult, CommandError> {
    let echo_arguments = EchoArguments::parse(arguments)?;

    Ok(CommandResult::Response(
        RespValue::BulkString(echo_arguments.message).encode(),
    ))
}
