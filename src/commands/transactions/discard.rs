use crate::{
    commands::{CommandError, command_handler::CommandResult},
    resp::RespValue,
    transactions::Transaction,
};

pub struct DiscardArguments;

impl DiscardArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if !arguments.is_empty() {
            return Err(CommandError::InvalidDiscardCommand);
        }

        Ok(Self)
    }
}

pub fn discard(transaction: &mut Transaction, arguments: Vec<String>) -> Result<CommandResult, CommandError> {
    DiscardArguments::parse(arguments)?;
    transaction.discard()?;

    Ok(CommandResult::Response(
        RespValue::SimpleString("OK".to_string()).encode(),
    ))
}
