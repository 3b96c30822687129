use crate::{
    commands::{CommandError, command_handler::CommandResult},
    resp::RespValue,
    transactions::Transaction,
};

pub struct MultiArguments;

impl MultiArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if !arguments.is_empty() {
            return Err(CommandError::InvalidMultiCommand);
        }

        Ok(Self)
    }
}

pub fn multi(transaction: &mut Transaction, arguments: Vec<String>) -> Result<CommandResult, CommandError> {
    MultiArguments::parse(arguments)?;
    transaction.begin()?;

    Ok(CommandResult::Response(
        RespValue::SimpleString("OK".to_string()).encode(),
    ))
}
