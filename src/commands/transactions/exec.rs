use crate::{
    commands::{CommandError, command_handler::CommandResult},
    transactions::Transaction,
};

pub struct ExecArguments;

impl ExecArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if !arguments.is_empty() {
            return Err(CommandError::InvalidExecCommand);
        }

        Ok(Self)
    }
}

/// Ends the transaction and hands back its queue. The caller runs the
/// commands and collects their replies; an empty queue replies `*0`.
pub fn exec(transaction: &mut Transaction, arguments: Vec<String>) -> Result<CommandResult, CommandError> {
    ExecArguments::parse(arguments)?;
    let queued = transaction.take_queued()?;

    Ok(CommandResult::Batch(queued))
}
