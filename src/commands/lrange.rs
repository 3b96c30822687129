use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    key_value_store::KeyValueStore,
    resp::RespValue,
};

pub struct LrangeArguments {
    key: String,
    start_index: i64,
    end_index: i64,
}

impl LrangeArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 3 {
            return Err(CommandError::InvalidLRangeCommand);
        }

        let Ok(start_index) = arguments[1].parse::<i64>() else {
            return Err(CommandError::InvalidLRangeCommandArgument);
        };

        let Ok(end_index) = arguments[2].parse::<i64>() else {
            return Err(CommandError::InvalidLRangeCommandArgument);
        };

        Ok(Self {
            key: arguments[0].clone(),
            start_index,
            end_index,
        })
    }
}

/// `LRANGE key start stop`, both ends inclusive. Negative indexes count from
/// the end of the list and out of range indexes are clamped.
pub async fn lrange(store: &KeyValueStore, arguments: Vec<String>) -> Result<CommandResult, CommandError> {
    let lrange_arguments = LrangeArguments::parse(arguments)?;

    let range = store
        .range(
            &lrange_arguments.key,
            lrange_arguments.start_index,
            lrange_arguments.end_index,
        )
        .await?;

    Ok(CommandResult::Response(
        RespValue::encode_array_from_strings(range),
    ))
}
