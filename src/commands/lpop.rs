use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    key_value_store::KeyValueStore,
    resp::RespValue,
};

pub struct LpopArguments {
    key: String,
    count: Option<usize>,
}

impl LpopArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.is_empty() || arguments.len() > 2 {
            return Err(CommandError::InvalidLPopCommand);
        }

        let count = match arguments.get(1) {
            Some(count) => Some(
                count
                    .parse::<usize>()
                    .map_err(|_| CommandError::InvalidLPopCommandArgument)?,
            ),
            None => None,
        };

        Ok(Self {
            key: arguments[0].clone(),
            count,
        })
    }
}

/// Handles `LPOP key [count]`.
///
/// Without a count the reply is the popped value, or null for an empty or
/// missing list. With a count the reply is an array of up to `count` values,
/// or null when the key does not exist.
pub async fn lpop(store: &KeyValueStore, arguments: Vec<String>) -> Result<CommandResult, CommandError> {
    let lpop_arguments = LpopArguments::parse(arguments)?;

    let response = match lpop_arguments.count {
        None => {
            let mut popped = store.pop(&lpop_arguments.key, 1).await?;

            match popped.pop() {
                Some(value) => RespValue::BulkString(value).encode(),
                None => RespValue::Null.encode(),
            }
        }
        Some(count) => {
            let popped = store.pop(&lpop_arguments.key, count).await?;

            if popped.is_empty() && count > 0 {
                RespValue::Null.encode()
            } else {
                RespValue::encode_array_from_strings(popped)
            }
        }
    };

    Ok(CommandResult::Response(response))
}
