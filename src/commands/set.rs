use jiff::{SignedDuration, Timestamp};

use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    key_value_store::KeyValueStore,
    resp::RespValue,
};

/// Represents the parsed arguments for SET command
pub struct SetArguments {
    /// The key name to store the value under
    key: String,
    /// The value to be stored under the given key
    value: String,
    /// Absolute expiration of the key value pair
    expiration: Option<Timestamp>,
}

impl SetArguments {
    /// Parses command arguments into a SetArguments structure.
    ///
    /// # Arguments
    ///
    /// * `arguments` - A vector of strings representing the command arguments:
    ///   - Format 1: `[key, value]` - For permanent storage
    ///   - Format 2: `[key, value, "PX", milliseconds]` - For expiring storage
    ///
    /// # Returns
    ///
    /// * `Ok(SetArguments)` - Successfully parsed arguments. The expiration is
    ///   resolved to `now + milliseconds` at parse time.
    /// * `Err(CommandError::InvalidSetCommand)` - If the number of arguments is not 2 or 4
    /// * `Err(CommandError::InvalidSetCommandArgument)` - If the option is not "PX"
    /// * `Err(CommandError::InvalidSetCommandExpiration)` - If the milliseconds are not a
    ///   positive integer
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let result = SetArguments::parse(vec![
    ///     "mykey".to_string(),
    ///     "hello".to_string(),
    ///     "px".to_string(),
    ///     "1000".to_string()
    /// ]);
    /// // Returns: Ok(SetArguments { key: "mykey", value: "hello", expiration: Some(now + 1s) })
    /// ```
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 2 && arguments.len() != 4 {
            return Err(CommandError::InvalidSetCommand);
        }

        let mut expiration = None;

        if arguments.len() == 4 {
            if arguments[2].to_lowercase() != "px" {
                return Err(CommandError::InvalidSetCommandArgument);
            }

            let milliseconds = arguments[3]
                .parse::<i64>()
                .ok()
                .filter(|ms| *ms > 0)
                .ok_or(CommandError::InvalidSetCommandExpiration)?;

            let expires_at = Timestamp::now()
                .checked_add(SignedDuration::from_millis(milliseconds))
                .map_err(|_| CommandError::InvalidSetCommandExpiration)?;

            expiration = Some(expires_at);
        }

        Ok(Self {
            key: arguments[0].clone(),
            value: arguments[1].clone(),
            expiration,
        })
    }
}

/// Handles the SET command.
///
/// Stores a string under a key, replacing whatever the key held before,
/// including lists and streams.
///
/// # Arguments
///
/// * `store` - The shared key-value store
/// * `arguments` - Either `[key, value]` or `[key, value, "PX", milliseconds]`
///
/// # Returns
///
/// * `Ok(CommandResult::Response)` - `+OK\r\n`
/// * `Err(CommandError)` - See [`SetArguments::parse`]
pub async fn set(store: &KeyValueStore, arguments: Vec<String>) -> Result<CommandResult, CommandError> {
    let set_arguments = SetArguments::parse(arguments)?;

    store
        .set(&set_arguments.key, &set_arguments.value, set_arguments.expiration)
        .await;

    Ok(CommandResult::Response(
        RespValue::SimpleString("OK".to_string()).encode(),
    ))
}
