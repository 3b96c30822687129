use crate::{
    commands::{CommandError, CommandResult},
    config::ServerConfig,
    resp::RespValue,
};

pub struct ConfigGetArguments {
    pub parameters: Vec<String>,
}

impl ConfigGetArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.is_empty() {
            return Err(CommandError::InvalidConfigGetCommand);
        }

        Ok(ConfigGetArguments {
            parameters: arguments,
        })
    }
}

/// `CONFIG GET parameter [parameter ...]` replies with a flat array of
/// name/value pairs. Unknown parameters are left out.
pub fn config_get(config: &ServerConfig, arguments: Vec<String>) -> Result<CommandResult, CommandError> {
    let config_get_arguments = ConfigGetArguments::parse(arguments)?;
    let mut response = Vec::new();

    for parameter in config_get_arguments.parameters {
        if let Some(value) = config.get(&parameter) {
            response.push(parameter.to_lowercase());
            response.push(value);
        }
    }

    Ok(CommandResult::Response(
        RespValue::encode_array_from_strings(response),
    ))
}
