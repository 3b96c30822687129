use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    key_value_store::KeyValueStore,
    resp::RespValue,
    stream::{RequestedId, StreamId},
};

/// Represents the parsed arguments for the XADD command.
///
/// Format: `XADD key id field value [field value ...]`
pub struct XaddArguments {
    key: String,
    /// `*`, `<ms>-*` or `<ms>-<seq>`
    requested_id: RequestedId,
    fields: Vec<(String, String)>,
}

impl XaddArguments {
    /// Parses command arguments into structured XaddArguments.
    ///
    /// # Returns
    ///
    /// * `Ok(XaddArguments)` - Successfully parsed arguments
    /// * `Err(CommandError::InvalidXAddCommand)` - If there is no field/value pair or a
    ///   field is missing its value
    /// * `Err(CommandError::Stream(StreamError::InvalidId))` - If the id is malformed
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() < 4 || arguments.len() % 2 != 0 {
            return Err(CommandError::InvalidXAddCommand);
        }

        let requested_id = arguments[1].parse::<RequestedId>()?;

        let fields = arguments[2..]
            .chunks_exact(2)
            .map(|pair| (pair[0].clone(), pair[1].clone()))
            .collect();

        Ok(Self {
            key: arguments[0].clone(),
            requested_id,
            fields,
        })
    }
}

/// An entry accepted by XADD.
pub struct AddedEntry {
    key: String,
    id: StreamId,
    fields: Vec<(String, String)>,
}

impl AddedEntry {
    pub fn response(&self) -> CommandResult {
        CommandResult::Response(RespValue::BulkString(self.id.to_string()).encode())
    }

    /// The XADD replicas apply. It always carries the stored id, so `*` and
    /// `<ms>-*` resolve to the same entry on every replica.
    pub fn replicated_command(&self) -> RespValue {
        let id = self.id.to_string();
        let mut parts = vec!["XADD", self.key.as_str(), id.as_str()];

        for (field, value) in &self.fields {
            parts.push(field.as_str());
            parts.push(value.as_str());
        }

        RespValue::command(&parts)
    }
}

/// Handles the XADD command.
///
/// Appends an entry to the stream, creating the stream on first use. Ids
/// that are `0-0` or not greater than the stream's last id are rejected
/// without touching the stream. Every XREAD blocked on the stream is woken
/// up.
pub async fn xadd(store: &KeyValueStore, arguments: Vec<String>) -> Result<AddedEntry, CommandError> {
    let xadd_arguments = XaddArguments::parse(arguments)?;

    let id = store
        .xadd(
            &xadd_arguments.key,
            xadd_arguments.requested_id,
            xadd_arguments.fields.clone(),
        )
        .await?;

    Ok(AddedEntry {
        key: xadd_arguments.key,
        id,
        fields: xadd_arguments.fields,
    })
}
