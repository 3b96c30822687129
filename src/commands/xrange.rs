use crate::{
    commands::{
        command_error::CommandError, command_handler::CommandResult,
        stream_utils::parse_stream_entries_to_resp,
    },
    key_value_store::KeyValueStore,
    stream::StreamId,
};

/// `XRANGE key start end [COUNT count]`
pub struct XrangeArguments {
    key: String,
    start: StreamId,
    end: StreamId,
    count: Option<usize>,
}

impl XrangeArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 3 && arguments.len() != 5 {
            return Err(CommandError::InvalidXRangeCommand);
        }

        let start = StreamId::parse_bound(&arguments[1], false)?;
        let end = StreamId::parse_bound(&arguments[2], true)?;

        let count = if arguments.len() == 5 {
            if arguments[3].to_lowercase() != "count" {
                return Err(CommandError::InvalidXRangeCommand);
            }

            Some(
                arguments[4]
                    .parse::<usize>()
                    .map_err(|_| CommandError::InvalidXRangeCommand)?,
            )
        } else {
            None
        };

        Ok(Self {
            key: arguments[0].clone(),
            start,
            end,
            count,
        })
    }
}

/// Entries with ids between `start` and `end`, both inclusive. `-` and `+`
/// stand for the first and last possible ids.
pub async fn xrange(store: &KeyValueStore, arguments: Vec<String>) -> Result<CommandResult, CommandError> {
    let xrange_arguments = XrangeArguments::parse(arguments)?;

    let mut entries = store
        .xrange(&xrange_arguments.key, xrange_arguments.start, xrange_arguments.end)
        .await?;

    if let Some(count) = xrange_arguments.count {
        entries.truncate(count);
    }

    Ok(CommandResult::Response(
        parse_stream_entries_to_resp(&entries).encode(),
    ))
}
