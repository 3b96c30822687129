use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::{
    commands::{
        command_error::CommandError, command_handler::CommandResult,
        stream_utils::parse_streams_to_resp,
    },
    key_value_store::KeyValueStore,
    resp::RespValue,
    state::{BlockingCommand, Subscriber},
    stream::{StreamEntry, StreamId},
};

/// Represents the parsed arguments for the XREAD command.
///
/// Format: `XREAD [COUNT count] [BLOCK milliseconds] STREAMS key1 key2 ... id1 id2 ...`
pub struct XreadArguments {
    /// `None` for a non-blocking read. `Some(0)` blocks until data arrives.
    blocking_duration: Option<u64>,
    count: Option<usize>,
    /// (stream name, id) pairs. The id is kept as given so that `$` can be
    /// resolved when the command runs.
    key_stream_pairs: Vec<(String, String)>,
}

impl XreadArguments {
    /// Parses command arguments into structured XreadArguments.
    ///
    /// # Returns
    ///
    /// * `Ok(XreadArguments)` - Successfully parsed arguments
    /// * `Err(CommandError::InvalidXReadCommand)` - If `STREAMS` is missing or has no pairs
    /// * `Err(CommandError::UnbalancedXReadStreams)` - If keys and ids do not pair up
    /// * `Err(CommandError::InvalidXReadBlockDuration)` - If the block duration is not a number
    /// * `Err(CommandError::InvalidXReadOption)` - If an unknown option precedes `STREAMS`
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        let mut blocking_duration = None;
        let mut count = None;
        let mut index = 0;

        loop {
            let Some(option) = arguments.get(index) else {
                return Err(CommandError::InvalidXReadCommand);
            };

            match option.to_lowercase().as_str() {
                "streams" => {
                    index += 1;
                    break;
                }
                "block" => {
                    let duration = arguments
                        .get(index + 1)
                        .and_then(|value| value.parse::<u64>().ok())
                        .ok_or(CommandError::InvalidXReadBlockDuration)?;

                    blocking_duration = Some(duration);
                    index += 2;
                }
                "count" => {
                    let value = arguments
                        .get(index + 1)
                        .and_then(|value| value.parse::<usize>().ok())
                        .ok_or(CommandError::InvalidXReadOption)?;

                    count = Some(value);
                    index += 2;
                }
                _ => return Err(CommandError::InvalidXReadOption),
            }
        }

        let data = &arguments[index..];

        if data.is_empty() {
            return Err(CommandError::InvalidXReadCommand);
        }

        if data.len() % 2 != 0 {
            return Err(CommandError::UnbalancedXReadStreams);
        }

        let (keys, ids) = data.split_at(data.len() / 2);
        let key_stream_pairs = keys.iter().cloned().zip(ids.iter().cloned()).collect();

        Ok(Self {
            blocking_duration,
            count,
            key_stream_pairs,
        })
    }
}

/// Turns each requested id into the id reads must start after. `$` is the
/// stream's current last id, or `0-0` for a stream that does not exist yet.
async fn resolve_stream_ids(
    store: &KeyValueStore,
    key_stream_pairs: Vec<(String, String)>,
) -> Result<Vec<(String, StreamId)>, CommandError> {
    let mut resolved = Vec::with_capacity(key_stream_pairs.len());

    for (key, stream_id) in key_stream_pairs {
        let id = if stream_id == "$" {
            store.last_stream_id(&key).await?.unwrap_or(StreamId::ZERO)
        } else {
            StreamId::parse_bound(&stream_id, false)?
        };

        resolved.push((key, id));
    }

    Ok(resolved)
}

fn streams_response(mut streams: Vec<(String, Vec<StreamEntry>)>, count: Option<usize>) -> CommandResult {
    if streams.is_empty() {
        return CommandResult::Response(RespValue::Null.encode());
    }

    if let Some(count) = count {
        for (_, entries) in streams.iter_mut() {
            entries.truncate(count);
        }
    }

    CommandResult::Response(parse_streams_to_resp(&streams).encode())
}

/// Handles the XREAD command.
///
/// Replies with the entries strictly after the given id of every listed
/// stream, leaving out streams without new entries. With `BLOCK` and nothing
/// to return yet, the connection waits until an XADD on one of the streams or
/// until the timeout. A read that finds nothing replies null.
pub async fn xread(
    store: &KeyValueStore,
    client_address: &str,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let xread_arguments = XreadArguments::parse(arguments)?;
    let count = xread_arguments.count;
    let queries = resolve_stream_ids(store, xread_arguments.key_stream_pairs).await?;

    let Some(blocking_duration_ms) = xread_arguments.blocking_duration else {
        let streams = store.xread_or_subscribe(&queries, None).await?;
        return Ok(streams_response(streams, count));
    };

    let deadline = (blocking_duration_ms > 0)
        .then(|| Instant::now() + Duration::from_millis(blocking_duration_ms));
    let keys: Vec<String> = queries.iter().map(|(key, _)| key.clone()).collect();

    loop {
        let (subscriber, mut receiver) = Subscriber::new(client_address);
        let streams = store.xread_or_subscribe(&queries, Some(subscriber)).await?;

        if !streams.is_empty() {
            return Ok(streams_response(streams, count));
        }

        debug!(client = %client_address, streams = ?keys, "XREAD waiting");

        let notified = match deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, receiver.recv())
                .await
                .ok()
                .flatten(),
            None => receiver.recv().await,
        };

        store
            .unsubscribe(BlockingCommand::Xread, &keys, client_address)
            .await;

        if notified.is_none() {
            let streams = store.xread_or_subscribe(&queries, None).await?;
            return Ok(streams_response(streams, count));
        }
    }
}
