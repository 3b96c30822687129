use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    resp::RespValue,
    server::RedisServer,
    state::{BlockingCommand, Subscriber},
};

pub struct BlpopArguments {
    key: String,
    /// `None` blocks until a value arrives.
    timeout: Option<Duration>,
}

impl BlpopArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 2 {
            return Err(CommandError::InvalidBLPopCommand);
        }

        let seconds = arguments[1]
            .parse::<f64>()
            .map_err(|_| CommandError::InvalidBLPopCommandArgument)?;

        let timeout = Duration::try_from_secs_f64(seconds)
            .map_err(|_| CommandError::InvalidBLPopCommandArgument)?;

        Ok(Self {
            key: arguments[0].clone(),
            timeout: (!timeout.is_zero()).then_some(timeout),
        })
    }
}

/// Pops from the head of the list while holding the write-order guard, and
/// forwards the pop to replicas as `LPOP key`. With a subscriber, an empty
/// list registers it instead; a `resumed` one keeps its place at the head.
async fn pop_and_propagate(
    server: &RedisServer,
    key: &str,
    subscriber: Option<Subscriber>,
    resumed: bool,
) -> Result<Option<String>, CommandError> {
    let _write_order = server.role.write_order_guard().await;

    let popped = match subscriber {
        Some(subscriber) => server.store.pop_or_subscribe(key, subscriber, resumed).await?,
        None => server.store.pop(key, 1).await?.pop(),
    };

    if popped.is_some() {
        server.role.propagate(&RespValue::command(&["LPOP", key])).await;
    }

    Ok(popped)
}

/// Handles `BLPOP key timeout`.
///
/// Replies `[key, value]` as soon as the list has a value. Otherwise the
/// connection waits until a push wakes it or the timeout (fractional seconds,
/// `0` for no limit) runs out, in which case the reply is null. A woken waiter
/// that loses the value to another client waits again at the head of the
/// queue.
pub async fn blpop(
    server: &RedisServer,
    client_address: &str,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let blpop_arguments = BlpopArguments::parse(arguments)?;
    let key = blpop_arguments.key;
    let deadline = blpop_arguments.timeout.map(|timeout| Instant::now() + timeout);

    let found = |value: String| {
        Ok(CommandResult::Response(RespValue::encode_array_from_strings(
            vec![key.clone(), value],
        )))
    };

    let mut resumed = false;

    loop {
        let (subscriber, mut receiver) = Subscriber::new(client_address);

        if let Some(value) = pop_and_propagate(server, &key, Some(subscriber), resumed).await? {
            return found(value);
        }

        debug!(client = %client_address, key = %key, "BLPOP waiting");

        let notified = match deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, receiver.recv())
                .await
                .ok()
                .flatten(),
            None => receiver.recv().await,
        };

        if notified.is_some() {
            resumed = true;
            continue;
        }

        server
            .store
            .unsubscribe(BlockingCommand::Blpop, std::slice::from_ref(&key), client_address)
            .await;

        // A push may have signalled between the timeout and the unsubscribe.
        if receiver.try_recv().is_ok() {
            if let Some(value) = pop_and_propagate(server, &key, None, false).await? {
                return found(value);
            }
        }

        return Ok(CommandResult::Response(RespValue::Null.encode()));
    }
}
