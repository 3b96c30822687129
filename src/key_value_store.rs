//! The shared keyspace: strings with optional expiry, lists and streams.
//!
//! [`KeyValueStore`] synchronizes internally, so connection tasks share one
//! instance behind an `Arc` and never lock around it themselves. Writers that
//! can unblock a waiting BLPOP or XREAD signal the waiter registry while still
//! holding the keyspace lock, and waiters register under that same lock, so a
//! wakeup cannot slip between a waiter's check and its registration.

use std::collections::{HashMap, VecDeque};

use globset::Glob;
use jiff::Timestamp;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::{
    resp::RespValue,
    state::{BlockingCommand, State, Subscriber},
    stream::{RequestedId, Stream, StreamEntry, StreamError, StreamId},
};

#[derive(Error, Debug, PartialEq, Clone)]
pub enum StoreError {
    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,
    #[error("value is not an integer or out of range")]
    NotAnInteger,
    #[error("invalid pattern: {0}")]
    InvalidPattern(String),
    #[error(transparent)]
    Stream(#[from] StreamError),
}

impl StoreError {
    pub fn as_string(&self) -> String {
        RespValue::Error(format!("ERR {}", self)).encode()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DataType {
    String(String),
    List(VecDeque<String>),
    Stream(Stream),
}

impl DataType {
    pub fn type_name(&self) -> &'static str {
        match self {
            DataType::String(_) => "string",
            DataType::List(_) => "list",
            DataType::Stream(_) => "stream",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    pub data: DataType,
    pub expiration: Option<Timestamp>,
}

impl Value {
    pub fn string(value: impl Into<String>, expiration: Option<Timestamp>) -> Self {
        Self {
            data: DataType::String(value.into()),
            expiration,
        }
    }

    /// An entry is expired from the instant its expiry is reached.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        matches!(self.expiration, Some(expiration) if now >= expiration)
    }
}

#[derive(Debug, Default)]
pub struct KeyValueStore {
    entries: Mutex<HashMap<String, Value>>,
    state: Mutex<State>,
}

/// Looks a key up, evicting it first if it has expired.
fn live_value<'a>(entries: &'a mut HashMap<String, Value>, key: &str) -> Option<&'a mut Value> {
    if entries
        .get(key)
        .is_some_and(|value| value.is_expired(Timestamp::now()))
    {
        entries.remove(key);
        return None;
    }

    entries.get_mut(key)
}

fn list_mut<'a>(
    entries: &'a mut HashMap<String, Value>,
    key: &str,
) -> Result<Option<&'a mut VecDeque<String>>, StoreError> {
    match live_value(entries, key) {
        None => Ok(None),
        Some(Value {
            data: DataType::List(list),
            ..
        }) => Ok(Some(list)),
        Some(_) => Err(StoreError::WrongType),
    }
}

fn stream_mut<'a>(
    entries: &'a mut HashMap<String, Value>,
    key: &str,
) -> Result<Option<&'a mut Stream>, StoreError> {
    match live_value(entries, key) {
        None => Ok(None),
        Some(Value {
            data: DataType::Stream(stream),
            ..
        }) => Ok(Some(stream)),
        Some(_) => Err(StoreError::WrongType),
    }
}

/// Converts inclusive, possibly negative indices into a clamped slice range.
fn resolve_range(len: usize, start: i64, end: i64) -> Option<(usize, usize)> {
    let len = i64::try_from(len).ok()?;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let end = if end < 0 { len + end } else { end.min(len - 1) };

    if len == 0 || start > end || start >= len {
        return None;
    }

    Some((usize::try_from(start).ok()?, usize::try_from(end).ok()?))
}

fn pop_front(
    entries: &mut HashMap<String, Value>,
    key: &str,
    count: usize,
) -> Result<Vec<String>, StoreError> {
    let Some(list) = list_mut(entries, key)? else {
        return Ok(Vec::new());
    };

    let count = count.min(list.len());
    let popped: Vec<String> = list.drain(..count).collect();

    if list.is_empty() {
        entries.remove(key);
    }

    Ok(popped)
}

impl KeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bulk-inserts entries, as read from a snapshot file.
    pub async fn load(&self, values: impl IntoIterator<Item = (String, Value)>) -> usize {
        let now = Timestamp::now();
        let mut entries = self.entries.lock().await;
        let mut loaded = 0;

        for (key, value) in values {
            if value.is_expired(now) {
                continue;
            }

            entries.insert(key, value);
            loaded += 1;
        }

        loaded
    }

    pub async fn set(&self, key: &str, value: &str, expiration: Option<Timestamp>) {
        let mut entries = self.entries.lock().await;
        entries.insert(key.to_string(), Value::string(value, expiration));
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut entries = self.entries.lock().await;

        match live_value(&mut entries, key) {
            None => Ok(None),
            Some(Value {
                data: DataType::String(value),
                ..
            }) => Ok(Some(value.clone())),
            Some(_) => Err(StoreError::WrongType),
        }
    }

    pub async fn remove(&self, key: &str) -> bool {
        let mut entries = self.entries.lock().await;
        entries.remove(key).is_some()
    }

    /// Returns the live keys matching a glob pattern, sorted. Expired keys met
    /// during the scan are evicted.
    pub async fn keys(&self, pattern: &str) -> Result<Vec<String>, StoreError> {
        let matcher = Glob::new(pattern)
            .map_err(|e| StoreError::InvalidPattern(e.to_string()))?
            .compile_matcher();

        let now = Timestamp::now();
        let mut entries = self.entries.lock().await;
        entries.retain(|_, value| !value.is_expired(now));

        let mut keys: Vec<String> = entries
            .keys()
            .filter(|key| matcher.is_match(key.as_str()))
            .cloned()
            .collect();
        keys.sort();

        Ok(keys)
    }

    /// `string`, `list`, `stream` or `none`.
    pub async fn data_type(&self, key: &str) -> &'static str {
        let mut entries = self.entries.lock().await;
        live_value(&mut entries, key).map_or("none", |value| value.data.type_name())
    }

    /// Increments an integer string, creating it as `1` when absent. Any
    /// expiry on the key is kept.
    pub async fn incr(&self, key: &str) -> Result<i64, StoreError> {
        let mut entries = self.entries.lock().await;

        match live_value(&mut entries, key) {
            None => {
                entries.insert(key.to_string(), Value::string("1", None));
                Ok(1)
            }
            Some(Value {
                data: DataType::String(value),
                ..
            }) => {
                let incremented = value
                    .parse::<i64>()
                    .ok()
                    .and_then(|number| number.checked_add(1))
                    .ok_or(StoreError::NotAnInteger)?;

                *value = incremented.to_string();
                Ok(incremented)
            }
            Some(_) => Err(StoreError::WrongType),
        }
    }

    /// Appends (or prepends, one value at a time) to a list and wakes one
    /// blocked BLPOP per pushed value. Returns the new length.
    pub async fn push(&self, key: &str, values: &[String], at_front: bool) -> Result<usize, StoreError> {
        let mut entries = self.entries.lock().await;

        let length = match list_mut(&mut entries, key)? {
            Some(list) => {
                for value in values {
                    if at_front {
                        list.push_front(value.clone());
                    } else {
                        list.push_back(value.clone());
                    }
                }

                list.len()
            }
            None => {
                let mut list = VecDeque::with_capacity(values.len());

                for value in values {
                    if at_front {
                        list.push_front(value.clone());
                    } else {
                        list.push_back(value.clone());
                    }
                }

                let length = list.len();
                entries.insert(
                    key.to_string(),
                    Value {
                        data: DataType::List(list),
                        expiration: None,
                    },
                );

                length
            }
        };

        let mut state = self.state.lock().await;
        state.notify_oldest(BlockingCommand::Blpop, key, values.len());

        Ok(length)
    }

    /// Removes up to `count` values from the front of a list. An emptied list
    /// is deleted.
    pub async fn pop(&self, key: &str, count: usize) -> Result<Vec<String>, StoreError> {
        let mut entries = self.entries.lock().await;
        pop_front(&mut entries, key, count)
    }

    /// Pops one value, or registers `subscriber` to be woken by the next push
    /// when the list is empty. A `resumed` subscriber was already woken once
    /// and goes back to the head of the queue.
    pub async fn pop_or_subscribe(
        &self,
        key: &str,
        subscriber: Subscriber,
        resumed: bool,
    ) -> Result<Option<String>, StoreError> {
        let mut entries = self.entries.lock().await;

        if let Some(value) = pop_front(&mut entries, key, 1)?.pop() {
            return Ok(Some(value));
        }

        let mut state = self.state.lock().await;

        if resumed {
            state.requeue_subscriber(BlockingCommand::Blpop, key, subscriber);
        } else {
            state.add_subscriber(BlockingCommand::Blpop, key, subscriber);
        }

        Ok(None)
    }

    pub async fn unsubscribe(&self, command: BlockingCommand, keys: &[String], client_address: &str) {
        let mut state = self.state.lock().await;

        for key in keys {
            state.remove_subscriber(command, key, client_address);
        }
    }

    pub async fn len(&self, key: &str) -> Result<usize, StoreError> {
        let mut entries = self.entries.lock().await;
        Ok(list_mut(&mut entries, key)?.map_or(0, |list| list.len()))
    }

    /// Inclusive range with negative indices counted from the end.
    pub async fn range(&self, key: &str, start: i64, end: i64) -> Result<Vec<String>, StoreError> {
        let mut entries = self.entries.lock().await;

        let Some(list) = list_mut(&mut entries, key)? else {
            return Ok(Vec::new());
        };

        Ok(match resolve_range(list.len(), start, end) {
            Some((start, end)) => list.range(start..=end).cloned().collect(),
            None => Vec::new(),
        })
    }

    /// Adds a stream entry, creating the stream if needed, and wakes every
    /// blocked XREAD on it. Nothing is created when the id is rejected.
    pub async fn xadd(
        &self,
        key: &str,
        requested: RequestedId,
        fields: Vec<(String, String)>,
    ) -> Result<StreamId, StoreError> {
        let now_ms = u64::try_from(Timestamp::now().as_millisecond()).unwrap_or_default();
        let mut entries = self.entries.lock().await;

        let id = match stream_mut(&mut entries, key)? {
            Some(stream) => stream.add(requested, fields, now_ms)?,
            None => {
                let mut stream = Stream::new(key);
                let id = stream.add(requested, fields, now_ms)?;

                entries.insert(
                    key.to_string(),
                    Value {
                        data: DataType::Stream(stream),
                        expiration: None,
                    },
                );

                id
            }
        };

        let mut state = self.state.lock().await;
        state.notify_all(BlockingCommand::Xread, key);

        Ok(id)
    }

    pub async fn xrange(
        &self,
        key: &str,
        from: StreamId,
        to: StreamId,
    ) -> Result<Vec<StreamEntry>, StoreError> {
        let mut entries = self.entries.lock().await;

        Ok(stream_mut(&mut entries, key)?
            .map(|stream| stream.range_query(from, to, true))
            .unwrap_or_default())
    }

    pub async fn last_stream_id(&self, key: &str) -> Result<Option<StreamId>, StoreError> {
        let mut entries = self.entries.lock().await;
        Ok(stream_mut(&mut entries, key)?.and_then(|stream| stream.last_id()))
    }

    /// Reads entries strictly after each given id. Only streams that produced
    /// entries are returned. When nothing was found and a subscriber is given,
    /// it is registered on every queried stream.
    pub async fn xread_or_subscribe(
        &self,
        queries: &[(String, StreamId)],
        subscriber: Option<Subscriber>,
    ) -> Result<Vec<(String, Vec<StreamEntry>)>, StoreError> {
        let mut entries = self.entries.lock().await;
        let mut results = Vec::new();

        for (key, after) in queries {
            if let Some(stream) = stream_mut(&mut entries, key)? {
                let found = stream.range_query(*after, StreamId::MAX, false);

                if !found.is_empty() {
                    results.push((key.clone(), found));
                }
            }
        }

        if results.is_empty() {
            if let Some(subscriber) = subscriber {
                let mut state = self.state.lock().await;

                for (key, _) in queries {
                    state.add_subscriber(BlockingCommand::Xread, key, subscriber.clone());
                }
            }
        }

        Ok(results)
    }
}
