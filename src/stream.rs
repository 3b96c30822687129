//! Stream entries, entry ids and the rules for adding and querying them.

use std::{fmt, str::FromStr};

use thiserror::Error;

use crate::resp::RespValue;

#[derive(Error, Debug, PartialEq, Clone)]
pub enum StreamError {
    #[error("The ID specified in XADD is invalid format")]
    InvalidId,
    #[error("The ID specified in XADD is equal or smaller than the target stream top item")]
    IdNotIncreasing,
    #[error("The ID specified in XADD must be greater than 0-0")]
    ZeroId,
    #[error("Invalid stream ID specified as stream command argument")]
    InvalidRangeId,
}

impl StreamError {
    pub fn as_string(&self) -> String {
        RespValue::Error(format!("ERR {}", self)).encode()
    }
}

/// A `<milliseconds>-<sequence>` pair. Ordering compares milliseconds first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StreamId {
    pub ms: u64,
    pub seq: u64,
}

impl StreamId {
    pub const ZERO: StreamId = StreamId { ms: 0, seq: 0 };
    pub const MAX: StreamId = StreamId {
        ms: u64::MAX,
        seq: u64::MAX,
    };

    pub fn new(ms: u64, seq: u64) -> Self {
        Self { ms, seq }
    }

    /// The smallest id strictly greater than `self`.
    pub fn successor(self) -> Self {
        match self.seq.checked_add(1) {
            Some(seq) => Self { ms: self.ms, seq },
            None => Self {
                ms: self.ms.saturating_add(1),
                seq: 0,
            },
        }
    }

    /// Parses a range bound as accepted by XRANGE and XREAD.
    ///
    /// `-` and `+` map to the smallest and largest ids. A bare millisecond
    /// value covers the whole millisecond: sequence `0` as a start bound and
    /// the largest sequence as an end bound.
    pub fn parse_bound(input: &str, is_end: bool) -> Result<Self, StreamError> {
        match input {
            "-" => Ok(StreamId::ZERO),
            "+" => Ok(StreamId::MAX),
            _ => match input.split_once('-') {
                Some(_) => input.parse(),
                None => {
                    let ms = parse_digits(input).ok_or(StreamError::InvalidRangeId)?;
                    let seq = if is_end { u64::MAX } else { 0 };
                    Ok(StreamId { ms, seq })
                }
            },
        }
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.ms, self.seq)
    }
}

impl FromStr for StreamId {
    type Err = StreamError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let (ms, seq) = input.split_once('-').ok_or(StreamError::InvalidRangeId)?;

        match (parse_digits(ms), parse_digits(seq)) {
            (Some(ms), Some(seq)) => Ok(StreamId { ms, seq }),
            _ => Err(StreamError::InvalidRangeId),
        }
    }
}

fn parse_digits(input: &str) -> Option<u64> {
    if input.is_empty() || !input.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    input.parse().ok()
}

/// The id argument of XADD before it has been resolved against a stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RequestedId {
    /// `*`
    Auto,
    /// `<ms>-*`
    AutoSequence(u64),
    /// `<ms>-<seq>`
    Explicit(StreamId),
}

impl FromStr for RequestedId {
    type Err = StreamError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        if input == "*" {
            return Ok(RequestedId::Auto);
        }

        let (ms, seq) = input.split_once('-').ok_or(StreamError::InvalidId)?;
        let ms = parse_digits(ms).ok_or(StreamError::InvalidId)?;

        if seq == "*" {
            return Ok(RequestedId::AutoSequence(ms));
        }

        let seq = parse_digits(seq).ok_or(StreamError::InvalidId)?;
        Ok(RequestedId::Explicit(StreamId { ms, seq }))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StreamEntry {
    pub id: StreamId,
    pub fields: Vec<(String, String)>,
}

impl StreamEntry {
    /// `[id, [field, value, ...]]`
    pub fn to_resp(&self) -> RespValue {
        let mut fields = Vec::with_capacity(self.fields.len() * 2);

        for (field, value) in &self.fields {
            fields.push(RespValue::BulkString(field.clone()));
            fields.push(RespValue::BulkString(value.clone()));
        }

        RespValue::Array(vec![
            RespValue::BulkString(self.id.to_string()),
            RespValue::Array(fields),
        ])
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Stream {
    pub name: String,
    entries: Vec<StreamEntry>,
}

impl Stream {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last_id(&self) -> Option<StreamId> {
        self.entries.last().map(|entry| entry.id)
    }

    /// Resolves a requested id into a concrete one.
    ///
    /// For `*` the millisecond part is `now_ms`, never going backwards past
    /// the last stored id. The sequence continues from the last entry that
    /// shares the millisecond, starting at `0` (or `1` for millisecond `0`,
    /// since `0-0` can never be stored).
    pub fn generate_id(&self, requested: RequestedId, now_ms: u64) -> StreamId {
        match requested {
            RequestedId::Explicit(id) => id,
            RequestedId::AutoSequence(ms) => self.next_in_millisecond(ms),
            RequestedId::Auto => {
                let ms = match self.last_id() {
                    Some(last) if last.ms > now_ms => last.ms,
                    _ => now_ms,
                };
                self.next_in_millisecond(ms)
            }
        }
    }

    fn next_in_millisecond(&self, ms: u64) -> StreamId {
        match self.last_id() {
            Some(last) if last.ms == ms => StreamId {
                ms,
                seq: last.seq.saturating_add(1),
            },
            _ if ms == 0 => StreamId { ms: 0, seq: 1 },
            _ => StreamId { ms, seq: 0 },
        }
    }

    pub fn validate(&self, id: StreamId) -> Result<(), StreamError> {
        if id == StreamId::ZERO {
            return Err(StreamError::ZeroId);
        }

        match self.last_id() {
            Some(last) if id <= last => Err(StreamError::IdNotIncreasing),
            _ => Ok(()),
        }
    }

    /// Inserts an entry. Callers must [`validate`](Stream::validate) the id first.
    pub fn append(&mut self, id: StreamId, fields: Vec<(String, String)>) {
        self.entries.push(StreamEntry { id, fields });
    }

    /// Generates, validates and appends in one step.
    pub fn add(
        &mut self,
        requested: RequestedId,
        fields: Vec<(String, String)>,
        now_ms: u64,
    ) -> Result<StreamId, StreamError> {
        let id = self.generate_id(requested, now_ms);
        self.validate(id)?;
        self.append(id, fields);

        Ok(id)
    }

    /// Entries with `from <= id <= to`, or `from < id <= to` when
    /// `inclusive_from` is false.
    pub fn range_query(&self, from: StreamId, to: StreamId, inclusive_from: bool) -> Vec<StreamEntry> {
        let from = if inclusive_from { from } else { from.successor() };

        if from > to {
            return Vec::new();
        }

        let start = self.entries.partition_point(|entry| entry.id < from);

        self.entries[start..]
            .iter()
            .take_while(|entry| entry.id <= to)
            .cloned()
            .collect()
    }
}
