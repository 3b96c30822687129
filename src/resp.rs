//! Redis Serialization Protocol (RESP) values and a resumable decoder.
//!
//! The decoder keeps whatever bytes it has been fed and only yields a value
//! once every byte of it has arrived, so a command split across several TCP
//! reads is decoded exactly like one that arrived in a single read.

use bytes::{Buf, BytesMut};
use thiserror::Error;

/// Errors raised while decoding bytes that are not valid RESP.
#[derive(Error, Debug, PartialEq, Clone)]
pub enum RespError {
    #[error("unknown RESP type byte '{0}'")]
    UnknownRespType(char),
    #[error("invalid length {0}")]
    InvalidLength(i64),
    #[error("failed to parse integer")]
    FailedToParseInteger,
    #[error("invalid bulk string")]
    InvalidBulkString,
    #[error("invalid UTF-8 sequence")]
    InvalidUtf8,
}

impl RespError {
    pub fn as_string(&self) -> String {
        RespValue::Error(format!("ERR Protocol error: {}", self)).encode()
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum RespValue {
    SimpleString(String),
    Error(String),
    Integer(i64),
    BulkString(String),
    /// The null bulk string, `$-1\r\n`.
    Null,
    Array(Vec<RespValue>),
}

impl RespValue {
    /// Encodes the value into its exact wire form.
    ///
    /// # Examples
    ///
    /// ```
    /// use redis_replica_server::resp::RespValue;
    ///
    /// let command = RespValue::Array(vec![RespValue::BulkString("PING".to_string())]);
    /// assert_eq!(command.encode(), "*1\r\n$4\r\nPING\r\n");
    /// ```
    pub fn encode(&self) -> String {
        match self {
            RespValue::SimpleString(s) => format!("+{}\r\n", s),
            RespValue::Error(msg) => format!("-{}\r\n", msg),
            RespValue::Integer(i) => format!(":{}\r\n", i),
            RespValue::BulkString(s) => format!("${}\r\n{}\r\n", s.len(), s),
            RespValue::Null => "$-1\r\n".to_string(),
            RespValue::Array(elements) => {
                let mut encoded = format!("*{}\r\n", elements.len());

                for element in elements {
                    encoded.push_str(&element.encode());
                }

                encoded
            }
        }
    }

    /// Builds a command array out of bulk strings, the shape every client
    /// request and every propagated write takes on the wire.
    pub fn command<S: AsRef<str>>(parts: &[S]) -> Self {
        RespValue::Array(
            parts
                .iter()
                .map(|part| RespValue::BulkString(part.as_ref().to_string()))
                .collect(),
        )
    }

    pub fn encode_array_from_strings(values: Vec<String>) -> String {
        RespValue::Array(values.into_iter().map(RespValue::BulkString).collect()).encode()
    }
}

/// Stateful RESP decoder that buffers partial input between reads.
#[derive(Debug, Default)]
pub struct RespDecoder {
    buffer: BytesMut,
}

impl RespDecoder {
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(4096),
        }
    }

    /// Appends freshly read bytes to the pending buffer.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Decodes the next complete value, returning it with the number of
    /// bytes it occupied on the wire. `Ok(None)` means more input is needed.
    ///
    /// On a protocol error the pending buffer is discarded, since there is no
    /// reliable way to find the start of the next value.
    pub fn decode_next(&mut self) -> Result<Option<(RespValue, usize)>, RespError> {
        match parse_value(&self.buffer, 0) {
            Ok(Some((value, consumed))) => {
                self.buffer.advance(consumed);
                Ok(Some((value, consumed)))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                self.buffer.clear();
                Err(e)
            }
        }
    }

    /// Decodes every complete value currently buffered.
    pub fn decode_all(&mut self) -> Result<Vec<RespValue>, RespError> {
        let mut values = Vec::new();

        while let Some((value, _)) = self.decode_next()? {
            values.push(value);
        }

        Ok(values)
    }

    /// Decodes a snapshot transfer, `$<len>\r\n<payload>`, which unlike a bulk
    /// string carries no trailing CRLF.
    pub fn decode_snapshot(&mut self) -> Result<Option<Vec<u8>>, RespError> {
        let Some(&type_byte) = self.buffer.first() else {
            return Ok(None);
        };

        if type_byte != b'$' {
            self.buffer.clear();
            return Err(RespError::UnknownRespType(type_byte as char));
        }

        let Some((line, payload_start)) = read_line(&self.buffer, 1) else {
            return Ok(None);
        };

        let length = parse_integer(line)?;
        let length = usize::try_from(length).map_err(|_| RespError::InvalidLength(length))?;

        if self.buffer.len() < payload_start + length {
            return Ok(None);
        }

        self.buffer.advance(payload_start);
        Ok(Some(self.buffer.split_to(length).to_vec()))
    }
}

fn read_line(buffer: &[u8], start: usize) -> Option<(&[u8], usize)> {
    if start > buffer.len() {
        return None;
    }

    buffer[start..]
        .windows(2)
        .position(|window| window == b"\r\n")
        .map(|end| (&buffer[start..start + end], start + end + 2))
}

fn parse_integer(line: &[u8]) -> Result<i64, RespError> {
    std::str::from_utf8(line)
        .map_err(|_| RespError::InvalidUtf8)?
        .parse::<i64>()
        .map_err(|_| RespError::FailedToParseInteger)
}

fn parse_text(bytes: &[u8]) -> Result<String, RespError> {
    String::from_utf8(bytes.to_vec()).map_err(|_| RespError::InvalidUtf8)
}

/// Parses one value starting at `cursor`, returning it and the cursor just
/// past its last byte.
fn parse_value(buffer: &[u8], cursor: usize) -> Result<Option<(RespValue, usize)>, RespError> {
    let Some(&type_byte) = buffer.get(cursor) else {
        return Ok(None);
    };

    if !matches!(type_byte, b'+' | b'-' | b':' | b'$' | b'*') {
        return Err(RespError::UnknownRespType(type_byte as char));
    }

    let Some((line, next)) = read_line(buffer, cursor + 1) else {
        return Ok(None);
    };

    match type_byte {
        b'+' => Ok(Some((RespValue::SimpleString(parse_text(line)?), next))),
        b'-' => Ok(Some((RespValue::Error(parse_text(line)?), next))),
        b':' => Ok(Some((RespValue::Integer(parse_integer(line)?), next))),
        b'$' => {
            let length = parse_integer(line)?;

            if length == -1 {
                return Ok(Some((RespValue::Null, next)));
            }

            let length = usize::try_from(length).map_err(|_| RespError::InvalidLength(length))?;

            if buffer.len() < next + length + 2 {
                return Ok(None);
            }

            if &buffer[next + length..next + length + 2] != b"\r\n" {
                return Err(RespError::InvalidBulkString);
            }

            let content = parse_text(&buffer[next..next + length])?;
            Ok(Some((RespValue::BulkString(content), next + length + 2)))
        }
        _ => {
            let count = parse_integer(line)?;
            let count = usize::try_from(count).map_err(|_| RespError::InvalidLength(count))?;

            let mut elements = Vec::with_capacity(count.min(64));
            let mut element_cursor = next;

            for _ in 0..count {
                match parse_value(buffer, element_cursor)? {
                    Some((element, after)) => {
                        elements.push(element);
                        element_cursor = after;
                    }
                    None => return Ok(None),
                }
            }

            Ok(Some((RespValue::Array(elements), element_cursor)))
        }
    }
}
