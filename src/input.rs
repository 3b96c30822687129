//! Reading RESP frames from network streams.
//!
//! A [`RespReader`] owns the read half of a socket together with a
//! [`RespDecoder`], so bytes that arrive after a frame (a pipelined command,
//! or the first propagated write following a snapshot transfer) stay buffered
//! for the next call instead of being lost.

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::resp::{RespDecoder, RespError, RespValue};

/// Errors that can occur while reading frames from a network stream.
#[derive(Error, Debug, PartialEq)]
pub enum CommandReadError {
    #[error("I/O error: {0}")]
    IoError(String),
    #[error("Connection closed")]
    ConnectionClosed,
    #[error("RESP parse error: {0}")]
    RespParseError(#[from] RespError),
}

impl CommandReadError {
    pub fn as_string(&self) -> String {
        match self {
            CommandReadError::IoError(msg) => RespValue::Error(format!("ERR {}", msg)).encode(),
            CommandReadError::ConnectionClosed => {
                RespValue::Error("ERR connection closed".to_string()).encode()
            }
            CommandReadError::RespParseError(err) => err.as_string(),
        }
    }
}

pub struct RespReader<R> {
    reader: R,
    decoder: RespDecoder,
    buffer: [u8; 4096],
}

impl<R> RespReader<R>
where
    R: AsyncRead + Unpin,
{
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            decoder: RespDecoder::new(),
            buffer: [0; 4096],
        }
    }

    /// Reads until one complete frame is available.
    ///
    /// # Returns
    ///
    /// * `Ok((RespValue, usize))` - The frame and the exact number of bytes it occupied
    /// * `Err(CommandReadError::ConnectionClosed)` - If the peer closed the stream
    /// * `Err(CommandReadError::RespParseError)` - If the peer sent malformed bytes
    pub async fn read_frame(&mut self) -> Result<(RespValue, usize), CommandReadError> {
        loop {
            if let Some(frame) = self.decoder.decode_next()? {
                return Ok(frame);
            }

            self.fill().await?;
        }
    }

    /// Reads a snapshot transfer (`$<len>\r\n<payload>`, no trailing CRLF).
    pub async fn read_snapshot(&mut self) -> Result<Vec<u8>, CommandReadError> {
        loop {
            if let Some(payload) = self.decoder.decode_snapshot()? {
                return Ok(payload);
            }

            self.fill().await?;
        }
    }

    async fn fill(&mut self) -> Result<(), CommandReadError> {
        let number_of_bytes = self
            .reader
            .read(&mut self.buffer)
            .await
            .map_err(|e| CommandReadError::IoError(e.to_string()))?;

        if number_of_bytes == 0 {
            return Err(CommandReadError::ConnectionClosed);
        }

        self.decoder.feed(&self.buffer[..number_of_bytes]);
        Ok(())
    }
}
