use std::collections::HashMap;

use tracing::debug;

use crate::{
    key_value_store::Value,
    rdb::{
        RdbError,
        opcode::{OpCode, parse_header, parse_opcode},
    },
};

/// Upper bound on the entries reserved up front from a resize-db section,
/// whose sizes come from the file and are not trusted.
const MAX_RESERVED_ENTRIES: usize = 1024;

/// Incremental snapshot decoder. Bytes can be fed in arbitrary chunks; a
/// section cut short by a chunk boundary is retried once more bytes arrive.
#[derive(Debug, Default)]
pub struct RdbParser {
    buffer: Vec<u8>,
    pub version: Option<u32>,
    pub metadata: HashMap<String, String>,
    pub database_number: Option<usize>,
    pub entries: Vec<(String, Value)>,
    pub crc64_checksum: Option<[u8; 8]>,
}

impl RdbParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once the end-of-file section has been read.
    pub fn is_complete(&self) -> bool {
        self.crc64_checksum.is_some()
    }

    pub fn parse(&mut self, chunk: &[u8]) -> Result<(), RdbError> {
        if self.is_complete() {
            return Ok(());
        }

        self.buffer.extend_from_slice(chunk);
        let mut cursor = 0;

        if self.version.is_none() {
            match parse_header(&self.buffer) {
                Ok((version, read)) => {
                    self.version = Some(version);
                    cursor += read;
                }
                Err(RdbError::Incomplete) => return Ok(()),
                Err(e) => return Err(e),
            }
        }

        while cursor < self.buffer.len() && !self.is_complete() {
            let (opcode, read) = match parse_opcode(&self.buffer, cursor) {
                Ok(parsed) => parsed,
                Err(RdbError::Incomplete) => break,
                Err(e) => return Err(e),
            };

            cursor += read;

            match opcode {
                OpCode::Metadata { key, value } => {
                    self.metadata.insert(key, value);
                }
                OpCode::ResizeDb {
                    hash_table_size, ..
                } => {
                    self.entries.reserve(hash_table_size.min(MAX_RESERVED_ENTRIES));
                }
                OpCode::Database { database_number } => {
                    self.database_number = Some(database_number);
                }
                OpCode::KeyValuePair {
                    key,
                    value,
                    expiration,
                } => {
                    self.entries.push((key, Value::string(value, expiration)));
                }
                OpCode::EndOfFile { crc64_checksum } => {
                    self.crc64_checksum = Some(crc64_checksum);
                }
            }
        }

        self.buffer.drain(..cursor);

        if self.is_complete() {
            debug!(
                entries = self.entries.len(),
                metadata = self.metadata.len(),
                "snapshot parsed"
            );
        }

        Ok(())
    }

    /// Consumes the parser, failing if the end-of-file section never arrived.
    pub fn finish(self) -> Result<Vec<(String, Value)>, RdbError> {
        if !self.is_complete() {
            return Err(RdbError::Truncated);
        }

        Ok(self.entries)
    }
}
