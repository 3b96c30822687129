use jiff::Timestamp;

use crate::rdb::{
    RdbError,
    encoding::{parse_length, parse_string, take, take_array},
};

const METADATA_OPCODE: u8 = 0xFA;
const RESIZE_DB_OPCODE: u8 = 0xFB;
const DATABASE_OPCODE: u8 = 0xFE;
const EXPIRATION_SECONDS_OPCODE: u8 = 0xFD;
const EXPIRATION_MILLISECONDS_OPCODE: u8 = 0xFC;
const END_OF_FILE_OPCODE: u8 = 0xFF;
const STRING_VALUE_TYPE: u8 = 0x00;

#[derive(Debug, PartialEq)]
pub enum OpCode {
    Metadata {
        key: String,
        value: String,
    },
    ResizeDb {
        hash_table_size: usize,
        expiry_hash_table_size: usize,
    },
    Database {
        database_number: usize,
    },
    KeyValuePair {
        key: String,
        value: String,
        expiration: Option<Timestamp>,
    },
    EndOfFile {
        crc64_checksum: [u8; 8],
    },
}

/// Parses `REDIS` followed by a four digit version, returning the version.
pub fn parse_header(bytes: &[u8]) -> Result<(u32, usize), RdbError> {
    if take(bytes, 0, 5)? != b"REDIS" {
        return Err(RdbError::InvalidMagicString);
    }

    let version = take(bytes, 5, 4)?;
    let version_text = String::from_utf8_lossy(version).to_string();

    match version_text.parse::<u32>() {
        Ok(version) if (1..=12).contains(&version) => Ok((version, 9)),
        _ => Err(RdbError::InvalidVersion(version_text)),
    }
}

fn parse_key_value(
    bytes: &[u8],
    cursor: usize,
    expiration: Option<Timestamp>,
) -> Result<(OpCode, usize), RdbError> {
    let [value_type] = take_array::<1>(bytes, cursor)?;

    if value_type != STRING_VALUE_TYPE {
        return Err(RdbError::UnsupportedValueType(value_type));
    }

    let (key, key_len) = parse_string(bytes, cursor + 1)?;
    let (value, value_len) = parse_string(bytes, cursor + 1 + key_len)?;

    Ok((
        OpCode::KeyValuePair {
            key,
            value,
            expiration,
        },
        1 + key_len + value_len,
    ))
}

/// Parses the section starting at `cursor`, returning it and its size.
pub fn parse_opcode(bytes: &[u8], cursor: usize) -> Result<(OpCode, usize), RdbError> {
    let [opcode] = take_array::<1>(bytes, cursor)?;
    let body = cursor + 1;

    match opcode {
        METADATA_OPCODE => {
            let (key, key_len) = parse_string(bytes, body)?;
            let (value, value_len) = parse_string(bytes, body + key_len)?;

            Ok((OpCode::Metadata { key, value }, 1 + key_len + value_len))
        }
        RESIZE_DB_OPCODE => {
            let (hash_table_size, first_len) = parse_length(bytes, body)?;
            let (expiry_hash_table_size, second_len) = parse_length(bytes, body + first_len)?;

            Ok((
                OpCode::ResizeDb {
                    hash_table_size,
                    expiry_hash_table_size,
                },
                1 + first_len + second_len,
            ))
        }
        DATABASE_OPCODE => {
            let (database_number, len) = parse_length(bytes, body)?;
            Ok((OpCode::Database { database_number }, 1 + len))
        }
        EXPIRATION_SECONDS_OPCODE => {
            let seconds = u32::from_le_bytes(take_array(bytes, body)?);
            let expiration = Timestamp::from_second(i64::from(seconds))
                .map_err(|_| RdbError::InvalidExpiration(i64::from(seconds)))?;

            let (key_value, len) = parse_key_value(bytes, body + 4, Some(expiration))?;
            Ok((key_value, 1 + 4 + len))
        }
        EXPIRATION_MILLISECONDS_OPCODE => {
            let milliseconds = u64::from_le_bytes(take_array(bytes, body)?);
            let milliseconds = i64::try_from(milliseconds).map_err(|_| RdbError::InvalidExpiration(i64::MAX))?;
            let expiration = Timestamp::from_millisecond(milliseconds)
                .map_err(|_| RdbError::InvalidExpiration(milliseconds))?;

            let (key_value, len) = parse_key_value(bytes, body + 8, Some(expiration))?;
            Ok((key_value, 1 + 8 + len))
        }
        END_OF_FILE_OPCODE => {
            let crc64_checksum = take_array::<8>(bytes, body)?;
            Ok((OpCode::EndOfFile { crc64_checksum }, 9))
        }
        STRING_VALUE_TYPE => parse_key_value(bytes, cursor, None),
        opcode => Err(RdbError::UnknownOpCode(opcode)),
    }
}
