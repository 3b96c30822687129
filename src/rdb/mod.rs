mod encoding;
mod opcode;
mod rdb_parser;
mod snapshot;

use thiserror::Error;

pub use rdb_parser::RdbParser;
pub use snapshot::{EMPTY_SNAPSHOT_HEX, empty_snapshot, load_snapshot_file, parse_snapshot, snapshot_payload};

#[derive(Error, Debug, PartialEq, Clone)]
pub enum RdbError {
    #[error("snapshot ended in the middle of a section")]
    Incomplete,
    #[error("snapshot ended before the end-of-file marker")]
    Truncated,
    #[error("missing REDIS magic string")]
    InvalidMagicString,
    #[error("unsupported snapshot version '{0}'")]
    InvalidVersion(String),
    #[error("unknown opcode 0x{0:02X}")]
    UnknownOpCode(u8),
    #[error("invalid length encoding 0x{0:02X}")]
    InvalidLengthEncoding(u8),
    #[error("unsupported string encoding")]
    UnsupportedEncoding,
    #[error("unsupported value type 0x{0:02X}")]
    UnsupportedValueType(u8),
    #[error("string is not valid UTF-8")]
    InvalidUtf8,
    #[error("expiration {0} is out of range")]
    InvalidExpiration(i64),
    #[error("failed to read snapshot: {0}")]
    Io(String),
}
