use std::path::Path;

use tokio::{fs::File, io::AsyncReadExt};
use tracing::{info, warn};

use crate::{
    key_value_store::Value,
    rdb::{RdbError, RdbParser},
};

/// A snapshot with metadata only and no keys.
pub const EMPTY_SNAPSHOT_HEX: &str = "524544495330303131fa0972656469732d76657205372e322e30fa0a72656469732d62697473c040fa056374696d65c26d08bc65fa08757365642d6d656dc2b0c41000fa08616f662d62617365c000fff06e3bfec0ff5aa2";

pub fn empty_snapshot() -> Vec<u8> {
    hex::decode(EMPTY_SNAPSHOT_HEX).unwrap_or_default()
}

pub fn parse_snapshot(bytes: &[u8]) -> Result<Vec<(String, Value)>, RdbError> {
    let mut parser = RdbParser::new();
    parser.parse(bytes)?;
    parser.finish()
}

/// Streams a snapshot file through the parser in 4KB chunks.
pub async fn load_snapshot_file(path: &Path) -> Result<Vec<(String, Value)>, RdbError> {
    let mut file = File::open(path)
        .await
        .map_err(|e| RdbError::Io(e.to_string()))?;

    let mut parser = RdbParser::new();
    let mut buffer = [0u8; 4096];

    loop {
        let n = file
            .read(&mut buffer)
            .await
            .map_err(|e| RdbError::Io(e.to_string()))?;

        if n == 0 {
            break;
        }

        parser.parse(&buffer[..n])?;
    }

    parser.finish()
}

/// Bytes sent to a replica after `+FULLRESYNC`: the configured snapshot file
/// if it can be read, otherwise the built-in empty snapshot.
pub async fn snapshot_payload(path: Option<&Path>) -> Vec<u8> {
    let Some(path) = path else {
        return empty_snapshot();
    };

    match tokio::fs::read(path).await {
        Ok(bytes) => {
            info!(path = %path.display(), bytes = bytes.len(), "sending snapshot file");
            bytes
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "snapshot file unavailable, sending empty snapshot");
            empty_snapshot()
        }
    }
}
