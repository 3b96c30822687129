use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use clap::Parser;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("invalid command line arguments: {0}")]
    InvalidArguments(String),
    #[error("invalid --replicaof value '{0}', expected \"<host> <port>\"")]
    InvalidReplicaOf(String),
}

#[derive(Parser, Debug, Clone, PartialEq)]
#[command(author, version, about = "In-memory key-value server with primary/replica replication", long_about = None)]
pub struct ServerConfig {
    /// Port to accept client connections on.
    #[arg(long, default_value_t = 6379)]
    pub port: u16,

    /// Directory containing the snapshot file.
    #[arg(long)]
    pub dir: Option<String>,

    /// Name of the snapshot file inside `--dir`.
    #[arg(long)]
    pub dbfilename: Option<String>,

    /// Primary to replicate from, either as one value "<host> <port>" or as two values.
    #[arg(long, num_args = 1..=2, value_name = "HOST PORT")]
    pub replicaof: Option<Vec<String>>,
}

impl ServerConfig {
    /// Parses a full argument list, program name first.
    pub fn from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let config =
            Self::try_parse_from(args).map_err(|e| ConfigError::InvalidArguments(e.to_string()))?;
        config.primary_address()?;

        Ok(config)
    }

    /// `host:port` of the primary when running as a replica.
    pub fn primary_address(&self) -> Result<Option<String>, ConfigError> {
        let Some(values) = &self.replicaof else {
            return Ok(None);
        };

        let joined = values.join(" ");
        let parts: Vec<&str> = joined.split_whitespace().collect();

        let [host, port] = parts.as_slice() else {
            return Err(ConfigError::InvalidReplicaOf(joined));
        };

        if port.parse::<u16>().is_err() {
            return Err(ConfigError::InvalidReplicaOf(joined));
        }

        Ok(Some(format!("{}:{}", host, port)))
    }

    pub fn snapshot_path(&self) -> Option<PathBuf> {
        match (&self.dir, &self.dbfilename) {
            (Some(dir), Some(dbfilename)) => Some(Path::new(dir).join(dbfilename)),
            _ => None,
        }
    }

    /// Value of a parameter as reported by CONFIG GET. Unset values are empty.
    pub fn get(&self, parameter: &str) -> Option<String> {
        match parameter.to_lowercase().as_str() {
            "dir" => Some(self.dir.clone().unwrap_or_default()),
            "dbfilename" => Some(self.dbfilename.clone().unwrap_or_default()),
            "port" => Some(self.port.to_string()),
            _ => None,
        }
    }
}
