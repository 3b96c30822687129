use thiserror::Error;

use crate::{
    key_value_store::StoreError, resp::RespValue, stream::StreamError,
    transactions::TransactionError,
};

#[derive(Error, Debug, PartialEq, Clone)]
pub enum CommandError {
    #[error("Invalid command")]
    InvalidCommand,
    #[error("Invalid command argument")]
    InvalidCommandArgument,
    #[error("wrong number of arguments for 'ping' command")]
    InvalidPingCommand,
    #[error("wrong number of arguments for 'echo' command")]
    InvalidEchoCommand,
    #[error("wrong number of arguments for 'get' command")]
    InvalidGetCommand,
    #[error("wrong number of arguments for 'set' command")]
    InvalidSetCommand,
    #[error("syntax error")]
    InvalidSetCommandArgument,
    #[error("invalid expire time in 'set' command")]
    InvalidSetCommandExpiration,
    #[error("wrong number of arguments for 'incr' command")]
    InvalidIncrCommand,
    #[error("wrong number of arguments for 'keys' command")]
    InvalidKeysCommand,
    #[error("wrong number of arguments for 'type' command")]
    InvalidTypeCommand,
    #[error("wrong number of arguments for 'config|get' command")]
    InvalidConfigGetCommand,
    #[error("unknown subcommand '{0}'")]
    InvalidConfigSubcommand(String),
    #[error("wrong number of arguments for 'info' command")]
    InvalidInfoCommand,
    #[error("wrong number of arguments for 'rpush' command")]
    InvalidRPushCommand,
    #[error("wrong number of arguments for 'lpush' command")]
    InvalidLPushCommand,
    #[error("wrong number of arguments for 'llen' command")]
    InvalidLLenCommand,
    #[error("wrong number of arguments for 'lpop' command")]
    InvalidLPopCommand,
    #[error("value is out of range, must be positive")]
    InvalidLPopCommandArgument,
    #[error("wrong number of arguments for 'blpop' command")]
    InvalidBLPopCommand,
    #[error("timeout is not a float or out of range")]
    InvalidBLPopCommandArgument,
    #[error("wrong number of arguments for 'lrange' command")]
    InvalidLRangeCommand,
    #[error("value is not an integer or out of range")]
    InvalidLRangeCommandArgument,
    #[error("wrong number of arguments for 'xadd' command")]
    InvalidXAddCommand,
    #[error("wrong number of arguments for 'xrange' command")]
    InvalidXRangeCommand,
    #[error("wrong number of arguments for 'xread' command")]
    InvalidXReadCommand,
    #[error("syntax error")]
    InvalidXReadOption,
    #[error("Unbalanced 'xread' list of streams: for each stream key an ID or '$' must be specified.")]
    UnbalancedXReadStreams,
    #[error("timeout is not an integer or out of range")]
    InvalidXReadBlockDuration,
    #[error("wrong number of arguments for 'multi' command")]
    InvalidMultiCommand,
    #[error("wrong number of arguments for 'exec' command")]
    InvalidExecCommand,
    #[error("wrong number of arguments for 'discard' command")]
    InvalidDiscardCommand,
    #[error("wrong number of arguments for 'replconf' command")]
    InvalidReplconfCommand,
    #[error("Unrecognized REPLCONF option: {0}")]
    InvalidReplconfOption(String),
    #[error("value is not an integer or out of range")]
    InvalidReplconfOffset,
    #[error("wrong number of arguments for 'psync' command")]
    InvalidPsyncCommand,
    #[error("value is not an integer or out of range")]
    InvalidPsyncOffset,
    #[error("PSYNC requires REPLCONF listening-port first")]
    PsyncWithoutListeningPort,
    #[error("wrong number of arguments for 'wait' command")]
    InvalidWaitCommand,
    #[error("value is not an integer or out of range")]
    InvalidWaitCommandArgument,
    #[error("READONLY You can't write against a read only replica.")]
    ReadOnlyReplica,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Stream(#[from] StreamError),
    #[error(transparent)]
    Transaction(#[from] TransactionError),
}

impl CommandError {
    pub fn as_string(&self) -> String {
        RespValue::Error(format!("ERR {}", self)).encode()
    }
}
