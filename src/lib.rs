//! An in-memory key-value server speaking the Redis protocol.
//!
//! Supported functionality:
//!
//! - String operations with optional expiry (GET, SET, INCR, KEYS, TYPE)
//! - List operations (LPUSH, RPUSH, LPOP, BLPOP, LRANGE, LLEN)
//! - Stream operations (XADD, XRANGE, XREAD with blocking reads)
//! - Transactions (MULTI, EXEC, DISCARD)
//! - Primary/replica replication with byte-exact offsets and WAIT
//! - Loading an initial keyspace from an RDB snapshot file
//!
//! Every accepted socket runs on its own Tokio task and shares one
//! [`server::RedisServer`] holding the keyspace and the replication role.

pub mod commands;
pub mod config;
pub mod connection;
pub mod handshake;
pub mod input;
pub mod key_value_store;
pub mod rdb;
pub mod replication;
pub mod resp;
pub mod server;
pub mod state;
pub mod stream;
pub mod transactions;
