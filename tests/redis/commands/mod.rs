mod get;
mod keys;
mod lrange;
mod replication;
mod rpush_and_lpush;
mod unknown;
mod xadd;
mod xrange;
