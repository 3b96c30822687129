use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::RwLock;

/// Replication state of a server following a primary.
#[derive(Debug)]
pub struct Replica {
    primary_address: String,
    replication_id: RwLock<String>,
    /// Bytes of the primary's command stream applied so far.
    offset: AtomicU64,
}

impl Replica {
    pub fn new(primary_address: impl Into<String>) -> Self {
        Self {
            primary_address: primary_address.into(),
            replication_id: RwLock::new("?".to_string()),
            offset: AtomicU64::new(0),
        }
    }

    pub fn primary_address(&self) -> &str {
        &self.primary_address
    }

    pub async fn replication_id(&self) -> String {
        self.replication_id.read().await.clone()
    }

    /// Adopts the id and starting offset announced in `+FULLRESYNC`.
    pub async fn start_stream(&self, replication_id: &str, offset: u64) {
        *self.replication_id.write().await = replication_id.to_string();
        self.offset.store(offset, Ordering::SeqCst);
    }

    pub fn offset(&self) -> u64 {
        self.offset.load(Ordering::SeqCst)
    }

    /// Counts one fully processed frame of the replicated stream.
    pub fn advance(&self, bytes: usize) -> u64 {
        self.offset.fetch_add(bytes as u64, Ordering::SeqCst) + bytes as u64
    }
}
