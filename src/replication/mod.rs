//! Primary/replica roles.
//!
//! The server holds exactly one [`Role`], chosen at startup. Commands whose
//! behaviour depends on replication (writes, REPLCONF, PSYNC, WAIT, INFO) ask
//! the role what to do instead of checking flags scattered across handlers.

mod primary;
mod replica;

use std::sync::Arc;

use rand::{Rng, distributions::Alphanumeric};
use tokio::{
    io::{AsyncWrite, AsyncWriteExt},
    sync::Mutex,
};

pub use primary::Primary;
pub use replica::Replica;

use crate::resp::RespValue;

/// Write half of a connection that other tasks may also write to, such as a
/// replica link receiving propagated commands.
pub type SharedWriter = Arc<Mutex<Box<dyn AsyncWrite + Send + Unpin>>>;

pub fn shared_writer<W>(writer: W) -> SharedWriter
where
    W: AsyncWrite + Send + Unpin + 'static,
{
    Arc::new(Mutex::new(Box::new(writer)))
}

pub async fn thread_safe_write_to_stream(writer: &SharedWriter, bytes: &[u8]) -> tokio::io::Result<()> {
    let mut writer_guard = writer.lock().await;
    writer_guard.write_all(bytes).await?;
    writer_guard.flush().await?;

    Ok(())
}

/// 40 random alphanumeric characters.
pub fn generate_replication_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(40)
        .map(char::from)
        .collect()
}

#[derive(Debug)]
pub enum Role {
    Primary(Primary),
    Replica(Replica),
}

impl Role {
    pub fn primary() -> Self {
        Role::Primary(Primary::new(generate_replication_id()))
    }

    pub fn replica(primary_address: impl Into<String>) -> Self {
        Role::Replica(Replica::new(primary_address))
    }

    /// The name reported by INFO.
    pub fn name(&self) -> &'static str {
        match self {
            Role::Primary(_) => "master",
            Role::Replica(_) => "slave",
        }
    }

    pub fn as_primary(&self) -> Option<&Primary> {
        match self {
            Role::Primary(primary) => Some(primary),
            Role::Replica(_) => None,
        }
    }

    pub fn as_replica(&self) -> Option<&Replica> {
        match self {
            Role::Primary(_) => None,
            Role::Replica(replica) => Some(replica),
        }
    }

    /// Sends an applied write on to every replica. Replicas never forward.
    pub async fn propagate(&self, command: &RespValue) {
        if let Role::Primary(primary) = self {
            primary.propagate(command).await;
        }
    }

    /// Held by a connection while it applies and propagates a write, so the
    /// replicated stream follows the order writes were applied in.
    pub async fn write_order_guard(&self) -> Option<tokio::sync::MutexGuard<'_, ()>> {
        match self {
            Role::Primary(primary) => Some(primary.write_order_guard().await),
            Role::Replica(_) => None,
        }
    }

    /// The `# Replication` section of INFO, one `field:value` per line.
    pub async fn info_lines(&self) -> Vec<String> {
        let mut lines = vec![format!("role:{}", self.name())];

        match self {
            Role::Primary(primary) => {
                lines.push(format!("connected_slaves:{}", primary.replica_count().await));
                lines.push(format!("master_replid:{}", primary.replication_id()));
                lines.push(format!("master_repl_offset:{}", primary.offset().await));
            }
            Role::Replica(replica) => {
                lines.push(format!("master_address:{}", replica.primary_address()));
                lines.push(format!("master_replid:{}", replica.replication_id().await));
                lines.push(format!("master_repl_offset:{}", replica.offset()));
            }
        }

        lines
    }
}
