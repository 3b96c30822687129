use std::{collections::HashMap, fmt, time::Duration};

use tokio::{
    sync::{Mutex, MutexGuard, Notify},
    time::Instant,
};
use tracing::{debug, info, warn};

use crate::{
    replication::{SharedWriter, thread_safe_write_to_stream},
    resp::RespValue,
};

struct ReplicaLink {
    writer: SharedWriter,
    acked_offset: u64,
}

impl fmt::Debug for ReplicaLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplicaLink")
            .field("acked_offset", &self.acked_offset)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
struct PrimaryState {
    /// Bytes of replicated stream produced so far.
    offset: u64,
    replicas: HashMap<String, ReplicaLink>,
}

/// Replication state of a server accepting writes.
#[derive(Debug)]
pub struct Primary {
    replication_id: String,
    state: Mutex<PrimaryState>,
    write_order: Mutex<()>,
    acks: Notify,
}

impl Primary {
    pub fn new(replication_id: String) -> Self {
        Self {
            replication_id,
            state: Mutex::new(PrimaryState::default()),
            write_order: Mutex::new(()),
            acks: Notify::new(),
        }
    }

    pub fn replication_id(&self) -> &str {
        &self.replication_id
    }

    pub async fn offset(&self) -> u64 {
        self.state.lock().await.offset
    }

    pub async fn replica_count(&self) -> usize {
        self.state.lock().await.replicas.len()
    }

    pub async fn is_replica(&self, address: &str) -> bool {
        self.state.lock().await.replicas.contains_key(address)
    }

    pub(crate) async fn write_order_guard(&self) -> MutexGuard<'_, ()> {
        self.write_order.lock().await
    }

    /// Answers `PSYNC ? -1`: sends `+FULLRESYNC <id> <offset>` and the snapshot,
    /// then registers the connection as a replica.
    ///
    /// Both happen under the state lock, so no propagated write can fall
    /// between the snapshot and the start of the replica's stream.
    pub async fn full_resync(
        &self,
        address: &str,
        writer: SharedWriter,
        snapshot: &[u8],
    ) -> tokio::io::Result<()> {
        let mut state = self.state.lock().await;
        let offset = state.offset;

        let mut payload = RespValue::SimpleString(format!(
            "FULLRESYNC {} {}",
            self.replication_id, offset
        ))
        .encode()
        .into_bytes();
        payload.extend_from_slice(format!("${}\r\n", snapshot.len()).as_bytes());
        payload.extend_from_slice(snapshot);

        thread_safe_write_to_stream(&writer, &payload).await?;

        state.replicas.insert(
            address.to_string(),
            ReplicaLink {
                writer,
                acked_offset: offset,
            },
        );
        drop(state);

        info!(replica = %address, offset, "replica registered");
        self.acks.notify_waiters();

        Ok(())
    }

    /// Sends `command` to every replica and advances the offset by its exact
    /// encoded length. Replicas that cannot be written to are dropped.
    pub async fn propagate(&self, command: &RespValue) -> u64 {
        let encoded = command.encode();
        let mut state = self.state.lock().await;
        let mut disconnected = Vec::new();

        for (address, replica) in state.replicas.iter() {
            if let Err(e) = thread_safe_write_to_stream(&replica.writer, encoded.as_bytes()).await {
                warn!(replica = %address, error = %e, "dropping replica after failed propagation");
                disconnected.push(address.clone());
            }
        }

        for address in disconnected {
            state.replicas.remove(&address);
        }

        state.offset += encoded.len() as u64;
        debug!(offset = state.offset, bytes = encoded.len(), "propagated command");

        state.offset
    }

    /// Records `REPLCONF ACK <offset>` from a registered replica.
    pub async fn acknowledge(&self, address: &str, offset: u64) {
        {
            let mut state = self.state.lock().await;

            match state.replicas.get_mut(address) {
                Some(replica) => replica.acked_offset = offset,
                None => {
                    debug!(client = %address, "ignoring ACK from unregistered connection");
                    return;
                }
            }
        }

        debug!(replica = %address, offset, "replica acknowledged");
        self.acks.notify_waiters();
    }

    pub async fn remove_replica(&self, address: &str) {
        let removed = self.state.lock().await.replicas.remove(address).is_some();

        if removed {
            info!(replica = %address, "replica disconnected");
        }
    }

    async fn synced_count(&self, target_offset: u64) -> usize {
        let state = self.state.lock().await;

        state
            .replicas
            .values()
            .filter(|replica| replica.acked_offset >= target_offset)
            .count()
    }

    /// Blocks until `min_replicas` replicas have acknowledged everything sent
    /// so far, or until `timeout` elapses (`None` waits indefinitely).
    /// Returns the number of replicas in sync at that point.
    ///
    /// When some writes have been propagated, `REPLCONF GETACK *` is broadcast
    /// first. The GETACK itself is part of the replicated stream, but
    /// acknowledgments are compared against the offset from before it.
    pub async fn wait(&self, min_replicas: usize, timeout: Option<Duration>) -> usize {
        let deadline = timeout.map(|timeout| Instant::now() + timeout);

        let (replica_count, target_offset) = {
            let state = self.state.lock().await;
            (state.replicas.len(), state.offset)
        };

        if replica_count == 0 {
            return 0;
        }

        let synced = self.synced_count(target_offset).await;

        if synced >= min_replicas {
            return synced;
        }

        if target_offset > 0 {
            self.propagate(&RespValue::command(&["REPLCONF", "GETACK", "*"]))
                .await;
        }

        loop {
            let notified = self.acks.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let synced = self.synced_count(target_offset).await;

            if synced >= min_replicas {
                return synced;
            }

            match deadline {
                Some(deadline) => {
                    if tokio::time::timeout_at(deadline, notified).await.is_err() {
                        return self.synced_count(target_offset).await;
                    }
                }
                None => notified.await,
            }
        }
    }
}
