//! ConnectionRegistry — live connections keyed by connection id.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use dashmap::DashMap;
use relay_transport::ConnectionHandle;
use tracing::info;

/// Concurrent map of connection id to handle, plus a running live count.
///
/// Each of `add`, `remove`, and `lookup` is atomic on its own; there is no
/// transaction spanning a lookup and the write that follows it. The count
/// moves by exactly one per `add`/`remove` call, so it tracks entries only
/// as long as ids are added once and removed once, which the transport
/// guarantees.
pub struct ConnectionRegistry {
    connections: DashMap<String, Arc<dyn ConnectionHandle>>,
    live: AtomicI64,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            live: AtomicI64::new(0),
        }
    }

    /// Insert or overwrite `id`. Returns the live count after the add.
    pub fn add(&self, id: impl Into<String>, handle: Arc<dyn ConnectionHandle>) -> i64 {
        let id = id.into();
        let count = self.live.fetch_add(1, Ordering::SeqCst) + 1;
        info!("Connection added: {id} (online: {count})");
        self.connections.insert(id, handle);
        count
    }

    /// Drop `id` if present. The count is decremented either way.
    pub fn remove(&self, id: &str) -> i64 {
        self.connections.remove(id);
        let count = self.live.fetch_sub(1, Ordering::SeqCst) - 1;
        info!("Connection removed: {id} (online: {count})");
        count
    }

    /// Current handle for `id`.
    ///
    /// The handle is cloned out so the shard lock is released before the
    /// caller writes to it.
    pub fn lookup(&self, id: &str) -> Option<Arc<dyn ConnectionHandle>> {
        self.connections.get(id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.connections.contains_key(id)
    }

    /// Running count of adds minus removes.
    pub fn count(&self) -> i64 {
        self.live.load(Ordering::SeqCst)
    }

    /// Number of entries actually in the map.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
