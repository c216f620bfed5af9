//! Producer registry implementation
//!
//! The process-wide table of producer identities. Connection tasks mutate
//! it as bytes arrive; the page-serving layer reads it to enumerate
//! producers and render their recent history.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::config::RegistryConfig;
use super::entry::{ProducerEntry, ProducerStats, RecordMeta};
use super::identity::ProducerId;

/// Central registry for all producer identities
///
/// Thread-safe via a two-level `RwLock`: a read-heavy map lock plus one
/// lock per entry. Mutations for the same identity serialize on the entry
/// lock, so records apply in the order the connection read them; different
/// identities never contend beyond the brief map access.
pub struct ProducerRegistry {
    /// Map of producer identity to registry entry
    producers: RwLock<HashMap<ProducerId, Arc<RwLock<ProducerEntry>>>>,

    /// Configuration
    config: RegistryConfig,
}

impl ProducerRegistry {
    /// Create a new registry with default configuration
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a new registry with custom configuration
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            producers: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Get the registry configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Register a connection attempt for an identity.
    ///
    /// A first-ever connection creates the entry at attempt 0; a reconnect
    /// advances the attempt sequence and discards the prior attempt's
    /// history. Returns the attempt sequence for this connection.
    pub async fn on_connect(&self, id: &ProducerId) -> u64 {
        let mut producers = self.producers.write().await;

        if let Some(entry_arc) = producers.get(id) {
            let mut entry = entry_arc.write().await;
            entry.begin_attempt();

            tracing::info!(
                producer = %id,
                attempt = entry.attempt,
                "Producer reconnected"
            );

            entry.attempt
        } else {
            let entry = ProducerEntry::new(&self.config);
            producers.insert(*id, Arc::new(RwLock::new(entry)));

            tracing::info!(producer = %id, "Producer registered");

            0
        }
    }

    /// Apply one validated record for an identity.
    ///
    /// Appends to the bounded history and advances the per-attempt record
    /// index. Returns `None` for an identity that was never connected.
    pub async fn on_record(&self, id: &ProducerId, payload: Arc<str>) -> Option<RecordMeta> {
        let producers = self.producers.read().await;
        let entry_arc = producers.get(id)?;

        let mut entry = entry_arc.write().await;
        Some(entry.on_record(payload))
    }

    /// Mark an identity's connection as ended
    pub async fn on_disconnect(&self, id: &ProducerId) {
        let producers = self.producers.read().await;

        if let Some(entry_arc) = producers.get(id) {
            let mut entry = entry_arc.write().await;
            entry.live = false;

            tracing::info!(
                producer = %id,
                records = entry.record_index,
                "Producer disconnected"
            );
        }
    }

    /// List all identities the registry has ever seen
    pub async fn producers(&self) -> Vec<ProducerId> {
        self.producers.read().await.keys().copied().collect()
    }

    /// Whether an identity's connection is currently live
    pub async fn is_live(&self, id: &ProducerId) -> bool {
        let producers = self.producers.read().await;

        if let Some(entry_arc) = producers.get(id) {
            entry_arc.read().await.live
        } else {
            false
        }
    }

    /// Snapshot of an identity's recent records, in arrival order.
    ///
    /// Empty for unknown identities. The snapshot is taken under the entry
    /// lock, so a concurrent append never produces a torn read.
    pub async fn history(&self, id: &ProducerId) -> Vec<Arc<str>> {
        let producers = self.producers.read().await;

        if let Some(entry_arc) = producers.get(id) {
            entry_arc.read().await.history.snapshot()
        } else {
            Vec::new()
        }
    }

    /// Point-in-time statistics for an identity
    pub async fn stats(&self, id: &ProducerId) -> Option<ProducerStats> {
        let producers = self.producers.read().await;
        let entry_arc = producers.get(id)?;

        let stats = entry_arc.read().await.stats();
        Some(stats)
    }

    /// Total number of identities ever seen
    pub async fn producer_count(&self) -> usize {
        self.producers.read().await.len()
    }
}

impl Default for ProducerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
