//! Ledger trait and the in-memory store with LRU eviction and optional TTL

use crate::config::ContextCoreConfig;
use crate::error::{ContextCoreError, Result};
use crate::ledger::{
    entry::LedgerEntry,
    eviction::{EvictionEvent, EvictionReason},
    types::LedgerStats,
};
use crate::vector::{SegmentId, SemanticVector};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Store of last-committed vectors per segment
///
/// Implementations must keep at most one entry per segment and return the
/// most recently written vector from `get`.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Last committed vector for the segment, if any
    async fn get(&self, segment_id: &str) -> Result<Option<SemanticVector>>;

    /// Commit a vector for the segment, replacing any previous one
    async fn put(&self, segment_id: &str, vector: SemanticVector) -> Result<()>;

    /// Remove the segment, returning its last vector
    async fn remove(&self, segment_id: &str) -> Result<Option<SemanticVector>>;

    /// Full entry with metadata, without touching access tracking
    async fn entry(&self, segment_id: &str) -> Result<Option<LedgerEntry>>;

    /// Number of live entries
    async fn len(&self) -> usize;

    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// In-memory ledger
///
/// - Async access via `RwLock`, writers are serialized (last writer wins)
/// - Optional TTL expiration; expired entries never count toward the limit
/// - LRU eviction at `max_entries`, or write rejection when eviction is off
pub struct InMemoryLedger {
    config: ContextCoreConfig,

    store: RwLock<LedgerStore>,
}

/// An entry and its position in the LRU index
struct Slot {
    entry: LedgerEntry,
    tick: u64,
}

/// Internal ledger storage
struct LedgerStore {
    /// Main storage: segment -> entry
    entries: HashMap<SegmentId, Slot>,

    /// LRU index: access tick -> segment, least recent first
    lru_index: BTreeMap<u64, SegmentId>,

    /// Next access tick, strictly increasing
    next_tick: u64,

    stats: LedgerStats,

    current_size_bytes: usize,
}

impl LedgerStore {
    fn tick(&mut self) -> u64 {
        let tick = self.next_tick;
        self.next_tick += 1;
        tick
    }

    fn insert_entry(&mut self, entry: LedgerEntry) {
        let tick = self.tick();
        self.current_size_bytes += entry.metadata.size_bytes;
        self.lru_index.insert(tick, entry.segment_id.clone());
        self.entries
            .insert(entry.segment_id.clone(), Slot { entry, tick });
    }

    fn remove_entry(&mut self, segment_id: &str) -> Option<LedgerEntry> {
        let slot = self.entries.remove(segment_id)?;
        self.lru_index.remove(&slot.tick);
        self.current_size_bytes = self
            .current_size_bytes
            .saturating_sub(slot.entry.metadata.size_bytes);
        Some(slot.entry)
    }

    /// Move the segment to the most recently used end
    fn touch(&mut self, segment_id: &str) {
        let tick = self.tick();
        if let Some(slot) = self.entries.get_mut(segment_id) {
            self.lru_index.remove(&slot.tick);
            slot.tick = tick;
            self.lru_index.insert(tick, segment_id.to_string());
        }
    }

    /// Drop every expired entry, counting each as a TTL eviction
    fn purge_expired(&mut self) -> Option<EvictionEvent> {
        let expired: Vec<SegmentId> = self
            .entries
            .iter()
            .filter(|(_, slot)| slot.entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        if expired.is_empty() {
            return None;
        }

        for key in &expired {
            self.remove_entry(key);
        }
        self.stats.evictions_ttl += expired.len() as u64;
        Some(EvictionEvent::new(EvictionReason::Expired, expired))
    }

    fn live_len(&self) -> usize {
        self.entries
            .values()
            .filter(|slot| !slot.entry.is_expired())
            .count()
    }

    fn sync_stats(&mut self) {
        self.stats.entries = self.entries.len();
        self.stats.size_bytes = self.current_size_bytes;
    }
}

impl InMemoryLedger {
    /// Create a new ledger with the retention settings of `config`
    pub fn new(config: ContextCoreConfig) -> Self {
        info!(
            "Initializing ledger (max_entries: {}, ttl: {:?}, lru: {})",
            config.max_entries, config.entry_ttl, config.enable_lru_eviction
        );

        let store = LedgerStore {
            entries: HashMap::new(),
            lru_index: BTreeMap::new(),
            next_tick: 0,
            stats: LedgerStats::default(),
            current_size_bytes: 0,
        };

        Self {
            config,
            store: RwLock::new(store),
        }
    }

    /// Ledger with default settings and the given entry limit
    pub fn with_capacity(max_entries: usize) -> Self {
        Self::new(ContextCoreConfig {
            max_entries,
            ..Default::default()
        })
    }

    /// Check if a live entry exists (without updating access time)
    pub async fn contains(&self, segment_id: &str) -> bool {
        let store = self.store.read().await;
        store
            .entries
            .get(segment_id)
            .map(|slot| !slot.entry.is_expired())
            .unwrap_or(false)
    }

    /// Commit a vector and report the entries that left to make room
    pub async fn commit(
        &self,
        segment_id: &str,
        vector: SemanticVector,
    ) -> Result<Vec<EvictionEvent>> {
        let ttl = self.config.ttl_with_jitter();
        let mut store = self.store.write().await;
        let mut events = Vec::new();

        let live = store
            .entries
            .get(segment_id)
            .map(|slot| !slot.entry.is_expired());

        match live {
            Some(true) => {
                debug!("Updating ledger entry: {}", segment_id);
                let (old_size, new_size) = match store.entries.get_mut(segment_id) {
                    Some(slot) => {
                        let old_size = slot.entry.metadata.size_bytes;
                        slot.entry.update_vector(vector, ttl);
                        (old_size, slot.entry.metadata.size_bytes)
                    }
                    None => (0, 0),
                };
                store.current_size_bytes =
                    store.current_size_bytes.saturating_sub(old_size) + new_size;
                store.touch(segment_id);
                store.stats.updates += 1;
            }
            stale => {
                if stale == Some(false) {
                    store.remove_entry(segment_id);
                    store.stats.evictions_ttl += 1;
                    events.push(EvictionEvent::new(
                        EvictionReason::Expired,
                        vec![segment_id.to_string()],
                    ));
                }

                if store.entries.len() >= self.config.max_entries {
                    events.extend(store.purge_expired());
                }

                let evicted = self.evict_if_needed(&mut store, segment_id);
                store.sync_stats();
                events.extend(evicted?);

                debug!("Inserting ledger entry: {}", segment_id);
                let mut entry = LedgerEntry::new(segment_id.to_string(), vector, ttl);
                entry.metadata.size_bytes = entry.calculate_size();
                store.insert_entry(entry);
                store.stats.inserts += 1;
            }
        }

        store.sync_stats();
        for event in &events {
            debug!("Ledger eviction ({}): {:?}", event.reason, event.segment_ids);
        }
        Ok(events)
    }

    /// Clear all entries from the ledger
    pub async fn clear(&self) -> EvictionEvent {
        let mut store = self.store.write().await;

        let segment_ids: Vec<SegmentId> = store.entries.keys().cloned().collect();
        store.entries.clear();
        store.lru_index.clear();
        store.current_size_bytes = 0;
        store.stats.removals += segment_ids.len() as u64;
        store.sync_stats();

        info!("Cleared {} entries from ledger", segment_ids.len());
        EvictionEvent::new(EvictionReason::Manual, segment_ids)
    }

    /// Remove all expired entries
    pub async fn cleanup_expired(&self) -> Vec<EvictionEvent> {
        let mut store = self.store.write().await;

        let events: Vec<EvictionEvent> = store.purge_expired().into_iter().collect();
        store.sync_stats();

        if let Some(event) = events.first() {
            debug!("Cleaned up {} expired ledger entries", event.len());
        }
        events
    }

    /// Get ledger statistics
    pub async fn stats(&self) -> LedgerStats {
        let store = self.store.read().await;
        store.stats.clone()
    }

    /// Get current ledger size in bytes
    pub async fn size_bytes(&self) -> usize {
        let store = self.store.read().await;
        store.current_size_bytes
    }

    /// Internal: make room for one new entry
    fn evict_if_needed(
        &self,
        store: &mut LedgerStore,
        segment_id: &str,
    ) -> Result<Option<EvictionEvent>> {
        let mut evicted = Vec::new();

        while store.entries.len() >= self.config.max_entries {
            if !self.config.enable_lru_eviction {
                store.stats.rejected_writes += 1;
                warn!(
                    "Ledger full ({} entries), rejecting write for {}",
                    store.entries.len(),
                    segment_id
                );
                return Err(ContextCoreError::LedgerWrite(format!(
                    "ledger is full ({} entries) and eviction is disabled",
                    self.config.max_entries
                )));
            }

            let Some((_, key)) = store.lru_index.pop_first() else {
                warn!("LRU index empty while ledger is over its entry limit");
                return Err(ContextCoreError::LedgerWrite(
                    "cannot evict entries to make room".to_string(),
                ));
            };

            if let Some(entry) = store.remove_entry(&key) {
                debug!(
                    "Evicting ledger entry due to max_entries limit: {} (age: {:?}, reads: {})",
                    key,
                    entry.age(),
                    entry.metadata.access_count
                );
            }
            store.stats.evictions_lru += 1;
            evicted.push(key);
        }

        Ok((!evicted.is_empty())
            .then(|| EvictionEvent::new(EvictionReason::LeastRecentlyUsed, evicted)))
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new(ContextCoreConfig::default())
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn get(&self, segment_id: &str) -> Result<Option<SemanticVector>> {
        let mut store = self.store.write().await;

        let expired = match store.entries.get(segment_id) {
            Some(slot) => slot.entry.is_expired(),
            None => {
                debug!("Ledger miss: {}", segment_id);
                store.stats.misses += 1;
                return Ok(None);
            }
        };

        if expired {
            debug!("Ledger entry expired: {}", segment_id);
            store.remove_entry(segment_id);
            store.stats.misses += 1;
            store.stats.evictions_ttl += 1;
            store.sync_stats();
            return Ok(None);
        }

        let vector = match store.entries.get_mut(segment_id) {
            Some(slot) => {
                slot.entry.mark_accessed();
                slot.entry.vector.clone()
            }
            None => return Ok(None),
        };
        store.stats.hits += 1;

        if self.config.enable_lru_eviction {
            store.touch(segment_id);
        }

        debug!("Ledger hit: {}", segment_id);
        Ok(Some(vector))
    }

    async fn put(&self, segment_id: &str, vector: SemanticVector) -> Result<()> {
        self.commit(segment_id, vector).await.map(|_| ())
    }

    async fn remove(&self, segment_id: &str) -> Result<Option<SemanticVector>> {
        let mut store = self.store.write().await;

        match store.remove_entry(segment_id) {
            Some(entry) => {
                store.stats.removals += 1;
                store.sync_stats();
                debug!("Removed ledger entry: {}", segment_id);
                Ok(Some(entry.vector))
            }
            None => Ok(None),
        }
    }

    async fn entry(&self, segment_id: &str) -> Result<Option<LedgerEntry>> {
        let store = self.store.read().await;
        Ok(store
            .entries
            .get(segment_id)
            .map(|slot| &slot.entry)
            .filter(|entry| !entry.is_expired())
            .cloned())
    }

    async fn len(&self) -> usize {
        let store = self.store.read().await;
        store.live_len()
    }
}

/// Background task that periodically drops expired entries
pub fn spawn_cleanup(ledger: Arc<InMemoryLedger>, interval: Duration) -> JoinHandle<()> {
    info!("Starting ledger cleanup task (interval: {:?})", interval);

    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;

            let events = ledger.cleanup_expired().await;
            if !events.is_empty() {
                debug!("Ledger cleanup: {} events", events.len());
            }
        }
    })
}
