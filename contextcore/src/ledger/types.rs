//! Ledger statistics

use serde::{Deserialize, Serialize};
use std::fmt;

/// Statistics for ledger monitoring
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct LedgerStats {
    /// Reads that found a live entry
    pub hits: u64,

    /// Reads that found nothing (or an expired entry)
    pub misses: u64,

    /// Writes that created a new entry
    pub inserts: u64,

    /// Writes that replaced an existing entry
    pub updates: u64,

    /// Writes refused because the ledger was full
    pub rejected_writes: u64,

    /// Number of entries currently in the ledger
    pub entries: usize,

    /// Total size of stored vectors and metadata in bytes
    pub size_bytes: usize,

    /// Number of evictions due to the entry limit
    pub evictions_lru: u64,

    /// Number of evictions due to TTL expiration
    pub evictions_ttl: u64,

    /// Number of explicit removals
    pub removals: u64,
}

impl LedgerStats {
    /// Read hit rate as a percentage
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }

    /// Calculate total evictions
    pub fn total_evictions(&self) -> u64 {
        self.evictions_lru + self.evictions_ttl
    }
}

impl fmt::Display for LedgerStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LedgerStats {{ entries: {}, hits: {}, misses: {}, inserts: {}, updates: {}, evictions: {}, size: {} bytes }}",
            self.entries,
            self.hits,
            self.misses,
            self.inserts,
            self.updates,
            self.total_evictions(),
            self.size_bytes
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate() {
        let stats = LedgerStats {
            hits: 80,
            misses: 20,
            ..Default::default()
        };
        assert_eq!(stats.hit_rate(), 80.0);
        assert_eq!(LedgerStats::default().hit_rate(), 0.0);
    }

    #[test]
    fn test_display() {
        let stats = LedgerStats {
            entries: 3,
            evictions_lru: 2,
            evictions_ttl: 1,
            ..Default::default()
        };
        let display = stats.to_string();
        assert!(display.contains("entries: 3"));
        assert!(display.contains("evictions: 3"));
    }
}
