//! Ledger entry management with optional TTL

use crate::vector::{SegmentId, SemanticVector};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A committed segment vector with its bookkeeping metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// The segment identifier
    pub segment_id: SegmentId,

    /// Last resolved vector for the segment
    pub vector: SemanticVector,

    /// Entry metadata
    pub metadata: EntryMetadata,
}

impl LedgerEntry {
    /// Create a new entry; `ttl` of `None` never expires
    pub fn new(segment_id: SegmentId, vector: SemanticVector, ttl: Option<Duration>) -> Self {
        let now = Utc::now();

        Self {
            segment_id,
            vector,
            metadata: EntryMetadata {
                created_at: now,
                updated_at: now,
                accessed_at: now,
                expires_at: ttl.map(|ttl| expiry_from(now, ttl)),
                access_count: 0,
                size_bytes: 0, // Will be calculated on insert
                version: 1,
            },
        }
    }

    /// Check if the entry has expired
    pub fn is_expired(&self) -> bool {
        match self.metadata.expires_at {
            Some(expires_at) => Utc::now() > expires_at,
            None => false,
        }
    }

    /// Mark the entry as accessed (updates access time and count)
    pub fn mark_accessed(&mut self) {
        self.metadata.accessed_at = Utc::now();
        self.metadata.access_count += 1;
    }

    /// Replace the stored vector, bump the version and reset expiration
    pub fn update_vector(&mut self, vector: SemanticVector, ttl: Option<Duration>) {
        let now = Utc::now();
        self.vector = vector;
        self.metadata.updated_at = now;
        self.metadata.expires_at = ttl.map(|ttl| expiry_from(now, ttl));
        self.metadata.version += 1;
        self.metadata.size_bytes = self.calculate_size();
    }

    /// Get the age of the entry
    pub fn age(&self) -> Duration {
        (Utc::now() - self.metadata.created_at)
            .to_std()
            .unwrap_or(Duration::from_secs(0))
    }

    /// Calculate the size of this entry in bytes
    pub fn calculate_size(&self) -> usize {
        // Approximate size: key + vector payload + metadata overhead
        self.segment_id.len() + self.vector.size_bytes() + std::mem::size_of::<EntryMetadata>()
    }
}

fn expiry_from(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    now + chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::seconds(3600))
}

/// Metadata associated with a ledger entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryMetadata {
    /// When the segment was first committed
    pub created_at: DateTime<Utc>,

    /// Last time the vector was written
    pub updated_at: DateTime<Utc>,

    /// Last access time (for LRU tracking)
    pub accessed_at: DateTime<Utc>,

    /// When the entry expires, if ever
    pub expires_at: Option<DateTime<Utc>>,

    /// Number of times this entry has been read
    pub access_count: u64,

    /// Size of the entry in bytes
    pub size_bytes: usize,

    /// Version number (incremented on every overwrite)
    pub version: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    fn vector(values: &[f32]) -> SemanticVector {
        SemanticVector::new(values.to_vec()).unwrap()
    }

    #[test]
    fn test_entry_creation() {
        let entry = LedgerEntry::new("seg_0".to_string(), vector(&[1.0, 0.0]), None);

        assert_eq!(entry.segment_id, "seg_0");
        assert_eq!(entry.vector.as_slice(), &[1.0, 0.0]);
        assert!(!entry.is_expired());
        assert!(entry.metadata.expires_at.is_none());
        assert_eq!(entry.metadata.version, 1);
    }

    #[test]
    fn test_entry_expiration() {
        let entry = LedgerEntry::new(
            "seg".to_string(),
            vector(&[1.0]),
            Some(Duration::from_millis(100)),
        );

        assert!(!entry.is_expired());
        sleep(Duration::from_millis(150));
        assert!(entry.is_expired());
    }

    #[test]
    fn test_mark_accessed() {
        let mut entry = LedgerEntry::new("seg".to_string(), vector(&[1.0]), None);

        let initial_time = entry.metadata.accessed_at;
        sleep(Duration::from_millis(10));
        entry.mark_accessed();

        assert_eq!(entry.metadata.access_count, 1);
        assert!(entry.metadata.accessed_at > initial_time);
    }

    #[test]
    fn test_update_vector() {
        let mut entry = LedgerEntry::new("seg".to_string(), vector(&[1.0, 0.0]), None);
        let created_at = entry.metadata.created_at;

        sleep(Duration::from_millis(5));
        entry.update_vector(vector(&[0.0, 1.0]), Some(Duration::from_secs(60)));

        assert_eq!(entry.vector.as_slice(), &[0.0, 1.0]);
        assert_eq!(entry.metadata.version, 2);
        assert_eq!(entry.metadata.created_at, created_at);
        assert!(entry.metadata.updated_at > created_at);
        assert!(entry.metadata.expires_at.is_some());
    }

    #[test]
    fn test_calculate_size() {
        let entry = LedgerEntry::new("seg".to_string(), vector(&[1.0, 2.0, 3.0]), None);
        assert!(entry.calculate_size() >= "seg".len() + 3 * 4);
    }

    #[test]
    fn test_age_grows() {
        let entry = LedgerEntry::new("seg".to_string(), vector(&[1.0]), None);
        sleep(Duration::from_millis(5));
        assert!(entry.age() >= Duration::from_millis(5));
    }
}
