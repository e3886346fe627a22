//! Records of entries leaving the ledger

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why entries left the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvictionReason {
    /// Entry outlived its TTL
    Expired,

    /// Evicted to make room under the entry limit
    LeastRecentlyUsed,

    /// Removed explicitly (segment invalidation or clear)
    Manual,
}

impl std::fmt::Display for EvictionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvictionReason::Expired => write!(f, "TTL expired"),
            EvictionReason::LeastRecentlyUsed => write!(f, "LRU eviction"),
            EvictionReason::Manual => write!(f, "manual removal"),
        }
    }
}

/// A batch of segments removed for the same reason
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvictionEvent {
    pub reason: EvictionReason,

    pub timestamp: DateTime<Utc>,

    /// Segments that were removed
    pub segment_ids: Vec<String>,
}

impl EvictionEvent {
    pub fn new(reason: EvictionReason, segment_ids: Vec<String>) -> Self {
        Self {
            reason,
            timestamp: Utc::now(),
            segment_ids,
        }
    }

    pub fn len(&self) -> usize {
        self.segment_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segment_ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_display() {
        assert_eq!(EvictionReason::Expired.to_string(), "TTL expired");
        assert_eq!(EvictionReason::LeastRecentlyUsed.to_string(), "LRU eviction");
    }

    #[test]
    fn test_event() {
        let event = EvictionEvent::new(
            EvictionReason::Manual,
            vec!["seg_1".to_string(), "seg_2".to_string()],
        );
        assert_eq!(event.len(), 2);
        assert!(!event.is_empty());

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["reason"], "manual");
    }
}
