//! # Segment Ledger
//!
//! Stores the last resolved semantic vector for every segment the arbiter
//! has seen.
//!
//! - **Injected store**: the arbiter owns an `Arc<dyn Ledger>`, so tests and
//!   services can supply their own implementation
//! - **LRU bound**: `max_entries` caps the ledger; the least recently used
//!   segment is evicted first, or writes are refused when eviction is off
//! - **Optional TTL**: entries may expire and then behave as absent
//!
//! ## Example
//!
//! ```rust
//! use contextcore::ledger::{InMemoryLedger, Ledger};
//! use contextcore::SemanticVector;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let ledger = InMemoryLedger::with_capacity(1_000);
//!
//! let vector = SemanticVector::new(vec![0.1, 0.2, 0.3])?;
//! ledger.put("seg_0", vector.clone()).await?;
//!
//! assert_eq!(ledger.get("seg_0").await?, Some(vector));
//! # Ok(())
//! # }
//! ```

pub mod entry;
pub mod eviction;
pub mod store;
pub mod types;

pub use entry::{EntryMetadata, LedgerEntry};
pub use eviction::{EvictionEvent, EvictionReason};
pub use store::{spawn_cleanup, InMemoryLedger, Ledger};
pub use types::LedgerStats;
