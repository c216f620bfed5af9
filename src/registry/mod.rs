//! Producer registry
//!
//! The registry tracks every producer identity the process has seen:
//! connection liveness, the per-attempt record index, the monotonically
//! advancing attempt sequence, and a bounded buffer of recent records.
//!
//! # Architecture
//!
//! ```text
//!                       Arc<ProducerRegistry>
//!                  ┌────────────────────────────┐
//!                  │ producers: HashMap<Id,     │
//!                  │   ProducerEntry {          │
//!                  │     attempt, record_index, │
//!                  │     live, history,         │
//!                  │   }                        │
//!                  │ >                          │
//!                  └─────────────┬──────────────┘
//!                                │
//!            ┌───────────────────┼───────────────────┐
//!            │                   │                   │
//!            ▼                   ▼                   ▼
//!      [Connection]        [Connection]        [Page layer]
//!      on_connect()        on_record()         producers()
//!      on_record()         on_disconnect()     history()
//!      on_disconnect()                         is_live()
//! ```
//!
//! # Ordering
//!
//! Each entry sits behind its own lock, so operations for one identity
//! apply in the order the connection read the bytes. No ordering is
//! promised across identities.

pub mod config;
pub mod entry;
pub mod history;
pub mod identity;
pub mod store;

pub use config::RegistryConfig;
pub use entry::{ProducerEntry, ProducerStats, RecordMeta};
pub use history::HistoryBuffer;
pub use identity::ProducerId;
pub use store::ProducerRegistry;
