//! memorystore: session-scoped conversational memory records
//!
//! Persists one record per session (rolling message window, running
//! summary, accumulated facts) in SQLite. The answerdaemon pipeline
//! loads a record at intake and upserts the reduced memory at turn end;
//! the `ms` binary inspects and maintains the store.

pub mod cli;
pub mod config;
pub mod store;

pub use config::Config;
pub use store::{SessionListing, SessionRecord, SessionStore, StoreError, StoredMessage, now_ms};
