//! Storage abstraction for Medvault.
//!
//! The persistent store is a plain key-value byte store with get/set
//! semantics. On top of it, [`EncryptedBlobStore`] keeps exactly one
//! encrypted envelope per logical slot name.
//!
//! ## Architecture
//!
//! The storage layer is backend-agnostic:
//! - `MemoryStore`: in-process map, for tests and embedding
//! - `FileStore`: one file per slot, replaced atomically
//! - `SqliteStore`: one row per slot in a SQLite table
//!
//! All backends implement [`KeyValueStore`]. A `set` fully overwrites the
//! previous value; there is no versioning and no compare-and-swap.

pub mod blob;
pub mod file;
pub mod memory;
pub mod sqlite;
pub mod traits;

// Re-export public types
pub use blob::{EncryptedBlobStore, RECORDS_SLOT};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::KeyValueStore;
