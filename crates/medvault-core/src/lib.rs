//! # Medvault Core
//!
//! Core library for Medvault - an encrypted store for clinical records and
//! their attachments, unlocked with a single shared password.
//!
//! This crate provides key derivation, envelope encryption, the encrypted
//! blob store and the role-filtered record repository, independent of the
//! CLI interface.
//!
//! ## Architecture
//!
//! - **crypto**: PBKDF2 key derivation and AES-256-GCM envelopes
//! - **storage**: Key-value backends and the encrypted blob store on top of them
//! - **records**: Record and attachment data model
//! - **repository**: Load/filter/mutate/save cycle over the whole collection
//! - **access**: Credential to role mapping from an injected role table
//! - **session**: Authorised session with the derived key and cached view
//!
//! ## Known limitations
//!
//! - Every session that presents the same secret derives the same key. There
//!   is no per-user or per-record key separation, and the KDF salt is a fixed
//!   application constant. Changing either would make existing envelopes
//!   unreadable.
//! - Every mutation rewrites the whole encrypted collection. There is no
//!   locking and no version token, so two writers on the same store race and
//!   the later write silently discards the earlier one.

pub mod access;
pub mod crypto;
pub mod error;
pub mod fs;
pub mod records;
pub mod repository;
pub mod session;
pub mod storage;

pub use access::{AccessControl, Credential, Role, RoleTable, Scope};
pub use error::{Result, VaultError};
pub use records::{Attachment, AttachmentKind, NaturalKey, Record};
pub use repository::RecordRepository;
pub use session::Session;
pub use storage::KeyValueStore;

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
