//! Cryptographic operations for Medvault.
//!
//! This module provides key derivation and envelope encryption using
//! well-audited RustCrypto implementations:
//! - **PBKDF2-HMAC-SHA256**: Password to key derivation
//! - **AES-256-GCM**: Authenticated encryption of the record collection
//!
//! ## Security Model
//!
//! - One key per password, derived with a fixed application salt
//! - The key lives only in memory for the session and is zeroized on drop
//! - No password hash is stored; a failed tag check is the only
//!   wrong-password signal
//!
//! ## Threat Model
//!
//! We defend against:
//! - Theft of the stored envelope
//! - Undetected tampering with the stored envelope
//!
//! We do NOT defend against:
//! - Precomputed attacks across deployments (the salt is fixed)
//! - Compromised OS / access to an unlocked session's memory

pub mod cipher;
pub mod key;

pub use cipher::{decrypt, encrypt, Envelope, NONCE_LENGTH};
pub use key::{derive_key, DerivedKey, KDF_SALT, KEY_LENGTH, PBKDF2_ITERATIONS};
