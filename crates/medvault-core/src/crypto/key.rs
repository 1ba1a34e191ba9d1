//! Key derivation using PBKDF2-HMAC-SHA256.
//!
//! Keys are derived from the password alone with a fixed application salt,
//! so the same password always yields the same key on every deployment.

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::ZeroizeOnDrop;

/// PBKDF2 iteration count.
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// Application-wide salt. Fixed so that existing envelopes stay readable.
pub const KDF_SALT: &[u8] = b"medical-records-salt";

/// Length of derived key in bytes (32 bytes = 256 bits for AES-256-GCM).
pub const KEY_LENGTH: usize = 32;

/// A cryptographic key derived from a password.
///
/// Key material is zeroized from memory when dropped.
#[derive(Clone, ZeroizeOnDrop)]
pub struct DerivedKey {
    key: [u8; KEY_LENGTH],
}

impl DerivedKey {
    /// Wrap raw key bytes.
    ///
    /// The caller is responsible for ensuring the bytes come from a secure source.
    pub fn from_bytes(bytes: [u8; KEY_LENGTH]) -> Self {
        Self { key: bytes }
    }

    /// Get a reference to the raw key bytes.
    ///
    /// Avoid storing or logging this value. Use only for immediate encryption operations.
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.key
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Derive an encryption key from a password.
///
/// Deterministic and free of I/O: the same password always produces the same
/// key. Blank passwords are not rejected here; `AccessControl` refuses them
/// before a key is ever derived.
///
/// # Examples
///
/// ```
/// use medvault_core::crypto::derive_key;
///
/// let key = derive_key("correct horse battery staple");
/// assert_eq!(key.as_bytes().len(), 32);
/// ```
pub fn derive_key(password: &str) -> DerivedKey {
    let mut key_bytes = [0u8; KEY_LENGTH];
    pbkdf2_hmac::<Sha256>(
        password.as_bytes(),
        KDF_SALT,
        PBKDF2_ITERATIONS,
        &mut key_bytes,
    );
    DerivedKey::from_bytes(key_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_derivation_deterministic() {
        let key1 = derive_key("test-passphrase");
        let key2 = derive_key("test-passphrase");

        assert_eq!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_different_password_different_key() {
        let key1 = derive_key("passphrase-one");
        let key2 = derive_key("passphrase-two");

        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_matches_reference_parameters() {
        // Same derivation done by hand, guarding the iteration count and salt.
        let mut expected = [0u8; KEY_LENGTH];
        pbkdf2_hmac::<Sha256>(b"medicalstaff123", b"medical-records-salt", 100_000, &mut expected);

        assert_eq!(derive_key("medicalstaff123").as_bytes(), &expected);
    }

    #[test]
    fn test_derived_key_debug_redacts() {
        let key = derive_key("test-passphrase");

        let debug_output = format!("{:?}", key);
        assert!(debug_output.contains("REDACTED"));

        let key_hex = hex::encode(&key.as_bytes()[..4]);
        assert!(!debug_output.contains(&key_hex));
    }
}
