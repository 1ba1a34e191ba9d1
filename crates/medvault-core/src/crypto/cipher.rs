//! AES-256-GCM envelope encryption.
//!
//! Each call to [`encrypt`] draws a fresh 96-bit nonce from the OS RNG and
//! returns it alongside the ciphertext. The 128-bit GCM tag is appended to the
//! ciphertext, so any change to either half of the envelope, or a different
//! key, fails [`decrypt`] with [`VaultError::Authentication`].

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};

use crate::crypto::key::DerivedKey;
use crate::error::{Result, VaultError};

/// AES-GCM nonce length in bytes (96 bits).
pub const NONCE_LENGTH: usize = 12;

/// Output of one encryption: the nonce and the tagged ciphertext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub nonce: [u8; NONCE_LENGTH],
    pub ciphertext: Vec<u8>,
}

fn cipher_for(key: &DerivedKey) -> Aes256Gcm {
    Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()))
}

/// Encrypt `plaintext` under `key` with a freshly generated nonce.
///
/// # Errors
///
/// Returns `VaultError::Crypto` if the AEAD primitive rejects the input.
/// Nothing is persisted by this function, so a failure leaves stored state
/// untouched.
pub fn encrypt(plaintext: &[u8], key: &DerivedKey) -> Result<Envelope> {
    let generated = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = cipher_for(key)
        .encrypt(&generated, plaintext)
        .map_err(|_| VaultError::Crypto("AES-GCM encryption failed".to_string()))?;

    let mut nonce = [0u8; NONCE_LENGTH];
    nonce.copy_from_slice(generated.as_slice());

    Ok(Envelope { nonce, ciphertext })
}

/// Decrypt an envelope produced by [`encrypt`].
///
/// # Errors
///
/// Returns `VaultError::Authentication` if the tag does not verify: the key is
/// wrong, or the nonce or ciphertext was altered.
pub fn decrypt(envelope: &Envelope, key: &DerivedKey) -> Result<Vec<u8>> {
    cipher_for(key)
        .decrypt(Nonce::from_slice(&envelope.nonce), envelope.ciphertext.as_slice())
        .map_err(|_| VaultError::Authentication)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::key::KEY_LENGTH;

    fn key(fill: u8) -> DerivedKey {
        DerivedKey::from_bytes([fill; KEY_LENGTH])
    }

    #[test]
    fn test_encrypt_decrypt_round_trip() {
        let plaintext = b"Hello, World! This is secret data.";

        let envelope = encrypt(plaintext, &key(1)).unwrap();
        let decrypted = decrypt(&envelope, &key(1)).unwrap();

        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_empty_data_encryption() {
        let envelope = encrypt(b"", &key(1)).unwrap();

        // Tag only.
        assert_eq!(envelope.ciphertext.len(), 16);
        assert_eq!(decrypt(&envelope, &key(1)).unwrap(), b"");
    }

    #[test]
    fn test_ciphertext_differs_from_plaintext() {
        let plaintext = b"secret data with marker";
        let envelope = encrypt(plaintext, &key(1)).unwrap();

        assert_ne!(&envelope.ciphertext[..plaintext.len()], plaintext);
    }

    #[test]
    fn test_wrong_key_fails_decryption() {
        let envelope = encrypt(b"secret data", &key(1)).unwrap();

        let result = decrypt(&envelope, &key(2));
        assert!(matches!(result, Err(VaultError::Authentication)));
    }

    #[test]
    fn test_corrupted_ciphertext_fails_decryption() {
        let mut envelope = encrypt(b"secret data", &key(1)).unwrap();
        let mid = envelope.ciphertext.len() / 2;
        envelope.ciphertext[mid] ^= 0xFF;

        assert!(matches!(
            decrypt(&envelope, &key(1)),
            Err(VaultError::Authentication)
        ));
    }

    #[test]
    fn test_swapped_nonce_fails_decryption() {
        let mut envelope = encrypt(b"secret data", &key(1)).unwrap();
        envelope.nonce[0] ^= 0x01;

        assert!(matches!(
            decrypt(&envelope, &key(1)),
            Err(VaultError::Authentication)
        ));
    }

    #[test]
    fn test_same_plaintext_gets_fresh_nonce() {
        let first = encrypt(b"same plaintext", &key(1)).unwrap();
        let second = encrypt(b"same plaintext", &key(1)).unwrap();

        assert_ne!(first.nonce, second.nonce);
        assert_ne!(first.ciphertext, second.ciphertext);
    }

    #[test]
    fn test_large_data_encryption() {
        let plaintext = vec![0x42u8; 1024 * 1024];

        let envelope = encrypt(&plaintext, &key(7)).unwrap();
        assert_eq!(decrypt(&envelope, &key(7)).unwrap(), plaintext);
    }
}
