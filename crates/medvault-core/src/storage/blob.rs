//! Encrypted envelope slots on top of a key-value store.
//!
//! An envelope is stored as JSON text with both halves hex-encoded:
//!
//! ```text
//! {"nonce":"<24 hex chars>","ciphertext":"<hex>"}
//! ```
//!
//! Envelopes written by earlier releases used the field names `iv` and
//! `data`; those are still accepted on read.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::crypto::cipher::{Envelope, NONCE_LENGTH};
use crate::error::{Result, VaultError};
use crate::storage::traits::KeyValueStore;

/// Slot holding the encrypted record collection.
pub const RECORDS_SLOT: &str = "records";

#[derive(Serialize, Deserialize)]
struct EnvelopeJson {
    #[serde(alias = "iv")]
    nonce: String,
    #[serde(alias = "data")]
    ciphertext: String,
}

impl From<&Envelope> for EnvelopeJson {
    fn from(envelope: &Envelope) -> Self {
        Self {
            nonce: hex::encode(envelope.nonce),
            ciphertext: hex::encode(&envelope.ciphertext),
        }
    }
}

impl TryFrom<EnvelopeJson> for Envelope {
    type Error = VaultError;

    fn try_from(json: EnvelopeJson) -> Result<Self> {
        let mut nonce = [0u8; NONCE_LENGTH];
        hex::decode_to_slice(json.nonce.trim(), &mut nonce)
            .map_err(|_| VaultError::Authentication)?;
        let ciphertext =
            hex::decode(json.ciphertext.trim()).map_err(|_| VaultError::Authentication)?;
        Ok(Envelope { nonce, ciphertext })
    }
}

/// Envelope-per-slot view over a [`KeyValueStore`].
#[derive(Debug)]
pub struct EncryptedBlobStore<S> {
    inner: S,
}

impl<S: KeyValueStore> EncryptedBlobStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    /// Read the envelope stored under `name`.
    ///
    /// # Errors
    ///
    /// - `VaultError::Storage` if the backend read fails
    /// - `VaultError::Authentication` if the stored value is not a well-formed
    ///   envelope (bad JSON, bad hex, wrong nonce length)
    pub fn get(&self, name: &str) -> Result<Option<Envelope>> {
        let Some(bytes) = self.inner.get(name)? else {
            debug!(slot = name, "no envelope stored");
            return Ok(None);
        };
        let json: EnvelopeJson =
            serde_json::from_slice(&bytes).map_err(|_| VaultError::Authentication)?;
        Envelope::try_from(json).map(Some)
    }

    /// Overwrite the envelope stored under `name`.
    pub fn put(&mut self, name: &str, envelope: &Envelope) -> Result<()> {
        let text = serde_json::to_vec(&EnvelopeJson::from(envelope))
            .map_err(|e| VaultError::Storage(format!("Envelope encoding failed: {}", e)))?;
        self.inner.set(name, &text)?;
        debug!(
            slot = name,
            ciphertext_bytes = envelope.ciphertext.len(),
            "envelope written"
        );
        Ok(())
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}
