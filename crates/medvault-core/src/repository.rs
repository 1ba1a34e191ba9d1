//! Record repository over the encrypted collection.
//!
//! The whole collection is one encrypted envelope in the [`RECORDS_SLOT`]
//! slot. Every mutation is a full cycle: read the envelope, decrypt, parse,
//! change the in-memory collection, serialise, encrypt under a fresh nonce,
//! and overwrite the slot with a single `put`. Any failure before that `put`
//! leaves the stored envelope exactly as it was.
//!
//! Mutations always work on the full collection, never on the caller's
//! filtered view, so a scoped writer cannot drop records it cannot see.
//!
//! There is no locking and no version token. Two repositories writing the
//! same store race, and the later `put` discards the earlier writer's changes.

use tracing::debug;
use zeroize::Zeroizing;

use crate::access::Scope;
use crate::crypto::{decrypt, encrypt, DerivedKey};
use crate::error::{Result, VaultError};
use crate::records::{NaturalKey, Record};
use crate::storage::{EncryptedBlobStore, KeyValueStore, RECORDS_SLOT};

/// Mediates all reads and writes of the record collection.
pub struct RecordRepository<S> {
    blobs: EncryptedBlobStore<S>,
}

impl<S: KeyValueStore> RecordRepository<S> {
    pub fn new(store: S) -> Self {
        Self {
            blobs: EncryptedBlobStore::new(store),
        }
    }

    /// Return the records visible to `scope`, in stored order.
    ///
    /// If nothing is stored yet, an encrypted empty collection is written
    /// first and an empty view is returned.
    ///
    /// # Errors
    ///
    /// - `VaultError::Authentication` if the envelope does not decrypt under `key`
    /// - `VaultError::Corrupt` if the plaintext is not a record collection
    /// - `VaultError::Storage` if the backend fails
    pub fn load_scoped(&mut self, key: &DerivedKey, scope: &Scope) -> Result<Vec<Record>> {
        match self.read_all(key)? {
            Some(records) => Ok(scope.filter(&records)),
            None => {
                debug!("initialising empty record collection");
                self.write_all(key, &[])?;
                Ok(Vec::new())
            }
        }
    }

    /// Look up one visible record by natural key.
    pub fn find(
        &self,
        key: &DerivedKey,
        scope: &Scope,
        natural_key: &NaturalKey,
    ) -> Result<Option<Record>> {
        let records = self.read_all(key)?.unwrap_or_default();
        Ok(records
            .into_iter()
            .find(|r| r.has_key(natural_key) && scope.permits(r)))
    }

    /// Insert or replace a record and return the caller's updated view.
    ///
    /// With `editing` set, the first record whose natural key equals it is
    /// replaced in place; later records sharing that key are kept as they
    /// are. Without it, `candidate` is appended.
    ///
    /// # Errors
    ///
    /// - `VaultError::Authorization` if a scoped caller writes another subject's record
    /// - `VaultError::NotFound` if `editing` names no stored record
    /// - `VaultError::Validation` if the result would hold two records with
    ///   the candidate's natural key
    /// - any error from loading or saving the collection
    pub fn upsert(
        &mut self,
        key: &DerivedKey,
        scope: &Scope,
        candidate: Record,
        editing: Option<&NaturalKey>,
    ) -> Result<Vec<Record>> {
        if !scope.permits(&candidate) {
            return Err(VaultError::Authorization(format!(
                "Cannot write records for subject {}",
                candidate.subject_id
            )));
        }
        if let Some(target) = editing {
            if !scope.permits_subject(&target.subject_id) {
                return Err(VaultError::Authorization(format!(
                    "Cannot edit records for subject {}",
                    target.subject_id
                )));
            }
        }

        let mut records = self.read_all(key)?.unwrap_or_default();
        let candidate_key = candidate.natural_key();

        match editing {
            Some(target) => {
                let index = records
                    .iter()
                    .position(|r| r.has_key(target))
                    .ok_or_else(|| VaultError::NotFound(format!("Record {}", target)))?;
                // Stored duplicates of an unchanged key are left alone.
                let collides = candidate_key != *target
                    && records.iter().any(|r| r.has_key(&candidate_key));
                if collides {
                    return Err(VaultError::Validation(format!(
                        "Record {} already exists",
                        candidate_key
                    )));
                }
                debug!(index, "replacing record");
                records[index] = candidate;
            }
            None => {
                if records.iter().any(|r| r.has_key(&candidate_key)) {
                    return Err(VaultError::Validation(format!(
                        "Record {} already exists; edit it instead",
                        candidate_key
                    )));
                }
                debug!("appending record");
                records.push(candidate);
            }
        }

        self.write_all(key, &records)?;
        Ok(scope.filter(&records))
    }

    /// Remove one attachment from the record at `target` and return the
    /// caller's updated view.
    ///
    /// An unknown `attachment_id` is not an error: the collection is left
    /// unchanged and nothing is rewritten.
    ///
    /// # Errors
    ///
    /// - `VaultError::Authorization` if `target` is outside the caller's scope
    /// - `VaultError::NotFound` if no record has the natural key `target`
    /// - any error from loading or saving the collection
    pub fn delete_attachment(
        &mut self,
        key: &DerivedKey,
        scope: &Scope,
        target: &NaturalKey,
        attachment_id: &str,
    ) -> Result<Vec<Record>> {
        if !scope.permits_subject(&target.subject_id) {
            return Err(VaultError::Authorization(format!(
                "Cannot edit records for subject {}",
                target.subject_id
            )));
        }

        let mut records = self.read_all(key)?.unwrap_or_default();
        let record = records
            .iter_mut()
            .find(|r| r.has_key(target))
            .ok_or_else(|| VaultError::NotFound(format!("Record {}", target)))?;

        if record.remove_attachment(attachment_id) {
            self.write_all(key, &records)?;
        } else {
            debug!("attachment not present; nothing to delete");
        }
        Ok(scope.filter(&records))
    }

    pub fn store(&self) -> &S {
        self.blobs.inner()
    }

    pub fn store_mut(&mut self) -> &mut S {
        self.blobs.inner_mut()
    }

    pub fn into_store(self) -> S {
        self.blobs.into_inner()
    }

    fn read_all(&self, key: &DerivedKey) -> Result<Option<Vec<Record>>> {
        let Some(envelope) = self.blobs.get(RECORDS_SLOT)? else {
            return Ok(None);
        };
        let plaintext = Zeroizing::new(decrypt(&envelope, key)?);
        let records: Vec<Record> = serde_json::from_slice(&plaintext)?;
        debug!(records = records.len(), "collection decrypted");
        Ok(Some(records))
    }

    fn write_all(&mut self, key: &DerivedKey, records: &[Record]) -> Result<()> {
        let plaintext = Zeroizing::new(serde_json::to_vec(records)?);
        let envelope = encrypt(&plaintext, key)?;
        self.blobs.put(RECORDS_SLOT, &envelope)?;
        debug!(records = records.len(), "collection saved");
        Ok(())
    }
}
