//! Authorised session over the record repository.
//!
//! A session owns the derived key for its lifetime, the role it was granted,
//! and the last view of the collection it returned. It is the boundary where
//! errors surface to the host:
//!
//! - a failed load (wrong key, unreadable store, corrupt payload) ends the
//!   session and drops the key; the caller must authorise again
//! - a mutation that cannot decrypt or parse the stored collection ends the
//!   session the same way
//! - any other failed mutation leaves both the stored envelope and the cached
//!   view as they were
//!
//! Nothing is retried automatically.

use tracing::warn;

use crate::access::{Role, Scope};
use crate::crypto::DerivedKey;
use crate::error::{Result, VaultError};
use crate::records::{NaturalKey, Record};
use crate::repository::RecordRepository;
use crate::storage::KeyValueStore;

pub struct Session<S> {
    role: Role,
    scope: Scope,
    key: Option<DerivedKey>,
    repository: RecordRepository<S>,
    records: Vec<Record>,
}

impl<S: KeyValueStore> Session<S> {
    /// Bind `key` and `role` to `store` and load the initial view.
    ///
    /// Usually reached through [`crate::AccessControl::open_session`].
    pub fn open(role: Role, key: DerivedKey, store: S) -> Result<Self> {
        let scope = role.scope();
        let mut repository = RecordRepository::new(store);
        // On failure `key` is dropped (and zeroized) here.
        let records = repository.load_scoped(&key, &scope)?;
        Ok(Self {
            role,
            scope,
            key: Some(key),
            repository,
            records,
        })
    }

    pub fn role(&self) -> &Role {
        &self.role
    }

    pub fn is_active(&self) -> bool {
        self.key.is_some()
    }

    /// The caller's view as of the last successful operation.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Re-read the collection from the store.
    ///
    /// On a terminal failure (see [`VaultError::ends_session`]) the key is
    /// discarded and every later call fails with `VaultError::SessionClosed`.
    pub fn reload(&mut self) -> Result<&[Record]> {
        let key = self.key.as_ref().ok_or(VaultError::SessionClosed)?;
        match self.repository.load_scoped(key, &self.scope) {
            Ok(records) => {
                self.records = records;
                Ok(&self.records)
            }
            Err(err) => {
                if err.ends_session() {
                    warn!(error = %err, "ending session after failed load");
                    self.end();
                }
                Err(err)
            }
        }
    }

    /// Look up one visible record by natural key.
    pub fn find(&self, natural_key: &NaturalKey) -> Result<Option<Record>> {
        let key = self.key.as_ref().ok_or(VaultError::SessionClosed)?;
        self.repository.find(key, &self.scope, natural_key)
    }

    /// Insert `candidate`, or replace the record at `editing` with it.
    pub fn upsert(&mut self, candidate: Record, editing: Option<&NaturalKey>) -> Result<&[Record]> {
        let key = self.key.as_ref().ok_or(VaultError::SessionClosed)?;
        let result = self
            .repository
            .upsert(key, &self.scope, candidate, editing);
        self.settle(result)
    }

    /// Remove one attachment from the record at `target`.
    pub fn delete_attachment(&mut self, target: &NaturalKey, attachment_id: &str) -> Result<&[Record]> {
        let key = self.key.as_ref().ok_or(VaultError::SessionClosed)?;
        let result = self
            .repository
            .delete_attachment(key, &self.scope, target, attachment_id);
        self.settle(result)
    }

    /// End the session, discarding the key and cached view.
    pub fn close(mut self) -> RecordRepository<S> {
        self.end();
        self.repository
    }

    /// Apply a mutation's outcome to the cached view.
    ///
    /// A collection that no longer decrypts or parses under the session key
    /// ends the session. Any other failure leaves the view as it was.
    fn settle(&mut self, result: Result<Vec<Record>>) -> Result<&[Record]> {
        match result {
            Ok(records) => {
                self.records = records;
                Ok(&self.records)
            }
            Err(err) => {
                if matches!(err, VaultError::Authentication | VaultError::Corrupt(_)) {
                    warn!(error = %err, "ending session after failed mutation");
                    self.end();
                }
                Err(err)
            }
        }
    }

    fn end(&mut self) {
        self.key = None;
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KEY_LENGTH;
    use crate::storage::{MemoryStore, RECORDS_SLOT};
    use chrono::NaiveDate;

    fn key(fill: u8) -> DerivedKey {
        DerivedKey::from_bytes([fill; KEY_LENGTH])
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_open_initialises_and_caches_view() {
        let session = Session::open(Role::Privileged, key(1), MemoryStore::new()).unwrap();

        assert!(session.is_active());
        assert!(session.records().is_empty());
    }

    #[test]
    fn test_open_with_wrong_key_fails() {
        let store = Session::open(Role::Privileged, key(1), MemoryStore::new())
            .unwrap()
            .close()
            .into_store();

        let result = Session::open(Role::Privileged, key(2), store);
        assert!(matches!(result, Err(VaultError::Authentication)));
    }

    #[test]
    fn test_failed_reload_ends_session() {
        let mut session = Session::open(Role::Privileged, key(1), MemoryStore::new()).unwrap();
        session
            .upsert(Record::new("P1", date("2024-01-01")), None)
            .unwrap();

        // Another writer replaced the envelope with garbage.
        let mut repository = session.close();
        repository
            .store_mut()
            .set(RECORDS_SLOT, b"{\"nonce\":\"xx\"}")
            .unwrap();
        let store = repository.into_store();
        let mut session = Session {
            role: Role::Privileged,
            scope: Scope::All,
            key: Some(key(1)),
            repository: RecordRepository::new(store),
            records: Vec::new(),
        };

        assert!(matches!(session.reload(), Err(VaultError::Authentication)));
        assert!(!session.is_active());
        assert!(matches!(session.reload(), Err(VaultError::SessionClosed)));
        assert!(matches!(
            session.upsert(Record::new("P1", date("2024-01-02")), None),
            Err(VaultError::SessionClosed)
        ));
    }

    /// Memory store whose reads or writes can be switched to fail.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        fail_get: bool,
        fail_set: bool,
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, name: &str) -> Result<Option<Vec<u8>>> {
            if self.fail_get {
                return Err(VaultError::Storage("read failed".to_string()));
            }
            self.inner.get(name)
        }

        fn set(&mut self, name: &str, value: &[u8]) -> Result<()> {
            if self.fail_set {
                return Err(VaultError::Storage("write failed".to_string()));
            }
            self.inner.set(name, value)
        }
    }

    #[test]
    fn test_mutation_under_foreign_envelope_ends_session() {
        let mut session = Session::open(Role::Privileged, key(1), MemoryStore::new()).unwrap();
        session
            .upsert(Record::new("P1", date("2024-01-01")), None)
            .unwrap();

        // Another writer re-encrypted the collection under a different key.
        let mut other = RecordRepository::new(MemoryStore::new());
        other.load_scoped(&key(2), &Scope::All).unwrap();
        let foreign = other.store().get(RECORDS_SLOT).unwrap().unwrap();
        session
            .repository
            .store_mut()
            .set(RECORDS_SLOT, &foreign)
            .unwrap();

        let result = session.upsert(Record::new("P1", date("2024-01-02")), None);

        assert!(matches!(result, Err(VaultError::Authentication)));
        assert!(!session.is_active());
        assert_eq!(
            session.repository.store().get(RECORDS_SLOT).unwrap(),
            Some(foreign)
        );
        assert!(matches!(
            session.upsert(Record::new("P1", date("2024-01-02")), None),
            Err(VaultError::SessionClosed)
        ));
    }

    #[test]
    fn test_failed_save_keeps_envelope_and_view() {
        let mut session = Session::open(Role::Privileged, key(1), FlakyStore::default()).unwrap();
        session
            .upsert(Record::new("P1", date("2024-01-01")), None)
            .unwrap();
        let before = session.repository.store().get(RECORDS_SLOT).unwrap();

        session.repository.store_mut().fail_set = true;
        let result = session.upsert(Record::new("P2", date("2024-01-01")), None);

        assert!(matches!(result, Err(VaultError::Storage(_))));
        assert!(session.is_active());
        assert_eq!(session.records().len(), 1);
        assert_eq!(session.records()[0].subject_id, "P1");
        assert_eq!(session.repository.store().get(RECORDS_SLOT).unwrap(), before);

        session.repository.store_mut().fail_set = false;
        assert_eq!(session.reload().unwrap().len(), 1);
    }

    #[test]
    fn test_failed_read_on_reload_ends_session() {
        let mut session = Session::open(Role::Privileged, key(1), FlakyStore::default()).unwrap();
        session
            .upsert(Record::new("P1", date("2024-01-01")), None)
            .unwrap();

        session.repository.store_mut().fail_get = true;

        assert!(matches!(session.reload(), Err(VaultError::Storage(_))));
        assert!(!session.is_active());
        assert!(session.records().is_empty());
        assert!(matches!(
            session.find(&NaturalKey::new("P1", date("2024-01-01"))),
            Err(VaultError::SessionClosed)
        ));
    }

    #[test]
    fn test_failed_upsert_keeps_cached_view() {
        let mut session = Session::open(Role::Privileged, key(1), MemoryStore::new()).unwrap();
        session
            .upsert(Record::new("P1", date("2024-01-01")).with_notes("first"), None)
            .unwrap();

        let result = session.upsert(Record::new("P1", date("2024-01-01")), None);

        assert!(matches!(result, Err(VaultError::Validation(_))));
        assert!(session.is_active());
        assert_eq!(session.records().len(), 1);
        assert_eq!(session.records()[0].notes, "first");
    }

    #[test]
    fn test_scoped_session_sees_own_subject_only() {
        let mut staff = Session::open(Role::Privileged, key(1), MemoryStore::new()).unwrap();
        staff
            .upsert(Record::new("P1", date("2024-01-01")), None)
            .unwrap();
        staff
            .upsert(Record::new("P2", date("2024-01-01")), None)
            .unwrap();
        let store = staff.close().into_store();

        let patient = Session::open(Role::Scoped("P2".to_string()), key(1), store).unwrap();
        assert_eq!(patient.records().len(), 1);
        assert_eq!(patient.records()[0].subject_id, "P2");
    }
}
