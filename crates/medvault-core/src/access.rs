//! Credential to role mapping.
//!
//! The role table is injected by the host (the CLI reads it from its config
//! file). It holds exactly one privileged secret and a closed list of scoped
//! secrets, each bound to one subject id.
//!
//! Authorisation only decides the role. The encryption key is derived from
//! the credential's secret afterwards, so every session that presents the
//! same secret, privileged or scoped, works with the same key.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use subtle::ConstantTimeEq;
use tracing::info;

use crate::crypto::derive_key;
use crate::error::{Result, VaultError};
use crate::records::Record;
use crate::session::Session;
use crate::storage::KeyValueStore;

/// Secret plus optional subject id submitted at session start.
#[derive(Debug)]
pub struct Credential {
    secret: SecretString,
    subject_id: Option<String>,
}

impl Credential {
    /// Build a credential. The subject id is trimmed, and a blank one counts
    /// as none.
    pub fn new(secret: impl Into<String>, subject_id: Option<&str>) -> Self {
        Self {
            secret: SecretString::from(secret.into()),
            subject_id: subject_id
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string),
        }
    }

    pub fn secret(&self) -> &SecretString {
        &self.secret
    }

    pub fn subject_id(&self) -> Option<&str> {
        self.subject_id.as_deref()
    }
}

/// Role granted to an authorised session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    /// Sees and edits every record.
    Privileged,
    /// Sees only records of this subject.
    Scoped(String),
}

impl Role {
    pub fn scope(&self) -> Scope {
        match self {
            Role::Privileged => Scope::All,
            Role::Scoped(subject_id) => Scope::Subject(subject_id.clone()),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Privileged => write!(f, "privileged"),
            Role::Scoped(subject_id) => write!(f, "scoped:{}", subject_id),
        }
    }
}

/// Visibility restriction applied to a session's view of the collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    All,
    Subject(String),
}

impl Scope {
    pub fn permits_subject(&self, subject_id: &str) -> bool {
        match self {
            Scope::All => true,
            Scope::Subject(own) => own == subject_id,
        }
    }

    pub fn permits(&self, record: &Record) -> bool {
        self.permits_subject(&record.subject_id)
    }

    /// Keep the records this scope may see, preserving order.
    pub fn filter(&self, records: &[Record]) -> Vec<Record> {
        records.iter().filter(|r| self.permits(r)).cloned().collect()
    }
}

/// A scoped secret bound to one subject.
#[derive(Debug)]
pub struct ScopedEntry {
    pub secret: SecretString,
    pub subject_id: String,
}

/// Externally configured secrets.
#[derive(Debug)]
pub struct RoleTable {
    privileged_secret: SecretString,
    scoped: Vec<ScopedEntry>,
}

impl RoleTable {
    pub fn new(privileged_secret: impl Into<String>) -> Self {
        Self {
            privileged_secret: SecretString::from(privileged_secret.into()),
            scoped: Vec::new(),
        }
    }

    pub fn with_scoped(mut self, secret: impl Into<String>, subject_id: impl Into<String>) -> Self {
        self.scoped.push(ScopedEntry {
            secret: SecretString::from(secret.into()),
            subject_id: subject_id.into(),
        });
        self
    }

    pub fn scoped_entries(&self) -> &[ScopedEntry] {
        &self.scoped
    }
}

fn secrets_equal(a: &SecretString, b: &SecretString) -> bool {
    a.expose_secret()
        .as_bytes()
        .ct_eq(b.expose_secret().as_bytes())
        .into()
}

/// Maps credentials to roles using an injected [`RoleTable`].
#[derive(Debug)]
pub struct AccessControl {
    table: RoleTable,
}

impl AccessControl {
    pub fn new(table: RoleTable) -> Self {
        Self { table }
    }

    /// Decide the role for `credential`.
    ///
    /// # Errors
    ///
    /// Returns `VaultError::Authorization` if:
    /// - the secret is blank
    /// - no subject id is given and the secret is not the privileged secret
    /// - a subject id is given and no scoped entry matches both secret and subject
    pub fn authorize(&self, credential: &Credential) -> Result<Role> {
        if credential.secret().expose_secret().trim().is_empty() {
            return Err(VaultError::Authorization(
                "Secret cannot be empty".to_string(),
            ));
        }

        let role = match credential.subject_id() {
            None => {
                if secrets_equal(credential.secret(), &self.table.privileged_secret) {
                    Some(Role::Privileged)
                } else {
                    None
                }
            }
            Some(subject_id) => self
                .table
                .scoped
                .iter()
                .find(|entry| {
                    entry.subject_id == subject_id
                        && secrets_equal(credential.secret(), &entry.secret)
                })
                .map(|entry| Role::Scoped(entry.subject_id.clone())),
        };

        match role {
            Some(role) => {
                info!(role = %role, "session authorized");
                Ok(role)
            }
            None => {
                info!("authorization rejected");
                Err(VaultError::Authorization("Invalid credentials".to_string()))
            }
        }
    }

    /// Authorise, derive the key from the credential's secret, and load the
    /// caller's view of the collection held in `store`.
    ///
    /// No key material survives a failure at any step.
    pub fn open_session<S: KeyValueStore>(
        &self,
        credential: &Credential,
        store: S,
    ) -> Result<Session<S>> {
        let role = self.authorize(credential)?;
        let key = derive_key(credential.secret().expose_secret());
        Session::open(role, key, store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn access() -> AccessControl {
        AccessControl::new(
            RoleTable::new("staff-secret")
                .with_scoped("p1-secret", "P1")
                .with_scoped("shared-secret", "P3"),
        )
    }

    #[test]
    fn test_privileged_secret_without_subject() {
        let role = access()
            .authorize(&Credential::new("staff-secret", None))
            .unwrap();
        assert_eq!(role, Role::Privileged);
        assert_eq!(role.scope(), Scope::All);
    }

    #[test]
    fn test_scoped_secret_with_matching_subject() {
        let role = access()
            .authorize(&Credential::new("p1-secret", Some("P1")))
            .unwrap();
        assert_eq!(role, Role::Scoped("P1".to_string()));
    }

    #[test]
    fn test_scoped_secret_with_other_subject_fails() {
        let result = access().authorize(&Credential::new("p1-secret", Some("P2")));
        assert!(matches!(result, Err(VaultError::Authorization(_))));
    }

    #[test]
    fn test_scoped_secret_without_subject_fails() {
        let result = access().authorize(&Credential::new("p1-secret", None));
        assert!(matches!(result, Err(VaultError::Authorization(_))));
    }

    #[test]
    fn test_privileged_secret_with_subject_needs_scoped_entry() {
        let result = access().authorize(&Credential::new("staff-secret", Some("P1")));
        assert!(matches!(result, Err(VaultError::Authorization(_))));
    }

    #[test]
    fn test_subject_id_is_trimmed() {
        let credential = Credential::new("p1-secret", Some(" P1 "));
        assert_eq!(credential.subject_id(), Some("P1"));

        let role = access().authorize(&credential).unwrap();
        assert_eq!(role, Role::Scoped("P1".to_string()));
    }

    #[test]
    fn test_blank_subject_counts_as_none() {
        let role = access()
            .authorize(&Credential::new("staff-secret", Some("  ")))
            .unwrap();
        assert_eq!(role, Role::Privileged);
    }

    #[test]
    fn test_unknown_and_empty_secrets_fail() {
        let access = access();
        assert!(access.authorize(&Credential::new("guess", None)).is_err());
        assert!(access.authorize(&Credential::new("", None)).is_err());
        assert!(access.authorize(&Credential::new("   ", Some("P1"))).is_err());
    }

    #[test]
    fn test_shared_privileged_and_scoped_secret() {
        let access = AccessControl::new(
            RoleTable::new("medicalstaff123").with_scoped("medicalstaff123", "PATIENT001"),
        );

        assert_eq!(
            access
                .authorize(&Credential::new("medicalstaff123", None))
                .unwrap(),
            Role::Privileged
        );
        assert_eq!(
            access
                .authorize(&Credential::new("medicalstaff123", Some("PATIENT001")))
                .unwrap(),
            Role::Scoped("PATIENT001".to_string())
        );
    }

    #[test]
    fn test_credential_debug_redacts_secret() {
        let credential = Credential::new("SECRET_MARKER", Some("P1"));
        assert!(!format!("{:?}", credential).contains("SECRET_MARKER"));
    }
}
