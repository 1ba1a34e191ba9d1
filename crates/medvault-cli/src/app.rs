//! Application-level utilities for the Medvault CLI.
//!
//! This module provides:
//! - Config and store resolution
//! - Secret handling (environment or interactive prompt)
//! - Session opening with user-facing error hints

use std::io::IsTerminal;
use std::path::Path;

use dialoguer::Password;
use secrecy::{ExposeSecret, SecretString};

use medvault_core::storage::{FileStore, SqliteStore};
use medvault_core::{AccessControl, Credential, KeyValueStore, Session, VaultError};

use crate::cli::Cli;
use crate::config::{read_config, resolve_config_path, MedvaultConfig, StoreBackend};

pub type CliSession = Session<Box<dyn KeyValueStore>>;

pub fn load_config(cli: &Cli) -> anyhow::Result<MedvaultConfig> {
    let path = resolve_config_path(cli.config.as_deref())?;
    read_config(&path)
}

pub fn open_store(config: &MedvaultConfig) -> anyhow::Result<Box<dyn KeyValueStore>> {
    let path = Path::new(&config.store.path);
    tracing::debug!(backend = ?config.store.backend, path = %path.display(), "opening store");
    let store: Box<dyn KeyValueStore> = match config.store.backend {
        StoreBackend::File => Box::new(FileStore::open(path)?),
        StoreBackend::Sqlite => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            Box::new(SqliteStore::open(path)?)
        }
    };
    Ok(store)
}

/// Read the secret from `MEDVAULT_SECRET`, or prompt when attached to a terminal.
pub fn read_secret() -> anyhow::Result<SecretString> {
    if let Ok(value) = std::env::var("MEDVAULT_SECRET") {
        if !value.is_empty() {
            return Ok(SecretString::from(value));
        }
    }

    if !std::io::stdin().is_terminal() {
        return Err(anyhow::anyhow!(
            "No secret available.\nHint: Set MEDVAULT_SECRET or run interactively."
        ));
    }

    let value = Password::new()
        .with_prompt("Secret")
        .interact()
        .map_err(|e| anyhow::anyhow!("Secret prompt failed: {}", e))?;
    Ok(SecretString::from(value))
}

/// Authorise the caller and open a session on the configured store.
pub fn open_session(cli: &Cli) -> anyhow::Result<CliSession> {
    let config = load_config(cli)?;
    let access = AccessControl::new(config.role_table()?);
    let store = open_store(&config)?;
    let secret = read_secret()?;
    let credential = Credential::new(secret.expose_secret(), cli.subject.as_deref());

    access
        .open_session(&credential, store)
        .map_err(|err| match err {
            VaultError::Authorization(_) => {
                anyhow::anyhow!("{}\nHint: Check the secret and --subject.", err)
            }
            VaultError::Authentication => anyhow::anyhow!(
                "{}\nHint: The store was written with a different secret; sign in again.",
                err
            ),
            other => anyhow::Error::new(other),
        })
}
