use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use medvault_core::RoleTable;

use crate::cli::Backend;

#[derive(Debug, Serialize, Deserialize)]
pub struct MedvaultConfig {
    pub store: StoreSection,
    pub access: AccessSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StoreSection {
    pub backend: StoreBackend,
    pub path: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    File,
    Sqlite,
}

impl From<Backend> for StoreBackend {
    fn from(backend: Backend) -> Self {
        match backend {
            Backend::File => StoreBackend::File,
            Backend::Sqlite => StoreBackend::Sqlite,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccessSection {
    pub privileged_secret: String,
    #[serde(default)]
    pub scoped: Vec<ScopedSecret>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScopedSecret {
    pub secret: String,
    pub subject_id: String,
}

impl MedvaultConfig {
    pub fn template(backend: StoreBackend, store_path: PathBuf) -> Self {
        Self {
            store: StoreSection {
                backend,
                path: store_path.to_string_lossy().to_string(),
            },
            access: AccessSection {
                privileged_secret: String::new(),
                scoped: Vec::new(),
            },
        }
    }

    /// Build the role table handed to the core.
    pub fn role_table(&self) -> anyhow::Result<RoleTable> {
        if self.access.privileged_secret.trim().is_empty() {
            return Err(anyhow::anyhow!(
                "access.privileged_secret is not set in the config"
            ));
        }
        let mut table = RoleTable::new(self.access.privileged_secret.clone());
        for entry in &self.access.scoped {
            if entry.subject_id.trim().is_empty() || entry.secret.trim().is_empty() {
                return Err(anyhow::anyhow!(
                    "access.scoped entries need both secret and subject_id"
                ));
            }
            table = table.with_scoped(entry.secret.clone(), entry.subject_id.trim());
        }
        Ok(table)
    }
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_config_dir()?.join("config.toml"))
}

pub fn default_store_path(backend: StoreBackend) -> anyhow::Result<PathBuf> {
    let dir = xdg_data_dir()?;
    Ok(match backend {
        StoreBackend::File => dir.join("store"),
        StoreBackend::Sqlite => dir.join("medvault.db"),
    })
}

pub fn resolve_config_path(flag: Option<&str>) -> anyhow::Result<PathBuf> {
    match flag {
        Some(path) if !path.trim().is_empty() => Ok(PathBuf::from(path)),
        _ => default_config_path(),
    }
}

pub fn read_config(path: &Path) -> anyhow::Result<MedvaultConfig> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        anyhow::anyhow!(
            "Failed to read config {}: {}\nHint: Run `medvault init-config` to create one.",
            path.display(),
            e
        )
    })?;
    toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("Failed to parse config {}: {}", path.display(), e))
}

pub fn write_config(path: &Path, config: &MedvaultConfig) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            anyhow::anyhow!(
                "Failed to create config directory {}: {}",
                parent.display(),
                e
            )
        })?;
    }
    let contents =
        toml::to_string_pretty(config).map_err(|e| anyhow::anyhow!("TOML error: {}", e))?;
    std::fs::write(path, contents)
        .map_err(|e| anyhow::anyhow!("Failed to write config {}: {}", path.display(), e))?;
    Ok(())
}

pub fn xdg_config_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_CONFIG_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("medvault"));
        }
    }
    Ok(home_dir()?.join(".config").join("medvault"))
}

pub fn xdg_data_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_DATA_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("medvault"));
        }
    }
    Ok(home_dir()?.join(".local").join("share").join("medvault"))
}

fn home_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .map_err(|_| anyhow::anyhow!("HOME is not set; cannot resolve default paths"))?;
    Ok(PathBuf::from(home))
}
