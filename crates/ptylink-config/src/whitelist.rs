//! Whitelist storage.

use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
    sync::RwLock,
};

use crate::{
    ConfigError, HostConfig,
    reconcile::{Reconciled, load_or_upgrade, reconcile, write_config},
};

/// A set of public keys allowed to open sessions.
pub trait WhitelistStore: Send + Sync {
    /// All keys, sorted.
    ///
    /// # Errors
    /// Returns `Internal` if the store is unusable.
    fn list(&self) -> Result<Vec<String>, ConfigError>;

    /// # Errors
    /// Returns `Internal` if the store is unusable.
    fn contains(&self, key: &str) -> Result<bool, ConfigError>;

    /// Add keys, returning how many were new.
    ///
    /// # Errors
    /// Returns `InvalidKey` for an empty key, in which case nothing is added.
    fn add(&self, keys: &[String]) -> Result<usize, ConfigError>;

    /// Remove keys, returning how many were present.
    ///
    /// # Errors
    /// Returns `InvalidKey` for an empty key, in which case nothing is removed.
    fn remove(&self, keys: &[String]) -> Result<usize, ConfigError>;
}

fn normalize_keys(keys: &[String]) -> Result<Vec<&str>, ConfigError> {
    keys.iter()
        .map(|k| {
            let k = k.trim();
            if k.is_empty() {
                Err(ConfigError::InvalidKey(k.to_string()))
            } else {
                Ok(k)
            }
        })
        .collect()
}

fn insert_all(set: &mut BTreeSet<String>, keys: &[&str]) -> usize {
    keys.iter().filter(|k| set.insert((**k).to_string())).count()
}

fn remove_all(set: &mut BTreeSet<String>, keys: &[&str]) -> usize {
    keys.iter().filter(|k| set.remove(**k)).count()
}

/// Process-local whitelist.
#[derive(Debug, Default)]
pub struct MemoryWhitelist {
    keys: RwLock<BTreeSet<String>>,
}

impl MemoryWhitelist {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl From<BTreeSet<String>> for MemoryWhitelist {
    fn from(keys: BTreeSet<String>) -> Self {
        Self {
            keys: RwLock::new(keys),
        }
    }
}

impl WhitelistStore for MemoryWhitelist {
    fn list(&self) -> Result<Vec<String>, ConfigError> {
        Ok(self
            .keys
            .read()
            .map_err(|e| ConfigError::Internal(e.to_string()))?
            .iter()
            .cloned()
            .collect())
    }

    fn contains(&self, key: &str) -> Result<bool, ConfigError> {
        Ok(self
            .keys
            .read()
            .map_err(|e| ConfigError::Internal(e.to_string()))?
            .contains(key.trim()))
    }

    fn add(&self, keys: &[String]) -> Result<usize, ConfigError> {
        let keys = normalize_keys(keys)?;
        let mut set = self
            .keys
            .write()
            .map_err(|e| ConfigError::Internal(e.to_string()))?;
        Ok(insert_all(&mut set, &keys))
    }

    fn remove(&self, keys: &[String]) -> Result<usize, ConfigError> {
        let keys = normalize_keys(keys)?;
        let mut set = self
            .keys
            .write()
            .map_err(|e| ConfigError::Internal(e.to_string()))?;
        Ok(remove_all(&mut set, &keys))
    }
}

/// Whitelist persisted in the config file.
///
/// Mutations re-read the file, change only `wl`, and write the whole config
/// back, so other fields keep their on-disk form.
#[derive(Debug)]
pub struct FileWhitelist {
    path: PathBuf,
    config: RwLock<HostConfig>,
}

impl FileWhitelist {
    /// Open the config at `path`, upgrading it if needed.
    ///
    /// # Errors
    /// Same as [`reconcile`].
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let Reconciled { config, .. } = reconcile(&path)?;
        Ok(Self {
            path,
            config: RwLock::new(config),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot of the reconciled config.
    ///
    /// # Errors
    /// Returns `Internal` if the lock is poisoned.
    pub fn config(&self) -> Result<HostConfig, ConfigError> {
        Ok(self
            .config
            .read()
            .map_err(|e| ConfigError::Internal(e.to_string()))?
            .clone())
    }

    fn update<F>(&self, keys: &[String], op: F) -> Result<usize, ConfigError>
    where
        F: Fn(&mut BTreeSet<String>, &[&str]) -> usize,
    {
        let keys = normalize_keys(keys)?;
        let mut config = self
            .config
            .write()
            .map_err(|e| ConfigError::Internal(e.to_string()))?;

        let (mut on_disk, _) = load_or_upgrade(&self.path)?;
        let changed = op(&mut on_disk.whitelist, &keys);
        if changed > 0 {
            write_config(&self.path, &on_disk)?;
            tracing::debug!(path = %self.path.display(), changed, "Whitelist updated");
        }
        config.whitelist = on_disk.whitelist;
        Ok(changed)
    }
}

impl WhitelistStore for FileWhitelist {
    fn list(&self) -> Result<Vec<String>, ConfigError> {
        Ok(self
            .config
            .read()
            .map_err(|e| ConfigError::Internal(e.to_string()))?
            .whitelist
            .iter()
            .cloned()
            .collect())
    }

    fn contains(&self, key: &str) -> Result<bool, ConfigError> {
        Ok(self
            .config
            .read()
            .map_err(|e| ConfigError::Internal(e.to_string()))?
            .is_whitelisted(key))
    }

    fn add(&self, keys: &[String]) -> Result<usize, ConfigError> {
        self.update(keys, insert_all)
    }

    fn remove(&self, keys: &[String]) -> Result<usize, ConfigError> {
        self.update(keys, remove_all)
    }
}
