//! Config file loading and schema upgrade.
//!
//! A config file that predates the whitelist (or otherwise fails to parse as
//! the current schema) is rebuilt from whatever fields still deserialize and
//! written back with an empty whitelist. No file locking is done: concurrent
//! invocations against the same path race on the rewrite.

use std::{
    fs,
    io::{self, Write},
    path::Path,
};

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use tempfile::NamedTempFile;

use crate::{ConfigError, HostConfig, config::keys, platform::normalize_cli_addr};

/// How a config file was loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Parsed as the current schema; the file was left untouched.
    Loaded,
    /// Rebuilt and written back in the current schema.
    Upgraded,
}

/// A loaded, normalized configuration.
#[derive(Debug, Clone)]
pub struct Reconciled {
    pub config: HostConfig,
    pub outcome: LoadOutcome,
}

/// Load the config at `path`, upgrading it on disk if needed, then apply
/// platform normalization and sync the secret key.
///
/// # Errors
/// Returns `NotFound` if the file does not exist, `Read` if it cannot be
/// read, and `Serialize`/`Write` if an upgrade cannot be written back.
pub fn reconcile(path: &Path) -> Result<Reconciled, ConfigError> {
    let (mut config, outcome) = load_or_upgrade(path)?;
    config.cli_addr = normalize_cli_addr(&config.cli_addr);
    config.sync_secret_key();
    Ok(Reconciled { config, outcome })
}

/// Load the on-disk form of the config without normalization.
pub(crate) fn load_or_upgrade(path: &Path) -> Result<(HostConfig, LoadOutcome), ConfigError> {
    let raw = match fs::read(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    match serde_json::from_slice::<HostConfig>(&raw) {
        Ok(config) => Ok((config, LoadOutcome::Loaded)),
        Err(e) => {
            tracing::info!(
                path = %path.display(),
                "Config does not match the current schema, upgrading: {e}"
            );
            let config = salvage(&raw);
            write_config(path, &config)?;
            Ok((config, LoadOutcome::Upgraded))
        }
    }
}

/// Build a config from defaults plus every field that deserializes on its own.
fn salvage(raw: &[u8]) -> HostConfig {
    let mut config = HostConfig::default();
    let Ok(Value::Object(fields)) = serde_json::from_slice::<Value>(raw) else {
        return config;
    };

    if let Some(v) = field(&fields, keys::DISC) {
        config.disc_addr = v;
    }
    if let Some(v) = field(&fields, keys::SESSIONS) {
        config.min_sessions = v;
    }
    if let Some(v) = field(&fields, keys::PORT) {
        config.port = v;
    }
    if let Some(v) = field(&fields, keys::CLI_NET) {
        config.cli_net = v;
    }
    if let Some(v) = field(&fields, keys::CLI_ADDR) {
        config.cli_addr = v;
    }
    if let Some(v) = field(&fields, keys::SK) {
        config.secret_key_str = v;
    }
    if let Some(v) = field(&fields, keys::WL) {
        config.whitelist = v;
    }
    config
}

fn field<T: DeserializeOwned>(fields: &Map<String, Value>, key: &str) -> Option<T> {
    let value = fields.get(key)?;
    match T::deserialize(value) {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::debug!(key, "Dropping config field: {e}");
            None
        }
    }
}

/// Write `config` to `path` as indented JSON in schema field order.
///
/// The file is replaced atomically with mode 0600 on Unix; a failed write
/// leaves the previous contents in place.
///
/// # Errors
/// Returns `Serialize` or `Write` on failure.
pub fn write_config(path: &Path, config: &HostConfig) -> Result<(), ConfigError> {
    let mut bytes = serde_json::to_vec_pretty(config).map_err(ConfigError::Serialize)?;
    bytes.push(b'\n');

    replace_file(path, |file| file.write_all(&bytes)).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Fill a temp file next to `path`, fsync it, then rename it over `path`.
fn replace_file<F>(path: &Path, fill: F) -> io::Result<()>
where
    F: FnOnce(&mut fs::File) -> io::Result<()>,
{
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    fill(tmp.as_file_mut())?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file().set_permissions(fs::Permissions::from_mode(0o600))?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
