//! Whitelist and config subcommands.

use std::path::Path;

use anyhow::{Context, Result};
use ptylink_config::{FileWhitelist, WhitelistStore, reconcile};
use ptylink_core::PubKey;

fn open(path: &Path) -> Result<FileWhitelist> {
    FileWhitelist::open(path).with_context(|| format!("Failed to load {}", path.display()))
}

fn key_strings(keys: &[PubKey]) -> Vec<String> {
    keys.iter().map(ToString::to_string).collect()
}

/// Whitelisted keys as a JSON array.
pub fn list(path: &Path) -> Result<String> {
    let keys = open(path)?.list()?;
    Ok(serde_json::to_string_pretty(&keys)?)
}

pub fn add(path: &Path, keys: &[PubKey]) -> Result<usize> {
    let added = open(path)?.add(&key_strings(keys))?;
    tracing::info!(added, "Whitelist keys added");
    Ok(added)
}

pub fn remove(path: &Path, keys: &[PubKey]) -> Result<usize> {
    let removed = open(path)?.remove(&key_strings(keys))?;
    tracing::info!(removed, "Whitelist keys removed");
    Ok(removed)
}

/// The reconciled config as JSON, without the secret key.
pub fn show_config(path: &Path) -> Result<String> {
    let loaded = reconcile(path).with_context(|| format!("Failed to load {}", path.display()))?;
    Ok(serde_json::to_string_pretty(&loaded.config.public_view())?)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    const PK_A: &str = "02a1633cafcc01ebfb6d78e39f687a1f0995c62fc95f51ead10a02ee0be551b5dc";
    const PK_B: &str = "03b21dba6e5e6fa0e9f2b4a35eb3ecb3e84a1c3d5d9e4e1a6b2a1c0f9e8d7c6b5a";

    fn config(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"dmsgdisc":"http://disc","dmsgport":22,"sk":"secret"}"#).unwrap();
        path
    }

    fn pk(s: &str) -> PubKey {
        s.parse().unwrap()
    }

    #[test]
    fn test_add_list_remove() {
        let dir = TempDir::new().unwrap();
        let path = config(&dir);

        assert_eq!(list(&path).unwrap(), "[]");
        assert_eq!(add(&path, &[pk(PK_B), pk(PK_A)]).unwrap(), 2);
        assert_eq!(add(&path, &[pk(PK_A)]).unwrap(), 0);

        let keys: Vec<String> = serde_json::from_str(&list(&path).unwrap()).unwrap();
        assert_eq!(keys, [PK_A, PK_B]);

        assert_eq!(remove(&path, &[pk(PK_A)]).unwrap(), 1);
        assert_eq!(remove(&path, &[pk(PK_A)]).unwrap(), 0);
    }

    #[test]
    fn test_show_config_hides_secret() {
        let dir = TempDir::new().unwrap();
        let path = config(&dir);

        let shown: serde_json::Value = serde_json::from_str(&show_config(&path).unwrap()).unwrap();
        assert_eq!(shown["dmsgdisc"], "http://disc");
        assert_eq!(shown["wl"], serde_json::json!([]));
        assert!(shown.get("sk").is_none());
        assert!(fs::read_to_string(&path).unwrap().contains("\"sk\": \"secret\""));
    }

    #[test]
    fn test_missing_config_has_context() {
        let dir = TempDir::new().unwrap();
        let err = list(&dir.path().join("nope.json")).unwrap_err();
        assert!(format!("{err:#}").contains("not found"));
    }
}
