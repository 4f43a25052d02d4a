//! Configuration errors.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file {} not found", .0.display())]
    NotFound(PathBuf),
    #[error("Unable to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Unable to serialize config: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("Unable to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Invalid whitelist key: {0:?}")]
    InvalidKey(String),
    #[error("Invalid secret key: {0}")]
    SecretKey(String),
    #[error("Whitelist error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_names_path() {
        let e = ConfigError::NotFound(PathBuf::from("conf/config.json"));
        assert_eq!(e.to_string(), "Config file conf/config.json not found");
    }

    #[test]
    fn test_write_keeps_source() {
        let e = ConfigError::Write {
            path: PathBuf::from("config.json"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(e.to_string().contains("denied"));
        assert!(std::error::Error::source(&e).is_some());
    }
}
