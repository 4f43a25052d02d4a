//! Peer addressing: public keys and `pubkey:port` pairs.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Port remote sessions are served on unless the peer address says otherwise.
pub const DEFAULT_PORT: u16 = 22;

/// Length in bytes of a compressed public key.
pub const PUBKEY_LEN: usize = 33;

/// Address parse error.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddrError {
    #[error("public key is empty")]
    EmptyKey,
    #[error("public key must be {expected} hex characters, got {0}", expected = PUBKEY_LEN * 2)]
    KeyLength(usize),
    #[error("public key is not valid hex: {0}")]
    KeyHex(String),
    #[error("invalid port: {0}")]
    Port(String),
}

/// A compressed public key identifying a peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PubKey([u8; PUBKEY_LEN]);

impl PubKey {
    /// The all-zero key, meaning "no peer".
    pub const NULL: Self = Self([0; PUBKEY_LEN]);

    /// Whether this is the null key.
    #[must_use]
    pub fn is_null(&self) -> bool {
        *self == Self::NULL
    }
}

impl fmt::Display for PubKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl FromStr for PubKey {
    type Err = AddrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AddrError::EmptyKey);
        }
        if s.len() != PUBKEY_LEN * 2 {
            return Err(AddrError::KeyLength(s.len()));
        }
        let mut bytes = [0u8; PUBKEY_LEN];
        hex::decode_to_slice(s, &mut bytes).map_err(|e| AddrError::KeyHex(e.to_string()))?;
        Ok(Self(bytes))
    }
}

impl Serialize for PubKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PubKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Remote session target in `pubkey:port` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeerAddr {
    pub pk: PubKey,
    pub port: u16,
}

impl PeerAddr {
    #[must_use]
    pub const fn new(pk: PubKey, port: u16) -> Self {
        Self { pk, port }
    }
}

impl fmt::Display for PeerAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.pk, self.port)
    }
}

impl FromStr for PeerAddr {
    type Err = AddrError;

    /// Parses `pubkey` or `pubkey:port`. A missing or zero port becomes
    /// [`DEFAULT_PORT`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (pk, port) = match s.trim().split_once(':') {
            Some((pk, port)) => {
                let port = port
                    .parse::<u16>()
                    .map_err(|_| AddrError::Port(port.to_string()))?;
                (pk, port)
            }
            None => (s, 0),
        };
        let port = if port == 0 { DEFAULT_PORT } else { port };
        Ok(Self::new(pk.parse()?, port))
    }
}
