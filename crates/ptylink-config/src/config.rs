//! Host configuration model.

use std::{collections::BTreeSet, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{ConfigError, platform};

/// Length in bytes of a secret key.
pub const SECRET_KEY_LEN: usize = 32;

/// JSON field names, in the order they are written.
pub(crate) mod keys {
    pub const DISC: &str = "dmsgdisc";
    pub const SESSIONS: &str = "dmsgsessions";
    pub const PORT: &str = "dmsgport";
    pub const CLI_NET: &str = "clinet";
    pub const CLI_ADDR: &str = "cliaddr";
    pub const SK: &str = "sk";
    pub const WL: &str = "wl";

    #[cfg(test)]
    pub const ORDER: [&str; 7] = [DISC, SESSIONS, PORT, CLI_NET, CLI_ADDR, SK, WL];
}

/// Host secret key. Never serialized directly.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SecretKey([u8; SECRET_KEY_LEN]);

impl SecretKey {
    #[must_use]
    pub const fn from_bytes(bytes: [u8; SECRET_KEY_LEN]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(..)")
    }
}

impl FromStr for SecretKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; SECRET_KEY_LEN];
        hex::decode_to_slice(s.trim(), &mut bytes)
            .map_err(|e| ConfigError::SecretKey(e.to_string()))?;
        Ok(Self(bytes))
    }
}

/// Persisted host configuration.
///
/// Every field except the whitelist may be absent on disk. A file without
/// `wl` predates the whitelist and is upgraded by [`crate::reconcile()`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostConfig {
    /// Discovery server address.
    #[serde(rename = "dmsgdisc", default)]
    pub disc_addr: String,
    /// Minimum number of transport sessions to keep.
    #[serde(rename = "dmsgsessions", default)]
    pub min_sessions: i64,
    /// Port remote sessions are served on.
    #[serde(rename = "dmsgport", default)]
    pub port: u16,
    /// Network the CLI dials the host on (e.g. `unix`).
    #[serde(rename = "clinet", default)]
    pub cli_net: String,
    /// Address the CLI dials the host on.
    #[serde(rename = "cliaddr", default)]
    pub cli_addr: String,
    /// In-memory form of `secret_key_str`; see [`Self::sync_secret_key`].
    #[serde(skip)]
    pub secret_key: Option<SecretKey>,
    #[serde(rename = "sk", default)]
    pub secret_key_str: String,
    /// Public keys allowed to open remote sessions.
    #[serde(rename = "wl")]
    pub whitelist: BTreeSet<String>,
}

impl HostConfig {
    /// Re-derive the in-memory secret key from its string form.
    ///
    /// An unparsable string leaves the key empty and is logged.
    pub fn sync_secret_key(&mut self) {
        self.secret_key = if self.secret_key_str.trim().is_empty() {
            None
        } else {
            match self.secret_key_str.parse() {
                Ok(sk) => Some(sk),
                Err(e) => {
                    tracing::warn!("Ignoring secret key from config: {e}");
                    None
                }
            }
        };
    }

    /// Set the secret key, keeping the string form consistent.
    pub fn set_secret_key(&mut self, sk: SecretKey) {
        self.secret_key_str = sk.to_hex();
        self.secret_key = Some(sk);
    }

    #[must_use]
    pub fn is_whitelisted(&self, pk: &str) -> bool {
        self.whitelist.contains(pk.trim())
    }

    /// Serializable view without the secret key.
    #[must_use]
    pub fn public_view(&self) -> PublicView<'_> {
        PublicView {
            disc_addr: &self.disc_addr,
            min_sessions: self.min_sessions,
            port: self.port,
            cli_net: &self.cli_net,
            cli_addr: &self.cli_addr,
            whitelist: &self.whitelist,
        }
    }

    /// Resolve the CLI endpoint: explicit flag, then non-empty file value,
    /// then the compiled-in default.
    #[must_use]
    pub fn cli_endpoint(&self, net_flag: Option<&str>, addr_flag: Option<&str>) -> CliEndpoint {
        let defaults = CliEndpoint::default();
        let pick = |flag: Option<&str>, file: &str, default: String| {
            flag.map(str::to_string)
                .or_else(|| (!file.is_empty()).then(|| file.to_string()))
                .unwrap_or(default)
        };
        CliEndpoint {
            net: pick(net_flag, &self.cli_net, defaults.net),
            addr: pick(addr_flag, &self.cli_addr, defaults.addr),
        }
    }
}

/// [`HostConfig`] without the secret key, for display.
#[derive(Debug, Serialize)]
pub struct PublicView<'a> {
    #[serde(rename = "dmsgdisc")]
    pub disc_addr: &'a str,
    #[serde(rename = "dmsgsessions")]
    pub min_sessions: i64,
    #[serde(rename = "dmsgport")]
    pub port: u16,
    #[serde(rename = "clinet")]
    pub cli_net: &'a str,
    #[serde(rename = "cliaddr")]
    pub cli_addr: &'a str,
    #[serde(rename = "wl")]
    pub whitelist: &'a BTreeSet<String>,
}

/// Where the CLI reaches the session host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliEndpoint {
    pub net: String,
    pub addr: String,
}

impl Default for CliEndpoint {
    fn default() -> Self {
        Self {
            net: "unix".to_string(),
            addr: platform::default_cli_addr(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SK: &str = "4b6c2f1e0d9a8877665544332211ffeeddccbbaa99887766554433221100aabb";

    #[test]
    fn test_secret_key_sync() {
        let mut conf = HostConfig {
            secret_key_str: SK.to_string(),
            ..HostConfig::default()
        };
        conf.sync_secret_key();
        assert_eq!(conf.secret_key.unwrap().to_hex(), SK);

        conf.secret_key_str = "abc".to_string();
        conf.sync_secret_key();
        assert_eq!(conf.secret_key, None);
        assert_eq!(conf.secret_key_str, "abc");
    }

    #[test]
    fn test_set_secret_key_updates_string() {
        let mut conf = HostConfig::default();
        conf.set_secret_key(SecretKey::from_bytes([7; SECRET_KEY_LEN]));
        assert_eq!(conf.secret_key_str, "07".repeat(SECRET_KEY_LEN));
        assert!(format!("{conf:?}").contains("SecretKey(..)"));
    }

    #[test]
    fn test_secret_key_never_serialized_raw() {
        let mut conf = HostConfig::default();
        conf.set_secret_key(SecretKey::from_bytes([1; SECRET_KEY_LEN]));

        let file = serde_json::to_value(&conf).unwrap();
        assert_eq!(file[keys::SK], "01".repeat(SECRET_KEY_LEN));
        assert_eq!(file.as_object().unwrap().len(), keys::ORDER.len());

        let public = serde_json::to_value(conf.public_view()).unwrap();
        assert!(public.get(keys::SK).is_none());
        assert_eq!(public[keys::WL], serde_json::json!([]));
    }

    #[test]
    fn test_large_session_count_parses() {
        let conf: HostConfig =
            serde_json::from_str(r#"{"dmsgsessions": 4294967296, "wl": []}"#).unwrap();
        assert_eq!(conf.min_sessions, 4_294_967_296);
        assert_eq!(conf.public_view().min_sessions, 4_294_967_296);
    }

    #[test]
    fn test_whitelist_required() {
        let err = serde_json::from_str::<HostConfig>(r#"{"dmsgport": 22}"#).unwrap_err();
        assert!(err.to_string().contains("wl"));

        let conf: HostConfig = serde_json::from_str(r#"{"wl": ["a", "b", "a"]}"#).unwrap();
        assert_eq!(conf.whitelist.len(), 2);
        assert!(conf.is_whitelisted(" a "));
    }

    #[test]
    fn test_cli_endpoint_precedence() {
        let mut conf = HostConfig::default();
        let defaults = CliEndpoint::default();
        assert_eq!(conf.cli_endpoint(None, None), defaults);

        conf.cli_net = "tcp".to_string();
        conf.cli_addr = "127.0.0.1:9000".to_string();
        let ep = conf.cli_endpoint(None, None);
        assert_eq!(ep.net, "tcp");
        assert_eq!(ep.addr, "127.0.0.1:9000");

        let ep = conf.cli_endpoint(Some("unix"), Some("/run/host.sock"));
        assert_eq!(ep.net, "unix");
        assert_eq!(ep.addr, "/run/host.sock");
    }
}
