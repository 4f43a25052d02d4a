//! The session transport seam.

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::addr::PeerAddr;

/// Exit status of a finished session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionExit(pub u32);

impl SessionExit {
    pub const SUCCESS: Self = Self(0);

    #[must_use]
    pub const fn success(self) -> bool {
        self.0 == 0
    }

    /// Exit code suitable for the current process (saturates at 255).
    #[must_use]
    pub fn process_code(self) -> u8 {
        u8::try_from(self.0).unwrap_or(u8::MAX)
    }
}

/// Transport error.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Executable not found: {0}")]
    ExecutableNotFound(String),
    #[error("Spawn failed: {0}")]
    SpawnFailed(String),
    #[error("Unsupported: {0}")]
    Unsupported(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Capability that runs one interactive session to completion.
///
/// Implementations must observe `cancel` and stop the session once it fires.
#[async_trait]
pub trait SessionTransport: Send + Sync {
    /// Run `cmd` with `args` on this host.
    async fn start_local(
        &self,
        cancel: &CancellationToken,
        cmd: &str,
        args: &[String],
    ) -> Result<SessionExit, TransportError>;

    /// Run `cmd` with `args` on the host behind `peer`.
    async fn start_remote(
        &self,
        cancel: &CancellationToken,
        peer: &PeerAddr,
        cmd: &str,
        args: &[String],
    ) -> Result<SessionExit, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_code_saturates() {
        assert_eq!(SessionExit(3).process_code(), 3);
        assert_eq!(SessionExit(300).process_code(), 255);
        assert!(SessionExit::SUCCESS.success());
        assert!(!SessionExit(1).success());
    }
}
