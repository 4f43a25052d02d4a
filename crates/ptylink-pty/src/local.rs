//! Local pseudo-terminal transport.

use std::{
    io::{self, IsTerminal, Read, Write},
    thread,
};

use async_trait::async_trait;
use portable_pty::{PtySize, native_pty_system};
use ptylink_core::{PeerAddr, SessionExit, SessionTransport, TransportError};
use tokio_util::sync::CancellationToken;

use crate::command::CommandParts;

const FALLBACK_SIZE: PtySize = PtySize {
    rows: 24,
    cols: 80,
    pixel_width: 0,
    pixel_height: 0,
};

/// Runs sessions in a pty on this host.
///
/// Remote sessions need an external dialer and are reported as unsupported,
/// naming the host endpoint they would have gone through.
#[derive(Debug, Clone)]
pub struct PtyTransport {
    size: Option<PtySize>,
    attach_stdio: bool,
    endpoint: Option<(String, String)>,
}

impl Default for PtyTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl PtyTransport {
    /// Transport wired to the process's stdin/stdout, sized to the terminal.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            size: None,
            attach_stdio: true,
            endpoint: None,
        }
    }

    /// Transport that discards session output and sends no input.
    #[must_use]
    pub const fn detached(size: PtySize) -> Self {
        Self {
            size: Some(size),
            attach_stdio: false,
            endpoint: None,
        }
    }

    /// Set the host endpoint (`net`, `addr`) remote sessions are dialed through.
    #[must_use]
    pub fn with_endpoint(mut self, net: impl Into<String>, addr: impl Into<String>) -> Self {
        self.endpoint = Some((net.into(), addr.into()));
        self
    }

    #[must_use]
    pub fn endpoint(&self) -> Option<(&str, &str)> {
        self.endpoint
            .as_ref()
            .map(|(net, addr)| (net.as_str(), addr.as_str()))
    }

    fn pty_size(&self) -> PtySize {
        self.size.unwrap_or_else(|| match crossterm::terminal::size() {
            Ok((cols, rows)) if cols > 0 && rows > 0 => PtySize {
                rows,
                cols,
                ..FALLBACK_SIZE
            },
            _ => FALLBACK_SIZE,
        })
    }
}

fn spawn_failed(err: impl std::fmt::Display) -> TransportError {
    TransportError::SpawnFailed(err.to_string())
}

/// Restores cooked mode on drop.
struct RawMode {
    enabled: bool,
}

impl RawMode {
    fn enable_if_terminal(attach: bool) -> Self {
        let enabled = attach
            && io::stdin().is_terminal()
            && crossterm::terminal::enable_raw_mode()
                .inspect_err(|e| tracing::warn!("Failed to enable raw mode: {e}"))
                .is_ok();
        Self { enabled }
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        if self.enabled {
            let _ = crossterm::terminal::disable_raw_mode();
        }
    }
}

fn pump<R, W>(name: &'static str, mut from: R, mut to: W)
where
    R: Read + Send + 'static,
    W: Write + Send + 'static,
{
    let spawned = thread::Builder::new()
        .name(format!("pty-{name}"))
        .spawn(move || {
            let mut buf = [0u8; 4096];
            loop {
                match from.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        if to.write_all(&buf[..n]).and_then(|()| to.flush()).is_err() {
                            break;
                        }
                    }
                }
            }
        });
    if let Err(e) = spawned {
        tracing::error!("Failed to spawn pty {name} thread: {e}");
    }
}

#[async_trait]
impl SessionTransport for PtyTransport {
    async fn start_local(
        &self,
        cancel: &CancellationToken,
        cmd: &str,
        args: &[String],
    ) -> Result<SessionExit, TransportError> {
        let parts = CommandParts::resolve(cmd, args).await?;
        let size = self.pty_size();
        tracing::info!(
            program = %parts.program.display(),
            cols = size.cols,
            rows = size.rows,
            "Starting local pty session"
        );

        let pair = native_pty_system().openpty(size).map_err(spawn_failed)?;
        let mut child = pair
            .slave
            .spawn_command(parts.to_pty_command())
            .map_err(spawn_failed)?;
        // Only the child holds the slave end, so reads hit EOF when it exits.
        drop(pair.slave);

        let mut killer = child.clone_killer();
        let reader = pair.master.try_clone_reader().map_err(spawn_failed)?;
        let writer = pair.master.take_writer().map_err(spawn_failed)?;

        let _raw = RawMode::enable_if_terminal(self.attach_stdio);
        if self.attach_stdio {
            pump("output", reader, io::stdout());
            pump("input", io::stdin(), writer);
        } else {
            pump("output", reader, io::sink());
            drop(writer);
        }

        let mut wait = tokio::task::spawn_blocking(move || child.wait());
        let joined = tokio::select! {
            res = &mut wait => res,
            () = cancel.cancelled() => {
                tracing::debug!("Session cancelled, killing child");
                if let Err(e) = killer.kill() {
                    tracing::warn!("Failed to kill session child: {e}");
                }
                wait.await
            }
        };
        let status = joined.map_err(|e| TransportError::Io(io::Error::other(e)))??;

        tracing::debug!(code = status.exit_code(), "Local pty session exited");
        Ok(SessionExit(status.exit_code()))
    }

    async fn start_remote(
        &self,
        _cancel: &CancellationToken,
        peer: &PeerAddr,
        _cmd: &str,
        _args: &[String],
    ) -> Result<SessionExit, TransportError> {
        let reason = match self.endpoint() {
            Some((net, addr)) => {
                tracing::debug!(%peer, net, addr, "Remote session requested");
                format!("no remote dialer configured for {peer} via {net}:{addr}")
            }
            None => format!("no remote dialer configured for {peer}"),
        };
        Err(TransportError::Unsupported(reason))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    const PK: &str = "02a1633cafcc01ebfb6d78e39f687a1f0995c62fc95f51ead10a02ee0be551b5dc";

    fn detached() -> PtyTransport {
        PtyTransport::detached(FALLBACK_SIZE)
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exit_code_is_returned() {
        let exit = detached()
            .start_local(
                &CancellationToken::new(),
                "sh",
                &["-c".into(), "exit 3".into()],
            )
            .await
            .unwrap();
        assert_eq!(exit, SessionExit(3));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cancel_kills_session() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            trigger.cancel();
        });

        let exit = tokio::time::timeout(
            Duration::from_secs(10),
            detached().start_local(&cancel, "sleep", &["30".into()]),
        )
        .await
        .expect("cancelled session should stop")
        .unwrap();
        assert!(!exit.success());
    }

    #[tokio::test]
    async fn test_missing_command() {
        let err = tokio_test::assert_err!(
            detached()
                .start_local(&CancellationToken::new(), "no-such-command-91c2", &[])
                .await
        );
        assert!(matches!(err, TransportError::ExecutableNotFound(_)));
    }

    #[tokio::test]
    async fn test_remote_is_unsupported() {
        let peer: PeerAddr = PK.parse().unwrap();
        let err = detached()
            .start_remote(&CancellationToken::new(), &peer, "sh", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Unsupported(msg) if msg.contains(PK)));
    }

    #[tokio::test]
    async fn test_remote_error_names_endpoint() {
        let transport = detached().with_endpoint("unix", "/tmp/ptylink.sock");
        assert_eq!(transport.endpoint(), Some(("unix", "/tmp/ptylink.sock")));

        let peer: PeerAddr = format!("{PK}:23").parse().unwrap();
        let err = transport
            .start_remote(&CancellationToken::new(), &peer, "", &[])
            .await
            .unwrap_err();
        let TransportError::Unsupported(msg) = err else {
            panic!("unexpected error: {err:?}");
        };
        assert!(msg.contains(PK), "{msg}");
        assert!(msg.ends_with("via unix:/tmp/ptylink.sock"), "{msg}");
    }
}
