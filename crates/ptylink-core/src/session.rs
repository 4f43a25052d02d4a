//! Single-session dispatch.

use crate::{
    addr::PeerAddr,
    context::SignalContext,
    traits::{SessionExit, SessionTransport, TransportError},
};

/// What to run and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRequest {
    /// Remote target; `None` (or a null key) runs locally.
    pub peer: Option<PeerAddr>,
    /// Command name. Empty lets the transport pick the user's shell.
    pub cmd: String,
    pub args: Vec<String>,
}

impl SessionRequest {
    #[must_use]
    pub fn local(cmd: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            peer: None,
            cmd: cmd.into(),
            args,
        }
    }

    #[must_use]
    pub fn remote(peer: PeerAddr, cmd: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            peer: Some(peer),
            cmd: cmd.into(),
            args,
        }
    }

    /// The remote peer, if this request targets one.
    #[must_use]
    pub fn remote_peer(&self) -> Option<&PeerAddr> {
        self.peer.as_ref().filter(|p| !p.pk.is_null())
    }
}

/// Run exactly one session for `request` through `transport`.
///
/// # Errors
/// Propagates the transport's error.
pub async fn run_session<T>(
    transport: &T,
    ctx: &SignalContext,
    request: &SessionRequest,
) -> Result<SessionExit, TransportError>
where
    T: SessionTransport + ?Sized,
{
    let cancel = ctx.token();
    let exit = if let Some(peer) = request.remote_peer() {
        tracing::debug!(%peer, cmd = %request.cmd, "Starting remote session");
        transport
            .start_remote(&cancel, peer, &request.cmd, &request.args)
            .await?
    } else {
        tracing::debug!(cmd = %request.cmd, "Starting local session");
        transport
            .start_local(&cancel, &request.cmd, &request.args)
            .await?
    };
    tracing::debug!(code = exit.0, "Session finished");
    Ok(exit)
}
