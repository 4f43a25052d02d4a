//! Signal-driven cancellation context.
//!
//! A [`SignalContext`] is derived from a parent [`CancellationToken`] and
//! cancels itself exactly once, either when one of the observed termination
//! signals arrives or when the owner calls [`SignalContext::cancel`].

use std::{
    fmt, io,
    sync::{Arc, OnceLock},
};

use futures::future::{self, BoxFuture, FutureExt};
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

/// Termination signals a [`SignalContext`] can observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TermSignal {
    /// `SIGINT` on Unix, Ctrl-C on Windows.
    Interrupt,
    /// `SIGTERM` on Unix, console close on Windows.
    Terminate,
    /// `SIGHUP` (Unix only).
    Hangup,
    /// `SIGQUIT` (Unix only).
    Quit,
}

impl TermSignal {
    /// The platform default set: interrupt and terminate where both exist.
    #[must_use]
    pub const fn defaults() -> &'static [Self] {
        if cfg!(windows) {
            &[Self::Interrupt]
        } else {
            &[Self::Interrupt, Self::Terminate]
        }
    }

    fn waiter(self) -> io::Result<BoxFuture<'static, Self>> {
        listen(self)
    }
}

impl fmt::Display for TermSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Interrupt => "SIGINT",
            Self::Terminate => "SIGTERM",
            Self::Hangup => "SIGHUP",
            Self::Quit => "SIGQUIT",
        };
        f.write_str(name)
    }
}

#[cfg(unix)]
fn listen(sig: TermSignal) -> io::Result<BoxFuture<'static, TermSignal>> {
    use tokio::signal::unix::{SignalKind, signal};

    let kind = match sig {
        TermSignal::Interrupt => SignalKind::interrupt(),
        TermSignal::Terminate => SignalKind::terminate(),
        TermSignal::Hangup => SignalKind::hangup(),
        TermSignal::Quit => SignalKind::quit(),
    };
    let mut stream = signal(kind)?;
    Ok(async move {
        // A closed stream never fires.
        if stream.recv().await.is_none() {
            future::pending::<()>().await;
        }
        sig
    }
    .boxed())
}

#[cfg(windows)]
fn listen(sig: TermSignal) -> io::Result<BoxFuture<'static, TermSignal>> {
    use tokio::signal::windows;

    match sig {
        TermSignal::Interrupt => {
            let mut stream = windows::ctrl_c()?;
            Ok(async move {
                if stream.recv().await.is_none() {
                    future::pending::<()>().await;
                }
                sig
            }
            .boxed())
        }
        TermSignal::Terminate => {
            let mut stream = windows::ctrl_close()?;
            Ok(async move {
                if stream.recv().await.is_none() {
                    future::pending::<()>().await;
                }
                sig
            }
            .boxed())
        }
        other => Err(io::Error::new(
            io::ErrorKind::Unsupported,
            format!("{other} cannot be observed on this platform"),
        )),
    }
}

/// Why a [`SignalContext`] was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// An observed termination signal arrived.
    Signal(TermSignal),
    /// The owner called `cancel`.
    Explicit,
    /// The parent token was cancelled.
    Parent,
}

/// Cloneable handle that cancels a [`SignalContext`].
#[derive(Debug, Clone)]
pub struct CancelHandle {
    token: CancellationToken,
    reason: Arc<OnceLock<CancelReason>>,
}

impl CancelHandle {
    /// Cancel the context. Safe to call any number of times.
    pub fn cancel(&self) {
        let _ = self.reason.set(CancelReason::Explicit);
        self.token.cancel();
    }
}

/// Cancellation context bridged to OS termination signals.
///
/// Dropping the context cancels it, which also stops the listener task.
#[derive(Debug)]
pub struct SignalContext {
    handle: CancelHandle,
    listener: Option<JoinHandle<()>>,
}

impl SignalContext {
    /// Derive a child context of `parent` that observes `signals`.
    ///
    /// An empty `signals` slice means [`TermSignal::defaults`]. Signal
    /// registration happens before this returns; a failure there is
    /// returned as-is and should be treated as fatal by the caller.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    /// Returns an error if a signal handler cannot be registered.
    pub fn derive(parent: &CancellationToken, signals: &[TermSignal]) -> io::Result<Self> {
        let signals = if signals.is_empty() {
            TermSignal::defaults()
        } else {
            signals
        };
        let waiters = signals
            .iter()
            .map(|sig| sig.waiter())
            .collect::<io::Result<Vec<_>>>()?;

        let handle = CancelHandle {
            token: parent.child_token(),
            reason: Arc::new(OnceLock::new()),
        };
        let listener = tokio::spawn(watch(handle.clone(), waiters));

        Ok(Self {
            handle,
            listener: Some(listener),
        })
    }

    /// Cancel the context. Idempotent.
    pub fn cancel(&self) {
        self.handle.cancel();
    }

    /// A handle other tasks can use to cancel this context.
    #[must_use]
    pub fn cancel_handle(&self) -> CancelHandle {
        self.handle.clone()
    }

    /// A clone of the underlying token, for collaborators that `select!` on it.
    #[must_use]
    pub fn token(&self) -> CancellationToken {
        self.handle.token.clone()
    }

    /// Whether the context has been cancelled.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.handle.token.is_cancelled()
    }

    /// Resolves once the context is cancelled.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.handle.token.cancelled()
    }

    /// Why the context was cancelled, if it has been.
    #[must_use]
    pub fn reason(&self) -> Option<CancelReason> {
        self.handle.reason.get().copied()
    }

    /// Wait for the listener task to exit.
    ///
    /// Only returns after the context is done, whoever cancelled it.
    pub async fn join(mut self) {
        if let Some(listener) = self.listener.take() {
            let _ = listener.await;
        }
    }
}

impl Drop for SignalContext {
    fn drop(&mut self) {
        self.handle.cancel();
    }
}

async fn watch(handle: CancelHandle, waiters: Vec<BoxFuture<'static, TermSignal>>) {
    tokio::select! {
        (sig, _, _) = future::select_all(waiters) => {
            if handle.reason.set(CancelReason::Signal(sig)).is_ok() {
                tracing::info!(signal = %sig, "Closing with received signal.");
            }
            handle.token.cancel();
        }
        () = handle.token.cancelled() => {
            let _ = handle.reason.set(CancelReason::Parent);
        }
    }
}
