//! Core abstractions for signal-driven pty sessions.
//!
//! This crate provides the fundamental building blocks:
//! - `SignalContext` - Cancellation bridged to OS termination signals
//! - `PeerAddr` / `PubKey` - Remote session addressing
//! - `SessionTransport` trait and single-session dispatch

pub mod addr;
pub mod context;
pub mod session;
pub mod traits;

pub use addr::{DEFAULT_PORT, PeerAddr, PubKey};
pub use context::{CancelHandle, CancelReason, SignalContext, TermSignal};
pub use session::{SessionRequest, run_session};
pub use traits::{SessionExit, SessionTransport, TransportError};
