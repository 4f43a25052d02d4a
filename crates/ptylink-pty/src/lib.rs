//! Local pseudo-terminal sessions.
//!
//! Provides:
//! - `PtyTransport` - `SessionTransport` that runs commands in a local pty
//! - Shell detection and executable resolution

pub mod command;
pub mod local;
pub mod shell;

pub use command::CommandParts;
pub use local::PtyTransport;
pub use shell::{get_interactive_shell, resolve_executable_path};
