//! Command resolution for pty sessions.

use std::path::PathBuf;

use ptylink_core::TransportError;

use crate::shell::{get_interactive_shell, resolve_executable_path};

/// Resolved command parts (program + args).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandParts {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl CommandParts {
    /// Resolve `cmd` to an executable path.
    ///
    /// An empty `cmd` selects the interactive shell and drops `args`.
    ///
    /// # Errors
    /// Returns `ExecutableNotFound` if `cmd` cannot be located.
    pub async fn resolve(cmd: &str, args: &[String]) -> Result<Self, TransportError> {
        let cmd = cmd.trim();
        if cmd.is_empty() {
            return Ok(Self {
                program: get_interactive_shell().await,
                args: Vec::new(),
            });
        }
        let program = resolve_executable_path(cmd)
            .await
            .ok_or_else(|| TransportError::ExecutableNotFound(cmd.to_string()))?;
        Ok(Self {
            program,
            args: args.to_vec(),
        })
    }

    /// Build the pty command, running in the current directory.
    #[must_use]
    pub fn to_pty_command(&self) -> portable_pty::CommandBuilder {
        let mut builder = portable_pty::CommandBuilder::new(&self.program);
        builder.args(&self.args);
        if let Ok(cwd) = std::env::current_dir() {
            builder.cwd(cwd);
        }
        builder
    }
}
