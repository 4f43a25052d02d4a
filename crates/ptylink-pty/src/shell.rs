//! Cross-platform shell and executable resolution.

use std::path::{Path, PathBuf};

/// Returns the path to an interactive shell for the current platform.
///
/// On Windows, prefers PowerShell if available, falling back to cmd.exe.
/// On Unix, returns the user's configured shell from `$SHELL`.
pub async fn get_interactive_shell() -> PathBuf {
    if cfg!(windows) {
        if let Some(powershell) = resolve_executable_path("powershell.exe").await {
            powershell
        } else {
            PathBuf::from("cmd.exe")
        }
    } else {
        login_shell(std::env::var_os("SHELL").as_deref().map(Path::new))
    }
}

/// Resolve an executable by name.
///
/// Absolute paths are accepted as-is when they point at a file; anything
/// else goes through a `PATH` lookup.
pub async fn resolve_executable_path(executable: &str) -> Option<PathBuf> {
    if executable.trim().is_empty() {
        return None;
    }

    let path = Path::new(executable);
    if path.is_absolute() {
        return path.is_file().then(|| path.to_path_buf());
    }

    let executable = executable.to_string();
    tokio::task::spawn_blocking(move || which::which(executable))
        .await
        .ok()
        .and_then(Result::ok)
}

/// `shell` when it is an absolute path to an existing file, else `/bin/sh`.
fn login_shell(shell: Option<&Path>) -> PathBuf {
    shell
        .filter(|path| path.is_absolute() && path.is_file())
        .map_or_else(|| PathBuf::from("/bin/sh"), Path::to_path_buf)
}
