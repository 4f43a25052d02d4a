//! Platform-specific address handling.

/// Default CLI socket address for this platform.
#[must_use]
pub fn default_cli_addr() -> String {
    if cfg!(windows) {
        normalize_cli_addr(r"%LOCALAPPDATA%\ptylink\cli.sock")
    } else {
        std::env::temp_dir()
            .join("ptylink.sock")
            .to_string_lossy()
            .into_owned()
    }
}

/// Resolve environment tokens in a CLI address.
///
/// On Windows `%VAR%` tokens are expanded from the process environment.
/// Elsewhere the address is returned unchanged.
#[must_use]
pub fn normalize_cli_addr(addr: &str) -> String {
    if cfg!(windows) {
        expand_percent_vars(addr, |name| std::env::var(name).ok())
    } else {
        addr.to_string()
    }
}

/// Expand `%NAME%` tokens using `lookup`.
///
/// Unknown names and unmatched `%` are left as written.
pub fn expand_percent_vars<F>(input: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find('%') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let Some(end) = after.find('%') else {
            out.push_str(&rest[start..]);
            return out;
        };
        let name = &after[..end];
        match Some(name).filter(|n| !n.is_empty()).and_then(&lookup) {
            Some(value) => {
                out.push_str(&value);
                rest = &after[end + 1..];
            }
            None => {
                // The closing % may open the next token.
                out.push('%');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
