//! Command-line arguments.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use ptylink_core::{PeerAddr, PubKey, SessionRequest};

/// Run an interactive session on this host or a remote peer.
#[derive(Debug, Parser)]
#[command(name = "ptylink")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Network used to reach the session host (overrides the config file)
    #[arg(long)]
    pub clinet: Option<String>,

    /// Address used to reach the session host (overrides the config file)
    #[arg(long)]
    pub cliaddr: Option<String>,

    /// Path to the JSON config file
    #[arg(long, default_value = "config.json")]
    pub confpath: PathBuf,

    /// Remote peer as `pubkey[:port]`; omit for a local session
    #[arg(long)]
    pub addr: Option<PeerAddr>,

    /// Command to run; empty runs the interactive shell
    #[arg(short, long, default_value = "")]
    pub cmd: String,

    /// Comma-separated command arguments
    #[arg(short, long, value_delimiter = ',', allow_hyphen_values = true)]
    pub args: Vec<String>,

    /// Serve metrics on this address (disabled when empty)
    #[arg(long, default_value = "")]
    pub metrics: String,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the whitelisted public keys
    Whitelist,

    /// Add public keys to the whitelist
    WhitelistAdd {
        #[arg(required = true)]
        keys: Vec<PubKey>,
    },

    /// Remove public keys from the whitelist
    WhitelistRemove {
        #[arg(required = true)]
        keys: Vec<PubKey>,
    },

    /// Print the loaded configuration without the secret key
    Config,
}

impl Cli {
    /// The session described by the flags.
    #[must_use]
    pub fn session_request(&self) -> SessionRequest {
        match self.addr {
            Some(peer) => SessionRequest::remote(peer, self.cmd.clone(), self.args.clone()),
            None => SessionRequest::local(self.cmd.clone(), self.args.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    const PK: &str = "02a1633cafcc01ebfb6d78e39f687a1f0995c62fc95f51ead10a02ee0be551b5dc";

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults_run_local_shell() {
        let cli = Cli::try_parse_from(["ptylink"]).unwrap();
        assert_eq!(cli.confpath, PathBuf::from("config.json"));
        assert!(cli.command.is_none());
        assert!(cli.metrics.is_empty());

        let req = cli.session_request();
        assert!(req.remote_peer().is_none());
        assert!(req.cmd.is_empty());
        assert!(req.args.is_empty());
    }

    #[test]
    fn test_remote_session_flags() {
        let addr = format!("{PK}:2222");
        let cli = Cli::try_parse_from([
            "ptylink",
            "--addr",
            addr.as_str(),
            "-c",
            "ls",
            "-a",
            "-la,/tmp",
        ])
        .unwrap();

        let req = cli.session_request();
        let peer = req.remote_peer().unwrap();
        assert_eq!(peer.port, 2222);
        assert_eq!(peer.pk.to_string(), PK);
        assert_eq!(req.cmd, "ls");
        assert_eq!(req.args, ["-la", "/tmp"]);
    }

    #[test]
    fn test_bad_addr_rejected() {
        assert!(Cli::try_parse_from(["ptylink", "--addr", "nothex:22"]).is_err());
    }

    #[test]
    fn test_whitelist_subcommands() {
        let cli = Cli::try_parse_from(["ptylink", "-v", "whitelist-add", PK]).unwrap();
        assert_eq!(cli.verbose, 1);
        assert!(matches!(cli.command, Some(Command::WhitelistAdd { ref keys }) if keys.len() == 1));

        assert!(Cli::try_parse_from(["ptylink", "whitelist-remove"]).is_err());
        assert!(Cli::try_parse_from(["ptylink", "whitelist-add", "zz"]).is_err());
        assert!(matches!(
            Cli::try_parse_from(["ptylink", "--confpath", "/etc/p.json", "config"])
                .unwrap()
                .command,
            Some(Command::Config)
        ));
    }
}
