//! CLI argument definitions for the gsnip client.

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use gsnip_config::ConfigArgs;
use gsnip_protocol::Opcode;

/// Command-line interface for the gsnip client.
#[derive(Parser, Debug)]
#[command(
    name = "gsnip",
    about = "Query and edit the snippets served by gsnipd",
    version,
    disable_help_subcommand = true
)]
pub(crate) struct Cli {
    #[command(flatten)]
    pub(crate) config: ConfigArgs,
    #[command(subcommand)]
    pub(crate) command: CliCommand,
}

/// Requests the client can send.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub(crate) enum CliCommand {
    /// Prints the body of a snippet.
    #[command(visible_alias = "f")]
    Find {
        /// Snippet name.
        name: String,
    },
    /// Lists every snippet with its description.
    #[command(visible_alias = "ls")]
    List,
    /// Adds one or more `startsnip` blocks read from stdin or a file.
    #[command(visible_alias = "i")]
    Insert {
        /// Read the blocks from this file instead of stdin.
        #[arg(long, value_name = "PATH")]
        file: Option<Utf8PathBuf>,
    },
    /// Removes a snippet. Removing an unknown name succeeds.
    #[command(visible_aliases = ["del", "d"])]
    Delete {
        /// Snippet name.
        name: String,
    },
    /// Asks the daemon to reread its snippet file.
    #[command(visible_alias = "rld")]
    Reload,
}

impl CliCommand {
    pub(crate) const fn operation(&self) -> Opcode {
        match self {
            Self::Find { .. } => Opcode::Find,
            Self::List => Opcode::List,
            Self::Insert { .. } => Opcode::Insert,
            Self::Delete { .. } => Opcode::Delete,
            Self::Reload => Opcode::Reload,
        }
    }

    pub(crate) const fn label(&self) -> &'static str {
        match self {
            Self::Find { .. } => "find",
            Self::List => "list",
            Self::Insert { .. } => "insert",
            Self::Delete { .. } => "delete",
            Self::Reload => "reload",
        }
    }
}
