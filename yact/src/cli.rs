//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Provider;

/// yact - prompt a code model and materialize the files it returns
#[derive(Parser, Debug)]
#[command(name = "y", author, version, about = "Prompt a code model and write the files it returns", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Write generated files as `<path>.new` instead of overwriting
    #[arg(short, long, global = true)]
    pub safe: bool,

    /// Model provider, overriding `default-provider`
    #[arg(short, long, global = true, value_enum)]
    pub provider: Option<Provider>,

    /// Subcommand to execute; with none, a piped prompt runs `act`
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Add files to the context
    Read {
        /// File paths or glob patterns
        #[arg(required = true)]
        patterns: Vec<String>,
    },

    /// Show or edit the context
    Context {
        #[command(subcommand)]
        command: Option<ContextCommand>,
    },

    /// Turn the pending plan into a command
    Accept,

    /// Accept the pending plan and act on it
    Go,

    /// Start a new, empty context
    New,

    /// Reload files and drop everything else from the context
    Reset,

    /// Print the last message, or replace it with the contents of FILE
    Last {
        /// File whose contents replace the last message
        file: Option<PathBuf>,
    },

    /// Generate or change source files
    Act {
        /// Prompt words; read from stdin when omitted
        prompt: Vec<String>,
    },

    /// Generate a shell script
    Bash {
        /// Prompt words; read from stdin when omitted
        prompt: Vec<String>,
    },

    /// Ask a question about the code in context
    Ask {
        /// Prompt words; read from stdin when omitted
        prompt: Vec<String>,
    },

    /// Plan a change for a later `accept`
    Plan {
        /// Prompt words; read from stdin when omitted
        prompt: Vec<String>,
    },

    /// Show or change configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommand>,
    },
}

/// `context` subcommands; none lists the context
#[derive(Debug, Subcommand)]
pub enum ContextCommand {
    /// List messages with their index
    List,

    /// Remove the last COUNT messages
    Pop {
        #[arg(default_value = "1")]
        count: usize,
    },

    /// Keep messages up to and including INDEX
    Popto { index: usize },

    /// Delete the message at INDEX
    Del { index: usize },

    /// Re-read files and expand generated code into file messages
    Reload,
}

/// `config` subcommands; none shows the configuration
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show,

    /// Set KEY to VALUE in the config file, e.g. `providers.ollama.model`
    Set { key: String, value: String },
}

/// Log file location: `<data_local_dir>/yact/logs/yact.log`
pub fn get_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("yact")
        .join("logs")
        .join("yact.log")
}
