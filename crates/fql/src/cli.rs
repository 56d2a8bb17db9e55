//! CLI argument parsing using clap derive macros.
//!
//! This module defines the command-line interface for the fql CLI.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// fql - Compile filter expressions to parameterized SQL
#[derive(Parser, Debug)]
#[command(name = "fql")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbose output (show debug information)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colors in output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Config file path (default: ~/.config/fql/config.toml)
    #[arg(long, global = true, env = "FQL_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile a filter expression to SQL
    #[command(alias = "c")]
    Compile {
        /// Filter expression (e.g., "title ~ 'rust' && votes > 10")
        filter: String,

        /// Allowed field name (repeatable, added to config fields)
        #[arg(short, long, action = clap::ArgAction::Append)]
        field: Vec<String>,

        /// Allowed field regex, matched against the whole name (repeatable)
        #[arg(short, long, action = clap::ArgAction::Append)]
        pattern: Vec<String>,

        /// Placeholder value as KEY=JSON (repeatable; non-JSON is taken as text)
        #[arg(long, action = clap::ArgAction::Append)]
        param: Vec<String>,

        /// Timestamp placeholder value as KEY=RFC3339 (repeatable)
        #[arg(long, action = clap::ArgAction::Append)]
        param_time: Vec<String>,

        /// Evaluate macros at this RFC 3339 instant instead of the current time
        #[arg(long)]
        now: Option<String>,

        /// Prefix for generated parameter names: ASCII letters, digits or `_` (default: p)
        #[arg(long)]
        prefix: Option<String>,

        /// Print SQL with parameter values substituted (for reading only)
        #[arg(long)]
        inline: bool,
    },

    /// Parse a filter expression and print its syntax tree
    #[command(alias = "p")]
    Parse {
        /// Filter expression
        filter: String,

        /// Print the token stream instead of the tree
        #[arg(long)]
        tokens: bool,
    },

    /// View or manage configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Shell types for completions
#[derive(ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Show config file path
    Path,

    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
