//! Command-line argument parsing for toolgate
//!
//! Provides clap-based CLI with subcommands and verbosity control.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// toolgate - validated, bounded shell, file, SQLite and web tools over stdio
#[derive(Parser, Debug)]
#[command(name = "toolgate")]
#[command(version)]
#[command(about = "Expose shell, SQLite and web tools to a host over stdio", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Root directory relative paths resolve against
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Tool groups to enable (comma separated: shell,sqlite,web)
    #[arg(long, global = true, value_delimiter = ',')]
    pub tools: Option<Vec<String>>,

    /// Verbosity level: -q (quiet), default (normal), -v (verbose), -vv (very verbose)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Log output format
    #[arg(long, global = true, value_enum, env = "TOOLGATE_LOG_FORMAT")]
    pub log_format: Option<LogFormat>,

    /// Subcommand
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Serve tools over stdin/stdout (default)
    Serve,

    /// Print the tool catalog as JSON
    Tools,

    /// Dispatch a single tool call and print the result
    Call {
        /// Tool name
        tool: String,

        /// Arguments as a JSON object
        #[arg(default_value = "{}")]
        arguments: String,
    },
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
}

/// Log line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::VeryVerbose,
            }
        }
    }

    /// Subcommand, defaulting to `serve`
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Serve)
    }

    /// Log format, defaulting to text
    pub fn log_format(&self) -> LogFormat {
        self.log_format.unwrap_or(LogFormat::Text)
    }
}

impl Verbosity {
    /// Default filter directive for this level
    pub fn as_filter(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "error",
            Verbosity::Normal => "info",
            Verbosity::Verbose => "debug",
            Verbosity::VeryVerbose => "trace",
        }
    }

    /// Whether the level was chosen explicitly on the command line
    pub fn is_explicit(&self) -> bool {
        !matches!(self, Verbosity::Normal)
    }
}
