//! Command-line argument parsing

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Slow-log and client-connection diagnostics for Valkey/Redis
#[derive(Parser, Debug, Clone)]
#[command(name = "valkey-diag")]
#[command(version, about, long_about = None)]
pub struct CliArgs {
    // ===== Operation =====
    /// Diagnostic to run
    #[arg(short = 'c', long = "command", value_enum)]
    pub command: DiagCommand,

    // ===== Connection Options =====
    /// Target address (seed node for cluster discovery)
    #[arg(long = "addr", default_value = "127.0.0.1:6379")]
    pub addr: String,

    /// Password for AUTH command
    #[arg(short = 'a', long = "password")]
    pub password: Option<String>,

    /// Username for ACL AUTH (requires --password)
    #[arg(long = "user")]
    pub username: Option<String>,

    /// Connection timeout in milliseconds (OS default when unset)
    #[arg(long = "connect-timeout")]
    pub connect_timeout_ms: Option<u64>,

    /// Read/write timeout in milliseconds (none when unset)
    #[arg(long = "request-timeout")]
    pub request_timeout_ms: Option<u64>,

    // ===== Slow Log Options =====
    /// Slow-log entries to fetch per node
    #[arg(long = "top", default_value_t = 10)]
    pub top: usize,

    /// Annotate node headers with the node's replication role
    #[arg(long = "show-role")]
    pub show_role: bool,

    /// Keep collecting from remaining nodes when one node fails
    #[arg(long = "keep-going")]
    pub keep_going: bool,

    // ===== Client List Options =====
    /// Order of client statistics
    #[arg(long = "sort", value_enum, default_value_t = SortOrder::Count)]
    pub sort: SortOrder,

    // ===== Output Options =====
    /// Output file path (stdout when unset)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(long = "output-format", value_enum, default_value_t = OutputFormat::Text)]
    pub output_format: OutputFormat,

    /// Quiet mode (errors only)
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,

    /// Verbose logging
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagCommand {
    /// Collect slow logs from every node of the target
    Slowlog,
    /// Count client connections per source IP
    Clientlist,
}

/// Output format for reports
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Client statistics order
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Most connections first
    #[default]
    Count,
    /// By IP
    Ip,
    /// Unspecified order
    #[value(name = "none")]
    Unordered,
}

impl CliArgs {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate argument combinations
    pub fn validate(&self) -> Result<(), String> {
        if self.username.is_some() && self.password.is_none() {
            return Err("--user requires --password to be set".to_string());
        }

        if self.top == 0 {
            return Err("--top must be at least 1".to_string());
        }

        if self.quiet && self.verbose {
            return Err("--quiet and --verbose are mutually exclusive".to_string());
        }

        Ok(())
    }
}
