//! Run configuration derived from CLI arguments

use std::path::PathBuf;
use std::time::Duration;

use super::cli::{CliArgs, DiagCommand, OutputFormat, SortOrder};
use crate::analyzer::{ClientSort, CollectOptions, FailurePolicy};
use crate::client::ConnectionFactory;
use crate::cluster::NodeAddress;
use crate::utils::{DiagError, Result};

/// Authentication configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub password: String,
    pub username: Option<String>,
}

/// Complete, validated run configuration
#[derive(Debug, Clone)]
pub struct DiagConfig {
    pub command: DiagCommand,

    // Connection
    pub address: NodeAddress,
    pub auth: Option<AuthConfig>,
    pub connect_timeout: Option<Duration>,
    pub request_timeout: Option<Duration>,

    // Slow log
    pub top_n: usize,
    pub show_role: bool,
    pub keep_going: bool,

    // Client list
    pub sort: ClientSort,

    // Output
    pub output_path: Option<PathBuf>,
    pub output_format: OutputFormat,
}

impl DiagConfig {
    /// Create configuration from CLI arguments
    pub fn from_cli(args: &CliArgs) -> Result<Self> {
        args.validate().map_err(DiagError::Config)?;

        let address = NodeAddress::parse(&args.addr).ok_or_else(|| {
            DiagError::Config(format!("--addr must be host:port, got {:?}", args.addr))
        })?;

        // An empty password means no AUTH, like an unset one
        let auth = args
            .password
            .as_ref()
            .filter(|p| !p.is_empty())
            .map(|p| AuthConfig {
                password: p.clone(),
                username: args.username.clone(),
            });

        let sort = match args.sort {
            SortOrder::Count => ClientSort::Count,
            SortOrder::Ip => ClientSort::Ip,
            SortOrder::Unordered => ClientSort::Unordered,
        };

        Ok(Self {
            command: args.command,

            address,
            auth,
            connect_timeout: args.connect_timeout_ms.map(Duration::from_millis),
            request_timeout: args.request_timeout_ms.map(Duration::from_millis),

            top_n: args.top,
            show_role: args.show_role,
            keep_going: args.keep_going,

            sort,

            output_path: args.output.clone(),
            output_format: args.output_format,
        })
    }

    /// Connection settings shared by every node visit
    pub fn connection_factory(&self) -> ConnectionFactory {
        ConnectionFactory {
            connect_timeout: self.connect_timeout,
            read_timeout: self.request_timeout,
            write_timeout: self.request_timeout,
            auth: self.auth.clone(),
        }
    }

    pub fn collect_options(&self) -> CollectOptions {
        CollectOptions {
            top_n: self.top_n,
            annotate_role: self.show_role,
            failure_policy: if self.keep_going {
                FailurePolicy::ContinueOnError
            } else {
                FailurePolicy::FailFast
            },
        }
    }
}
