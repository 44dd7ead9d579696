//! Configuration module

pub mod cli;
pub mod diag_config;

pub use cli::{CliArgs, DiagCommand, OutputFormat, SortOrder};
pub use diag_config::{AuthConfig, DiagConfig};
