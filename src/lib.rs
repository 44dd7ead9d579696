//! valkey-diag library
//!
//! Operator diagnostics for Valkey/Redis deployments: cluster-wide slow-log
//! collection and per-IP client connection analysis.

pub mod analyzer;
pub mod client;
pub mod cluster;
pub mod config;
pub mod reply;
pub mod report;
pub mod utils;
