//! Diagnostics pipelines
//!
//! - Slow-log collection across every node of a deployment
//! - Client connection aggregation by source IP for a single node

pub mod client_list;
pub mod slowlog;

pub use client_list::{
    aggregate_client_list, sort_stats, ClientListAnalyzer, ClientSort, ClientStat,
};
pub use slowlog::{
    collect_slow_logs, CollectOptions, CollectionSummary, FailurePolicy, NodeOutcome, NodeReport,
    Role, SlowLogCollector, SlowLogEntry,
};
