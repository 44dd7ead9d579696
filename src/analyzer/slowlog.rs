//! Slow-log collection across discovered nodes
//!
//! Nodes are visited one at a time, in discovery order, over a fresh
//! connection each. Per node: INFO replication (role, informational only),
//! then SLOWLOG GET, then one report line per well-formed entry.

use std::fmt;
use std::io::Write;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::client::{ControlPlaneExt, NodeConnector};
use crate::cluster::{NodeAddress, TopologyDiscoverer};
use crate::reply;
use crate::report::Reporter;
use crate::utils::{DiagError, Result};

/// One decoded SLOWLOG GET entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlowLogEntry {
    /// Server-assigned entry id; not used for anything but JSON output
    pub id: Option<i64>,
    /// Unix timestamp (seconds) the command was executed at
    pub timestamp: i64,
    pub exec_time_micros: u64,
    /// Command name followed by its arguments
    pub command: Vec<String>,
}

impl SlowLogEntry {
    pub fn duration_ms(&self) -> f64 {
        self.exec_time_micros as f64 / 1000.0
    }
}

/// Replication role a node reports for itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Primary,
    Replica,
    Unknown,
}

impl Role {
    /// Map the value of an INFO `role:` field
    pub fn from_info(value: &str) -> Self {
        match value.trim() {
            "master" => Role::Primary,
            "slave" | "replica" => Role::Replica,
            _ => Role::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Primary => "primary",
            Role::Replica => "replica",
            Role::Unknown => "unknown",
        }
    }

    pub fn is_primary(&self) -> bool {
        *self == Role::Primary
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-node context emitted ahead of the node's entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeReport {
    pub address: NodeAddress,
    pub role: Role,
}

/// What to do when one node fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Abort the whole collection on the first failing node
    #[default]
    FailFast,
    /// Record the failure and move on to the next node
    ContinueOnError,
}

#[derive(Debug, Clone)]
pub struct CollectOptions {
    /// SLOWLOG GET count per node
    pub top_n: usize,
    /// Append the node's replication role to its header
    pub annotate_role: bool,
    pub failure_policy: FailurePolicy,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            top_n: 10,
            annotate_role: false,
            failure_policy: FailurePolicy::FailFast,
        }
    }
}

/// Result of visiting one node
#[derive(Debug)]
pub struct NodeOutcome {
    pub address: NodeAddress,
    /// Entries reported for the node
    pub entries: usize,
    pub error: Option<DiagError>,
}

#[derive(Debug, Default)]
pub struct CollectionSummary {
    pub outcomes: Vec<NodeOutcome>,
}

impl CollectionSummary {
    pub fn total_entries(&self) -> usize {
        self.outcomes.iter().map(|o| o.entries).sum()
    }

    pub fn failed(&self) -> impl Iterator<Item = &NodeOutcome> {
        self.outcomes.iter().filter(|o| o.error.is_some())
    }

    pub fn has_failures(&self) -> bool {
        self.failed().next().is_some()
    }
}

/// Fetches and reports the slow log of every node in a list
pub struct SlowLogCollector<'a, C> {
    connector: &'a C,
    options: CollectOptions,
}

impl<'a, C: NodeConnector> SlowLogCollector<'a, C> {
    pub fn new(connector: &'a C, options: CollectOptions) -> Self {
        Self { connector, options }
    }

    /// Visit `nodes` in order and report each node's slow log
    ///
    /// Under [`FailurePolicy::FailFast`] the first node error is returned and
    /// later nodes are never contacted. Report output already written stays.
    pub fn collect<W: Write>(
        &self,
        nodes: &[NodeAddress],
        reporter: &mut Reporter<W>,
    ) -> Result<CollectionSummary> {
        let mut summary = CollectionSummary::default();

        for address in nodes {
            match self.collect_node(address, reporter) {
                Ok(entries) => summary.outcomes.push(NodeOutcome {
                    address: address.clone(),
                    entries,
                    error: None,
                }),
                // The report sink itself failing is never a per-node problem
                Err(e @ DiagError::Io(_)) => return Err(e),
                Err(e) => match self.options.failure_policy {
                    FailurePolicy::FailFast => return Err(e),
                    FailurePolicy::ContinueOnError => {
                        warn!("Skipping {}: {}", address, e);
                        reporter.node_error(address, &e)?;
                        summary.outcomes.push(NodeOutcome {
                            address: address.clone(),
                            entries: 0,
                            error: Some(e),
                        });
                    }
                },
            }
        }

        reporter.flush()?;
        Ok(summary)
    }

    fn collect_node<W: Write>(
        &self,
        address: &NodeAddress,
        reporter: &mut Reporter<W>,
    ) -> Result<usize> {
        let mut conn = self.connector.connect(address)?;

        let replication = conn.info("replication")?;
        let node = NodeReport {
            address: address.clone(),
            role: reply::replication_role(&replication),
        };
        debug!("{} reports role {}", address, node.role);
        reporter.node(&node, self.options.annotate_role)?;

        let entries = conn.slowlog_get(self.options.top_n)?;
        info!("{}: {} slow-log entries", address, entries.len());

        for entry in &entries {
            reporter.slowlog_entry(&node.address, entry)?;
        }
        Ok(entries.len())
    }
}

/// Discover the nodes behind `seed` and report all their slow logs
pub fn collect_slow_logs<C: NodeConnector, W: Write>(
    connector: &C,
    seed: &NodeAddress,
    options: CollectOptions,
    reporter: &mut Reporter<W>,
) -> Result<CollectionSummary> {
    let discovery = TopologyDiscoverer::new(connector).discover(seed)?;
    SlowLogCollector::new(connector, options).collect(&discovery.nodes, reporter)
}
