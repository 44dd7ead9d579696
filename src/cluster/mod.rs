//! Cluster topology discovery
//!
//! This module provides:
//! - `host:port` node addresses and CLUSTER NODES line parsing
//! - Cluster vs. standalone detection via CLUSTER INFO

pub mod discovery;
pub mod node;

pub use discovery::{DeploymentMode, Discovery, TopologyDiscoverer};
pub use node::{parse_cluster_node_line, NodeAddress};
