//! Node addresses and CLUSTER NODES line parsing

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::utils::ConnectionError;

/// Client-facing address of a node (`host:port`)
///
/// Only constructed through [`NodeAddress::parse`], so the host is never
/// empty and the port always fits a `u16`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub struct NodeAddress {
    host: String,
    port: u16,
}

impl NodeAddress {
    /// Parse `host:port`. The port is whatever follows the last `:`, so bare
    /// IPv6 hosts (`::1:6379`) work as well as bracketed ones (`[::1]:6379`).
    pub fn parse(s: &str) -> Option<Self> {
        let (host, port) = s.trim().rsplit_once(':')?;
        let port: u16 = port.parse().ok()?;
        let host = host.trim_start_matches('[').trim_end_matches(']');
        if host.is_empty() {
            return None;
        }

        Some(Self {
            host: host.to_string(),
            port,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl FromStr for NodeAddress {
    type Err = ConnectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ConnectionError::InvalidAddress(s.to_string()))
    }
}

impl From<NodeAddress> for String {
    fn from(addr: NodeAddress) -> Self {
        addr.to_string()
    }
}

/// Extract the client address from one CLUSTER NODES line
///
/// Format: `<id> <ip:port@cport[,hostname]> <flags> <master> <ping-sent> <pong-recv> <config-epoch> <link-state> <slot> ...`
///
/// Only the second field matters here. Lines with fewer than two fields, or
/// whose address is unusable (`:0@0` for nodes that have not announced one),
/// yield `None`.
pub fn parse_cluster_node_line(line: &str) -> Option<NodeAddress> {
    let addr_field = line.split_whitespace().nth(1)?;
    let host_port = addr_field.split('@').next().unwrap_or(addr_field);
    NodeAddress::parse(host_port)
}
