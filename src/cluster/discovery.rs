//! Cluster vs. standalone detection and node enumeration

use std::fmt;

use tracing::{debug, info, trace};

use super::node::{parse_cluster_node_line, NodeAddress};
use crate::client::{ControlPlaneExt, NodeConnector};
use crate::reply;
use crate::utils::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentMode {
    Standalone,
    Cluster,
}

impl fmt::Display for DeploymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeploymentMode::Standalone => f.write_str("standalone"),
            DeploymentMode::Cluster => f.write_str("cluster"),
        }
    }
}

/// Nodes to visit, in the order the seed reported them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovery {
    pub mode: DeploymentMode,
    pub nodes: Vec<NodeAddress>,
}

impl Discovery {
    pub fn standalone(seed: &NodeAddress) -> Self {
        Self {
            mode: DeploymentMode::Standalone,
            nodes: vec![seed.clone()],
        }
    }
}

pub struct TopologyDiscoverer<'a, C> {
    connector: &'a C,
}

impl<'a, C: NodeConnector> TopologyDiscoverer<'a, C> {
    pub fn new(connector: &'a C) -> Self {
        Self { connector }
    }

    /// Work out which nodes sit behind `seed`
    ///
    /// Anything short of a successful CLUSTER INFO reporting
    /// `cluster_state:ok` means standalone, including failing to reach the
    /// seed at all. Once the cluster state is confirmed, a failing
    /// CLUSTER NODES is an error.
    pub fn discover(&self, seed: &NodeAddress) -> Result<Discovery> {
        let mut conn = match self.connector.connect(seed) {
            Ok(conn) => conn,
            Err(e) => {
                debug!("Cluster check could not reach {}: {}", seed, e);
                info!("Not a cluster. Proceeding with standalone mode...");
                return Ok(Discovery::standalone(seed));
            }
        };

        let cluster_ok = match conn.cluster_info() {
            Ok(info) => reply::is_cluster_ok(&info),
            Err(e) => {
                debug!("CLUSTER INFO on {} failed: {}", seed, e);
                false
            }
        };
        if !cluster_ok {
            info!("Not a cluster. Proceeding with standalone mode...");
            return Ok(Discovery::standalone(seed));
        }

        info!("Detected a cluster. Collecting all node addresses...");
        let listing = conn.cluster_nodes()?;

        let mut nodes = Vec::new();
        for line in listing.lines() {
            match parse_cluster_node_line(line) {
                Some(addr) => nodes.push(addr),
                None if line.trim().is_empty() => {}
                None => trace!("Skipping malformed CLUSTER NODES line: {:?}", line),
            }
        }
        info!("Discovered {} cluster nodes", nodes.len());

        Ok(Discovery {
            mode: DeploymentMode::Cluster,
            nodes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::{MockConnector, Reply};
    use crate::utils::{DiagError, RespValue};

    const SEED: &str = "10.0.0.1:7000";

    fn seed() -> NodeAddress {
        NodeAddress::parse(SEED).unwrap()
    }

    fn cluster_info(state: &str) -> RespValue {
        RespValue::bulk(format!(
            "cluster_enabled:1\r\ncluster_state:{state}\r\ncluster_known_nodes:3\r\n"
        ))
    }

    #[test]
    fn test_cluster_disabled_is_standalone() {
        let connector = MockConnector::new().node(MockConnector::conn(SEED).reply(
            "CLUSTER INFO",
            RespValue::Error("ERR This instance has cluster support disabled".into()),
        ));
        let discovery = TopologyDiscoverer::new(&connector).discover(&seed()).unwrap();
        assert_eq!(discovery, Discovery::standalone(&seed()));
    }

    #[test]
    fn test_cluster_state_fail_is_standalone() {
        let connector = MockConnector::new()
            .node(MockConnector::conn(SEED).reply("CLUSTER INFO", cluster_info("fail")));
        let discovery = TopologyDiscoverer::new(&connector).discover(&seed()).unwrap();
        assert_eq!(discovery.mode, DeploymentMode::Standalone);
        assert_eq!(discovery.nodes, [seed()]);
    }

    #[test]
    fn test_unreachable_seed_is_standalone() {
        let connector = MockConnector::new();
        let discovery = TopologyDiscoverer::new(&connector).discover(&seed()).unwrap();
        assert_eq!(discovery.nodes, [seed()]);
    }

    #[test]
    fn test_broken_cluster_info_is_standalone() {
        let connector = MockConnector::new().node(
            MockConnector::conn(SEED).script("CLUSTER INFO", Reply::Broken("reset".into())),
        );
        let discovery = TopologyDiscoverer::new(&connector).discover(&seed()).unwrap();
        assert_eq!(discovery.mode, DeploymentMode::Standalone);
    }

    #[test]
    fn test_node_listing_skips_malformed_lines() {
        let listing = "e7d1eecce10fd6bb5eb35b9f99a514335d9ba9ca 10.0.0.1:7000@17000 master - 0 0 0 connected\nbadline\n";
        let connector = MockConnector::new().node(
            MockConnector::conn(SEED)
                .reply("CLUSTER INFO", cluster_info("ok"))
                .reply("CLUSTER NODES", RespValue::bulk(listing)),
        );
        let discovery = TopologyDiscoverer::new(&connector).discover(&seed()).unwrap();
        assert_eq!(discovery.mode, DeploymentMode::Cluster);
        let nodes: Vec<String> = discovery.nodes.iter().map(|n| n.to_string()).collect();
        assert_eq!(nodes, ["10.0.0.1:7000"]);
    }

    #[test]
    fn test_node_listing_keeps_order() {
        let listing = "\
a1 10.0.0.1:7000@17000 myself,master - 0 0 1 connected 0-5460
b2 10.0.0.2:7001@17001 master - 0 1426238316232 2 connected 5461-10922
c3 10.0.0.3:7002@17002 slave a1 0 1426238316232 1 connected
";
        let connector = MockConnector::new().node(
            MockConnector::conn(SEED)
                .reply("CLUSTER INFO", cluster_info("ok"))
                .reply("CLUSTER NODES", RespValue::bulk(listing)),
        );
        let discovery = TopologyDiscoverer::new(&connector).discover(&seed()).unwrap();
        let nodes: Vec<String> = discovery.nodes.iter().map(|n| n.to_string()).collect();
        assert_eq!(nodes, ["10.0.0.1:7000", "10.0.0.2:7001", "10.0.0.3:7002"]);
    }

    #[test]
    fn test_node_listing_failure_is_an_error() {
        let connector = MockConnector::new().node(
            MockConnector::conn(SEED)
                .reply("CLUSTER INFO", cluster_info("ok"))
                .reply("CLUSTER NODES", RespValue::Error("ERR busy".into())),
        );
        let err = TopologyDiscoverer::new(&connector)
            .discover(&seed())
            .unwrap_err();
        assert!(matches!(err, DiagError::Protocol(_)));
        assert!(err.to_string().contains("CLUSTER NODES"));
    }
}
