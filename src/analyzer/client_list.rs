//! Per-IP aggregation of CLIENT LIST

use std::cmp::Reverse;
use std::collections::HashMap;

use serde::Serialize;
use tracing::{info, trace};

use crate::client::{ControlPlaneExt, NodeConnector};
use crate::cluster::NodeAddress;
use crate::utils::Result;

/// Connection count for one source IP
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientStat {
    pub ip: String,
    pub connections: u64,
}

/// Output order for client stats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClientSort {
    /// Whatever order the aggregation produced
    Unordered,
    /// By IP, ascending (string order)
    Ip,
    /// By connection count, descending; ties by IP
    #[default]
    Count,
}

/// Source IP of an `addr=` value (`ip:port`, `[v6]:port` or `v6:port`)
fn client_ip(addr: &str) -> Option<&str> {
    let (ip, _port) = addr.rsplit_once(':')?;
    let ip = ip.trim_start_matches('[').trim_end_matches(']');
    (!ip.is_empty()).then_some(ip)
}

/// Count connections per source IP in a CLIENT LIST reply
///
/// Every `addr=` token counts once; blank lines and tokens whose value has
/// no usable IP are ignored. The port never takes part in the key.
pub fn aggregate_client_list(listing: &str) -> Vec<ClientStat> {
    let mut counts: HashMap<&str, u64> = HashMap::new();

    for line in listing.lines() {
        if line.trim().is_empty() {
            continue;
        }

        let mut matched = false;
        for token in line.split(' ') {
            if let Some(value) = token.strip_prefix("addr=") {
                if let Some(ip) = client_ip(value.trim()) {
                    *counts.entry(ip).or_insert(0) += 1;
                    matched = true;
                }
            }
        }
        if !matched {
            trace!("No usable addr= token in CLIENT LIST line: {:?}", line);
        }
    }

    counts
        .into_iter()
        .map(|(ip, connections)| ClientStat {
            ip: ip.to_string(),
            connections,
        })
        .collect()
}

/// Put stats into a deterministic order
pub fn sort_stats(stats: &mut [ClientStat], order: ClientSort) {
    match order {
        ClientSort::Unordered => {}
        ClientSort::Ip => stats.sort_by(|a, b| a.ip.cmp(&b.ip)),
        ClientSort::Count => {
            stats.sort_by(|a, b| {
                (Reverse(a.connections), &a.ip).cmp(&(Reverse(b.connections), &b.ip))
            })
        }
    }
}

/// Fetches CLIENT LIST from one node and aggregates it by IP
pub struct ClientListAnalyzer<'a, C> {
    connector: &'a C,
}

impl<'a, C: NodeConnector> ClientListAnalyzer<'a, C> {
    pub fn new(connector: &'a C) -> Self {
        Self { connector }
    }

    /// One stat per distinct source IP; order unspecified
    pub fn analyze(&self, address: &NodeAddress) -> Result<Vec<ClientStat>> {
        let mut conn = self.connector.connect(address)?;
        let listing = conn.client_list()?;
        let stats = aggregate_client_list(&listing);
        info!(
            "{}: {} connections from {} distinct IPs",
            address,
            stats.iter().map(|s| s.connections).sum::<u64>(),
            stats.len()
        );
        Ok(stats)
    }
}
