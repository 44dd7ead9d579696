//! Scripted in-memory transport for tests

use std::cell::RefCell;
use std::collections::HashMap;
use std::io;

use super::control_plane::{ControlPlane, NodeConnector};
use crate::cluster::NodeAddress;
use crate::utils::{ConnectionError, RespValue};

/// Scripted outcome of one command
#[derive(Debug, Clone)]
pub enum Reply {
    Value(RespValue),
    /// Transport failure with the given message
    Broken(String),
}

/// Connection that answers commands from a script keyed by the
/// space-joined command line
#[derive(Debug, Clone)]
pub struct MockConnection {
    address: NodeAddress,
    script: HashMap<String, Reply>,
    sent: Vec<String>,
}

impl MockConnection {
    pub fn new(address: NodeAddress) -> Self {
        Self {
            address,
            script: HashMap::new(),
            sent: Vec::new(),
        }
    }

    pub fn reply(self, command: &str, value: RespValue) -> Self {
        self.script(command, Reply::Value(value))
    }

    pub fn script(mut self, command: &str, reply: Reply) -> Self {
        self.script.insert(command.to_string(), reply);
        self
    }

    pub fn sent(&self) -> &[String] {
        &self.sent
    }
}

impl ControlPlane for MockConnection {
    fn address(&self) -> &NodeAddress {
        &self.address
    }

    fn execute(&mut self, args: &[&str]) -> io::Result<RespValue> {
        let command = args.join(" ");
        self.sent.push(command.clone());
        match self.script.get(&command) {
            Some(Reply::Value(v)) => Ok(v.clone()),
            Some(Reply::Broken(msg)) => {
                Err(io::Error::new(io::ErrorKind::ConnectionReset, msg.clone()))
            }
            None => Err(io::Error::new(
                io::ErrorKind::Other,
                format!("no scripted reply for {command}"),
            )),
        }
    }
}

/// Connector over a fixed set of scripted nodes; unknown nodes refuse
/// the connection
#[derive(Debug, Default)]
pub struct MockConnector {
    nodes: HashMap<String, MockConnection>,
    connects: RefCell<Vec<String>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start scripting a node at `addr`
    pub fn conn(addr: &str) -> MockConnection {
        MockConnection::new(NodeAddress::parse(addr).expect("valid test address"))
    }

    pub fn node(mut self, conn: MockConnection) -> Self {
        self.nodes.insert(conn.address().to_string(), conn);
        self
    }

    /// Addresses connected to, in order
    pub fn connects(&self) -> Vec<String> {
        self.connects.borrow().clone()
    }
}

impl NodeConnector for MockConnector {
    type Connection = MockConnection;

    fn connect(&self, address: &NodeAddress) -> Result<MockConnection, ConnectionError> {
        self.connects.borrow_mut().push(address.to_string());
        self.nodes
            .get(&address.to_string())
            .cloned()
            .ok_or_else(|| ConnectionError::ConnectFailed {
                address: address.to_string(),
                source: io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused"),
            })
    }
}
