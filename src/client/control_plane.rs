//! Control plane traits for admin commands
//!
//! `ControlPlane` is the transport seam: send one command, get one reply.
//! `ControlPlaneExt` builds the admin queries (CLUSTER INFO, SLOWLOG GET, ...)
//! on top of it and turns transport failures and error replies into
//! [`DiagError`]s that name the node and the command.
//!
//! `NodeConnector` opens authenticated connections by address so the
//! discovery and collection loops can be driven against any transport.

use std::io;

use crate::analyzer::SlowLogEntry;
use crate::cluster::NodeAddress;
use crate::reply::{self, QueryContext};
use crate::utils::{ConnectionError, ProtocolError, RespValue, Result};

/// Single-command request/reply transport
pub trait ControlPlane {
    /// Address of the node this connection talks to
    fn address(&self) -> &NodeAddress;

    /// Execute a command with string arguments
    ///
    /// # Example
    /// ```ignore
    /// let response = conn.execute(&["CLUSTER", "INFO"])?;
    /// ```
    fn execute(&mut self, args: &[&str]) -> io::Result<RespValue>;
}

/// Admin queries built on top of [`ControlPlane`]
pub trait ControlPlaneExt: ControlPlane {
    /// Execute a command; transport failures become `ConnectionError`,
    /// error replies become `ProtocolError::ServerError`
    fn query(&mut self, args: &[&str]) -> Result<RespValue> {
        let ctx = QueryContext::new(self.address(), args);
        let reply = self.execute(args).map_err(|source| ConnectionError::Io {
            address: ctx.address.clone(),
            command: ctx.command.clone(),
            source,
        })?;

        match reply {
            RespValue::Error(message) => Err(ProtocolError::ServerError {
                address: ctx.address,
                command: ctx.command,
                message,
            }
            .into()),
            other => Ok(other),
        }
    }

    /// Execute a command whose reply is a single text block
    fn query_text(&mut self, args: &[&str]) -> Result<String> {
        let ctx = QueryContext::new(self.address(), args);
        let reply = self.query(args)?;
        Ok(reply::expect_text(reply, &ctx)?)
    }

    /// CLUSTER INFO as raw `field:value` lines
    fn cluster_info(&mut self) -> Result<String> {
        self.query_text(&["CLUSTER", "INFO"])
    }

    /// CLUSTER NODES as raw lines
    fn cluster_nodes(&mut self) -> Result<String> {
        self.query_text(&["CLUSTER", "NODES"])
    }

    /// INFO for one section
    fn info(&mut self, section: &str) -> Result<String> {
        self.query_text(&["INFO", section])
    }

    /// SLOWLOG GET with a result-count ceiling, decoded into entries
    fn slowlog_get(&mut self, count: usize) -> Result<Vec<SlowLogEntry>> {
        let count = count.to_string();
        let args = ["SLOWLOG", "GET", count.as_str()];
        let ctx = QueryContext::new(self.address(), &args);
        let reply = self.query(&args)?;
        Ok(reply::decode_slowlog(reply, &ctx)?)
    }

    /// CLIENT LIST as raw lines, one per connection
    fn client_list(&mut self) -> Result<String> {
        self.query_text(&["CLIENT", "LIST"])
    }

    /// Send AUTH; any rejection is a connection-level failure
    fn authenticate(
        &mut self,
        password: &str,
        username: Option<&str>,
    ) -> std::result::Result<(), ConnectionError> {
        let address = self.address().to_string();
        let response = match username {
            Some(user) => self.execute(&["AUTH", user, password]),
            None => self.execute(&["AUTH", password]),
        }
        .map_err(|source| ConnectionError::Io {
            address: address.clone(),
            command: "AUTH".to_string(),
            source,
        })?;

        match response {
            RespValue::SimpleString(s) if s == "OK" => Ok(()),
            RespValue::Error(reason) => Err(ConnectionError::AuthFailed { address, reason }),
            other => Err(ConnectionError::AuthFailed {
                address,
                reason: format!("unexpected reply: {}", other.kind()),
            }),
        }
    }
}

// Blanket implementation: any ControlPlane automatically gets ControlPlaneExt
impl<T: ControlPlane + ?Sized> ControlPlaneExt for T {}

/// Opens ready-to-use (connected and authenticated) connections to nodes
pub trait NodeConnector {
    type Connection: ControlPlane;

    fn connect(&self, address: &NodeAddress)
        -> std::result::Result<Self::Connection, ConnectionError>;
}
