//! Blocking TCP connection speaking RESP2
//!
//! One connection per visited node; nothing is pooled or shared.

use std::io::{self, BufReader, BufWriter, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::debug;

use super::control_plane::{ControlPlane, ControlPlaneExt, NodeConnector};
use crate::cluster::NodeAddress;
use crate::config::AuthConfig;
use crate::utils::{ConnectionError, RespDecoder, RespEncoder, RespValue};

/// TCP connection split into buffered reader and writer halves
pub struct RawConnection {
    address: NodeAddress,
    writer: BufWriter<TcpStream>,
    reader: BufReader<TcpStream>,
    encoder: RespEncoder,
}

impl RawConnection {
    /// Open a TCP connection. Without a timeout the OS default applies.
    pub fn connect_tcp(
        address: &NodeAddress,
        connect_timeout: Option<Duration>,
    ) -> Result<Self, ConnectionError> {
        let connect_failed = |source: io::Error| ConnectionError::ConnectFailed {
            address: address.to_string(),
            source,
        };

        let stream = match connect_timeout {
            Some(timeout) => {
                let addr = (address.host(), address.port())
                    .to_socket_addrs()
                    .map_err(connect_failed)?
                    .next()
                    .ok_or_else(|| {
                        connect_failed(io::Error::new(
                            io::ErrorKind::NotFound,
                            "No addresses found",
                        ))
                    })?;
                TcpStream::connect_timeout(&addr, timeout)
            }
            None => TcpStream::connect((address.host(), address.port())),
        }
        .map_err(connect_failed)?;

        stream.set_nodelay(true).ok();

        let writer = BufWriter::new(stream.try_clone().map_err(connect_failed)?);
        let reader = BufReader::new(stream);

        Ok(Self {
            address: address.clone(),
            writer,
            reader,
            encoder: RespEncoder::with_capacity(256),
        })
    }

    pub fn set_read_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        self.reader.get_ref().set_read_timeout(timeout)
    }

    pub fn set_write_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        self.writer.get_ref().set_write_timeout(timeout)
    }
}

impl ControlPlane for RawConnection {
    fn address(&self) -> &NodeAddress {
        &self.address
    }

    fn execute(&mut self, args: &[&str]) -> io::Result<RespValue> {
        self.encoder.clear();
        self.encoder.encode_command(args);
        self.writer.write_all(self.encoder.as_bytes())?;
        self.writer.flush()?;

        RespDecoder::new(&mut self.reader).decode()
    }
}

/// Creates authenticated connections with common settings
#[derive(Debug, Clone, Default)]
pub struct ConnectionFactory {
    pub connect_timeout: Option<Duration>,
    pub read_timeout: Option<Duration>,
    pub write_timeout: Option<Duration>,
    pub auth: Option<AuthConfig>,
}

impl ConnectionFactory {
    /// Create a new connection to the specified node
    pub fn create(&self, address: &NodeAddress) -> Result<RawConnection, ConnectionError> {
        debug!("Connecting to {}", address);
        let mut conn = RawConnection::connect_tcp(address, self.connect_timeout)?;

        if self.read_timeout.is_some() {
            conn.set_read_timeout(self.read_timeout).ok();
        }
        if self.write_timeout.is_some() {
            conn.set_write_timeout(self.write_timeout).ok();
        }

        if let Some(ref auth) = self.auth {
            conn.authenticate(&auth.password, auth.username.as_deref())?;
        }

        Ok(conn)
    }
}

impl NodeConnector for ConnectionFactory {
    type Connection = RawConnection;

    fn connect(&self, address: &NodeAddress) -> Result<RawConnection, ConnectionError> {
        self.create(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::net::TcpListener;
    use std::thread;

    /// Accepts one connection, checks the request bytes and answers with `reply`
    fn one_shot_server(expected: &'static [u8], reply: &'static [u8]) -> NodeAddress {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = vec![0u8; expected.len()];
            stream.read_exact(&mut buf).unwrap();
            assert_eq!(buf, expected);
            stream.write_all(reply).unwrap();
        });
        NodeAddress::parse(&format!("127.0.0.1:{port}")).unwrap()
    }

    #[test]
    fn test_execute_round_trip_over_tcp() {
        let addr = one_shot_server(
            b"*2\r\n$6\r\nCLIENT\r\n$4\r\nLIST\r\n",
            b"$24\r\nid=1 addr=10.0.0.1:5000\n\r\n",
        );
        let mut conn = ConnectionFactory::default().create(&addr).unwrap();
        let text = conn.client_list().unwrap();
        assert_eq!(text, "id=1 addr=10.0.0.1:5000\n");
    }

    #[test]
    fn test_factory_authenticates() {
        let addr = one_shot_server(b"*2\r\n$4\r\nAUTH\r\n$2\r\npw\r\n", b"-WRONGPASS nope\r\n");
        let factory = ConnectionFactory {
            auth: Some(AuthConfig {
                password: "pw".to_string(),
                username: None,
            }),
            ..Default::default()
        };
        match factory.create(&addr) {
            Err(ConnectionError::AuthFailed { reason, .. }) => assert_eq!(reason, "WRONGPASS nope"),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("auth should have been rejected"),
        }
    }

    #[test]
    fn test_connect_refused() {
        // Bind then drop to get a port nobody listens on
        let port = TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let addr = NodeAddress::parse(&format!("127.0.0.1:{port}")).unwrap();
        let err = ConnectionFactory {
            connect_timeout: Some(Duration::from_secs(2)),
            ..Default::default()
        }
        .create(&addr)
        .err()
        .unwrap();
        assert!(matches!(err, ConnectionError::ConnectFailed { .. }));
    }

    #[test]
    #[ignore]
    fn test_live_server() {
        let addr = NodeAddress::parse("127.0.0.1:6379").unwrap();
        let mut conn = ConnectionFactory::default()
            .create(&addr)
            .expect("Failed to connect");
        assert!(conn.info("replication").unwrap().contains("role:"));
    }
}
