//! Client connection layer

pub mod control_plane;
#[cfg(test)]
pub mod mock;
pub mod raw_connection;

pub use control_plane::{ControlPlane, ControlPlaneExt, NodeConnector};
pub use raw_connection::{ConnectionFactory, RawConnection};
