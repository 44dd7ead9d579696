//! Shape-checked decoding of admin command replies
//!
//! Each admin command gets an explicit decoder with the reply shape it
//! expects. A reply of the wrong overall shape is a [`ProtocolError`];
//! individual malformed records inside an otherwise valid reply are dropped.

use tracing::trace;

use crate::analyzer::{Role, SlowLogEntry};
use crate::cluster::NodeAddress;
use crate::utils::{ProtocolError, RespValue};

/// Which node and command a reply came from, for error messages
#[derive(Debug, Clone)]
pub struct QueryContext {
    pub address: String,
    pub command: String,
}

impl QueryContext {
    pub fn new(address: &NodeAddress, args: &[&str]) -> Self {
        Self {
            address: address.to_string(),
            command: args.join(" "),
        }
    }

    fn unexpected(&self, expected: &'static str, actual: &RespValue) -> ProtocolError {
        ProtocolError::UnexpectedResponse {
            address: self.address.clone(),
            command: self.command.clone(),
            expected,
            actual: actual.kind(),
        }
    }
}

/// Text-block replies (INFO, CLUSTER INFO, CLUSTER NODES, CLIENT LIST)
pub fn expect_text(reply: RespValue, ctx: &QueryContext) -> Result<String, ProtocolError> {
    match reply {
        RespValue::BulkString(data) => Ok(String::from_utf8(data)
            .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())),
        RespValue::SimpleString(s) => Ok(s),
        other => Err(ctx.unexpected("text", &other)),
    }
}

/// Value of the `cluster_state` field of CLUSTER INFO
pub fn cluster_state(info: &str) -> Option<&str> {
    info.lines()
        .find_map(|line| line.trim().strip_prefix("cluster_state:"))
        .map(str::trim)
}

/// True only when CLUSTER INFO confirms `cluster_state:ok`
pub fn is_cluster_ok(info: &str) -> bool {
    cluster_state(info) == Some("ok")
}

/// Role reported by the `role:` line of INFO replication
pub fn replication_role(info: &str) -> Role {
    info.lines()
        .find_map(|line| line.trim().strip_prefix("role:"))
        .map(Role::from_info)
        .unwrap_or(Role::Unknown)
}

/// SLOWLOG GET reply: an array of entry arrays
///
/// Entry layout: `[id, unix-timestamp, exec-time-us, [arg, ...], client-addr, client-name]`.
/// The last two only exist on newer servers and are ignored.
pub fn decode_slowlog(
    reply: RespValue,
    ctx: &QueryContext,
) -> Result<Vec<SlowLogEntry>, ProtocolError> {
    let raw_entries = match reply {
        RespValue::Array(entries) => entries,
        other => return Err(ctx.unexpected("array of slow-log entries", &other)),
    };

    let mut entries = Vec::with_capacity(raw_entries.len());
    for raw in &raw_entries {
        match decode_slowlog_entry(raw) {
            Some(entry) => entries.push(entry),
            None => trace!("Skipping malformed slow-log entry from {}: {:?}", ctx.address, raw),
        }
    }
    Ok(entries)
}

/// Decode one entry; `None` for anything that is not a usable entry
pub fn decode_slowlog_entry(raw: &RespValue) -> Option<SlowLogEntry> {
    let fields = raw.as_array()?;
    if fields.len() < 3 {
        return None;
    }

    let timestamp = fields[1].as_i64()?;
    let exec_time_micros = u64::try_from(fields[2].as_i64()?).ok()?;
    let command = match fields.get(3) {
        Some(RespValue::Array(args)) => args.iter().filter_map(RespValue::to_text_lossy).collect(),
        Some(_) => return None,
        None => Vec::new(),
    };

    Some(SlowLogEntry {
        id: fields[0].as_i64(),
        timestamp,
        exec_time_micros,
        command,
    })
}
