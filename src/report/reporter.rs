//! Report output formatting
//!
//! Supports two output formats:
//! - Text (one human-readable line per record)
//! - JSON (one object per line)

use std::io::{self, Write};

use chrono::{Local, TimeZone};
use serde_json::json;

use crate::analyzer::{ClientStat, NodeReport, SlowLogEntry};
use crate::cluster::NodeAddress;
use crate::config::OutputFormat;
use crate::utils::DiagError;

/// Render a unix timestamp as local `YYYY-MM-DD HH:MM:SS`
///
/// Timestamps outside chrono's range fall back to the raw number.
pub fn format_timestamp(timestamp: i64) -> String {
    match Local.timestamp_opt(timestamp, 0).earliest() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => timestamp.to_string(),
    }
}

/// Execution time in milliseconds with two decimals
pub fn format_duration_ms(exec_time_micros: u64) -> String {
    format!("{:.2}", exec_time_micros as f64 / 1000.0)
}

pub fn format_slowlog_line(entry: &SlowLogEntry) -> String {
    format!(
        "Time: {} | Duration: {} ms | Command: {}",
        format_timestamp(entry.timestamp),
        format_duration_ms(entry.exec_time_micros),
        entry.command.join(" ")
    )
}

pub fn format_client_line(stat: &ClientStat) -> String {
    format!("IP: {} | Connections: {}", stat.ip, stat.connections)
}

/// Writes report records to a sink in the configured format
///
/// Append-only: nothing written is ever taken back, so output produced
/// before a failure stays in the sink.
pub struct Reporter<W: Write> {
    out: W,
    format: OutputFormat,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W, format: OutputFormat) -> Self {
        Self { out, format }
    }

    /// Header for a node, written before its entries
    pub fn node(&mut self, node: &NodeReport, annotate_role: bool) -> Result<(), DiagError> {
        match self.format {
            OutputFormat::Text if annotate_role => {
                writeln!(self.out, "Node: {} (role: {})", node.address, node.role)?
            }
            OutputFormat::Text => writeln!(self.out, "Node: {}", node.address)?,
            OutputFormat::Json => {
                let mut record = json!({ "type": "node", "address": node.address });
                if annotate_role {
                    record["role"] = json!(node.role);
                }
                self.write_json(&record)?
            }
        }
        Ok(())
    }

    pub fn slowlog_entry(
        &mut self,
        node: &NodeAddress,
        entry: &SlowLogEntry,
    ) -> Result<(), DiagError> {
        match self.format {
            OutputFormat::Text => writeln!(self.out, "{}", format_slowlog_line(entry))?,
            OutputFormat::Json => self.write_json(&json!({
                "type": "slowlog",
                "node": node,
                "id": entry.id,
                "timestamp": entry.timestamp,
                "time": format_timestamp(entry.timestamp),
                "exec_time_us": entry.exec_time_micros,
                "duration_ms": entry.duration_ms(),
                "command": entry.command,
            }))?,
        }
        Ok(())
    }

    /// A node that failed under continue-on-error collection
    pub fn node_error(&mut self, node: &NodeAddress, error: &DiagError) -> Result<(), DiagError> {
        match self.format {
            OutputFormat::Text => writeln!(self.out, "Node: {} | Error: {}", node, error)?,
            OutputFormat::Json => self.write_json(&json!({
                "type": "error",
                "node": node,
                "error": error.to_string(),
            }))?,
        }
        Ok(())
    }

    pub fn client_stats(&mut self, stats: &[ClientStat]) -> Result<(), DiagError> {
        match self.format {
            OutputFormat::Text => {
                writeln!(self.out, "Client IP Statistics:")?;
                for stat in stats {
                    writeln!(self.out, "{}", format_client_line(stat))?;
                }
            }
            OutputFormat::Json => {
                for stat in stats {
                    self.write_json(&json!({
                        "type": "client",
                        "ip": stat.ip,
                        "connections": stat.connections,
                    }))?;
                }
            }
        }
        self.flush()
    }

    pub fn flush(&mut self) -> Result<(), DiagError> {
        self.out.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_json(&mut self, value: &serde_json::Value) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, value)?;
        self.out.write_all(b"\n")
    }
}
