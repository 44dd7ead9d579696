//! Report rendering

pub mod reporter;

pub use reporter::{
    format_client_line, format_duration_ms, format_slowlog_line, format_timestamp, Reporter,
};
