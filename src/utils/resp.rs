//! RESP2 (Redis Serialization Protocol) codec
//!
//! Only what the admin commands need: commands are encoded as arrays of
//! bulk strings, replies are decoded into a generic [`RespValue`] tree that
//! the reply parsers then give a shape to.

use std::io::{self, BufRead};

/// Largest bulk string accepted, matching the server's default `proto-max-bulk-len`
pub const MAX_BULK_LEN: i64 = 512 * 1024 * 1024;

/// Upper bound on array capacity reserved before elements arrive
const MAX_PREALLOC_ELEMENTS: usize = 1024;

/// Decoded reply value
#[derive(Debug, Clone, PartialEq)]
pub enum RespValue {
    /// Simple string (+OK\r\n)
    SimpleString(String),
    /// Error (-ERR message\r\n)
    Error(String),
    /// Integer (:1000\r\n)
    Integer(i64),
    /// Bulk string ($6\r\nfoobar\r\n)
    BulkString(Vec<u8>),
    /// Null bulk string or null array ($-1\r\n, *-1\r\n)
    Null,
    /// Array (*2\r\n...)
    Array(Vec<RespValue>),
}

impl RespValue {
    /// Shorthand for building bulk string replies
    pub fn bulk(s: impl AsRef<[u8]>) -> Self {
        RespValue::BulkString(s.as_ref().to_vec())
    }

    /// Get as string (simple string or UTF-8 bulk string)
    pub fn as_str(&self) -> Option<&str> {
        match self {
            RespValue::SimpleString(s) => Some(s),
            RespValue::BulkString(b) => std::str::from_utf8(b).ok(),
            _ => None,
        }
    }

    /// Get as integer
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            RespValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as array
    pub fn as_array(&self) -> Option<&[RespValue]> {
        match self {
            RespValue::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Render a string-ish value, replacing invalid UTF-8
    pub fn to_text_lossy(&self) -> Option<String> {
        match self {
            RespValue::SimpleString(s) => Some(s.clone()),
            RespValue::BulkString(b) => Some(String::from_utf8_lossy(b).into_owned()),
            RespValue::Integer(i) => Some(i.to_string()),
            _ => None,
        }
    }

    /// Short shape description used in protocol error messages
    pub fn kind(&self) -> String {
        match self {
            RespValue::SimpleString(_) => "simple string".to_string(),
            RespValue::Error(e) => format!("error ({})", e),
            RespValue::Integer(i) => format!("integer ({})", i),
            RespValue::BulkString(b) => format!("bulk string ({} bytes)", b.len()),
            RespValue::Null => "null".to_string(),
            RespValue::Array(a) => format!("array ({} elements)", a.len()),
        }
    }
}

/// RESP command encoder with a reusable buffer
pub struct RespEncoder {
    buf: Vec<u8>,
}

impl RespEncoder {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Encode a command as RESP array of bulk strings
    pub fn encode_command(&mut self, args: &[&str]) {
        self.buf.push(b'*');
        self.write_int(args.len() as i64);
        self.buf.extend_from_slice(b"\r\n");

        for arg in args {
            self.buf.push(b'$');
            self.write_int(arg.len() as i64);
            self.buf.extend_from_slice(b"\r\n");
            self.buf.extend_from_slice(arg.as_bytes());
            self.buf.extend_from_slice(b"\r\n");
        }
    }

    #[inline]
    fn write_int(&mut self, value: i64) {
        let mut buffer = itoa::Buffer::new();
        self.buf.extend_from_slice(buffer.format(value).as_bytes());
    }
}

/// Streaming RESP decoder
pub struct RespDecoder<R> {
    reader: R,
    line_buf: String,
}

impl<R: BufRead> RespDecoder<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_buf: String::with_capacity(256),
        }
    }

    /// Decode the next reply from the stream
    pub fn decode(&mut self) -> io::Result<RespValue> {
        self.line_buf.clear();
        self.reader.read_line(&mut self.line_buf)?;

        if self.line_buf.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "Connection closed",
            ));
        }

        let line = self.line_buf.trim_end_matches(&['\r', '\n'][..]);
        let type_byte = match line.as_bytes().first() {
            Some(&b) => b,
            None => return Err(invalid_data("Empty RESP line")),
        };
        // Non-ASCII type bytes leave no char boundary at 1 and fall through to the error arm
        let content = line.get(1..).unwrap_or_default();

        match type_byte {
            b'+' => Ok(RespValue::SimpleString(content.to_string())),
            b'-' => Ok(RespValue::Error(content.to_string())),
            b':' => content
                .parse()
                .map(RespValue::Integer)
                .map_err(|_| invalid_data("Invalid integer")),
            b'$' => {
                let len: i64 = content
                    .parse()
                    .map_err(|_| invalid_data("Invalid bulk string length"))?;
                if len < 0 {
                    return Ok(RespValue::Null);
                }
                if len > MAX_BULK_LEN {
                    return Err(invalid_data(&format!("Bulk string length {} too large", len)));
                }

                let mut data = vec![0u8; len as usize];
                self.reader.read_exact(&mut data)?;
                let mut crlf = [0u8; 2];
                self.reader.read_exact(&mut crlf)?;

                Ok(RespValue::BulkString(data))
            }
            b'*' => {
                let count: i64 = content
                    .parse()
                    .map_err(|_| invalid_data("Invalid array length"))?;
                if count < 0 {
                    return Ok(RespValue::Null);
                }

                let mut elements = Vec::with_capacity((count as usize).min(MAX_PREALLOC_ELEMENTS));
                for _ in 0..count {
                    elements.push(self.decode()?);
                }
                Ok(RespValue::Array(elements))
            }
            other => Err(invalid_data(&format!(
                "Invalid RESP type byte: {}",
                other as char
            ))),
        }
    }
}

fn invalid_data(msg: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn decode(data: &[u8]) -> io::Result<RespValue> {
        RespDecoder::new(Cursor::new(data)).decode()
    }

    #[test]
    fn test_encode_slowlog_get() {
        let mut encoder = RespEncoder::with_capacity(64);
        encoder.encode_command(&["SLOWLOG", "GET", "10"]);
        assert_eq!(
            encoder.as_bytes(),
            b"*3\r\n$7\r\nSLOWLOG\r\n$3\r\nGET\r\n$2\r\n10\r\n"
        );
    }

    #[test]
    fn test_decode_error() {
        let value = decode(b"-ERR This instance has cluster support disabled\r\n").unwrap();
        assert_eq!(
            value,
            RespValue::Error("ERR This instance has cluster support disabled".to_string())
        );
    }

    #[test]
    fn test_decode_slowlog_entry() {
        let data = b"*1\r\n*4\r\n:14\r\n:1309448221\r\n:15\r\n*2\r\n$4\r\nping\r\n$1\r\nx\r\n";
        let value = decode(data).unwrap();
        assert_eq!(
            value,
            RespValue::Array(vec![RespValue::Array(vec![
                RespValue::Integer(14),
                RespValue::Integer(1309448221),
                RespValue::Integer(15),
                RespValue::Array(vec![RespValue::bulk("ping"), RespValue::bulk("x")]),
            ])])
        );
    }

    #[test]
    fn test_decode_null_bulk_and_array() {
        assert_eq!(decode(b"$-1\r\n").unwrap(), RespValue::Null);
        assert_eq!(decode(b"*-1\r\n").unwrap(), RespValue::Null);
    }

    #[test]
    fn test_decode_closed_stream() {
        let err = decode(b"").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_decode_bad_type_byte() {
        let err = decode(b"?what\r\n").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_oversized_headers_are_rejected() {
        let err = decode(b"*9223372036854775807\r\n").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);

        let err = decode(b"$9223372036854775807\r\n").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);

        let header = format!("${}\r\n", MAX_BULK_LEN + 1);
        let err = decode(header.as_bytes()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_lossy_text() {
        let value = RespValue::BulkString(vec![b'a', 0xff, b'b']);
        assert_eq!(value.as_str(), None);
        assert_eq!(value.to_text_lossy().unwrap(), "a\u{fffd}b");
    }
}
