//! RESP2 reply parser and request encoder
//!
//! Requests are always arrays of bulk strings. Replies may be any RESP2
//! type:
//! - Simple Strings (+) → `Reply::Status`
//! - Errors (-) → `Reply::Error`
//! - Integers (:) → `Reply::Int`
//! - Bulk Strings ($) → `Reply::Bulk`, `$-1` → `Reply::Nil`
//! - Arrays (*) → `Reply::Array`, `*-1` → `Reply::Nil`

use bytes::{BufMut, BytesMut};
use sugar_core::Reply;

/// Maximum nesting depth for arrays
pub const MAX_NESTING_DEPTH: usize = 32;

/// Maximum bulk string size (512MB)
pub const MAX_BULK_SIZE: usize = 512 * 1024 * 1024;

/// Maximum array elements
pub const MAX_ELEMENTS: usize = 1_000_000;

/// Outcome of parsing one reply from a buffer
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed {
    /// A full reply and the number of bytes it occupied
    Complete(Reply, usize),
    /// The buffer ends mid-reply
    Incomplete,
    /// The bytes are not valid RESP2
    Invalid(String),
}

/// Parse one reply from the front of `data`
pub fn parse_reply(data: &[u8]) -> Parsed {
    parse_value(data, 0)
}

fn find_crlf(data: &[u8]) -> Option<usize> {
    data.windows(2).position(|w| w == b"\r\n")
}

/// Header line after the type byte: (text, bytes consumed including prefix and CRLF)
fn line(data: &[u8]) -> Option<(&[u8], usize)> {
    find_crlf(&data[1..]).map(|pos| (&data[1..1 + pos], pos + 3))
}

fn parse_len(text: &[u8]) -> Result<i64, String> {
    std::str::from_utf8(text)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| format!("invalid length '{}'", String::from_utf8_lossy(text)))
}

fn parse_value(data: &[u8], depth: usize) -> Parsed {
    if data.is_empty() {
        return Parsed::Incomplete;
    }
    if depth > MAX_NESTING_DEPTH {
        return Parsed::Invalid("maximum nesting depth exceeded".to_string());
    }
    let Some((text, header_len)) = line(data) else {
        return Parsed::Incomplete;
    };

    match data[0] {
        b'+' => Parsed::Complete(
            Reply::Status(String::from_utf8_lossy(text).into_owned()),
            header_len,
        ),
        b'-' => Parsed::Complete(
            Reply::Error(String::from_utf8_lossy(text).into_owned()),
            header_len,
        ),
        b':' => match parse_len(text) {
            Ok(n) => Parsed::Complete(Reply::Int(n), header_len),
            Err(_) => Parsed::Invalid("invalid integer".to_string()),
        },
        b'$' => {
            let len = match parse_len(text) {
                Ok(-1) => return Parsed::Complete(Reply::Nil, header_len),
                Ok(n) if n >= 0 => n as usize,
                Ok(_) => return Parsed::Invalid("invalid bulk string length".to_string()),
                Err(e) => return Parsed::Invalid(e),
            };
            if len > MAX_BULK_SIZE {
                return Parsed::Invalid(format!(
                    "bulk string too large: {} > {}",
                    len, MAX_BULK_SIZE
                ));
            }
            let end = header_len + len;
            if data.len() < end + 2 {
                return Parsed::Incomplete;
            }
            if &data[end..end + 2] != b"\r\n" {
                return Parsed::Invalid("missing CRLF after bulk string".to_string());
            }
            Parsed::Complete(Reply::Bulk(data[header_len..end].to_vec()), end + 2)
        }
        b'*' => {
            let len = match parse_len(text) {
                Ok(-1) => return Parsed::Complete(Reply::Nil, header_len),
                Ok(n) if n >= 0 => n as usize,
                Ok(_) => return Parsed::Invalid("invalid array length".to_string()),
                Err(e) => return Parsed::Invalid(e),
            };
            if len > MAX_ELEMENTS {
                return Parsed::Invalid(format!("array too large: {} > {}", len, MAX_ELEMENTS));
            }
            let mut items = Vec::with_capacity(len.min(1024));
            let mut offset = header_len;
            for _ in 0..len {
                match parse_value(&data[offset..], depth + 1) {
                    Parsed::Complete(item, used) => {
                        items.push(item);
                        offset += used;
                    }
                    other => return other,
                }
            }
            Parsed::Complete(Reply::Array(items), offset)
        }
        other => Parsed::Invalid(format!("unexpected type byte 0x{:02x}", other)),
    }
}

/// Append one request (array of bulk strings) to `buf`
pub fn encode_request(args: &[Vec<u8>], buf: &mut BytesMut) {
    buf.put_u8(b'*');
    buf.put_slice(args.len().to_string().as_bytes());
    buf.put_slice(b"\r\n");
    for arg in args {
        buf.put_u8(b'$');
        buf.put_slice(arg.len().to_string().as_bytes());
        buf.put_slice(b"\r\n");
        buf.put_slice(arg);
        buf.put_slice(b"\r\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete(data: &[u8]) -> Reply {
        match parse_reply(data) {
            Parsed::Complete(reply, used) => {
                assert_eq!(used, data.len());
                reply
            }
            other => panic!("expected complete reply, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_scalars() {
        assert_eq!(complete(b"+OK\r\n"), Reply::Status("OK".into()));
        assert_eq!(
            complete(b"-ERR no such key\r\n"),
            Reply::Error("ERR no such key".into())
        );
        assert_eq!(complete(b":-42\r\n"), Reply::Int(-42));
        assert_eq!(complete(b"$3\r\nabc\r\n"), Reply::bulk("abc"));
        assert_eq!(complete(b"$0\r\n\r\n"), Reply::bulk(""));
        assert_eq!(complete(b"$-1\r\n"), Reply::Nil);
        assert_eq!(complete(b"*-1\r\n"), Reply::Nil);
    }

    #[test]
    fn test_parse_nested_array() {
        let reply = complete(b"*2\r\n$1\r\n0\r\n*2\r\n$1\r\na\r\n$1\r\nb\r\n");
        assert_eq!(
            reply,
            Reply::Array(vec![
                Reply::bulk("0"),
                Reply::Array(vec![Reply::bulk("a"), Reply::bulk("b")])
            ])
        );
    }

    #[test]
    fn test_incomplete() {
        assert_eq!(parse_reply(b""), Parsed::Incomplete);
        assert_eq!(parse_reply(b"+OK"), Parsed::Incomplete);
        assert_eq!(parse_reply(b"$5\r\nab"), Parsed::Incomplete);
        assert_eq!(parse_reply(b"*2\r\n:1\r\n"), Parsed::Incomplete);
    }

    #[test]
    fn test_leaves_trailing_bytes() {
        match parse_reply(b":1\r\n:2\r\n") {
            Parsed::Complete(Reply::Int(1), 4) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_invalid() {
        assert!(matches!(parse_reply(b"?x\r\n"), Parsed::Invalid(_)));
        assert!(matches!(parse_reply(b":abc\r\n"), Parsed::Invalid(_)));
        assert!(matches!(parse_reply(b"$3\r\nabcd\r\n"), Parsed::Invalid(_)));
    }

    #[test]
    fn test_binary_safe_bulk() {
        let reply = complete(b"$4\r\n\r\n\0\xff\r\n");
        assert_eq!(reply, Reply::Bulk(vec![b'\r', b'\n', 0, 0xff]));
    }

    #[test]
    fn test_encode_request() {
        let mut buf = BytesMut::new();
        encode_request(&[b"GET".to_vec(), b"k".to_vec()], &mut buf);
        assert_eq!(&buf[..], b"*2\r\n$3\r\nGET\r\n$1\r\nk\r\n");
    }
}
