/// A single RESP bulk-string argument: an owned, opaque byte blob.
///
/// Arguments are never re-encoded by the codec: whatever
/// bytes a caller hands in are the bytes that go on the wire between
/// `$<len>\r\n` and the trailing `\r\n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkString(Vec<u8>);

impl BulkString {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for BulkString {
    fn from(bytes: Vec<u8>) -> Self {
        BulkString(bytes)
    }
}

impl From<&[u8]> for BulkString {
    fn from(bytes: &[u8]) -> Self {
        BulkString(bytes.to_vec())
    }
}

impl From<&str> for BulkString {
    fn from(s: &str) -> Self {
        BulkString(s.as_bytes().to_vec())
    }
}

impl From<String> for BulkString {
    fn from(s: String) -> Self {
        BulkString(s.into_bytes())
    }
}

impl From<&String> for BulkString {
    fn from(s: &String) -> Self {
        BulkString(s.as_bytes().to_vec())
    }
}

impl From<i64> for BulkString {
    fn from(n: i64) -> Self {
        let mut buf = itoa::Buffer::new();
        BulkString(buf.format(n).as_bytes().to_vec())
    }
}

impl From<i32> for BulkString {
    fn from(n: i32) -> Self {
        BulkString::from(n as i64)
    }
}

impl From<u64> for BulkString {
    fn from(n: u64) -> Self {
        let mut buf = itoa::Buffer::new();
        BulkString(buf.format(n).as_bytes().to_vec())
    }
}

impl From<usize> for BulkString {
    fn from(n: usize) -> Self {
        BulkString::from(n as u64)
    }
}

impl From<f64> for BulkString {
    fn from(n: f64) -> Self {
        let mut buf = dtoa::Buffer::new();
        BulkString(buf.format(n).as_bytes().to_vec())
    }
}

impl std::fmt::Display for BulkString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}
