use crate::{Error, Result};
use std::fmt;

/// A fully-parsed RESP value.
///
/// Every variant owns its data: no reference into the decoder's input
/// buffer survives a parse boundary. Nested arrays are kept as
/// `Array(Vec<Value>)` rather than flattened, but every accessor below
/// works uniformly whether a downstream parser treats an element as bytes,
/// an integer, or a nested array.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    SimpleString(String),
    Error(String, String),
    Integer(i64),
    Bulk(Vec<u8>),
    Nil,
    Array(Vec<Value>),
    NilArray,
}

impl Value {
    pub fn ok() -> Value {
        Value::SimpleString("OK".to_string())
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Value::SimpleString(s) if s == "OK")
    }

    pub fn is_queued(&self) -> bool {
        matches!(self, Value::SimpleString(s) if s == "QUEUED")
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil | Value::NilArray)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_, _))
    }

    /// Converts a `-CODE message` response into the matching [`Error`],
    /// or `None` if this value isn't an error.
    pub fn as_error(&self) -> Option<Error> {
        match self {
            Value::Error(code, message) => Some(Error::Server {
                code: code.clone(),
                message: message.clone(),
            }),
            _ => None,
        }
    }

    /// "the array's i-th element, as bytes".
    pub fn element_as_bytes(&self, index: usize) -> Result<&[u8]> {
        self.element(index)?.as_bytes()
    }

    /// "the array's i-th element, as integer".
    pub fn element_as_integer(&self, index: usize) -> Result<i64> {
        self.element(index)?.as_integer()
    }

    /// "the array's i-th element, as array".
    pub fn element_as_array(&self, index: usize) -> Result<&[Value]> {
        self.element(index)?.as_array()
    }

    fn element(&self, index: usize) -> Result<&Value> {
        match self {
            Value::Array(items) => items.get(index).ok_or_else(|| {
                Error::UnexpectedResponse(format!("index {index} out of bounds"))
            }),
            other => Err(unexpected("Array", other)),
        }
    }

    pub fn as_bytes(&self) -> Result<&[u8]> {
        match self {
            Value::Bulk(b) => Ok(b),
            Value::SimpleString(s) => Ok(s.as_bytes()),
            other => Err(unexpected("Bulk", other)),
        }
    }

    pub fn as_integer(&self) -> Result<i64> {
        match self {
            Value::Integer(n) => Ok(*n),
            other => Err(unexpected("Integer", other)),
        }
    }

    pub fn as_array(&self) -> Result<&[Value]> {
        match self {
            Value::Array(items) => Ok(items),
            other => Err(unexpected("Array", other)),
        }
    }

    pub fn len(&self) -> Result<usize> {
        match self {
            Value::Array(items) => Ok(items.len()),
            other => Err(unexpected("Array", other)),
        }
    }
}

fn unexpected(expected: &str, found: &Value) -> Error {
    Error::UnexpectedResponse(format!("expected {expected}, got {found:?}"))
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::SimpleString(s) => write!(f, "+{s}"),
            Value::Error(code, message) => write!(f, "-{code} {message}"),
            Value::Integer(n) => write!(f, ":{n}"),
            Value::Bulk(b) => write!(f, "${}", String::from_utf8_lossy(b)),
            Value::Nil => f.write_str("$-1"),
            Value::NilArray => f.write_str("*-1"),
            Value::Array(items) => {
                write!(f, "*{}[", items.len())?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}
