use super::Value;
use crate::{
    client::Charset,
    error::{Error, Result},
};
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// A total function from [`Value`] to a typed result.
///
/// Every implementor accepts a well-defined subset of [`Value`] shapes and
/// surfaces `Error::UnexpectedResponse` (or a more specific named error)
/// for everything else. None of them ever panic: "parsers are total
/// relative to their accepted set".
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self>;
}

/// `integer` — accepts `Integer`, rejects everything else.
impl FromValue for i64 {
    fn from_value(value: Value) -> Result<Self> {
        value.as_integer()
    }
}

impl FromValue for u64 {
    fn from_value(value: Value) -> Result<Self> {
        i64::from_value(value)?
            .try_into()
            .map_err(|_| Error::UnexpectedResponse("negative integer".into()))
    }
}

/// `boolean` — `Integer` must be exactly `0` or `1`; any other integer or
/// type is rejected.
impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self> {
        match value.as_integer()? {
            0 => Ok(false),
            1 => Ok(true),
            n => Err(Error::UnexpectedResponse(format!(
                "expected 0 or 1, got integer {n}"
            ))),
        }
    }
}

/// `simpleString` — only `SimpleString`.
pub fn simple_string(value: Value) -> Result<String> {
    match value {
        Value::SimpleString(s) => Ok(s),
        other => Err(Error::UnexpectedResponse(format!(
            "expected simple string, got {other:?}"
        ))),
    }
}

/// `expectOk` — `SimpleString == "OK"`, nothing else.
pub fn expect_ok(value: Value) -> Result<()> {
    match value {
        Value::SimpleString(ref s) if s == "OK" => Ok(()),
        other => Err(Error::UnexpectedResponse(format!(
            "expected +OK, got {other:?}"
        ))),
    }
}

/// `bulk` — `Bulk` or `Nil`, returned as raw bytes (`None` for nil).
pub fn bulk(value: Value) -> Result<Option<Vec<u8>>> {
    match value {
        Value::Bulk(b) => Ok(Some(b)),
        Value::Nil => Ok(None),
        other => Err(Error::UnexpectedResponse(format!(
            "expected bulk string, got {other:?}"
        ))),
    }
}

/// `string` — `SimpleString`, `Bulk`, or `Nil`, decoded through `charset`.
/// Raw-bytes callers should use [`bulk`] instead, which bypasses the
/// charset entirely.
pub fn string(value: Value, charset: Charset) -> Result<Option<String>> {
    let bytes = match value {
        Value::SimpleString(s) => return Ok(Some(s)),
        Value::Bulk(b) => b,
        Value::Nil => return Ok(None),
        other => {
            return Err(Error::UnexpectedResponse(format!(
                "expected string-like response, got {other:?}"
            )))
        }
    };
    charset.decode(&bytes).map(Some)
}

/// `double` — a `Bulk` response parseable as IEEE-754.
pub fn double(value: Value) -> Result<f64> {
    let bytes = value.as_bytes()?;
    let text = std::str::from_utf8(bytes)
        .map_err(|_| Error::UnexpectedResponse("non-UTF8 double response".into()))?;
    fast_float::parse(text)
        .map_err(|_| Error::UnexpectedResponse(format!("not a valid double: {text:?}")))
}

/// `nullableInteger` — `Integer` or `Nil`.
impl FromValue for Option<i64> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Nil => Ok(None),
            other => Ok(Some(other.as_integer()?)),
        }
    }
}

/// `array<T>` — `Array` (or `NilArray`, treated as empty) of elements each
/// parsed with `T::from_value`.
impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::NilArray => Ok(Vec::new()),
            Value::Array(items) => items.into_iter().map(T::from_value).collect(),
            other => Err(Error::UnexpectedResponse(format!(
                "expected array, got {other:?}"
            ))),
        }
    }
}

/// `set<T>` — `Array` whose elements parse as `T`; duplicates are merged
/// silently rather than rejected.
pub fn set<T>(value: Value) -> Result<HashSet<T>>
where
    T: FromValue + Eq + Hash,
{
    let items: Vec<T> = Vec::from_value(value)?;
    Ok(items.into_iter().collect())
}

/// `map<K,V>` — `Array` of even length, parsed as alternating key/value
/// pairs. Odd length is `UnexpectedResponse`; a repeated key is
/// `DuplicateField`.
pub fn map<K, V>(value: Value) -> Result<HashMap<K, V>>
where
    K: FromValue + Eq + Hash + std::fmt::Debug,
    V: FromValue,
{
    let items = match value {
        Value::NilArray => Vec::new(),
        Value::Array(items) => items,
        other => {
            return Err(Error::UnexpectedResponse(format!(
                "expected array, got {other:?}"
            )))
        }
    };

    if items.len() % 2 != 0 {
        return Err(Error::UnexpectedResponse(
            "map response had an odd number of elements".into(),
        ));
    }

    let mut map = HashMap::with_capacity(items.len() / 2);
    let mut it = items.into_iter();
    while let (Some(k), Some(v)) = (it.next(), it.next()) {
        let key = K::from_value(k)?;
        let value = V::from_value(v)?;
        if map.insert(key, value).is_some() {
            // Re-derive the display form only for the error message; the
            // key itself has already been moved into the map.
            return Err(Error::DuplicateField(
                "duplicate key in map response".into(),
            ));
        }
    }
    Ok(map)
}

/// `scanResult` — `Array[cursor, elements]` where `cursor` is a decimal
/// string. Returned as `(next_cursor, elements)`.
pub fn scan_result<T: FromValue>(value: Value) -> Result<(u64, Vec<T>)> {
    let items = match value {
        Value::Array(items) if items.len() == 2 => items,
        other => {
            return Err(Error::UnexpectedResponse(format!(
                "expected [cursor, elements], got {other:?}"
            )))
        }
    };
    let mut it = items.into_iter();
    let cursor_value = it.next().unwrap();
    let elements_value = it.next().unwrap();

    let cursor_bytes = cursor_value.as_bytes()?;
    let cursor_text = std::str::from_utf8(cursor_bytes)
        .map_err(|_| Error::UnexpectedResponse("non-UTF8 scan cursor".into()))?;
    let cursor: u64 = cursor_text
        .parse()
        .map_err(|_| Error::UnexpectedResponse(format!("invalid scan cursor: {cursor_text:?}")))?;

    let elements = Vec::<T>::from_value(elements_value)?;
    Ok((cursor, elements))
}

/// Identity conversion: lets command wrappers that want the raw [`Value`]
/// (e.g. `EXEC`'s own result) opt out of typed parsing entirely.
impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self> {
        Ok(value)
    }
}

impl FromValue for () {
    fn from_value(value: Value) -> Result<Self> {
        expect_ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_rejects_non_integer() {
        assert!(i64::from_value(Value::SimpleString("OK".into())).is_err());
    }

    #[test]
    fn boolean_accepts_zero_and_one_only() {
        assert_eq!(bool::from_value(Value::Integer(0)).unwrap(), false);
        assert_eq!(bool::from_value(Value::Integer(1)).unwrap(), true);
        assert!(bool::from_value(Value::Integer(2)).is_err());
        assert!(bool::from_value(Value::SimpleString("OK".into())).is_err());
    }

    #[test]
    fn nullable_integer_accepts_nil() {
        assert_eq!(Option::<i64>::from_value(Value::Nil).unwrap(), None);
        assert_eq!(Option::<i64>::from_value(Value::Integer(5)).unwrap(), Some(5));
    }

    #[test]
    fn expect_ok_rejects_anything_else() {
        assert!(expect_ok(Value::SimpleString("OK".into())).is_ok());
        assert!(expect_ok(Value::SimpleString("QUEUED".into())).is_err());
        assert!(expect_ok(Value::Nil).is_err());
    }

    #[test]
    fn array_of_integers() {
        let value = Value::Array(vec![Value::Integer(1), Value::Integer(2)]);
        assert_eq!(Vec::<i64>::from_value(value).unwrap(), vec![1, 2]);
    }

    #[test]
    fn nil_array_parses_as_empty_vec() {
        assert_eq!(Vec::<i64>::from_value(Value::NilArray).unwrap(), Vec::<i64>::new());
    }

    #[test]
    fn set_merges_duplicates_silently() {
        let value = Value::Array(vec![
            Value::Integer(1),
            Value::Integer(1),
            Value::Integer(2),
        ]);
        let s = set::<i64>(value).unwrap();
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn map_rejects_odd_length() {
        let value = Value::Array(vec![Value::Integer(1)]);
        assert!(map::<i64, i64>(value).is_err());
    }

    #[test]
    fn map_rejects_duplicate_keys() {
        let value = Value::Array(vec![
            Value::Integer(1),
            Value::Integer(10),
            Value::Integer(1),
            Value::Integer(20),
        ]);
        match map::<i64, i64>(value) {
            Err(Error::DuplicateField(_)) => (),
            other => panic!("expected DuplicateField, got {other:?}"),
        }
    }

    #[test]
    fn double_parses_bulk_as_float() {
        let value = Value::Bulk(b"3.14".to_vec());
        assert!((double(value).unwrap() - 3.14).abs() < 1e-9);
    }

    #[test]
    fn double_rejects_garbage() {
        let value = Value::Bulk(b"not-a-number".to_vec());
        assert!(double(value).is_err());
    }

    #[test]
    fn scan_result_parses_cursor_and_elements() {
        let value = Value::Array(vec![
            Value::Bulk(b"42".to_vec()),
            Value::Array(vec![Value::Bulk(b"a".to_vec()), Value::Bulk(b"b".to_vec())]),
        ]);
        let (cursor, elements) = scan_result::<Vec<u8>>(value).unwrap();
        assert_eq!(cursor, 42);
        assert_eq!(elements, vec![b"a".to_vec(), b"b".to_vec()]);
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: Value) -> Result<Self> {
        value.as_bytes().map(|b| b.to_vec())
    }
}

/// `String` decodes `SimpleString`/`Bulk` as UTF-8 (the default charset);
/// use [`string`] directly when a non-default [`Charset`] is configured,
/// and `Option<String>` below when `Nil` is an acceptable response.
impl FromValue for String {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::SimpleString(s) => Ok(s),
            Value::Bulk(b) => String::from_utf8(b)
                .map_err(|_| Error::UnexpectedResponse("non-UTF8 bulk string".into())),
            other => Err(Error::UnexpectedResponse(format!(
                "expected string-like response, got {other:?}"
            ))),
        }
    }
}

impl FromValue for Option<String> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Nil | Value::NilArray => Ok(None),
            other => String::from_value(other).map(Some),
        }
    }
}
