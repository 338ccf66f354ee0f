use super::{Command, Value};
use crate::{Error, Result};
use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

/// Bidirectional RESP v2 codec: encodes [`Command`]s as
/// outgoing bytes and decodes incoming bytes into a stream of [`Value`]s.
///
/// The decoder is stateless beyond the partial-frame buffer `tokio_util`
/// already gives every [`Decoder`]: `decode` is handed whatever bytes have
/// arrived so far and, on a short read, returns `Ok(None)` without
/// consuming anything, so the next call resumes from byte zero of the same
/// (now longer) buffer.
#[derive(Debug, Default)]
pub struct RespCodec;

impl Encoder<Command> for RespCodec {
    type Error = Error;

    fn encode(&mut self, command: Command, dst: &mut BytesMut) -> Result<()> {
        let words: Vec<&str> = command.name_words().collect();
        let total_args = words.len() + command.num_args();

        dst.put_u8(b'*');
        write_decimal(dst, total_args as i64);
        dst.put_slice(b"\r\n");

        for word in words {
            write_bulk(dst, word.as_bytes());
        }
        for arg in command.iter_args() {
            write_bulk(dst, arg.as_bytes());
        }

        Ok(())
    }
}

fn write_bulk(dst: &mut BytesMut, bytes: &[u8]) {
    dst.put_u8(b'$');
    write_decimal(dst, bytes.len() as i64);
    dst.put_slice(b"\r\n");
    dst.put_slice(bytes);
    dst.put_slice(b"\r\n");
}

fn write_decimal(dst: &mut BytesMut, n: i64) {
    let mut buf = itoa::Buffer::new();
    dst.put_slice(buf.format(n).as_bytes());
}

impl Decoder for RespCodec {
    type Item = Value;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Value>> {
        match try_parse(src)? {
            Some((value, consumed)) => {
                src.advance(consumed);
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }
}

/// Tries to parse exactly one [`Value`] from the front of `buf`. Returns
/// `Ok(None)` (without borrowing past the end of `buf`) when more bytes are
/// needed; recurses for nested arrays so a short read anywhere in the tree
/// simply bubbles up as `Ok(None)` for the whole frame.
fn try_parse(buf: &[u8]) -> Result<Option<(Value, usize)>> {
    if buf.is_empty() {
        return Ok(None);
    }

    let tag = buf[0];
    let rest = &buf[1..];

    match tag {
        b'+' => Ok(parse_line(rest)?.map(|(line, len)| (Value::SimpleString(line.to_string()), 1 + len))),
        b'-' => Ok(parse_line(rest)?.map(|(line, len)| {
            let (code, message) = split_error(line);
            (Value::Error(code, message), 1 + len)
        })),
        b':' => match parse_line(rest)? {
            Some((line, len)) => {
                let n = parse_integer(line)?;
                Ok(Some((Value::Integer(n), 1 + len)))
            }
            None => Ok(None),
        },
        b'$' => match parse_line(rest)? {
            Some((line, len)) => {
                let size = parse_integer(line)?;
                if size == -1 {
                    return Ok(Some((Value::Nil, 1 + len)));
                }
                if size < -1 {
                    return Err(Error::Parse(format!("negative bulk length: {size}")));
                }
                let size = size as usize;
                let header_len = 1 + len;
                let total_len = header_len + size + 2;
                if buf.len() < total_len {
                    return Ok(None);
                }
                let data = buf[header_len..header_len + size].to_vec();
                if &buf[header_len + size..total_len] != b"\r\n" {
                    return Err(Error::Parse("bulk string missing trailing CRLF".into()));
                }
                Ok(Some((Value::Bulk(data), total_len)))
            }
            None => Ok(None),
        },
        b'*' => match parse_line(rest)? {
            Some((line, len)) => {
                let count = parse_integer(line)?;
                if count == -1 {
                    return Ok(Some((Value::NilArray, 1 + len)));
                }
                if count < -1 {
                    return Err(Error::Parse(format!("negative array length: {count}")));
                }
                let mut consumed = 1 + len;
                let mut items = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    match try_parse(&buf[consumed..])? {
                        Some((value, item_len)) => {
                            items.push(value);
                            consumed += item_len;
                        }
                        None => return Ok(None),
                    }
                }
                Ok(Some((Value::Array(items), consumed)))
            }
            None => Ok(None),
        },
        other => Err(Error::Parse(format!(
            "unrecognized RESP type prefix: {:?}",
            other as char
        ))),
    }
}

/// Finds the line terminated by `\r\n` at the front of `buf`. Returns the
/// line (without the terminator) and the total byte length including the
/// terminator, or `None` if `buf` doesn't contain a full line yet.
fn parse_line(buf: &[u8]) -> Result<Option<(&str, usize)>> {
    let Some(pos) = buf.windows(2).position(|w| w == b"\r\n") else {
        return Ok(None);
    };
    let line = std::str::from_utf8(&buf[..pos])
        .map_err(|_| Error::Parse("non-UTF8 line in RESP frame".into()))?;
    Ok(Some((line, pos + 2)))
}

fn parse_integer(line: &str) -> Result<i64> {
    atoi::atoi::<i64>(line.trim().as_bytes())
        .ok_or_else(|| Error::Parse(format!("expected integer, got {line:?}")))
}

fn split_error(line: &str) -> (String, String) {
    match line.split_once(' ') {
        Some((code, message)) => (code.to_string(), message.to_string()),
        None => (line.to_string(), String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(bytes: &[u8]) -> Vec<Value> {
        let mut codec = RespCodec;
        let mut buf = BytesMut::from(bytes);
        let mut out = Vec::new();
        while let Some(v) = codec.decode(&mut buf).unwrap() {
            out.push(v);
        }
        out
    }

    #[test]
    fn decodes_simple_string() {
        assert_eq!(
            decode_all(b"+PONG\r\n"),
            vec![Value::SimpleString("PONG".into())]
        );
    }

    #[test]
    fn decodes_error_with_code_and_message() {
        assert_eq!(
            decode_all(b"-WRONGTYPE Operation against a wrong kind of value\r\n"),
            vec![Value::Error(
                "WRONGTYPE".into(),
                "Operation against a wrong kind of value".into()
            )]
        );
    }

    #[test]
    fn decodes_integer() {
        assert_eq!(decode_all(b":1000\r\n"), vec![Value::Integer(1000)]);
    }

    #[test]
    fn decodes_negative_integer() {
        assert_eq!(decode_all(b":-1\r\n"), vec![Value::Integer(-1)]);
    }

    #[test]
    fn decodes_nil_bulk() {
        assert_eq!(decode_all(b"$-1\r\n"), vec![Value::Nil]);
    }

    #[test]
    fn decodes_bulk_string() {
        assert_eq!(
            decode_all(b"$5\r\nhello\r\n"),
            vec![Value::Bulk(b"hello".to_vec())]
        );
    }

    #[test]
    fn decodes_bulk_string_with_embedded_crlf() {
        assert_eq!(
            decode_all(b"$6\r\nfoo\r\nb\r\n"),
            vec![Value::Bulk(b"foo\r\nb".to_vec())]
        );
    }

    #[test]
    fn decodes_nil_array() {
        assert_eq!(decode_all(b"*-1\r\n"), vec![Value::NilArray]);
    }

    #[test]
    fn decodes_nested_array() {
        let bytes = b"*2\r\n:1\r\n*2\r\n:2\r\n:3\r\n";
        assert_eq!(
            decode_all(bytes),
            vec![Value::Array(vec![
                Value::Integer(1),
                Value::Array(vec![Value::Integer(2), Value::Integer(3)])
            ])]
        );
    }

    #[test]
    fn resumes_across_short_reads() {
        let mut codec = RespCodec;
        let mut buf = BytesMut::from(&b"$5\r\nhel"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        buf.extend_from_slice(b"lo\r\n");
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(Value::Bulk(b"hello".to_vec()))
        );
    }

    #[test]
    fn resumes_mid_line() {
        let mut codec = RespCodec;
        let mut buf = BytesMut::from(&b"+PO"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        buf.extend_from_slice(b"NG\r\n");
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(Value::SimpleString("PONG".into()))
        );
    }

    #[test]
    fn malformed_prefix_is_fatal() {
        let mut codec = RespCodec;
        let mut buf = BytesMut::from(&b"!oops\r\n"[..]);
        assert!(codec.decode(&mut buf).is_err());
    }

    #[test]
    fn bad_length_is_fatal() {
        let mut codec = RespCodec;
        let mut buf = BytesMut::from(&b"$-5\r\n"[..]);
        assert!(codec.decode(&mut buf).is_err());
    }

    #[test]
    fn encodes_command_with_name_and_args() {
        use super::super::cmd;
        let mut codec = RespCodec;
        let mut buf = BytesMut::new();
        codec
            .encode(cmd("SET").arg("key").arg("value"), &mut buf)
            .unwrap();
        assert_eq!(&buf[..], b"*3\r\n$3\r\nSET\r\n$3\r\nkey\r\n$5\r\nvalue\r\n");
    }

    #[test]
    fn encodes_multi_word_opcode_as_two_arguments() {
        use super::super::cmd;
        let mut codec = RespCodec;
        let mut buf = BytesMut::new();
        codec
            .encode(cmd("CLIENT SETNAME").arg("conn1"), &mut buf)
            .unwrap();
        assert_eq!(
            &buf[..],
            b"*3\r\n$6\r\nCLIENT\r\n$7\r\nSETNAME\r\n$5\r\nconn1\r\n"
        );
    }

    #[test]
    fn round_trip_encode_decode_preserves_args() {
        use super::super::cmd;
        let mut codec = RespCodec;
        let mut buf = BytesMut::new();
        codec
            .encode(cmd("MSET").arg("a").arg("1").arg("b").arg("2"), &mut buf)
            .unwrap();

        // decode it back as a generic array-of-bulks, the way a replaying
        // test double would see the bytes we wrote on the wire.
        let mut decode_buf = BytesMut::from(&buf[..]);
        let value = codec.decode(&mut decode_buf).unwrap().unwrap();
        let Value::Array(items) = value else {
            panic!("expected array")
        };
        let strings: Vec<String> = items
            .iter()
            .map(|v| String::from_utf8(v.as_bytes().unwrap().to_vec()).unwrap())
            .collect();
        assert_eq!(strings, vec!["MSET", "a", "1", "b", "2"]);
    }
}
