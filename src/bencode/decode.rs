use super::error::BencodeError;
use super::value::Value;
use bytes::Bytes;
use std::collections::BTreeMap;

const MAX_DEPTH: usize = 64;

/// Decodes a single bencode value that must span the entire input.
///
/// # Errors
///
/// Fails on malformed input or if any bytes remain after the root value.
/// No partially decoded value is ever returned.
pub fn decode(data: &[u8]) -> Result<Value, BencodeError> {
    let mut decoder = Decoder::new(data);
    let value = decoder.decode_next()?;

    if !decoder.is_empty() {
        return Err(BencodeError::TrailingData {
            offset: decoder.position(),
        });
    }

    Ok(value)
}

/// A bencode reader over a byte buffer with an explicit cursor.
///
/// Use [`decode`] for whole-buffer decoding; the decoder itself allows
/// reading consecutive values out of one buffer.
pub struct Decoder<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current cursor position.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns true once the cursor has reached the end of the buffer.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Decodes the value starting at the cursor and advances past it.
    pub fn decode_next(&mut self) -> Result<Value, BencodeError> {
        self.decode_value(0)
    }

    fn peek(&self) -> Result<u8, BencodeError> {
        self.data
            .get(self.pos)
            .copied()
            .ok_or(BencodeError::UnexpectedEof { offset: self.pos })
    }

    fn decode_value(&mut self, depth: usize) -> Result<Value, BencodeError> {
        if depth > MAX_DEPTH {
            return Err(BencodeError::NestingTooDeep { offset: self.pos });
        }

        match self.peek()? {
            b'i' => self.decode_integer(),
            b'l' => self.decode_list(depth),
            b'd' => self.decode_dict(depth),
            b'0'..=b'9' => self.decode_bytes().map(Value::Bytes),
            c => Err(BencodeError::InvalidTypeTag {
                offset: self.pos,
                tag: c as char,
            }),
        }
    }

    /// Advances until `delim` and returns the bytes before it, leaving the
    /// cursor on the delimiter.
    fn take_until(&mut self, delim: u8) -> Result<&'a [u8], BencodeError> {
        let data = self.data;
        let start = self.pos;
        let len = data[start..]
            .iter()
            .position(|&b| b == delim)
            .ok_or(BencodeError::UnexpectedEof { offset: data.len() })?;
        self.pos = start + len;
        Ok(&data[start..start + len])
    }

    fn decode_integer(&mut self) -> Result<Value, BencodeError> {
        self.pos += 1;
        let start = self.pos;
        let digits = self.take_until(b'e')?;

        let invalid = |reason: &str| BencodeError::InvalidInteger {
            offset: start,
            reason: reason.into(),
        };

        let unsigned = digits.strip_prefix(b"-").unwrap_or(digits);
        if unsigned.is_empty() {
            return Err(invalid("empty"));
        }
        if !unsigned.iter().all(u8::is_ascii_digit) {
            return Err(invalid("non-digit character"));
        }
        if unsigned.len() > 1 && unsigned[0] == b'0' {
            return Err(invalid("leading zeros"));
        }
        if digits.len() != unsigned.len() && unsigned == b"0" {
            return Err(invalid("negative zero"));
        }

        // Only ASCII digits and an optional sign remain.
        let text = std::str::from_utf8(digits).map_err(|_| invalid("invalid utf8"))?;
        let value: i64 = text.parse().map_err(|_| invalid("out of range"))?;

        self.pos += 1;
        Ok(Value::Integer(value))
    }

    fn decode_bytes(&mut self) -> Result<Bytes, BencodeError> {
        let start = self.pos;
        let digits = self.take_until(b':')?;

        if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
            return Err(BencodeError::InvalidStringLength { offset: start });
        }

        let len: usize = std::str::from_utf8(digits)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or(BencodeError::InvalidStringLength { offset: start })?;

        self.pos += 1;

        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or(BencodeError::UnexpectedEof {
                offset: self.data.len(),
            })?;

        let bytes = Bytes::copy_from_slice(&self.data[self.pos..end]);
        self.pos = end;
        Ok(bytes)
    }

    fn decode_list(&mut self, depth: usize) -> Result<Value, BencodeError> {
        self.pos += 1;
        let mut list = Vec::new();

        while self.peek()? != b'e' {
            list.push(self.decode_value(depth + 1)?);
        }

        self.pos += 1;
        Ok(Value::List(list))
    }

    fn decode_dict(&mut self, depth: usize) -> Result<Value, BencodeError> {
        self.pos += 1;
        let mut dict = BTreeMap::new();

        while self.peek()? != b'e' {
            if !self.peek()?.is_ascii_digit() {
                return Err(BencodeError::InvalidKey { offset: self.pos });
            }
            let key = self.decode_bytes()?;
            let value = self.decode_value(depth + 1)?;
            dict.insert(key, value);
        }

        self.pos += 1;
        Ok(Value::Dict(dict))
    }
}
