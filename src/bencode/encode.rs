use super::value::Value;

/// Encodes a bencode value to a byte vector.
///
/// The output is canonical:
/// - Integers: `i<number>e`
/// - Byte strings: `<length>:<data>`
/// - Lists: `l<items>e`
/// - Dictionaries: `d<key><value>...e` with keys in ascending byte order
///
/// # Examples
///
/// ```
/// use leech::bencode::{encode, Value};
/// use std::collections::BTreeMap;
/// use bytes::Bytes;
///
/// let mut dict = BTreeMap::new();
/// dict.insert(Bytes::from_static(b"b"), Value::Integer(2));
/// dict.insert(Bytes::from_static(b"a"), Value::Integer(1));
/// assert_eq!(encode(&Value::Dict(dict)), b"d1:ai1e1:bi2ee");
/// ```
pub fn encode(value: &Value) -> Vec<u8> {
    let mut buf = Vec::new();
    encode_value(value, &mut buf);
    buf
}

fn encode_bytes(bytes: &[u8], buf: &mut Vec<u8>) {
    buf.extend_from_slice(bytes.len().to_string().as_bytes());
    buf.push(b':');
    buf.extend_from_slice(bytes);
}

fn encode_value(value: &Value, buf: &mut Vec<u8>) {
    match value {
        Value::Integer(i) => {
            buf.push(b'i');
            buf.extend_from_slice(i.to_string().as_bytes());
            buf.push(b'e');
        }
        Value::Bytes(b) => encode_bytes(b, buf),
        Value::List(l) => {
            buf.push(b'l');
            for item in l {
                encode_value(item, buf);
            }
            buf.push(b'e');
        }
        Value::Dict(d) => {
            // BTreeMap<Bytes, _> iterates in lexicographic byte order.
            buf.push(b'd');
            for (key, val) in d {
                encode_bytes(key, buf);
                encode_value(val, buf);
            }
            buf.push(b'e');
        }
    }
}
