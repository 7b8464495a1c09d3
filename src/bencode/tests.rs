use std::collections::BTreeMap;

use bytes::Bytes;

use super::*;

fn dict_keys(value: &Value) -> Vec<Vec<u8>> {
    value
        .as_dict()
        .unwrap()
        .keys()
        .map(|k| k.to_vec())
        .collect()
}

#[test]
fn test_decode_integer() {
    assert_eq!(decode(b"i42e").unwrap(), Value::Integer(42));
    assert_eq!(decode(b"i-42e").unwrap(), Value::Integer(-42));
    assert_eq!(decode(b"i0e").unwrap(), Value::Integer(0));
    assert_eq!(
        decode(b"i9223372036854775807e").unwrap(),
        Value::Integer(i64::MAX)
    );
}

#[test]
fn test_decode_integer_invalid() {
    assert!(matches!(
        decode(b"i-0e"),
        Err(BencodeError::InvalidInteger { offset: 1, .. })
    ));
    assert!(decode(b"i03e").is_err());
    assert!(decode(b"ie").is_err());
    assert!(decode(b"i-e").is_err());
    assert!(decode(b"i4x2e").is_err());
    assert!(decode(b"i99999999999999999999e").is_err());
    assert!(matches!(
        decode(b"i42"),
        Err(BencodeError::UnexpectedEof { offset: 3 })
    ));
}

#[test]
fn test_decode_bytes() {
    assert_eq!(
        decode(b"4:spam").unwrap(),
        Value::Bytes(Bytes::from_static(b"spam"))
    );
    assert_eq!(decode(b"0:").unwrap(), Value::Bytes(Bytes::new()));
    assert_eq!(
        decode(&[b'2', b':', 0xff, 0x00]).unwrap(),
        Value::Bytes(Bytes::from_static(&[0xff, 0x00]))
    );
}

#[test]
fn test_decode_bytes_truncated() {
    assert!(matches!(
        decode(b"10:short"),
        Err(BencodeError::UnexpectedEof { offset: 8 })
    ));
    assert!(matches!(
        decode(b"4spam"),
        Err(BencodeError::UnexpectedEof { .. })
    ));
}

#[test]
fn test_decode_list() {
    let result = decode(b"l4:spami42ee").unwrap();
    let list = result.as_list().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0], Value::Bytes(Bytes::from_static(b"spam")));
    assert_eq!(list[1], Value::Integer(42));

    assert_eq!(decode(b"le").unwrap(), Value::List(vec![]));
    assert!(decode(b"l4:spam").is_err());
}

#[test]
fn test_decode_dict() {
    let result = decode(b"d3:cow3:moo4:spam4:eggse").unwrap();
    let dict = result.as_dict().unwrap();
    assert_eq!(dict.len(), 2);
    assert_eq!(result.get(b"cow").and_then(|v| v.as_str()), Some("moo"));
    assert_eq!(result.get(b"spam").and_then(|v| v.as_str()), Some("eggs"));
}

#[test]
fn test_decode_dict_non_string_key() {
    assert!(matches!(
        decode(b"di1ei2ee"),
        Err(BencodeError::InvalidKey { offset: 1 })
    ));
}

#[test]
fn test_decode_invalid_type_tag() {
    let err = decode(b"l4:spamx").unwrap_err();
    assert_eq!(
        err,
        BencodeError::InvalidTypeTag {
            offset: 7,
            tag: 'x'
        }
    );
    assert_eq!(err.offset(), 7);
}

#[test]
fn test_decode_empty_input() {
    assert!(matches!(
        decode(b""),
        Err(BencodeError::UnexpectedEof { offset: 0 })
    ));
}

#[test]
fn test_trailing_data_error() {
    assert_eq!(
        decode(b"i42eextra").unwrap_err(),
        BencodeError::TrailingData { offset: 4 }
    );
    assert!(decode(b"d1:ai1eee").is_err());
}

#[test]
fn test_nesting_too_deep() {
    let mut data = vec![b'l'; 100];
    data.extend(std::iter::repeat(b'e').take(100));
    assert!(matches!(
        decode(&data),
        Err(BencodeError::NestingTooDeep { .. })
    ));
}

#[test]
fn test_decoder_cursor_reads_consecutive_values() {
    let mut decoder = Decoder::new(b"i1e4:spamle");
    assert_eq!(decoder.decode_next().unwrap(), Value::Integer(1));
    assert_eq!(decoder.position(), 3);
    assert_eq!(decoder.decode_next().unwrap(), Value::string("spam"));
    assert_eq!(decoder.decode_next().unwrap(), Value::List(vec![]));
    assert!(decoder.is_empty());
}

#[test]
fn test_encode_scalars() {
    assert_eq!(encode(&Value::Integer(42)), b"i42e");
    assert_eq!(encode(&Value::Integer(-42)), b"i-42e");
    assert_eq!(encode(&Value::Integer(0)), b"i0e");
    assert_eq!(encode(&Value::string("spam")), b"4:spam");
    assert_eq!(encode(&Value::Bytes(Bytes::new())), b"0:");
}

#[test]
fn test_encode_list() {
    let list = Value::List(vec![Value::string("spam"), Value::Integer(42)]);
    assert_eq!(encode(&list), b"l4:spami42ee");
}

#[test]
fn test_encode_sorts_dict_keys() {
    let mut dict = BTreeMap::new();
    dict.insert(Bytes::from_static(b"zebra"), Value::Integer(1));
    dict.insert(Bytes::from_static(b"apple"), Value::Integer(2));
    dict.insert(Bytes::from_static(b"Zulu"), Value::Integer(3));
    dict.insert(Bytes::from_static(b"app"), Value::Integer(4));

    assert_eq!(
        encode(&Value::Dict(dict)),
        b"d4:Zului3e3:appi4e5:applei2e5:zebrai1ee".to_vec()
    );
}

#[test]
fn test_encode_canonicalizes_unsorted_input() {
    let unsorted = b"d4:spami1e3:cowi2e1:ai3ee";
    let decoded = decode(unsorted).unwrap();

    assert_eq!(
        dict_keys(&decoded),
        vec![b"a".to_vec(), b"cow".to_vec(), b"spam".to_vec()]
    );
    assert_eq!(encode(&decoded), b"d1:ai3e3:cowi2e4:spami1ee".to_vec());
    assert_eq!(decode(&encode(&decoded)).unwrap(), decoded);
}

#[test]
fn test_roundtrip_canonical_torrent() {
    let original = b"d8:announce15:http://test.com4:infod6:lengthi600000e4:name4:test12:piece lengthi262144e6:pieces0:ee";
    let decoded = decode(original).unwrap();
    assert_eq!(encode(&decoded), original.to_vec());
}

#[test]
fn test_roundtrip_nested_structures() {
    let data = b"d4:listl4:spami42ed1:xli-1eeee1:zle0:0:e";
    let decoded = decode(data).unwrap();
    assert_eq!(decode(&encode(&decoded)).unwrap(), decoded);
}

#[test]
fn test_value_accessors() {
    let value = Value::Integer(42);
    assert_eq!(value.as_integer(), Some(42));
    assert!(value.as_bytes().is_none());
    assert!(value.get(b"x").is_none());

    let value = Value::Bytes(Bytes::from_static(b"test"));
    assert_eq!(value.as_str(), Some("test"));
    assert!(value.as_integer().is_none());

    let value = Value::Bytes(Bytes::from_static(&[0xff]));
    assert!(value.as_str().is_none());
    assert!(value.as_bytes().is_some());

    let value = Value::List(vec![]);
    assert!(value.as_list().is_some());
    assert!(value.as_dict().is_none());
}
