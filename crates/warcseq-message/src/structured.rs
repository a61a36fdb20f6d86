//! Mapping between messages and their structured form.
//!
//! The structured form of a message is a JSON object with exactly one key,
//! the variant tag, mapped to an object of the variant's fields:
//!
//! ```text
//! {"Header":{"version":"WARC/1.1","fields":[["WARC-Record-Type","resource"]]}}
//! {"BlockChunk":{"data":"SGVsbG8gd29ybGQh"}}
//! {"BlockEnd":{"crc32c":2073618257}}
//! {"EndOfFile":{}}
//! ```

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

use crate::error::{DecodeError, DecodeErrorKind, MessageError, Result};
use crate::model::{BlockEnd, BlockEndV1, EmptyBody, Message, MessageTag};
use crate::version::ProtocolVersion;

impl Serialize for Message {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        let tag = self.tag().as_str();
        match self {
            Message::Metadata(body) => map.serialize_entry(tag, body)?,
            Message::Header(body) => map.serialize_entry(tag, body)?,
            Message::BlockChunk(body) => map.serialize_entry(tag, body)?,
            Message::BlockEnd(body) => map.serialize_entry(tag, body)?,
            Message::EndOfFile => map.serialize_entry(tag, &EmptyBody {})?,
        }
        map.end()
    }
}

impl Message {
    /// The structured form of this message.
    pub fn to_structured(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Rebuild a message from its structured form under `version`.
    ///
    /// The bare string `"EndOfFile"` is accepted in place of
    /// `{"EndOfFile":{}}`. Tags with fields have no bare form.
    pub fn from_structured(
        value: Value,
        version: ProtocolVersion,
    ) -> std::result::Result<Message, DecodeErrorKind> {
        let (name, body) = match value {
            Value::Object(map) if map.len() == 1 => match map.into_iter().next() {
                Some(entry) => entry,
                None => return Err(DecodeErrorKind::NotTagged),
            },
            Value::String(name) if name == MessageTag::EndOfFile.as_str() => {
                (name, Value::Object(Map::new()))
            }
            _ => return Err(DecodeErrorKind::NotTagged),
        };

        let Some(tag) = MessageTag::from_name(&name) else {
            return Err(DecodeErrorKind::UnrecognizedTag(name));
        };
        if !version.supports(tag) {
            return Err(DecodeErrorKind::TagNotInVersion { tag, version });
        }

        let message = match tag {
            MessageTag::Metadata => Message::Metadata(fields(tag, body)?),
            MessageTag::Header => Message::Header(fields(tag, body)?),
            MessageTag::BlockChunk => Message::BlockChunk(fields(tag, body)?),
            MessageTag::BlockEnd => match version {
                ProtocolVersion::V1 => Message::BlockEnd(fields::<BlockEndV1>(tag, body)?.into()),
                ProtocolVersion::V2 => Message::BlockEnd(fields::<BlockEnd>(tag, body)?),
            },
            MessageTag::EndOfFile => {
                let EmptyBody {} = fields(tag, body)?;
                Message::EndOfFile
            }
        };

        Ok(message)
    }
}

fn fields<T: DeserializeOwned>(
    tag: MessageTag,
    body: Value,
) -> std::result::Result<T, DecodeErrorKind> {
    serde_json::from_value(body).map_err(|source| DecodeErrorKind::InvalidFields { tag, source })
}

/// Serialize `message` as compact single-line JSON for `version`.
pub fn encode_payload(message: &Message, version: ProtocolVersion) -> Result<Vec<u8>> {
    if !version.can_represent(message) {
        return Err(MessageError::Unrepresentable {
            tag: message.tag(),
            version,
        });
    }
    Ok(serde_json::to_vec(message)?)
}

/// Decode one non-blank segment under `version`.
///
/// Surrounding whitespace (including the frame's trailing newline) is
/// ignored.
pub fn decode_segment(
    segment: Bytes,
    version: ProtocolVersion,
) -> std::result::Result<Message, DecodeError> {
    let value = match serde_json::from_slice::<Value>(&segment) {
        Ok(value) => value,
        Err(err) => return Err(DecodeError::new(segment, DecodeErrorKind::InvalidJson(err))),
    };

    Message::from_structured(value, version).map_err(|kind| DecodeError::new(segment, kind))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::model::{BlockChunk, Header, Metadata};

    fn v2(value: Value) -> std::result::Result<Message, DecodeErrorKind> {
        Message::from_structured(value, ProtocolVersion::V2)
    }

    #[test]
    fn header_structured_form() {
        let header = Message::header(
            "WARC/1.1",
            [("WARC-Record-Type", "resource"), ("Content-Length", "12")],
        );
        let payload = encode_payload(&header, ProtocolVersion::V2).unwrap();
        assert_eq!(
            String::from_utf8(payload).unwrap(),
            r#"{"Header":{"version":"WARC/1.1","fields":[["WARC-Record-Type","resource"],["Content-Length","12"]]}}"#
        );
    }

    #[test]
    fn end_of_file_structured_form() {
        assert_eq!(
            Message::EndOfFile.to_structured().unwrap(),
            json!({"EndOfFile": {}})
        );
        assert_eq!(v2(json!({"EndOfFile": {}})).unwrap(), Message::EndOfFile);
        assert_eq!(v2(json!("EndOfFile")).unwrap(), Message::EndOfFile);
    }

    #[test]
    fn every_variant_roundtrips_through_structured_form() {
        let messages = [
            Message::metadata("example.warc.gz", 1024),
            Message::header("WARC/1.0", [("WARC-Type", "warcinfo")]),
            Message::block_chunk(vec![0u8, 0x1e, b'\n', 0xff]),
            Message::block_end(BlockEnd::crc32c(7).with_crc32(8).with_xxh3(u64::MAX)),
            Message::EndOfFile,
        ];

        for message in messages {
            let value = message.to_structured().unwrap();
            assert_eq!(v2(value).unwrap(), message);
        }
    }

    #[test]
    fn block_end_crc32c_only_leaves_others_absent() {
        let message = v2(json!({"BlockEnd": {"crc32c": 2073618257u32}})).unwrap();
        let Message::BlockEnd(end) = message else {
            panic!("expected BlockEnd");
        };
        assert_eq!(end.crc32c, Some(2073618257));
        assert_eq!(end.crc32, None);
        assert_eq!(end.xxh3, None);
    }

    #[test]
    fn block_end_zero_is_not_absent() {
        let message = v2(json!({"BlockEnd": {"crc32": 0}})).unwrap();
        assert_eq!(
            message,
            Message::BlockEnd(BlockEnd {
                crc32: Some(0),
                crc32c: None,
                xxh3: None
            })
        );
    }

    #[test]
    fn metadata_position_from_string() {
        let message = v2(json!({"Metadata": {"file": "a.warc", "position": "99"}})).unwrap();
        assert_eq!(message, Message::Metadata(Metadata::new("a.warc", 99)));
    }

    #[test]
    fn rejects_untagged_values() {
        assert!(matches!(v2(json!(42)), Err(DecodeErrorKind::NotTagged)));
        assert!(matches!(v2(json!({})), Err(DecodeErrorKind::NotTagged)));
        assert!(matches!(
            v2(json!({"Header": {}, "BlockEnd": {}})),
            Err(DecodeErrorKind::NotTagged)
        ));
    }

    #[test]
    fn bare_string_is_only_end_of_file() {
        for name in ["Metadata", "Header", "BlockChunk", "BlockEnd", "Bogus"] {
            assert!(
                matches!(v2(json!(name)), Err(DecodeErrorKind::NotTagged)),
                "{name}"
            );
        }
        assert_eq!(v2(json!("EndOfFile")).unwrap(), Message::EndOfFile);
    }

    #[test]
    fn rejects_unrecognized_tag() {
        let err = v2(json!({"Response": {"ok": true}})).unwrap_err();
        assert!(matches!(err, DecodeErrorKind::UnrecognizedTag(name) if name == "Response"));
    }

    #[test]
    fn rejects_missing_and_unknown_fields() {
        let err = v2(json!({"Header": {"version": "WARC/1.1"}})).unwrap_err();
        assert!(matches!(
            err,
            DecodeErrorKind::InvalidFields {
                tag: MessageTag::Header,
                ..
            }
        ));

        let err = v2(json!({"BlockEnd": {"md5": 1}})).unwrap_err();
        assert!(matches!(
            err,
            DecodeErrorKind::InvalidFields {
                tag: MessageTag::BlockEnd,
                ..
            }
        ));
    }

    #[test]
    fn rejects_invalid_base64() {
        let err = v2(json!({"BlockChunk": {"data": "***"}})).unwrap_err();
        assert!(matches!(
            err,
            DecodeErrorKind::InvalidFields {
                tag: MessageTag::BlockChunk,
                ..
            }
        ));
    }

    #[test]
    fn v1_gates_tags_and_fields() {
        let v1 = ProtocolVersion::V1;

        let err = Message::from_structured(json!({"EndOfFile": {}}), v1).unwrap_err();
        assert!(matches!(
            err,
            DecodeErrorKind::TagNotInVersion {
                tag: MessageTag::EndOfFile,
                version: ProtocolVersion::V1
            }
        ));

        let ok = Message::from_structured(json!({"BlockEnd": {"crc32c": 3}}), v1).unwrap();
        assert_eq!(ok, Message::BlockEnd(BlockEnd::crc32c(3)));

        let extra = json!({"BlockEnd": {"crc32c": 3, "xxh3": 4}});
        let err = Message::from_structured(extra, v1).unwrap_err();
        assert!(matches!(err, DecodeErrorKind::InvalidFields { .. }));

        let err = Message::from_structured(json!({"BlockEnd": {}}), v1).unwrap_err();
        assert!(matches!(err, DecodeErrorKind::InvalidFields { .. }));
    }

    #[test]
    fn v1_refuses_to_encode_unrepresentable() {
        let err = encode_payload(&Message::EndOfFile, ProtocolVersion::V1).unwrap_err();
        assert!(matches!(
            err,
            MessageError::Unrepresentable {
                tag: MessageTag::EndOfFile,
                version: ProtocolVersion::V1
            }
        ));

        let payload =
            encode_payload(&Message::BlockEnd(BlockEnd::crc32c(9)), ProtocolVersion::V1).unwrap();
        assert_eq!(payload, br#"{"BlockEnd":{"crc32c":9}}"#);
    }

    #[test]
    fn payload_never_contains_framing_bytes() {
        let message = Message::Header(Header::new(
            "WARC/1.1\n",
            [("X-Odd\u{1e}", "line\nbreak\r\u{1e}")],
        ));
        let payload = encode_payload(&message, ProtocolVersion::V2).unwrap();
        assert!(!payload.contains(&0x1e));
        assert!(!payload.contains(&b'\n'));

        let back = decode_segment(Bytes::from(payload), ProtocolVersion::V2).unwrap();
        assert_eq!(back, message);
    }

    #[test]
    fn decode_segment_tolerates_whitespace() {
        let segment = Bytes::from_static(b"  {\"BlockChunk\":{\"data\":\"AA==\"}}\r\n");
        let message = decode_segment(segment, ProtocolVersion::V2).unwrap();
        assert_eq!(message, Message::BlockChunk(BlockChunk::new(vec![0u8])));
    }

    #[test]
    fn decode_segment_keeps_bad_input() {
        let segment = Bytes::from_static(b"not json\n");
        let err = decode_segment(segment, ProtocolVersion::V2).unwrap_err();
        assert_eq!(err.segment(), b"not json\n");
        assert!(matches!(err.kind(), DecodeErrorKind::InvalidJson(_)));
    }
}
