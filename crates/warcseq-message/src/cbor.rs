//! CBOR sequences: messages as consecutive CBOR data items.
//!
//! Each item carries the same structured form as the JSON formats, so block
//! data stays base64 text and decoding goes through the same tag dispatch.
//! Items delimit themselves; there are no blank segments to skip, and a
//! stream that stops inside an item is malformed.

use std::io::{self, BufRead, BufReader, ErrorKind, Read};

use bytes::{Bytes, BytesMut};
use serde_json::Value;
use warcseq_frame::{FrameConfig, FrameError};

use crate::error::{DecodeError, DecodeErrorKind, MessageError, Result};
use crate::model::Message;
use crate::version::ProtocolVersion;

type CborError = ciborium::de::Error<io::Error>;

/// Serialize `message` as one CBOR data item for `version`.
pub fn encode_item(message: &Message, version: ProtocolVersion) -> Result<Vec<u8>> {
    if !version.can_represent(message) {
        return Err(MessageError::Unrepresentable {
            tag: message.tag(),
            version,
        });
    }
    let mut item = Vec::new();
    ciborium::into_writer(message, &mut item)
        .map_err(|err| MessageError::Cbor(format!("{err:?}")))?;
    Ok(item)
}

/// Decode one complete CBOR data item under `version`.
pub fn decode_item(item: Bytes, version: ProtocolVersion) -> Result<Message> {
    let mut rest: &[u8] = &item;
    let parsed = ciborium::from_reader::<Value, _>(&mut rest);
    let trailing = rest.len();
    let value = parsed.map_err(|err| invalid(item.clone(), &err))?;
    if trailing > 0 {
        return Err(DecodeError::new(
            item,
            DecodeErrorKind::InvalidCbor(format!("{trailing} bytes after the data item")),
        )
        .into());
    }
    from_value(item, value, version)
}

/// Blocking reader of CBOR items from any `Read` stream.
pub(crate) struct CborReader<R> {
    inner: BufReader<R>,
    max_item_size: usize,
}

impl<R: Read> CborReader<R> {
    pub fn new(inner: R, config: &FrameConfig) -> Self {
        Self {
            inner: BufReader::with_capacity(config.read_chunk_size.max(1), inner),
            max_item_size: config.max_frame_size,
        }
    }

    /// Read and decode the next item. `Ok(None)` at a clean end of stream.
    pub fn read_message(&mut self, version: ProtocolVersion) -> Result<Option<Message>> {
        loop {
            match self.inner.fill_buf() {
                Ok(buf) if buf.is_empty() => return Ok(None),
                Ok(_) => break,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            }
        }

        let max = self.max_item_size;
        let mut recorder = Recorder {
            inner: &mut self.inner,
            seen: Vec::new(),
            max,
            overflow: None,
        };
        let parsed = ciborium::from_reader::<Value, _>(&mut recorder);
        let Recorder { seen, overflow, .. } = recorder;

        if let Some(size) = overflow {
            return Err(FrameError::FrameTooLarge { size, max }.into());
        }
        let item = Bytes::from(seen);
        tracing::trace!(len = item.len(), "read CBOR item");

        match parsed {
            Ok(value) => from_value(item, value, version).map(Some),
            Err(ciborium::de::Error::Io(err)) if err.kind() != ErrorKind::UnexpectedEof => {
                Err(err.into())
            }
            Err(err) => Err(invalid(item, &err)),
        }
    }

    pub fn get_ref(&self) -> &R {
        self.inner.get_ref()
    }

    pub fn get_mut(&mut self) -> &mut R {
        self.inner.get_mut()
    }

    pub fn into_inner(self) -> R {
        self.inner.into_inner()
    }
}

/// Split the next complete item off the front of `src`.
///
/// Returns `Ok(None)` while the item is still incomplete.
pub(crate) fn decode_buffered(
    src: &mut BytesMut,
    version: ProtocolVersion,
    max: usize,
) -> Result<Option<Message>> {
    if src.is_empty() {
        return Ok(None);
    }

    let mut rest: &[u8] = src;
    let parsed = ciborium::from_reader::<Value, _>(&mut rest);
    let used = src.len() - rest.len();

    if let Err(ciborium::de::Error::Io(err)) = &parsed {
        if err.kind() == ErrorKind::UnexpectedEof {
            if src.len() > max {
                return Err(FrameError::FrameTooLarge {
                    size: src.len(),
                    max,
                }
                .into());
            }
            return Ok(None);
        }
    }

    let item = src.split_to(used).freeze();
    if item.len() > max {
        return Err(FrameError::FrameTooLarge {
            size: item.len(),
            max,
        }
        .into());
    }
    match parsed {
        Ok(value) => from_value(item, value, version).map(Some),
        Err(err) => Err(invalid(item, &err)),
    }
}

/// Like [`decode_buffered`], but bytes left at end of stream are a
/// truncated item.
pub(crate) fn decode_buffered_eof(
    src: &mut BytesMut,
    version: ProtocolVersion,
    max: usize,
) -> Result<Option<Message>> {
    if let Some(message) = decode_buffered(src, version, max)? {
        return Ok(Some(message));
    }
    if src.is_empty() {
        return Ok(None);
    }
    let item = src.split().freeze();
    Err(DecodeError::new(item, DecodeErrorKind::InvalidCbor("truncated data item".into())).into())
}

fn from_value(item: Bytes, value: Value, version: ProtocolVersion) -> Result<Message> {
    Message::from_structured(value, version).map_err(|kind| DecodeError::new(item, kind).into())
}

fn invalid(item: Bytes, err: &CborError) -> MessageError {
    let reason = match err {
        ciborium::de::Error::Io(err) if err.kind() == ErrorKind::UnexpectedEof => {
            "truncated data item".to_string()
        }
        ciborium::de::Error::Io(err) => err.to_string(),
        ciborium::de::Error::Syntax(offset) => format!("syntax error at offset {offset}"),
        ciborium::de::Error::Semantic(_, msg) => msg.clone(),
        other => format!("{other:?}"),
    };
    DecodeError::new(item, DecodeErrorKind::InvalidCbor(reason)).into()
}

/// Keeps the bytes of the item being parsed and enforces the size limit.
struct Recorder<'a, R> {
    inner: &'a mut R,
    seen: Vec<u8>,
    max: usize,
    overflow: Option<usize>,
}

impl<R: Read> Read for Recorder<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        let size = self.seen.len() + n;
        if size > self.max {
            self.overflow = Some(size);
            return Err(io::Error::new(
                ErrorKind::InvalidData,
                "CBOR item exceeds the size limit",
            ));
        }
        self.seen.extend_from_slice(&buf[..n]);
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::model::BlockEnd;

    fn items(messages: &[Message]) -> Vec<u8> {
        let mut wire = Vec::new();
        for message in messages {
            wire.extend(encode_item(message, ProtocolVersion::V2).unwrap());
        }
        wire
    }

    fn read_all(wire: Vec<u8>, config: FrameConfig) -> Vec<Result<Message>> {
        let mut reader = CborReader::new(Cursor::new(wire), &config);
        let mut out = Vec::new();
        loop {
            match reader.read_message(ProtocolVersion::V2) {
                Ok(Some(message)) => out.push(Ok(message)),
                Ok(None) => break,
                Err(err) => {
                    out.push(Err(err));
                    break;
                }
            }
        }
        out
    }

    #[test]
    fn item_is_tagged_map() {
        let item = encode_item(&Message::EndOfFile, ProtocolVersion::V2).unwrap();
        // map(1) { text(9) "EndOfFile": map(0) }
        assert_eq!(item[0], 0xa1);
        assert_eq!(item[1], 0x69);
        assert_eq!(&item[2..11], b"EndOfFile");
        assert_eq!(item[11], 0xa0);
        assert_eq!(item.len(), 12);
    }

    #[test]
    fn reader_yields_items_in_order() {
        let messages = vec![
            Message::metadata("a.warc", 7),
            Message::header("WARC/1.1", [("Content-Length", "12")]),
            Message::block_chunk(b"Hello world!".to_vec()),
            Message::block_end(BlockEnd::crc32c(2073618257).with_xxh3(u64::MAX)),
            Message::EndOfFile,
        ];
        let config = FrameConfig {
            read_chunk_size: 1,
            ..FrameConfig::default()
        };
        let decoded: Vec<Message> = read_all(items(&messages), config)
            .into_iter()
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(decoded, messages);
    }

    #[test]
    fn truncated_item_is_decode_error() {
        let mut wire = items(&[Message::EndOfFile, Message::block_chunk(b"abc".to_vec())]);
        wire.truncate(wire.len() - 2);

        let results = read_all(wire, FrameConfig::default());
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].as_ref().unwrap(), &Message::EndOfFile);
        let Err(MessageError::Decode(err)) = &results[1] else {
            panic!("expected decode error");
        };
        assert!(matches!(
            err.kind(),
            DecodeErrorKind::InvalidCbor(reason) if reason == "truncated data item"
        ));
    }

    #[test]
    fn oversized_item_is_rejected() {
        let wire = items(&[Message::block_chunk(vec![0u8; 256])]);
        let config = FrameConfig {
            max_frame_size: 64,
            ..FrameConfig::default()
        };
        let results = read_all(wire, config);
        assert!(matches!(
            results[0],
            Err(MessageError::Frame(FrameError::FrameTooLarge { max: 64, .. }))
        ));
    }

    #[test]
    fn item_of_wrong_shape_is_not_tagged() {
        // array(2) [1, 2]
        let err = decode_item(Bytes::from_static(&[0x82, 0x01, 0x02]), ProtocolVersion::V2)
            .unwrap_err();
        let MessageError::Decode(err) = err else {
            panic!("expected decode error");
        };
        assert!(matches!(err.kind(), DecodeErrorKind::NotTagged));
        assert_eq!(err.segment(), &[0x82, 0x01, 0x02]);
    }

    #[test]
    fn decode_item_rejects_trailing_bytes() {
        let mut wire = items(&[Message::EndOfFile]);
        wire.push(0x00);
        let err = decode_item(Bytes::from(wire), ProtocolVersion::V2).unwrap_err();
        assert!(err.is_decode());
    }

    #[test]
    fn buffered_decode_waits_for_complete_item() {
        let wire = items(&[Message::block_chunk(b"Hello".to_vec()), Message::EndOfFile]);
        let mut src = BytesMut::new();
        let mut decoded = Vec::new();
        for byte in wire {
            src.extend_from_slice(&[byte]);
            if let Some(message) = decode_buffered(&mut src, ProtocolVersion::V2, 1024).unwrap() {
                decoded.push(message);
            }
        }
        assert_eq!(
            decoded,
            vec![Message::block_chunk(b"Hello".to_vec()), Message::EndOfFile]
        );
        assert!(src.is_empty());
        assert!(decode_buffered_eof(&mut src, ProtocolVersion::V2, 1024)
            .unwrap()
            .is_none());
    }

    #[test]
    fn buffered_eof_with_partial_item_fails() {
        let wire = items(&[Message::EndOfFile]);
        let mut src = BytesMut::from(&wire[..5]);
        let err = decode_buffered_eof(&mut src, ProtocolVersion::V2, 1024).unwrap_err();
        assert!(err.is_decode());
    }

    #[test]
    fn version_gates_cbor_items() {
        let err = encode_item(&Message::EndOfFile, ProtocolVersion::V1).unwrap_err();
        assert!(matches!(err, MessageError::Unrepresentable { .. }));

        let item = Bytes::from(items(&[Message::EndOfFile]));
        let err = decode_item(item, ProtocolVersion::V1).unwrap_err();
        let MessageError::Decode(err) = err else {
            panic!("expected decode error");
        };
        assert!(matches!(err.kind(), DecodeErrorKind::TagNotInVersion { .. }));
    }
}
