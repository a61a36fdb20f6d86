use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};
use warcseq_frame::{FrameCodec, FrameError};

use crate::cbor;
use crate::config::MessageConfig;
use crate::error::MessageError;
use crate::format::StreamFormat;
use crate::model::Message;
use crate::structured::{decode_segment, encode_payload};
use crate::version::ProtocolVersion;

/// Message codec for `FramedRead`/`FramedWrite`.
#[derive(Debug, Clone, Default)]
pub struct MessageCodec {
    frames: FrameCodec,
    format: StreamFormat,
    version: ProtocolVersion,
}

impl MessageCodec {
    pub fn new(config: MessageConfig) -> Self {
        let framing = config.format.framing().unwrap_or_default();
        Self {
            frames: FrameCodec::with_framing(framing, config.frame.max_frame_size),
            format: config.format,
            version: config.version,
        }
    }

    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    pub fn format(&self) -> StreamFormat {
        self.format
    }
}

impl Decoder for MessageCodec {
    type Item = Message;
    type Error = MessageError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if self.format == StreamFormat::CborSeq {
            return cbor::decode_buffered(src, self.version, self.frames.max_frame_size());
        }
        match self.frames.decode(src)? {
            Some(segment) => Ok(Some(decode_segment(segment, self.version)?)),
            None => Ok(None),
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if self.format == StreamFormat::CborSeq {
            return cbor::decode_buffered_eof(src, self.version, self.frames.max_frame_size());
        }
        match self.frames.decode_eof(src)? {
            Some(segment) => Ok(Some(decode_segment(segment, self.version)?)),
            None => Ok(None),
        }
    }
}

impl Encoder<&Message> for MessageCodec {
    type Error = MessageError;

    fn encode(&mut self, item: &Message, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if self.format == StreamFormat::CborSeq {
            let encoded = cbor::encode_item(item, self.version)?;
            let max = self.frames.max_frame_size();
            if encoded.len() > max {
                return Err(FrameError::FrameTooLarge {
                    size: encoded.len(),
                    max,
                }
                .into());
            }
            dst.extend_from_slice(&encoded);
            return Ok(());
        }
        let payload = encode_payload(item, self.version)?;
        Encoder::<&[u8]>::encode(&mut self.frames, payload.as_slice(), dst)?;
        Ok(())
    }
}

impl Encoder<Message> for MessageCodec {
    type Error = MessageError;

    fn encode(&mut self, item: Message, dst: &mut BytesMut) -> Result<(), Self::Error> {
        Encoder::<&Message>::encode(self, &item, dst)
    }
}
