//! `tokio_util::codec` adapter over the same reassembly as [`FrameReader`].
//!
//! [`FrameReader`]: crate::FrameReader

use bytes::{Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{FrameDecoder, Framing, DEFAULT_MAX_FRAME_SIZE};
use crate::error::FrameError;

/// Frame codec for `FramedRead`/`FramedWrite`.
#[derive(Debug, Clone)]
pub struct FrameCodec {
    decoder: FrameDecoder,
    max_frame_size: usize,
}

impl FrameCodec {
    /// Create a record-separated codec that rejects segments larger than
    /// `max_frame_size`.
    pub fn new(max_frame_size: usize) -> Self {
        Self::with_framing(Framing::RecordSeparated, max_frame_size)
    }

    /// Create a codec for `framing`.
    pub fn with_framing(framing: Framing, max_frame_size: usize) -> Self {
        Self {
            decoder: FrameDecoder::with_framing(framing, max_frame_size),
            max_frame_size,
        }
    }

    /// Framing this codec reads and writes.
    pub fn framing(&self) -> Framing {
        self.decoder.framing()
    }

    /// Maximum accepted segment size.
    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_SIZE)
    }
}

impl Decoder for FrameCodec {
    type Item = Bytes;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        self.decoder.decode(src)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        self.decoder.decode_eof(src)
    }
}

impl Encoder<&[u8]> for FrameCodec {
    type Error = FrameError;

    fn encode(&mut self, item: &[u8], dst: &mut BytesMut) -> Result<(), Self::Error> {
        let framing = self.framing();
        framing.check_frame_size(item.len(), self.max_frame_size)?;
        framing.encode(item, dst)
    }
}

impl Encoder<Bytes> for FrameCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        Encoder::<&[u8]>::encode(self, item.as_ref(), dst)
    }
}

#[cfg(test)]
mod tests {
    use futures_util::{SinkExt, StreamExt};
    use tokio_util::codec::{FramedRead, FramedWrite};

    use super::*;

    #[tokio::test]
    async fn framed_read_yields_segments_and_tail() {
        let wire: &[u8] = b"\x1eone\n\x1e\x1etwo\n\x1ethree";
        let mut framed = FramedRead::new(wire, FrameCodec::default());

        let mut segments = Vec::new();
        while let Some(segment) = framed.next().await {
            segments.push(segment.unwrap());
        }

        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].as_ref(), b"one\n");
        assert_eq!(segments[1].as_ref(), b"two\n");
        assert_eq!(segments[2].as_ref(), b"three");
    }

    #[tokio::test]
    async fn framed_write_then_read() {
        let mut framed = FramedWrite::new(Vec::new(), FrameCodec::default());
        framed.send(Bytes::from_static(b"alpha")).await.unwrap();
        framed.send(&b"beta"[..]).await.unwrap();

        let wire = framed.into_inner();
        assert_eq!(wire, b"\x1ealpha\n\x1ebeta\n");

        let mut read = FramedRead::new(wire.as_slice(), FrameCodec::default());
        assert_eq!(read.next().await.unwrap().unwrap().as_ref(), b"alpha\n");
        assert_eq!(read.next().await.unwrap().unwrap().as_ref(), b"beta\n");
        assert!(read.next().await.is_none());
    }

    #[tokio::test]
    async fn oversized_item_rejected() {
        let mut framed = FramedWrite::new(Vec::new(), FrameCodec::new(2));
        let err = framed.send(&b"abc"[..]).await.unwrap_err();
        assert!(matches!(err, FrameError::FrameTooLarge { size: 4, max: 2 }));
    }

    #[tokio::test]
    async fn line_delimited_codec_roundtrip() {
        let codec = FrameCodec::with_framing(Framing::LineDelimited, 16);
        let mut framed = FramedWrite::new(Vec::new(), codec.clone());
        framed.send(&b"{\"a\":1}"[..]).await.unwrap();
        framed.send(&b"{\"b\":2}"[..]).await.unwrap();

        let wire = framed.into_inner();
        assert_eq!(wire, b"{\"a\":1}\n{\"b\":2}\n");

        let mut read = FramedRead::new(wire.as_slice(), codec);
        assert_eq!(read.next().await.unwrap().unwrap().as_ref(), b"{\"a\":1}");
        assert_eq!(read.next().await.unwrap().unwrap().as_ref(), b"{\"b\":2}");
        assert!(read.next().await.is_none());
    }

    #[tokio::test]
    async fn item_at_limit_decodes_with_same_limit() {
        let mut framed = FramedWrite::new(Vec::new(), FrameCodec::new(4));
        framed.send(&b"abc"[..]).await.unwrap();
        framed.send(&b"xyz"[..]).await.unwrap();

        let wire = framed.into_inner();
        let mut read = FramedRead::new(wire.as_slice(), FrameCodec::new(4));
        assert_eq!(read.next().await.unwrap().unwrap().as_ref(), b"abc\n");
        assert_eq!(read.next().await.unwrap().unwrap().as_ref(), b"xyz\n");
        assert!(read.next().await.is_none());
    }
}
