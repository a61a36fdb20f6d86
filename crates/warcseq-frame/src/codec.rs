use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// ASCII record separator. Opens every record-separated frame.
pub const DELIMITER: u8 = 0x1E;

/// Line feed. Closes the payload of every frame.
pub const TERMINATOR: u8 = b'\n';

/// Default maximum segment size: 16 MiB.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Default size of a single read from the source: 8 KiB.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 8 * 1024;

/// How frames are laid out on the wire.
///
/// ```text
/// RecordSeparated:  0x1E <payload> \n     (split on 0x1E)
/// LineDelimited:         <payload> \n     (split on \n)
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Framing {
    /// JSON text sequences: every frame opens with the record separator.
    #[default]
    RecordSeparated,
    /// JSON Lines: every frame is one line.
    LineDelimited,
}

impl Framing {
    /// The byte that separates segments when decoding.
    pub fn delimiter(self) -> u8 {
        match self {
            Framing::RecordSeparated => DELIMITER,
            Framing::LineDelimited => TERMINATOR,
        }
    }

    /// The total wire size of a frame carrying `payload_len` bytes.
    pub fn frame_len(self, payload_len: usize) -> usize {
        match self {
            Framing::RecordSeparated => payload_len + 2,
            Framing::LineDelimited => payload_len + 1,
        }
    }

    /// Bytes a payload occupies as a decoded segment. A record-separated
    /// segment keeps its terminator; a line loses it with the delimiter.
    /// `max_frame_size` limits this length on both sides of a pipe.
    pub fn segment_len(self, payload_len: usize) -> usize {
        match self {
            Framing::RecordSeparated => payload_len + 1,
            Framing::LineDelimited => payload_len,
        }
    }

    /// Reject a payload whose segment would exceed `max_frame_size`.
    pub fn check_frame_size(self, payload_len: usize, max_frame_size: usize) -> Result<()> {
        let size = self.segment_len(payload_len);
        if size > max_frame_size {
            return Err(FrameError::FrameTooLarge {
                size,
                max: max_frame_size,
            });
        }
        Ok(())
    }

    /// Reject payloads that could not be told apart from framing bytes.
    pub fn check_payload(self, payload: &[u8]) -> Result<()> {
        let ambiguous = |b: u8| match self {
            Framing::RecordSeparated => b == DELIMITER || b == TERMINATOR,
            Framing::LineDelimited => b == TERMINATOR,
        };
        match payload.iter().position(|&b| ambiguous(b)) {
            Some(offset) => Err(FrameError::AmbiguousPayload {
                byte: payload[offset],
                offset,
            }),
            None => Ok(()),
        }
    }

    /// Append one frame carrying `payload` to `dst`.
    pub fn encode(self, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
        self.check_payload(payload)?;
        dst.reserve(self.frame_len(payload.len()));
        if self == Framing::RecordSeparated {
            dst.put_u8(DELIMITER);
        }
        dst.put_slice(payload);
        dst.put_u8(TERMINATOR);
        Ok(())
    }
}

/// Encode a payload into the record-separated wire format.
///
/// Wire format:
/// ```text
/// ┌──────────┬──────────────────────┬──────────┐
/// │ RS (1B)  │ Payload              │ LF (1B)  │
/// │ 0x1E     │ (single line, no RS) │ 0x0A     │
/// └──────────┴──────────────────────┴──────────┘
/// ```
///
/// The payload must not contain the delimiter or a line feed.
pub fn encode_frame(payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    Framing::RecordSeparated.encode(payload, dst)
}

/// Reject payloads that could not be told apart from record-separated
/// framing bytes.
pub fn check_payload(payload: &[u8]) -> Result<()> {
    Framing::RecordSeparated.check_payload(payload)
}

/// The total wire size of a record-separated frame.
pub fn frame_len(payload_len: usize) -> usize {
    Framing::RecordSeparated.frame_len(payload_len)
}

/// Returns true if a segment is empty or holds only ASCII whitespace.
pub fn is_blank(segment: &[u8]) -> bool {
    segment.iter().all(u8::is_ascii_whitespace)
}

/// Reassembles delimiter-bounded segments from an accumulating buffer.
///
/// A segment is everything before the next delimiter. Blank segments (the
/// one before the very first delimiter, the gap between two adjacent
/// delimiters, an empty line) are dropped here and never reach the caller.
#[derive(Debug, Clone)]
pub struct FrameDecoder {
    framing: Framing,
    /// Prefix of the buffer already known to hold no delimiter.
    searched: usize,
    max_frame_size: usize,
}

impl FrameDecoder {
    /// Create a record-separated decoder that rejects segments larger than
    /// `max_frame_size`.
    pub fn new(max_frame_size: usize) -> Self {
        Self::with_framing(Framing::RecordSeparated, max_frame_size)
    }

    /// Create a decoder for `framing`.
    pub fn with_framing(framing: Framing, max_frame_size: usize) -> Self {
        Self {
            framing,
            searched: 0,
            max_frame_size,
        }
    }

    /// Split the next non-blank segment off the front of `src`.
    ///
    /// Returns `Ok(None)` if `src` holds no complete segment yet. On success
    /// the segment and the delimiter that closed it are consumed from `src`.
    pub fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Bytes>> {
        let delimiter = self.framing.delimiter();
        loop {
            let found = src[self.searched..]
                .iter()
                .position(|&b| b == delimiter)
                .map(|idx| self.searched + idx);

            let Some(pos) = found else {
                self.searched = src.len();
                if src.len() > self.max_frame_size {
                    return Err(FrameError::FrameTooLarge {
                        size: src.len(),
                        max: self.max_frame_size,
                    });
                }
                return Ok(None);
            };

            let segment = src.split_to(pos).freeze();
            src.advance(1);
            self.searched = 0;

            if is_blank(&segment) {
                tracing::trace!(len = segment.len(), "skipped blank segment");
                continue;
            }
            if segment.len() > self.max_frame_size {
                return Err(FrameError::FrameTooLarge {
                    size: segment.len(),
                    max: self.max_frame_size,
                });
            }

            tracing::debug!(len = segment.len(), "segment complete");
            return Ok(Some(segment));
        }
    }

    /// Like [`decode`](Self::decode), but treats the end of `src` as the end
    /// of the stream: whatever remains after the last delimiter is returned
    /// as a final segment unless it is blank. `src` is empty afterwards.
    pub fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Bytes>> {
        if let Some(segment) = self.decode(src)? {
            return Ok(Some(segment));
        }

        self.searched = 0;
        let rest = src.split().freeze();
        if is_blank(&rest) {
            return Ok(None);
        }

        tracing::debug!(len = rest.len(), "unterminated final segment");
        Ok(Some(rest))
    }

    /// Framing this decoder splits on.
    pub fn framing(&self) -> Framing {
        self.framing
    }

    /// Maximum accepted segment size.
    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }

    /// Update the maximum accepted segment size.
    pub fn set_max_frame_size(&mut self, max_frame_size: usize) {
        self.max_frame_size = max_frame_size;
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_SIZE)
    }
}

/// Configuration for frame readers and writers.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Wire layout. Default: record-separated.
    pub framing: Framing,
    /// Maximum segment size in bytes. Default: 16 MiB.
    pub max_frame_size: usize,
    /// Bytes requested from the source per read. Default: 8 KiB.
    pub read_chunk_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            framing: Framing::default(),
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
        }
    }
}
