use std::io::{ErrorKind, Read};

use bytes::{Bytes, BytesMut};

use crate::codec::{FrameConfig, FrameDecoder};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Reads complete segments from any `Read` stream.
///
/// Handles partial reads internally: callers always get whole segments, and
/// the bytes left after the last delimiter are returned once the source
/// reports end of stream.
pub struct FrameReader<T> {
    inner: T,
    buf: BytesMut,
    chunk: Vec<u8>,
    decoder: FrameDecoder,
    config: FrameConfig,
    eof: bool,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            chunk: vec![0u8; config.read_chunk_size.max(1)],
            decoder: FrameDecoder::with_framing(config.framing, config.max_frame_size),
            config,
            eof: false,
        }
    }

    /// Read the next non-blank segment (blocking).
    ///
    /// Returns `Ok(None)` once the source is exhausted and the buffer has
    /// been drained.
    pub fn read_frame(&mut self) -> Result<Option<Bytes>> {
        loop {
            if self.eof {
                return self.decoder.decode_eof(&mut self.buf);
            }

            if let Some(segment) = self.decoder.decode(&mut self.buf)? {
                return Ok(Some(segment));
            }

            let read = match self.inner.read(&mut self.chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                tracing::debug!(buffered = self.buf.len(), "source reached end of stream");
                self.eof = true;
                continue;
            }

            tracing::trace!(read, "read chunk");
            self.buf.extend_from_slice(&self.chunk[..read]);
        }
    }

    /// Number of bytes buffered but not yet returned as a segment.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    ///
    /// Buffered bytes are discarded.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Update maximum segment size for subsequent decoding.
    pub fn set_max_frame_size(&mut self, max_frame_size: usize) {
        self.config.max_frame_size = max_frame_size;
        self.decoder.set_max_frame_size(max_frame_size);
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}
