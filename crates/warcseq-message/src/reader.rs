use std::io::Read;
use std::iter::FusedIterator;

use warcseq_frame::FrameReader;

use crate::cbor::CborReader;
use crate::config::MessageConfig;
use crate::error::{MessageError, Result};
use crate::format::StreamFormat;
use crate::model::Message;
use crate::structured::decode_segment;
use crate::version::ProtocolVersion;

/// Decode a message stream from `source` with the default configuration.
///
/// The returned reader is lazy: it reads from `source` only when it needs
/// more bytes to complete a frame.
pub fn decode<R: Read>(source: R) -> MessageReader<R> {
    MessageReader::new(source)
}

enum Source<R> {
    Framed(FrameReader<R>),
    Cbor(CborReader<R>),
}

/// Reads messages from any `Read` stream.
///
/// Messages come out in the order their frames appear. The first error
/// (I/O, oversized frame or malformed segment) ends the stream: every later
/// call returns `Ok(None)`, and the iterator yields `None`.
pub struct MessageReader<R> {
    source: Source<R>,
    format: StreamFormat,
    version: ProtocolVersion,
    read: u64,
    done: bool,
}

impl<R: Read> MessageReader<R> {
    /// Create a new message reader with default configuration.
    pub fn new(inner: R) -> Self {
        Self::with_config(inner, MessageConfig::default())
    }

    /// Create a new message reader with explicit configuration.
    pub fn with_config(inner: R, config: MessageConfig) -> Self {
        let source = match config.framed() {
            Some(frame) => Source::Framed(FrameReader::with_config(inner, frame)),
            None => Source::Cbor(CborReader::new(inner, &config.frame)),
        };
        Self {
            source,
            format: config.format,
            version: config.version,
            read: 0,
            done: false,
        }
    }

    /// Read the next message (blocking).
    ///
    /// Returns `Ok(None)` once the source is exhausted, or after an earlier
    /// error.
    pub fn read_message(&mut self) -> Result<Option<Message>> {
        if self.done {
            return Ok(None);
        }

        let next = match &mut self.source {
            Source::Framed(frames) => match frames.read_frame() {
                Ok(Some(segment)) => decode_segment(segment, self.version)
                    .map(Some)
                    .map_err(MessageError::from),
                Ok(None) => Ok(None),
                Err(err) => Err(err.into()),
            },
            Source::Cbor(items) => items.read_message(self.version),
        };

        match next {
            Ok(Some(message)) => {
                self.read += 1;
                tracing::debug!(tag = %message.tag(), index = self.read, "decoded message");
                Ok(Some(message))
            }
            Ok(None) => {
                tracing::debug!(messages = self.read, "message stream ended");
                self.done = true;
                Ok(None)
            }
            Err(err) => {
                if err.is_decode() {
                    tracing::warn!(index = self.read + 1, error = %err, "malformed segment");
                }
                self.done = true;
                Err(err)
            }
        }
    }

    /// Protocol version used for decoding.
    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    /// Stream format being read.
    pub fn format(&self) -> StreamFormat {
        self.format
    }

    /// Number of messages decoded so far.
    pub fn messages_read(&self) -> u64 {
        self.read
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &R {
        match &self.source {
            Source::Framed(frames) => frames.get_ref(),
            Source::Cbor(items) => items.get_ref(),
        }
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut R {
        match &mut self.source {
            Source::Framed(frames) => frames.get_mut(),
            Source::Cbor(items) => items.get_mut(),
        }
    }

    /// Consume the reader and return the inner stream.
    ///
    /// Bytes buffered for an incomplete frame are discarded.
    pub fn into_inner(self) -> R {
        match self.source {
            Source::Framed(frames) => frames.into_inner(),
            Source::Cbor(items) => items.into_inner(),
        }
    }
}

impl<R: Read> Iterator for MessageReader<R> {
    type Item = Result<Message>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_message().transpose()
    }
}

impl<R: Read> FusedIterator for MessageReader<R> {}
