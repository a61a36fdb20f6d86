use std::io::Write;

use warcseq_frame::{FrameError, FrameWriter};

use crate::cbor::encode_item;
use crate::config::MessageConfig;
use crate::error::Result;
use crate::format::StreamFormat;
use crate::model::Message;
use crate::structured::encode_payload;
use crate::version::ProtocolVersion;

/// Encode one framed message into `sink` with the default configuration.
pub fn encode<W: Write>(sink: W, message: &Message) -> Result<()> {
    MessageWriter::new(sink).write_message(message)
}

enum Sink<W> {
    Framed(FrameWriter<W>),
    Cbor { inner: W, max_item_size: usize },
}

/// Writes framed messages to any `Write` stream.
pub struct MessageWriter<W> {
    sink: Sink<W>,
    format: StreamFormat,
    version: ProtocolVersion,
    written: u64,
}

impl<W: Write> MessageWriter<W> {
    /// Create a new message writer with default configuration.
    pub fn new(inner: W) -> Self {
        Self::with_config(inner, MessageConfig::default())
    }

    /// Create a new message writer with explicit configuration.
    pub fn with_config(inner: W, config: MessageConfig) -> Self {
        let sink = match config.framed() {
            Some(frame) => Sink::Framed(FrameWriter::with_config(inner, frame)),
            None => Sink::Cbor {
                inner,
                max_item_size: config.frame.max_frame_size,
            },
        };
        Self {
            sink,
            format: config.format,
            version: config.version,
            written: 0,
        }
    }

    /// Encode, frame, write and flush one message (blocking).
    ///
    /// Nothing is written if the message cannot be represented in the
    /// configured protocol version or its encoding would be ambiguous.
    pub fn write_message(&mut self, message: &Message) -> Result<()> {
        let len = match &mut self.sink {
            Sink::Framed(frames) => {
                let payload = encode_payload(message, self.version)?;
                frames.write_frame(&payload)?;
                payload.len()
            }
            Sink::Cbor {
                inner,
                max_item_size,
            } => {
                let item = encode_item(message, self.version)?;
                if item.len() > *max_item_size {
                    return Err(FrameError::FrameTooLarge {
                        size: item.len(),
                        max: *max_item_size,
                    }
                    .into());
                }
                warcseq_frame::write_all(inner, &item)?;
                warcseq_frame::flush(inner)?;
                item.len()
            }
        };
        self.written += 1;
        tracing::debug!(tag = %message.tag(), len, format = %self.format, "wrote message");
        Ok(())
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        match &mut self.sink {
            Sink::Framed(frames) => frames.flush()?,
            Sink::Cbor { inner, .. } => warcseq_frame::flush(inner)?,
        }
        Ok(())
    }

    /// Protocol version used for encoding.
    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    /// Stream format being written.
    pub fn format(&self) -> StreamFormat {
        self.format
    }

    /// Number of messages written so far.
    pub fn messages_written(&self) -> u64 {
        self.written
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &W {
        match &self.sink {
            Sink::Framed(frames) => frames.get_ref(),
            Sink::Cbor { inner, .. } => inner,
        }
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut W {
        match &mut self.sink {
            Sink::Framed(frames) => frames.get_mut(),
            Sink::Cbor { inner, .. } => inner,
        }
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> W {
        match self.sink {
            Sink::Framed(frames) => frames.into_inner(),
            Sink::Cbor { inner, .. } => inner,
        }
    }
}
