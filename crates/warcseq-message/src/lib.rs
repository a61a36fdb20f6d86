//! Versioned WARC record event messages over record-separated JSON frames.
//!
//! A producer turns WARC records into a sequence of [`Message`]s (optional
//! metadata, a header, body chunks, a block end) and writes each one as a
//! frame:
//!
//! ```text
//! <0x1E>{"Header":{"version":"WARC/1.1","fields":[["WARC-Record-Type","resource"]]}}\n
//! <0x1E>{"BlockChunk":{"data":"SGVsbG8gd29ybGQh"}}\n
//! <0x1E>{"BlockEnd":{"crc32c":2073618257}}\n
//! ```
//!
//! A consumer reads the same frames back with [`decode`] or
//! [`MessageReader`], whatever the chunking of the underlying pipe.
//!
//! The same messages can also travel as JSON Lines or as a CBOR sequence;
//! pick one with [`StreamFormat`] in [`MessageConfig`].
//!
//! # Example
//!
//! ```
//! use warcseq_message::{decode, BlockEnd, Message, MessageWriter};
//!
//! let mut writer = MessageWriter::new(Vec::new());
//! writer.write_message(&Message::header("WARC/1.1", [("Content-Length", "2")]))?;
//! writer.write_message(&Message::block_chunk(b"hi".to_vec()))?;
//! writer.write_message(&Message::block_end(BlockEnd::crc32c(0x1234)))?;
//!
//! let wire = writer.into_inner();
//! let messages = decode(wire.as_slice()).collect::<Result<Vec<_>, _>>()?;
//! assert_eq!(messages.len(), 3);
//! # Ok::<(), warcseq_message::MessageError>(())
//! ```

#[cfg(feature = "async")]
pub mod async_codec;
pub mod cbor;
pub mod config;
pub mod error;
pub mod format;
pub mod model;
pub mod reader;
pub mod sequence;
pub mod structured;
pub mod version;
pub mod writer;

#[cfg(feature = "async")]
pub use async_codec::MessageCodec;
pub use config::MessageConfig;
pub use error::{DecodeError, DecodeErrorKind, MessageError, Result};
pub use format::{StreamFormat, UnknownFormat};
pub use model::{BlockChunk, BlockEnd, Header, Message, MessageTag, Metadata};
pub use reader::{decode, MessageReader};
pub use sequence::{RecordSummary, SequenceError, SequenceValidator};
pub use structured::{decode_segment, encode_payload};
pub use version::{ProtocolVersion, UnknownVersion};
pub use writer::{encode, MessageWriter};
