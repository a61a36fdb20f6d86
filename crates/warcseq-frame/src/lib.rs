//! Record-separator framing with stream reassembly for WARC message pipes.
//!
//! Every frame on the wire is:
//! - The ASCII record separator `0x1E` as the delimiter
//! - A single-line payload that never contains `0x1E` or `\n`
//! - A terminating `\n`
//!
//! A segment is everything between two delimiters. Blank segments are
//! skipped, and the bytes after the last delimiter are still returned once
//! the stream ends, so the final frame needs no closing delimiter.
//!
//! [`Framing::LineDelimited`] drops the leading separator and splits on
//! `\n` instead, which gives JSON Lines with the same reassembly rules.

#[cfg(feature = "async")]
pub mod async_codec;
pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

#[cfg(feature = "async")]
pub use async_codec::FrameCodec;
pub use codec::{
    check_payload, encode_frame, frame_len, is_blank, FrameConfig, FrameDecoder, Framing,
    DEFAULT_MAX_FRAME_SIZE, DEFAULT_READ_CHUNK_SIZE, DELIMITER, TERMINATOR,
};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use writer::{flush, write_all, FrameWriter};
