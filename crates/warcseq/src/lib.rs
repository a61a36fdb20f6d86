//! Stream WARC record events between processes as record-separated JSON.
//!
//! warcseq lets one process describe WARC records as a sequence of small
//! messages (metadata, header, body chunks, block end) and another process
//! read them back from a pipe, regardless of how the bytes are chunked in
//! transit.
//!
//! # Crate Structure
//!
//! - [`frame`]: Record-separator framing and stream reassembly
//! - [`message`]: Message model, protocol versions, stream formats, readers
//!   and writers

/// Re-export frame types.
pub mod frame {
    pub use warcseq_frame::*;
}

/// Re-export message types.
pub mod message {
    pub use warcseq_message::*;
}

pub use warcseq_message::{
    decode, encode, BlockEnd, Message, MessageConfig, MessageError, MessageReader, MessageWriter,
    ProtocolVersion, StreamFormat,
};
