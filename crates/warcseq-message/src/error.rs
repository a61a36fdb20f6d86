use bytes::Bytes;
use warcseq_frame::FrameError;

use crate::model::MessageTag;
use crate::version::ProtocolVersion;

const PREVIEW_LEN: usize = 64;

/// Errors that can occur while encoding or decoding messages.
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    /// Frame-level error: I/O failure, oversized or ambiguous frame.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// A non-blank segment is not a valid structured form.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// The structured form could not be serialized.
    #[error("failed to serialize message: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The structured form could not be written as CBOR.
    #[error("failed to serialize message as CBOR: {0}")]
    Cbor(String),

    /// The message has no representation in the selected protocol version.
    #[error("{tag} cannot be represented in protocol version {version}")]
    Unrepresentable {
        tag: MessageTag,
        version: ProtocolVersion,
    },
}

impl MessageError {
    /// True for failures of the underlying source or sink.
    pub fn is_io(&self) -> bool {
        matches!(self, MessageError::Frame(FrameError::Io(_) | FrameError::Closed))
    }

    /// True for malformed input.
    pub fn is_decode(&self) -> bool {
        matches!(self, MessageError::Decode(_))
    }

    /// True if a payload could not be put on the wire unambiguously.
    pub fn is_ambiguity(&self) -> bool {
        matches!(
            self,
            MessageError::Frame(FrameError::AmbiguousPayload { .. })
        )
    }
}

impl From<std::io::Error> for MessageError {
    fn from(err: std::io::Error) -> Self {
        MessageError::Frame(FrameError::Io(err))
    }
}

/// Why a segment failed to decode.
#[derive(Debug, thiserror::Error)]
pub enum DecodeErrorKind {
    #[error("segment is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("item is not valid CBOR: {0}")]
    InvalidCbor(String),

    #[error("structured form must be an object with exactly one tag key")]
    NotTagged,

    #[error("unrecognized message tag {0:?}")]
    UnrecognizedTag(String),

    #[error("message tag {tag} is not part of protocol version {version}")]
    TagNotInVersion {
        tag: MessageTag,
        version: ProtocolVersion,
    },

    #[error("invalid {tag} fields: {source}")]
    InvalidFields {
        tag: MessageTag,
        #[source]
        source: serde_json::Error,
    },
}

/// A segment that failed to decode, kept for diagnostics.
#[derive(Debug, thiserror::Error)]
#[error("malformed segment {}: {kind}", preview(.segment))]
pub struct DecodeError {
    segment: Bytes,
    #[source]
    kind: DecodeErrorKind,
}

impl DecodeError {
    pub fn new(segment: Bytes, kind: DecodeErrorKind) -> Self {
        Self { segment, kind }
    }

    /// The offending segment, exactly as read between delimiters (or the
    /// bytes of the CBOR item).
    pub fn segment(&self) -> &[u8] {
        &self.segment
    }

    pub fn kind(&self) -> &DecodeErrorKind {
        &self.kind
    }

    pub fn into_kind(self) -> DecodeErrorKind {
        self.kind
    }
}

fn preview(segment: &[u8]) -> String {
    let Ok(text) = std::str::from_utf8(segment) else {
        let head: Vec<String> = segment
            .iter()
            .take(PREVIEW_LEN / 4)
            .map(|b| format!("{b:02x}"))
            .collect();
        return format!("<{} ({} bytes)>", head.join(" "), segment.len());
    };
    let text = text.trim();
    if text.chars().count() <= PREVIEW_LEN {
        return format!("{text:?}");
    }
    let head: String = text.chars().take(PREVIEW_LEN).collect();
    format!("{head:?}... ({} bytes)", segment.len())
}

pub type Result<T> = std::result::Result<T, MessageError>;
