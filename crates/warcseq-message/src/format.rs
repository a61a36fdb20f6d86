use std::fmt;
use std::str::FromStr;

use warcseq_frame::Framing;

/// Serialization of a message stream.
///
/// All three carry the same structured form; only the bytes around it
/// differ.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StreamFormat {
    /// JSON text sequences: `0x1E <json> \n` per message.
    #[default]
    JsonSeq,
    /// JSON Lines: `<json> \n` per message.
    Jsonl,
    /// CBOR sequences: consecutive self-delimiting CBOR data items.
    CborSeq,
}

impl StreamFormat {
    pub const ALL: [StreamFormat; 3] = [
        StreamFormat::JsonSeq,
        StreamFormat::Jsonl,
        StreamFormat::CborSeq,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StreamFormat::JsonSeq => "json-seq",
            StreamFormat::Jsonl => "jsonl",
            StreamFormat::CborSeq => "cbor-seq",
        }
    }

    /// Delimiter framing for the JSON formats. CBOR items delimit
    /// themselves.
    pub fn framing(self) -> Option<Framing> {
        match self {
            StreamFormat::JsonSeq => Some(Framing::RecordSeparated),
            StreamFormat::Jsonl => Some(Framing::LineDelimited),
            StreamFormat::CborSeq => None,
        }
    }
}

impl fmt::Display for StreamFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown stream format.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown stream format {0:?} (expected json-seq, jsonl or cbor-seq)")]
pub struct UnknownFormat(pub String);

impl FromStr for StreamFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json-seq" | "jsonseq" | "json" => Ok(StreamFormat::JsonSeq),
            "jsonl" | "json-lines" | "ndjson" => Ok(StreamFormat::Jsonl),
            "cbor-seq" | "cborseq" | "cbor" => Ok(StreamFormat::CborSeq),
            _ => Err(UnknownFormat(s.to_string())),
        }
    }
}
