use std::fmt;
use std::str::FromStr;

use crate::model::{Message, MessageTag};

/// Negotiated message set.
///
/// | Version | Tags | BlockEnd fields |
/// |---|---|---|
/// | `V1` | Header, BlockChunk, BlockEnd | `crc32c` (required) |
/// | `V2` | all five | `crc32`, `crc32c`, `xxh3` (each optional) |
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProtocolVersion {
    V1,
    #[default]
    V2,
}

const V1_TAGS: &[MessageTag] = &[
    MessageTag::Header,
    MessageTag::BlockChunk,
    MessageTag::BlockEnd,
];

const V2_TAGS: &[MessageTag] = &MessageTag::ALL;

impl ProtocolVersion {
    pub const LATEST: ProtocolVersion = ProtocolVersion::V2;

    pub fn number(self) -> u8 {
        match self {
            ProtocolVersion::V1 => 1,
            ProtocolVersion::V2 => 2,
        }
    }

    /// Tags this version can carry.
    pub fn tags(self) -> &'static [MessageTag] {
        match self {
            ProtocolVersion::V1 => V1_TAGS,
            ProtocolVersion::V2 => V2_TAGS,
        }
    }

    pub fn supports(self, tag: MessageTag) -> bool {
        self.tags().contains(&tag)
    }

    /// Checksum field names a BlockEnd may carry in this version.
    pub fn block_end_fields(self) -> &'static [&'static str] {
        match self {
            ProtocolVersion::V1 => &["crc32c"],
            ProtocolVersion::V2 => &["crc32", "crc32c", "xxh3"],
        }
    }

    /// True if `message` can be encoded without losing information.
    pub fn can_represent(self, message: &Message) -> bool {
        if !self.supports(message.tag()) {
            return false;
        }
        match (self, message) {
            (ProtocolVersion::V1, Message::BlockEnd(end)) => {
                end.crc32c.is_some() && end.crc32.is_none() && end.xxh3.is_none()
            }
            _ => true,
        }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Error returned when parsing an unknown protocol version.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown protocol version {0:?} (expected 1 or 2)")]
pub struct UnknownVersion(pub String);

impl FromStr for ProtocolVersion {
    type Err = UnknownVersion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches(['v', 'V']) {
            "1" => Ok(ProtocolVersion::V1),
            "2" => Ok(ProtocolVersion::V2),
            _ => Err(UnknownVersion(s.to_string())),
        }
    }
}
