//! The closed set of messages exchanged over a WARC message stream.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One event in a WARC message stream.
///
/// A record is sent as optional [`Metadata`], a [`Header`], zero or more
/// [`BlockChunk`]s and a closing [`BlockEnd`]. [`Message::EndOfFile`] marks the
/// logical end of the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Metadata(Metadata),
    Header(Header),
    BlockChunk(BlockChunk),
    BlockEnd(BlockEnd),
    EndOfFile,
}

impl Message {
    /// Location of the following record in its source file.
    pub fn metadata(file: impl Into<String>, position: u64) -> Self {
        Self::Metadata(Metadata::new(file, position))
    }

    /// Start of a record.
    pub fn header<N, V>(
        version: impl Into<String>,
        fields: impl IntoIterator<Item = (N, V)>,
    ) -> Self
    where
        N: Into<String>,
        V: Into<String>,
    {
        Self::Header(Header::new(version, fields))
    }

    /// One piece of a record body.
    pub fn block_chunk(data: impl Into<Vec<u8>>) -> Self {
        Self::BlockChunk(BlockChunk::new(data))
    }

    /// End of a record body.
    pub fn block_end(end: BlockEnd) -> Self {
        Self::BlockEnd(end)
    }

    /// The tag naming this message's variant.
    pub fn tag(&self) -> MessageTag {
        match self {
            Message::Metadata(_) => MessageTag::Metadata,
            Message::Header(_) => MessageTag::Header,
            Message::BlockChunk(_) => MessageTag::BlockChunk,
            Message::BlockEnd(_) => MessageTag::BlockEnd,
            Message::EndOfFile => MessageTag::EndOfFile,
        }
    }
}

impl From<Metadata> for Message {
    fn from(value: Metadata) -> Self {
        Message::Metadata(value)
    }
}

impl From<Header> for Message {
    fn from(value: Header) -> Self {
        Message::Header(value)
    }
}

impl From<BlockChunk> for Message {
    fn from(value: BlockChunk) -> Self {
        Message::BlockChunk(value)
    }
}

impl From<BlockEnd> for Message {
    fn from(value: BlockEnd) -> Self {
        Message::BlockEnd(value)
    }
}

/// Variant tags, as they appear as the single key of a structured form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MessageTag {
    Metadata,
    Header,
    BlockChunk,
    BlockEnd,
    EndOfFile,
}

impl MessageTag {
    pub const ALL: [MessageTag; 5] = [
        MessageTag::Metadata,
        MessageTag::Header,
        MessageTag::BlockChunk,
        MessageTag::BlockEnd,
        MessageTag::EndOfFile,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MessageTag::Metadata => "Metadata",
            MessageTag::Header => "Header",
            MessageTag::BlockChunk => "BlockChunk",
            MessageTag::BlockEnd => "BlockEnd",
            MessageTag::EndOfFile => "EndOfFile",
        }
    }

    /// Look up a tag by its exact wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tag| tag.as_str() == name)
    }
}

impl fmt::Display for MessageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the next record came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Metadata {
    pub file: String,
    #[serde(deserialize_with = "numeric::deserialize")]
    pub position: u64,
}

impl Metadata {
    pub fn new(file: impl Into<String>, position: u64) -> Self {
        Self {
            file: file.into(),
            position,
        }
    }
}

/// A record header: version line plus fields in their original order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Header {
    pub version: String,
    pub fields: Vec<(String, String)>,
}

impl Header {
    pub fn new<N, V>(version: impl Into<String>, fields: impl IntoIterator<Item = (N, V)>) -> Self
    where
        N: Into<String>,
        V: Into<String>,
    {
        Self {
            version: version.into(),
            fields: fields
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }

    /// First value of the named field, compared case-insensitively.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// One chunk of a record body.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlockChunk {
    #[serde(with = "base64_data")]
    pub data: Vec<u8>,
}

impl BlockChunk {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self { data: data.into() }
    }
}

impl fmt::Debug for BlockChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockChunk")
            .field("data", &format_args!("<{} bytes>", self.data.len()))
            .finish()
    }
}

/// End of a record body, with whichever checksums the producer computed.
///
/// An absent checksum is `None`. It is never reported as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlockEnd {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crc32: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crc32c: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xxh3: Option<u64>,
}

impl BlockEnd {
    /// A block end carrying only a CRC-32C.
    pub fn crc32c(value: u32) -> Self {
        Self {
            crc32c: Some(value),
            ..Self::default()
        }
    }

    pub fn with_crc32(mut self, value: u32) -> Self {
        self.crc32 = Some(value);
        self
    }

    pub fn with_crc32c(mut self, value: u32) -> Self {
        self.crc32c = Some(value);
        self
    }

    pub fn with_xxh3(mut self, value: u64) -> Self {
        self.xxh3 = Some(value);
        self
    }

    /// True if no checksum is present.
    pub fn is_empty(&self) -> bool {
        self.crc32.is_none() && self.crc32c.is_none() && self.xxh3.is_none()
    }
}

/// Empty body of field-less variants: `{}`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct EmptyBody {}

/// First-revision block end: exactly one required CRC-32C.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct BlockEndV1 {
    pub crc32c: u32,
}

impl From<BlockEndV1> for BlockEnd {
    fn from(value: BlockEndV1) -> Self {
        BlockEnd::crc32c(value.crc32c)
    }
}

mod base64_data {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(s.as_bytes()).map_err(serde::de::Error::custom)
    }
}

// Producers written in other languages send the position as a string.
mod numeric {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(u64),
        String(String),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        match NumberOrString::deserialize(deserializer)? {
            NumberOrString::Number(n) => Ok(n),
            NumberOrString::String(s) => s.trim().parse().map_err(|_| {
                serde::de::Error::custom(format!("position {s:?} is not an unsigned integer"))
            }),
        }
    }
}
