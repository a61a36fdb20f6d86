use warcseq_frame::FrameConfig;

use crate::format::StreamFormat;
use crate::version::ProtocolVersion;

/// Configuration for message readers and writers.
#[derive(Debug, Clone, Default)]
pub struct MessageConfig {
    /// Size limits for the underlying stream. Its framing is replaced by the
    /// one `format` calls for.
    pub frame: FrameConfig,
    /// Message set used to decode and encode.
    pub version: ProtocolVersion,
    /// Bytes around each message.
    pub format: StreamFormat,
}

impl MessageConfig {
    pub fn with_version(version: ProtocolVersion) -> Self {
        Self {
            version,
            ..Self::default()
        }
    }

    pub fn with_format(format: StreamFormat) -> Self {
        Self {
            format,
            ..Self::default()
        }
    }

    /// Frame settings with the framing of the JSON formats applied.
    pub(crate) fn framed(&self) -> Option<FrameConfig> {
        self.format.framing().map(|framing| FrameConfig {
            framing,
            ..self.frame.clone()
        })
    }
}
