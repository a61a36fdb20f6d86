/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// More bytes were buffered for one segment than the configured maximum.
    #[error("frame too large ({size} bytes, max {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// The payload contains a byte that carries meaning on the wire.
    #[error("payload byte 0x{byte:02x} at offset {offset} would be ambiguous on the wire")]
    AmbiguousPayload { byte: u8, offset: usize },

    /// The sink stopped accepting bytes before a frame was fully written.
    #[error("stream closed (incomplete frame written)")]
    Closed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
