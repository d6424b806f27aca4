//! Error types for the SDCP wire layer

use thiserror::Error;

/// Result type alias for wire operations
pub type Result<T> = std::result::Result<T, Error>;

/// Wire-level error types
#[derive(Error, Debug)]
pub enum Error {
    /// JSON encoding failed
    #[error("encode error: {0}")]
    Encode(String),

    /// The frame is not a JSON object carrying a `Topic`
    #[error("invalid envelope: {0}")]
    Envelope(String),

    /// The envelope was readable but its payload did not match the shape for its topic
    #[error("decode error on {topic}: {reason}")]
    Payload { topic: String, reason: String },

    /// Generic JSON decoding error
    #[error("decode error: {0}")]
    Decode(String),
}

impl Error {
    /// Envelope failures mean the byte stream itself is unusable
    pub fn is_envelope(&self) -> bool {
        matches!(self, Error::Envelope(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        if e.is_data() || e.is_syntax() || e.is_eof() {
            Error::Decode(e.to_string())
        } else {
            Error::Encode(e.to_string())
        }
    }
}
