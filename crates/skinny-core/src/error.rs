//! Error handling for the SCCP wire core
//!
//! Decode errors come in two severities. Framing violations mean the byte
//! stream can no longer be trusted and the connection should be dropped;
//! everything else is scoped to a single message and the session can keep
//! reading.

use thiserror::Error;

/// Result type alias for wire and capability operations
pub type Result<T> = std::result::Result<T, SccpError>;

/// Error type for SCCP message and capability operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SccpError {
    /// Not enough bytes left in the buffer for the structure being read
    #[error("Buffer too small: need {needed} bytes, got {actual}")]
    BufferTooSmall { needed: usize, actual: usize },

    /// Declared frame length below the protocol minimum
    #[error("Frame too short: declared length {length}, minimum is 4")]
    FrameTooShort { length: u32 },

    /// Declared frame length above the largest message this stack defines
    #[error("Frame too large: declared length {length}, maximum is {max}")]
    FrameTooLarge { length: u32, max: u32 },

    /// Message id not known to this stack
    #[error("Unknown message id 0x{id:04X}")]
    UnknownMessage { id: u32 },

    /// No byte layout registered for this message at the negotiated version
    #[error("Message {name} has no layout at protocol version {version}")]
    UnsupportedVersion { name: &'static str, version: u8 },

    /// Payload bytes did not match any valid encoding
    #[error("Malformed {name} payload: {details}")]
    MalformedPayload { name: &'static str, details: String },

    /// Fixed-capacity structure cannot take more entries
    #[error("Capacity exceeded: {capacity} entries")]
    CapacityExceeded { capacity: usize },

    /// Protocol family/version pair outside the supported tables
    #[error("Unsupported protocol: {family} version {version}")]
    UnsupportedProtocol { family: &'static str, version: u8 },

    /// host:port string could not be split
    #[error("Invalid host/port string: {input:?}")]
    InvalidHostPort { input: String },

    /// Port required by policy but absent
    #[error("Missing port in {input:?}")]
    MissingPort { input: String },

    /// Port present but forbidden by policy
    #[error("Unexpected port in {input:?}")]
    UnexpectedPort { input: String },
}

impl SccpError {
    /// Create a malformed-payload error
    pub fn malformed(name: &'static str, details: impl Into<String>) -> Self {
        Self::MalformedPayload {
            name,
            details: details.into(),
        }
    }

    /// Whether the connection that produced this error must be closed.
    ///
    /// A bad prologue means framing is lost and nothing after it can be
    /// re-synchronized. A message-scoped failure leaves the stream intact.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::BufferTooSmall { .. }
            | Self::FrameTooShort { .. }
            | Self::FrameTooLarge { .. } => true,

            Self::UnknownMessage { .. }
            | Self::UnsupportedVersion { .. }
            | Self::MalformedPayload { .. }
            | Self::CapacityExceeded { .. }
            | Self::UnsupportedProtocol { .. }
            | Self::InvalidHostPort { .. }
            | Self::MissingPort { .. }
            | Self::UnexpectedPort { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(SccpError::FrameTooShort { length: 2 }.is_fatal());
        assert!(SccpError::FrameTooLarge { length: 9000, max: 2040 }.is_fatal());
        assert!(!SccpError::UnknownMessage { id: 0x4242 }.is_fatal());
        assert!(!SccpError::malformed("Register", "truncated").is_fatal());
    }

    #[test]
    fn test_error_display() {
        let err = SccpError::UnknownMessage { id: 0x8F };
        assert_eq!(format!("{}", err), "Unknown message id 0x008F");

        let err = SccpError::BufferTooSmall { needed: 12, actual: 3 };
        assert!(format!("{}", err).contains("need 12"));
    }
}
