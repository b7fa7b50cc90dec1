use std::fmt::{Display, Formatter};

/// Error type for envelope extraction.
///
/// [`EnvelopeError::Open`] is only ever returned synchronously from
/// [`crate::SampleOperation::start`]. The other variants arrive through the
/// completion callback, exactly once per operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvelopeError {
    /// The source could not be opened (missing, unreadable, or unsupported).
    Open(String),
    /// The source failed mid-stream and reported a cause.
    Read(String),
    /// The operation was stopped through its cancellation handle.
    Cancelled,
    /// The source failed without attaching a cause.
    Unknown,
}

impl EnvelopeError {
    /// Whether this error came from a user-initiated cancel rather than a fault.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl Display for EnvelopeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open(err) => write!(f, "open error: {}", err),
            Self::Read(err) => write!(f, "read error: {}", err),
            Self::Cancelled => write!(f, "operation cancelled"),
            Self::Unknown => write!(f, "unknown error"),
        }
    }
}

impl std::error::Error for EnvelopeError {}

impl From<std::io::Error> for EnvelopeError {
    fn from(value: std::io::Error) -> Self {
        Self::Open(value.to_string())
    }
}

impl From<symphonia::core::errors::Error> for EnvelopeError {
    fn from(value: symphonia::core::errors::Error) -> Self {
        Self::Open(value.to_string())
    }
}
