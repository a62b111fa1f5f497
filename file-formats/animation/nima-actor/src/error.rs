use nima_data::DataError;
use thiserror::Error;

/// Error types for actor loading
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActorError {
    /// A read ran past the bound of the block being parsed
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    /// Invalid magic number in the file header
    #[error("Invalid magic number: expected {expected:?}, got {actual:?}")]
    InvalidMagic { expected: [u8; 4], actual: [u8; 4] },

    /// File version older than the runtime understands
    #[error("Unsupported version: {version} (minimum {minimum})")]
    UnsupportedVersion { version: u32, minimum: u32 },
}

impl ActorError {
    /// Bad magic or a version below the supported minimum
    pub fn is_unsupported_format(&self) -> bool {
        matches!(
            self,
            Self::InvalidMagic { .. } | Self::UnsupportedVersion { .. }
        )
    }

    pub fn is_overflow(&self) -> bool {
        matches!(self, Self::Data(DataError::Overflow { .. }))
    }
}

/// Result type using ActorError
pub type Result<T> = std::result::Result<T, ActorError>;
