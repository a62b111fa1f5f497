use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DataError {
    /// A read would run past the end of the current block.
    #[error("Overflow: read of {requested} bytes at offset {offset} exceeds {available} available")]
    Overflow {
        offset: usize,
        requested: usize,
        available: usize,
    },
}

pub type Result<T> = std::result::Result<T, DataError>;
