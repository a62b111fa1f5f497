//! Binary primitives for Nima actor files.
//!
//! Actor files are little-endian and organized as nested blocks: a one-byte
//! type tag, a four-byte length and `length` bytes of payload. Readers for
//! newer block types can be skipped wholesale, which keeps old runtimes able
//! to load new files.

pub mod block;
pub mod error;

pub use block::BlockReader;
pub use error::{DataError, Result};

pub mod prelude {
    pub use crate::block::BlockReader;
    pub use crate::error::{DataError, Result};
}
