use thiserror::Error;

/// Failure of a stream operation. The stream is left untouched whenever one
/// of these is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("writing {requested} bits at bit {cursor} exceeds the fixed capacity of {capacity} bits")]
    InsufficientCapacity {
        cursor: usize,
        requested: usize,
        capacity: usize,
    },
    #[error("reading {requested} bits at bit {cursor} runs past the end of the stream ({len} bits)")]
    InsufficientData {
        cursor: usize,
        requested: usize,
        len: usize,
    },
    #[error("buffer holds {available} bytes but {needed} are required")]
    BufferTooShort { needed: usize, available: usize },
    #[error("failed to grow stream storage to {bytes} bytes")]
    Allocation { bytes: usize },
    #[error("a width of {bits} bits is wider than the maximum of {max}")]
    InvalidWidth { bits: u32, max: u32 },
}

pub type Result<T> = std::result::Result<T, Error>;

