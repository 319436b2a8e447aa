//! Bit granular read/write streams.
//!
//! A [`BitStream`] packs values at arbitrary bit offsets, least significant
//! bit first within each byte. It either owns a growable buffer or wraps a
//! caller supplied slice of fixed size.
//!
//! ```
//! use bitstream::BitStream;
//!
//! let mut stream = BitStream::new();
//! stream.write(true)?;
//! stream.write(0xDEADBEEF_u32)?;
//! stream.write(false)?;
//!
//! stream.seek(0);
//! assert!(stream.read::<bool>()?);
//! assert_eq!(stream.read::<u32>()?, 0xDEADBEEF);
//! assert!(!stream.read::<bool>()?);
//! assert_eq!(stream.tell(), 34);
//! # Ok::<(), bitstream::Error>(())
//! ```

mod codec;
mod error;
mod quantum;
mod storage;
mod stream;

pub use codec::BitCodec;
pub use error::{Error, Result};
pub use quantum::QUANTUM_BITS;
pub use stream::BitStream;
