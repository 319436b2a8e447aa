use std::mem::size_of;

use crate::{error::Result, stream::BitStream};

/// A value with a fixed width bit representation.
///
/// Multi-byte values are laid out little endian, so the stream contents do
/// not depend on the host. [`BitStream::write`] and [`BitStream::read`] check
/// capacity and length for [`BitCodec::BITS`] bits before calling into an
/// implementation.
pub trait BitCodec: Sized {
    /// Number of bits the value occupies in a stream.
    const BITS: usize;

    fn encode(&self, stream: &mut BitStream<'_>) -> Result<()>;
    fn decode(stream: &mut BitStream<'_>) -> Result<Self>;
}

impl BitCodec for bool {
    const BITS: usize = 1;

    fn encode(&self, stream: &mut BitStream<'_>) -> Result<()> {
        stream.write_bit(*self)
    }

    fn decode(stream: &mut BitStream<'_>) -> Result<Self> {
        stream.read_bit()
    }
}

macro_rules! int_codec {
    ($($ty:ty),*) => {$(
        impl BitCodec for $ty {
            const BITS: usize = <$ty>::BITS as usize;

            fn encode(&self, stream: &mut BitStream<'_>) -> Result<()> {
                stream.write_bits(&self.to_le_bytes(), <Self as BitCodec>::BITS)
            }

            fn decode(stream: &mut BitStream<'_>) -> Result<Self> {
                let mut buf = [0; size_of::<$ty>()];
                stream.read_bits(&mut buf, <Self as BitCodec>::BITS)?;
                Ok(<$ty>::from_le_bytes(buf))
            }
        }
    )*};
}

int_codec!(u8, u16, u32, u64, u128, i8, i16, i32, i64, i128);

impl BitCodec for f32 {
    const BITS: usize = 32;

    fn encode(&self, stream: &mut BitStream<'_>) -> Result<()> {
        self.to_bits().encode(stream)
    }

    fn decode(stream: &mut BitStream<'_>) -> Result<Self> {
        u32::decode(stream).map(f32::from_bits)
    }
}

impl BitCodec for f64 {
    const BITS: usize = 64;

    fn encode(&self, stream: &mut BitStream<'_>) -> Result<()> {
        self.to_bits().encode(stream)
    }

    fn decode(stream: &mut BitStream<'_>) -> Result<Self> {
        u64::decode(stream).map(f64::from_bits)
    }
}

impl<T: BitCodec + Copy + Default, const N: usize> BitCodec for [T; N] {
    const BITS: usize = T::BITS * N;

    fn encode(&self, stream: &mut BitStream<'_>) -> Result<()> {
        self.iter().try_for_each(|item| item.encode(stream))
    }

    fn decode(stream: &mut BitStream<'_>) -> Result<Self> {
        let mut out = [T::default(); N];
        for slot in out.iter_mut() {
            *slot = T::decode(stream)?;
        }
        Ok(out)
    }
}
