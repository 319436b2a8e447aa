use tracing::debug;

use crate::{
    codec::BitCodec,
    error::{Error, Result},
    quantum::{self, QUANTUM_BITS},
    storage::Storage,
};

/// Cursor addressed sequence of bits over byte quanta. Bits are ordered least
/// to most significant within each byte.
///
/// The stream either owns its memory, growing it as writes require, or wraps
/// a caller supplied buffer whose capacity is fixed.
#[derive(Debug)]
pub struct BitStream<'a> {
    storage: Storage<'a>,
    capacity: usize,
    len: usize,
    cursor: usize,
}

impl BitStream<'static> {
    /// Creates an empty stream. Memory is allocated on the first write.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty stream able to hold `bytes` bytes before it has to
    /// grow.
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            len: 0,
            ..Self::from_vec(vec![0; bytes])
        }
    }

    /// Takes ownership of `bytes`, treating all of them as valid data. The
    /// cursor starts at bit zero and the stream may grow.
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        let bits = bytes.len() * QUANTUM_BITS;
        Self {
            storage: Storage::Owned(bytes),
            capacity: bits,
            len: bits,
            cursor: 0,
        }
    }
}

impl<'a> BitStream<'a> {
    /// Wraps all of `bytes` without taking ownership. The whole region counts
    /// as valid data and the capacity can never change.
    pub fn from_slice(bytes: &'a mut [u8]) -> Self {
        let bits = bytes.len() * QUANTUM_BITS;
        Self {
            storage: Storage::Borrowed(bytes),
            capacity: bits,
            len: bits,
            cursor: 0,
        }
    }

    /// Wraps the first `bits` bits of `bytes` without taking ownership.
    pub fn from_slice_bits(bytes: &'a mut [u8], bits: usize) -> Result<Self> {
        let needed = quantum::count(bits);
        if bytes.len() < needed {
            return Err(Error::BufferTooShort {
                needed,
                available: bytes.len(),
            });
        }

        Ok(Self {
            storage: Storage::Borrowed(bytes),
            capacity: bits,
            len: bits,
            cursor: 0,
        })
    }

    /// Writes `bits` bits from `src` at the cursor, starting with the least
    /// significant bit of `src[0]`, and advances the cursor past them.
    pub fn write_bits(&mut self, src: &[u8], bits: usize) -> Result<()> {
        if bits == 0 {
            return Ok(());
        }

        let needed = quantum::count(bits);
        if src.len() < needed {
            return Err(Error::BufferTooShort {
                needed,
                available: src.len(),
            });
        }
        self.reserve_capacity(bits)?;

        let dst = self.storage.bytes_mut();
        let mut src = &src[..needed];
        let mut pos = self.cursor;
        let mut remaining = bits;

        // Aligned destinations take whole quanta in one copy, leaving at most
        // one partial quantum for the merge loop.
        if quantum::offset(pos) == 0 {
            let whole = remaining / QUANTUM_BITS;
            let start = quantum::index(pos);
            dst[start..start + whole].copy_from_slice(&src[..whole]);

            src = &src[whole..];
            pos += whole * QUANTUM_BITS;
            remaining -= whole * QUANTUM_BITS;
        }

        for &byte in src {
            let chunk = remaining.min(QUANTUM_BITS);
            quantum::merge(dst, pos, byte, chunk);
            pos += chunk;
            remaining -= chunk;
        }

        self.advance_written(pos);
        Ok(())
    }

    /// Reads `bits` bits at the cursor into `dst` and advances the cursor past
    /// them. Unused high bits of the last byte written to `dst` are cleared.
    pub fn read_bits(&mut self, dst: &mut [u8], bits: usize) -> Result<()> {
        if bits == 0 {
            return Ok(());
        }

        let needed = quantum::count(bits);
        if dst.len() < needed {
            return Err(Error::BufferTooShort {
                needed,
                available: dst.len(),
            });
        }
        self.check_readable(bits)?;

        let src = self.storage.bytes();
        let mut dst = &mut dst[..needed];
        let mut pos = self.cursor;
        let mut remaining = bits;

        if quantum::offset(pos) == 0 {
            let whole = remaining / QUANTUM_BITS;
            let start = quantum::index(pos);
            dst[..whole].copy_from_slice(&src[start..start + whole]);

            dst = &mut std::mem::take(&mut dst)[whole..];
            pos += whole * QUANTUM_BITS;
            remaining -= whole * QUANTUM_BITS;
        }

        for byte in dst {
            let chunk = remaining.min(QUANTUM_BITS);
            *byte = quantum::extract(src, pos, chunk);
            pos += chunk;
            remaining -= chunk;
        }

        self.cursor = pos;
        Ok(())
    }

    /// Writes a single bit.
    pub fn write_bit(&mut self, value: bool) -> Result<()> {
        self.reserve_capacity(1)?;

        let idx = quantum::index(self.cursor);
        let bit: u8 = 1 << quantum::offset(self.cursor);
        let dst = self.storage.bytes_mut();
        if value {
            dst[idx] |= bit;
        } else {
            dst[idx] &= !bit;
        }

        self.advance_written(self.cursor + 1);
        Ok(())
    }

    /// Reads a single bit.
    pub fn read_bit(&mut self) -> Result<bool> {
        self.check_readable(1)?;

        let idx = quantum::index(self.cursor);
        let bit = quantum::offset(self.cursor);
        let value = (self.storage.bytes()[idx] >> bit) & 1 != 0;

        self.cursor += 1;
        Ok(value)
    }

    /// Writes `value` using its [`BitCodec`] representation.
    pub fn write<T: BitCodec>(&mut self, value: T) -> Result<()> {
        self.reserve_capacity(T::BITS)?;
        value.encode(self)
    }

    /// Reads a `T` using its [`BitCodec`] representation.
    pub fn read<T: BitCodec>(&mut self) -> Result<T> {
        self.check_readable(T::BITS)?;
        T::decode(self)
    }

    /// Reads a `T` without moving the cursor.
    pub fn peek<T: BitCodec>(&mut self) -> Result<T> {
        let cursor = self.cursor;
        let value = self.read();
        self.cursor = cursor;
        value
    }

    /// Writes the low `bits` bits of `value`.
    pub fn write_uint(&mut self, value: u64, bits: u32) -> Result<()> {
        check_width(bits)?;
        self.write_bits(&value.to_le_bytes(), bits as usize)
    }

    /// Reads a `bits` wide unsigned integer.
    pub fn read_uint(&mut self, bits: u32) -> Result<u64> {
        check_width(bits)?;
        let mut buf = [0; 8];
        self.read_bits(&mut buf, bits as usize)?;
        Ok(u64::from_le_bytes(buf))
    }

    /// Writes every bit of `bytes`. The cursor does not need to be aligned.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.write_bits(bytes, bytes.len() * QUANTUM_BITS)
    }

    /// Reads `count` whole bytes. The cursor does not need to be aligned.
    pub fn read_bytes(&mut self, count: usize) -> Result<Vec<u8>> {
        let bits = count.saturating_mul(QUANTUM_BITS);
        self.check_readable(bits)?;

        let mut out = vec![0; count];
        self.read_bits(&mut out, bits)?;
        Ok(out)
    }

    /// Writes `bits` zero bits and returns the position they start at, so the
    /// region can be filled in later with [`BitStream::execute_at`].
    pub fn reserve(&mut self, bits: usize) -> Result<usize> {
        const ZEROS: [u8; 64] = [0; 64];
        const CHUNK: usize = ZEROS.len() * QUANTUM_BITS;

        self.reserve_capacity(bits)?;
        let start = self.cursor;
        let mut remaining = bits;
        while remaining > 0 {
            let chunk = remaining.min(CHUNK);
            self.write_bits(&ZEROS, chunk)?;
            remaining -= chunk;
        }

        Ok(start)
    }

    /// Runs `func` with the cursor moved to `pos`, then puts the cursor back
    /// where it was.
    pub fn execute_at<T>(&mut self, pos: usize, func: impl FnOnce(&mut Self) -> T) -> T {
        let cursor = self.cursor;
        self.seek(pos);
        let result = func(self);
        self.cursor = cursor;
        result
    }

    /// Moves the cursor by `delta` bits, clamped to `0..=capacity`.
    pub fn skip(&mut self, delta: isize) {
        self.cursor = self.cursor.saturating_add_signed(delta).min(self.capacity);
    }

    /// Moves the cursor to bit `pos`, clamped to the capacity.
    pub fn seek(&mut self, pos: usize) {
        self.cursor = pos.min(self.capacity);
    }

    /// Advances the cursor to the next multiple of `bytes` bytes. An already
    /// aligned cursor stays put. Like [`BitStream::skip`], the result is
    /// clamped to the capacity, so the boundary may not be reached.
    pub fn align(&mut self, bytes: usize) {
        let Some(bits) = bytes.checked_mul(QUANTUM_BITS).filter(|&bits| bits > 0) else {
            return;
        };

        let distance = (bits - self.cursor % bits) % bits;
        self.skip(isize::try_from(distance).unwrap_or(isize::MAX));
    }

    /// Forgets every bit at or past `bits`. The cursor is pulled back if it was
    /// beyond the new end.
    pub fn truncate(&mut self, bits: usize) {
        self.len = self.len.min(bits);
        self.cursor = self.cursor.min(self.len);
    }

    /// Empties the stream, keeping its memory.
    pub fn clear(&mut self) {
        self.len = 0;
        self.cursor = 0;
    }

    /// Current cursor position in bits.
    pub fn tell(&self) -> usize {
        self.cursor
    }

    /// Number of valid bits.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of bits the stream can hold without growing.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Valid bits left between the cursor and the end of the stream.
    pub fn remaining(&self) -> usize {
        self.len.saturating_sub(self.cursor)
    }

    pub fn is_at_end(&self) -> bool {
        self.cursor >= self.len
    }

    pub fn owns_memory(&self) -> bool {
        self.storage.is_owned()
    }

    /// The whole backing buffer, including bytes past the valid length.
    pub fn as_bytes(&self) -> &[u8] {
        self.storage.bytes()
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        self.storage.bytes_mut()
    }

    /// Consumes the stream, returning the bytes that hold valid bits. Owned
    /// memory is handed back without copying. Bits past the end of the stream
    /// in the final byte are cleared.
    pub fn into_bytes(self) -> Vec<u8> {
        let count = quantum::count(self.len);
        let mut bytes = match self.storage {
            Storage::Owned(mut buffer) => {
                buffer.truncate(count);
                buffer
            }
            Storage::Borrowed(buffer) => buffer[..count].to_vec(),
        };

        let tail = quantum::offset(self.len);
        if let Some(last) = bytes.last_mut().filter(|_| tail != 0) {
            *last &= (1u8 << tail) - 1;
        }
        bytes
    }

    /// Makes room for `bits` more bits at the cursor.
    fn reserve_capacity(&mut self, bits: usize) -> Result<()> {
        let required = self.cursor.checked_add(bits);
        if required.is_some_and(|required| required <= self.capacity) {
            return Ok(());
        }

        match required.and_then(|required| self.storage.grow(required)) {
            Some(capacity) => {
                self.capacity = capacity?;
                Ok(())
            }
            None => {
                let error = Error::InsufficientCapacity {
                    cursor: self.cursor,
                    requested: bits,
                    capacity: self.capacity,
                };
                debug!("Refusing to write past the end of a fixed buffer: {error}");
                Err(error)
            }
        }
    }

    fn check_readable(&self, bits: usize) -> Result<()> {
        if bits > self.remaining() {
            return Err(Error::InsufficientData {
                cursor: self.cursor,
                requested: bits,
                len: self.len,
            });
        }

        Ok(())
    }

    fn advance_written(&mut self, cursor: usize) {
        self.cursor = cursor;
        self.len = self.len.max(cursor);
    }
}

impl Default for BitStream<'static> {
    fn default() -> Self {
        Self::new()
    }
}

fn check_width(bits: u32) -> Result<()> {
    if bits > u64::BITS {
        return Err(Error::InvalidWidth {
            bits,
            max: u64::BITS,
        });
    }

    Ok(())
}
