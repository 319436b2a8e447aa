//! Addressing helpers for the byte quanta backing a stream.

/// Width in bits of the smallest addressable storage unit.
pub const QUANTUM_BITS: usize = u8::BITS as usize;
const QUANTUM_BITS_LOG2: u32 = QUANTUM_BITS.trailing_zeros();

/// Index of the quantum holding `bit`.
#[inline]
pub fn index(bit: usize) -> usize {
    bit >> QUANTUM_BITS_LOG2
}

/// Position of `bit` within its quantum.
#[inline]
pub fn offset(bit: usize) -> usize {
    bit & (QUANTUM_BITS - 1)
}

/// Number of quanta needed to hold `bits` bits.
#[inline]
pub fn count(bits: usize) -> usize {
    bits.div_ceil(QUANTUM_BITS)
}

/// Mask covering the low `bits` bits, `bits <= 8`.
#[inline]
fn low_mask(bits: usize) -> u16 {
    (1 << bits) - 1
}

/// Writes the low `bits` bits of `value` at bit position `pos`, leaving every
/// other bit of `dst` as it was. The run may straddle two quanta.
#[inline]
pub fn merge(dst: &mut [u8], pos: usize, value: u8, bits: usize) {
    debug_assert!((1..=QUANTUM_BITS).contains(&bits));

    let idx = index(pos);
    let shift = offset(pos);
    let mask = low_mask(bits) << shift;
    let window = ((value as u16) << shift) & mask;

    dst[idx] = (dst[idx] & !(mask as u8)) | window as u8;
    if shift + bits > QUANTUM_BITS {
        let high = (mask >> QUANTUM_BITS) as u8;
        dst[idx + 1] = (dst[idx + 1] & !high) | (window >> QUANTUM_BITS) as u8;
    }
}

/// Reads `bits` bits starting at bit position `pos`. Bits above `bits` in the
/// result are zero.
#[inline]
pub fn extract(src: &[u8], pos: usize, bits: usize) -> u8 {
    debug_assert!((1..=QUANTUM_BITS).contains(&bits));

    let idx = index(pos);
    let shift = offset(pos);
    let mut window = src[idx] as u16;
    if shift + bits > QUANTUM_BITS {
        window |= (src[idx + 1] as u16) << QUANTUM_BITS;
    }

    ((window >> shift) & low_mask(bits)) as u8
}
