use tracing::trace;

use crate::{
    error::{Error, Result},
    quantum::{self, QUANTUM_BITS},
};

/// Memory backing a [`BitStream`](crate::BitStream).
#[derive(Debug)]
pub(crate) enum Storage<'a> {
    /// Allocated by the stream. Grows on demand and is freed on drop.
    Owned(Vec<u8>),
    /// Supplied by the caller. Fixed in size and never freed by the stream.
    Borrowed(&'a mut [u8]),
}

impl Storage<'_> {
    pub fn bytes(&self) -> &[u8] {
        match self {
            Storage::Owned(buffer) => buffer,
            Storage::Borrowed(buffer) => buffer,
        }
    }

    pub fn bytes_mut(&mut self) -> &mut [u8] {
        match self {
            Storage::Owned(buffer) => buffer,
            Storage::Borrowed(buffer) => buffer,
        }
    }

    pub fn is_owned(&self) -> bool {
        matches!(self, Storage::Owned(_))
    }

    /// Grows owned storage so it can address at least `required` bits,
    /// returning the new capacity in bits. Borrowed storage cannot grow and
    /// yields `None`.
    pub fn grow(&mut self, required: usize) -> Option<Result<usize>> {
        let Storage::Owned(buffer) = self else {
            return None;
        };

        Some(grown_capacity(required).and_then(|capacity| {
            let bytes = quantum::count(capacity);
            buffer
                .try_reserve_exact(bytes.saturating_sub(buffer.len()))
                .map_err(|_| Error::Allocation { bytes })?;
            buffer.resize(bytes, 0);

            trace!("Grew bit stream storage to {bytes} bytes ({required} bits requested)");
            Ok(capacity)
        }))
    }
}

/// Capacity in bits chosen when `required` bits no longer fit: half again the
/// requirement plus four quanta of slack, rounded up to a whole quantum.
pub(crate) fn grown_capacity(required: usize) -> Result<usize> {
    required
        .checked_add(4 * QUANTUM_BITS)
        .and_then(|bits| bits.checked_add(required / 2))
        .and_then(|bits| bits.checked_next_multiple_of(QUANTUM_BITS))
        .ok_or(Error::Allocation { bytes: usize::MAX })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn growth_policy() {
        assert_eq!(grown_capacity(1).unwrap(), 40);
        assert_eq!(grown_capacity(34).unwrap(), 88);
        assert_eq!(grown_capacity(100).unwrap(), 184);
        assert!(grown_capacity(usize::MAX).is_err());
    }

    #[test]
    fn grow_owned_preserves_contents() {
        let mut storage = Storage::Owned(vec![0xAB, 0xCD]);
        let capacity = storage.grow(17).unwrap().unwrap();

        assert_eq!(capacity, 64);
        assert_eq!(storage.bytes(), &[0xAB, 0xCD, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn borrowed_never_grows() {
        let mut buffer = [0u8; 2];
        let mut storage = Storage::Borrowed(&mut buffer);

        assert!(storage.grow(64).is_none());
        assert_eq!(storage.bytes().len(), 2);
        assert!(!storage.is_owned());
    }
}
