//! Caller-owned object storage that can be attached to a [`Link`](super::Link).
//!
//! The link never owns the memory it frames. It borrows `&'a [Cell<u8>]`
//! slices for its whole lifetime, so the storage must outlive the link, and
//! because `Cell` is `!Sync` the borrow checker keeps everything on the one
//! control-loop thread. Application code keeps reading and writing the object
//! between `send()`/`receive()` calls through the same shared reference.

use std::cell::Cell;

/// Fixed-layout conversion for objects exchanged over the link.
///
/// Both ends must agree on `N` and the byte order; the provided types use
/// little-endian, matching the board.
pub trait Packed<const N: usize>: Sized {
    fn to_bytes(&self) -> [u8; N];
    fn from_bytes(bytes: [u8; N]) -> Self;
}

/// `N` bytes of interior-mutable storage.
#[derive(Debug)]
pub struct Region<const N: usize> {
    cells: [Cell<u8>; N],
}

impl<const N: usize> Region<N> {
    pub fn new() -> Self {
        Self {
            cells: std::array::from_fn(|_| Cell::new(0)),
        }
    }

    pub fn with_bytes(bytes: [u8; N]) -> Self {
        let region = Self::new();
        region.set(bytes);
        region
    }

    /// The slice handed to `attach_tx`/`attach_rx`.
    pub fn cells(&self) -> &[Cell<u8>] {
        &self.cells
    }

    pub fn get(&self) -> [u8; N] {
        std::array::from_fn(|i| self.cells[i].get())
    }

    pub fn set(&self, bytes: [u8; N]) {
        for (cell, b) in self.cells.iter().zip(bytes) {
            cell.set(b);
        }
    }

    pub fn store<T: Packed<N>>(&self, value: &T) {
        self.set(value.to_bytes());
    }

    pub fn load<T: Packed<N>>(&self) -> T {
        T::from_bytes(self.get())
    }

    pub const fn len(&self) -> usize {
        N
    }

    pub const fn is_empty(&self) -> bool {
        N == 0
    }
}

impl<const N: usize> Default for Region<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// View a plain mutable byte buffer as attachable cells.
pub fn as_cells(bytes: &mut [u8]) -> &[Cell<u8>] {
    Cell::from_mut(bytes).as_slice_of_cells()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Pair(u16, u16);

    impl Packed<4> for Pair {
        fn to_bytes(&self) -> [u8; 4] {
            let [a0, a1] = self.0.to_le_bytes();
            let [b0, b1] = self.1.to_le_bytes();
            [a0, a1, b0, b1]
        }

        fn from_bytes(b: [u8; 4]) -> Self {
            Pair(u16::from_le_bytes([b[0], b[1]]), u16::from_le_bytes([b[2], b[3]]))
        }
    }

    #[test]
    fn store_and_load_through_cells() {
        let region = Region::<4>::new();
        region.store(&Pair(0x1234, 0xBEEF));
        assert_eq!(region.get(), [0x34, 0x12, 0xEF, 0xBE]);

        region.cells()[0].set(0x00);
        let back: Pair = region.load();
        assert_eq!(back.0, 0x1200);
        assert_eq!(back.1, 0xBEEF);
    }

    #[test]
    fn plain_buffer_views_alias_storage() {
        let mut raw = [1u8, 2, 3];
        {
            let cells = as_cells(&mut raw);
            cells[1].set(9);
        }
        assert_eq!(raw, [1, 9, 3]);
    }
}
