//! Slot bookkeeping for one link direction.

use std::cell::Cell;

use super::error::LinkError;
use super::{BUF_SIZE, FRAME_RESERVE, MAX_OBJS};

/// Largest payload a direction may carry; the rest of the scratch buffer is
/// headroom for a 4-byte header and a 4-byte terminator.
pub const PAYLOAD_LIMIT: usize = BUF_SIZE - FRAME_RESERVE;

/// Ordered, append-only list of attached regions.
///
/// Attach order is payload order, and it must match on both ends.
#[derive(Debug)]
pub struct SlotList<'a> {
    slots: [Option<&'a [Cell<u8>]>; MAX_OBJS],
    count: usize,
    total: usize,
}

impl<'a> SlotList<'a> {
    pub const fn new() -> Self {
        Self {
            slots: [None; MAX_OBJS],
            count: 0,
            total: 0,
        }
    }

    /// Append `region`. On failure the list is left exactly as it was.
    pub fn attach(&mut self, region: &'a [Cell<u8>]) -> Result<(), LinkError> {
        if self.count >= MAX_OBJS {
            return Err(LinkError::SlotsExhausted { max: MAX_OBJS });
        }
        if self.total + region.len() > PAYLOAD_LIMIT {
            return Err(LinkError::CapacityExceeded {
                attached: self.total,
                requested: region.len(),
                limit: PAYLOAD_LIMIT,
            });
        }
        self.slots[self.count] = Some(region);
        self.count += 1;
        self.total += region.len();
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Sum of attached slot lengths, i.e. the payload length.
    pub fn total_bytes(&self) -> usize {
        self.total
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a [Cell<u8>]> + '_ {
        self.slots[..self.count].iter().flatten().copied()
    }

    /// Copy every slot into `out` back to back. `out` must hold `total_bytes()`.
    pub fn gather(&self, out: &mut [u8]) -> usize {
        let mut at = 0;
        for slot in self.iter() {
            for (dst, cell) in out[at..at + slot.len()].iter_mut().zip(slot) {
                *dst = cell.get();
            }
            at += slot.len();
        }
        at
    }

    /// Distribute `payload` over the slots: slot `i` gets the bytes starting
    /// at the sum of the lengths before it.
    pub fn scatter(&self, payload: &[u8]) {
        let mut at = 0;
        for slot in self.iter() {
            for (cell, &b) in slot.iter().zip(&payload[at..at + slot.len()]) {
                cell.set(b);
            }
            at += slot.len();
        }
    }
}

impl Default for SlotList<'_> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::Region;

    #[test]
    fn rejects_fifth_slot() {
        let regions: Vec<Region<1>> = (0..=MAX_OBJS).map(|_| Region::new()).collect();
        let mut list = SlotList::new();
        for r in &regions[..MAX_OBJS] {
            list.attach(r.cells()).unwrap();
        }
        let err = list.attach(regions[MAX_OBJS].cells()).unwrap_err();
        assert!(matches!(err, LinkError::SlotsExhausted { max: MAX_OBJS }));
        assert_eq!(list.len(), MAX_OBJS);
        assert_eq!(list.total_bytes(), MAX_OBJS);
    }

    #[test]
    fn byte_limit_is_exact_and_failure_keeps_total() {
        let big = Region::<{ PAYLOAD_LIMIT - 1 }>::new();
        let one = Region::<1>::new();
        let two = Region::<2>::new();
        let mut list = SlotList::new();
        list.attach(big.cells()).unwrap();
        assert!(matches!(
            list.attach(two.cells()),
            Err(LinkError::CapacityExceeded { attached, requested: 2, .. }) if attached == PAYLOAD_LIMIT - 1
        ));
        assert_eq!(list.total_bytes(), PAYLOAD_LIMIT - 1);
        assert_eq!(list.len(), 1);
        list.attach(one.cells()).unwrap();
        assert_eq!(list.total_bytes(), PAYLOAD_LIMIT);
    }

    #[test]
    fn gather_then_scatter_follows_attach_order() {
        let a = Region::with_bytes([1u8, 2]);
        let b = Region::with_bytes([3u8, 4, 5]);
        let mut list = SlotList::new();
        list.attach(a.cells()).unwrap();
        list.attach(b.cells()).unwrap();

        let mut buf = [0u8; 8];
        assert_eq!(list.gather(&mut buf), 5);
        assert_eq!(&buf[..5], &[1, 2, 3, 4, 5]);

        list.scatter(&[9, 8, 7, 6, 5]);
        assert_eq!(a.get(), [9, 8]);
        assert_eq!(b.get(), [7, 6, 5]);
    }
}
