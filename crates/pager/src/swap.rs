//! The swap area.
//!
//! The swap area is a backing store divided into PAGE_SIZE slots. A free slot is filled
//! with [`SWAP_EMPTY`] bytes on disk, but which slots are free is decided by a bitmap kept
//! here, so page contents that happen to match the fill pattern cannot be mistaken for
//! free space:
//! - Bit = 0: slot is free
//! - Bit = 1: slot holds an evicted page

use std::io;

use crate::{
    SlotNumber,
    geometry::{PAGE_SIZE, SWAP_EMPTY},
    store::BackingStore,
};

const BITS_PER_WORD: usize = u64::BITS as usize;

const EMPTY_PAGE: [u8; PAGE_SIZE] = [SWAP_EMPTY; PAGE_SIZE];

/// Slot-granular access to a swap backing store.
pub struct SwapArea<S> {
    store: S,
    slot_count: usize,
    /// Bitmap tracking occupied slots (1 = occupied, 0 = free).
    bitmap: Vec<u64>,
    /// Number of free slots remaining.
    free_count: usize,
}

impl<S: BackingStore> SwapArea<S> {
    /// Fills every slot of `store` with the empty pattern and marks all slots free.
    ///
    /// Writes one page per slot.
    pub fn format(mut store: S, slot_count: usize) -> io::Result<Self> {
        for slot in 0..slot_count {
            store.write_at(SlotNumber::new(slot).byte_offset() as u64, &EMPTY_PAGE)?;
        }
        store.flush()?;

        Ok(Self {
            store,
            slot_count,
            bitmap: vec![0; slot_count.div_ceil(BITS_PER_WORD)],
            free_count: slot_count,
        })
    }

    /// Returns the number of slots.
    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    /// Returns the number of free slots.
    pub fn free_count(&self) -> usize {
        self.free_count
    }

    /// Returns whether `slot` is free.
    pub fn is_free(&self, slot: SlotNumber) -> bool {
        slot.as_usize() < self.slot_count && !self.test_bit(slot.as_usize())
    }

    /// Claims the lowest-numbered free slot.
    ///
    /// Returns None if every slot is occupied.
    pub fn allocate(&mut self) -> Option<SlotNumber> {
        let (word_index, word) = self
            .bitmap
            .iter()
            .enumerate()
            .find(|(_, word)| **word != u64::MAX)?;
        let slot = word_index * BITS_PER_WORD + word.trailing_ones() as usize;
        if slot >= self.slot_count {
            return None;
        }

        self.set_bit(slot, true);
        self.free_count -= 1;
        Some(SlotNumber::new(slot))
    }

    /// Writes a page into an allocated slot.
    pub fn write_slot(&mut self, slot: SlotNumber, page: &[u8]) -> io::Result<()> {
        debug_assert!(!self.is_free(slot), "slot must be allocated before writing");
        debug_assert_eq!(page.len(), PAGE_SIZE);
        self.store.write_at(slot.byte_offset() as u64, page)
    }

    /// Reads the page held in `slot`.
    pub fn read_slot(&mut self, slot: SlotNumber, page: &mut [u8]) -> io::Result<()> {
        debug_assert_eq!(page.len(), PAGE_SIZE);
        self.store.read_at(slot.byte_offset() as u64, page)
    }

    /// Refills `slot` with the empty pattern and marks it free.
    ///
    /// If the write fails the slot stays occupied.
    pub fn release(&mut self, slot: SlotNumber) -> io::Result<()> {
        debug_assert!(!self.is_free(slot), "double free of swap slot");
        self.store
            .write_at(slot.byte_offset() as u64, &EMPTY_PAGE)?;
        self.mark_free(slot);
        Ok(())
    }

    /// Marks `slot` free without touching the store.
    ///
    /// Used when a write into a freshly allocated slot failed.
    pub fn abandon(&mut self, slot: SlotNumber) {
        self.mark_free(slot);
    }

    /// Reads the whole swap area.
    pub fn read_all(&mut self) -> io::Result<Vec<u8>> {
        let mut bytes = vec![0u8; self.slot_count * PAGE_SIZE];
        self.store.read_at(0, &mut bytes)?;
        Ok(bytes)
    }

    /// Flushes the backing store.
    pub fn flush(&mut self) -> io::Result<()> {
        self.store.flush()
    }

    /// Returns the backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consumes the swap area, returning the backing store.
    pub fn into_inner(self) -> S {
        self.store
    }

    fn mark_free(&mut self, slot: SlotNumber) {
        if self.test_bit(slot.as_usize()) {
            self.set_bit(slot.as_usize(), false);
            self.free_count += 1;
        }
    }

    #[inline]
    fn test_bit(&self, slot: usize) -> bool {
        self.bitmap[slot / BITS_PER_WORD] & (1 << (slot % BITS_PER_WORD)) != 0
    }

    #[inline]
    fn set_bit(&mut self, slot: usize, occupied: bool) {
        let word = &mut self.bitmap[slot / BITS_PER_WORD];
        let mask = 1 << (slot % BITS_PER_WORD);
        if occupied {
            *word |= mask;
        } else {
            *word &= !mask;
        }
    }
}
