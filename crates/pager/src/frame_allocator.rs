//! Round-robin frame allocation with write-back eviction.
//!
//! Frames are handed out in strict rotation: the n-th completed fault lands in frame
//! `n % frame_count`. Once every frame has been used, the page occupying the next frame in
//! the rotation is evicted first. A dirty occupant is written to the lowest free swap slot;
//! a clean one is dropped, since it can be rebuilt from the program image or by
//! zero-filling.

use crate::{
    Error, FrameNumber, Location, MainMemory, PageNumber, PageTable, Result, SlotNumber,
    StoreKind, store::BackingStore, swap::SwapArea,
};

/// A page removed from its frame to make room for another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Eviction {
    /// The page that was evicted.
    pub page: PageNumber,
    /// The frame it occupied.
    pub frame: FrameNumber,
    /// The swap slot its contents were written to, if it was dirty.
    pub written_to: Option<SlotNumber>,
}

/// Chooses frames for incoming pages.
#[derive(Debug, Clone)]
pub struct FrameAllocator {
    frame_count: usize,
    /// Number of faults completed so far.
    allocations: u64,
}

impl FrameAllocator {
    /// Creates an allocator over `frame_count` frames.
    ///
    /// # Panics
    /// Panics if `frame_count` is zero.
    pub fn new(frame_count: usize) -> Self {
        assert!(frame_count > 0, "frame allocator needs at least one frame");
        Self {
            frame_count,
            allocations: 0,
        }
    }

    /// Returns the number of frames in the rotation.
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Returns the number of frames handed out so far.
    pub fn allocations(&self) -> u64 {
        self.allocations
    }

    /// Returns true once every frame has been handed out at least once.
    pub fn is_saturated(&self) -> bool {
        self.allocations >= self.frame_count as u64
    }

    /// Returns the frame the next fault will use.
    pub fn next_frame(&self) -> FrameNumber {
        FrameNumber::new((self.allocations % self.frame_count as u64) as usize)
    }

    /// Frees the next frame in the rotation, evicting its occupant if there is one.
    ///
    /// On error nothing has changed: the occupant is still resident and no swap slot is
    /// held.
    pub(crate) fn select_frame<S: BackingStore>(
        &self,
        table: &mut PageTable,
        memory: &MainMemory,
        swap: &mut SwapArea<S>,
    ) -> Result<(FrameNumber, Option<Eviction>)> {
        let frame = self.next_frame();

        let Some(page) = table.owner(frame) else {
            if self.is_saturated() {
                log::debug!("frame {frame} is vacant, reusing it without eviction");
            }
            return Ok((frame, None));
        };

        debug_assert!(
            self.is_saturated(),
            "frames are filled in order before the rotation wraps"
        );

        let entry = table.entry(page);
        let written_to = if entry.is_dirty() {
            let slot = swap.allocate().ok_or(Error::SwapExhausted { page })?;
            if let Err(source) = swap.write_slot(slot, memory.frame(frame)) {
                swap.abandon(slot);
                return Err(Error::Io {
                    store: StoreKind::SwapArea,
                    source,
                });
            }
            log::debug!("evicted dirty page {page} from frame {frame} to swap slot {slot}");
            Some(slot)
        } else {
            log::debug!("evicted clean page {page} from frame {frame}");
            None
        };

        let location = written_to.map_or(Location::Unmaterialized, Location::Swapped);
        table.unmap(frame, location);

        Ok((
            frame,
            Some(Eviction {
                page,
                frame,
                written_to,
            }),
        ))
    }

    /// Advances the rotation after a fault has placed a page in [`Self::next_frame`].
    pub(crate) fn commit(&mut self) {
        self.allocations += 1;
    }
}
