//! Page fault resolution.
//!
//! A fault brings a non-resident page into the next frame of the rotation. The page's
//! bytes come from, in order of preference:
//! - its swap slot, if it was evicted while dirty (the slot is freed afterwards),
//! - the program image, if the page starts inside the text or data segment,
//! - nowhere: the frame is zero-filled.

use core::fmt;

use crate::{
    Error, FrameNumber, Location, PageNumber, Result, SlotNumber, StoreKind, simulator::Simulator,
    store::BackingStore,
};

/// Where the contents of a faulted page came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultSource {
    /// Restored from a swap slot.
    Swap(SlotNumber),
    /// Read from the program image.
    ProgramImage,
    /// Zero-filled.
    ZeroFill,
}

impl fmt::Display for FaultSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Swap(slot) => write!(f, "swap slot {slot}"),
            Self::ProgramImage => write!(f, "program image"),
            Self::ZeroFill => write!(f, "zero fill"),
        }
    }
}

impl<I: BackingStore, S: BackingStore> Simulator<I, S> {
    /// Makes `page` resident, returning the frame that now holds it.
    ///
    /// If this fails after an eviction, the eviction stands and the chosen frame is left
    /// vacant; `page` itself is unchanged.
    pub(crate) fn resolve_fault(&mut self, page: PageNumber) -> Result<FrameNumber> {
        let entry = self.table.entry(page);
        if let Some(frame) = entry.frame() {
            return Ok(frame);
        }

        let (frame, eviction) =
            self.allocator
                .select_frame(&mut self.table, &self.memory, &mut self.swap)?;
        if let Some(eviction) = eviction {
            self.stats.record_eviction(&eviction);
        }

        let source = match entry.location() {
            Location::Swapped(slot) => {
                debug_assert!(entry.is_dirty(), "only dirty pages are written to swap");
                self.swap
                    .read_slot(slot, self.memory.frame_mut(frame))
                    .map_err(Error::io(StoreKind::SwapArea))?;
                self.swap
                    .release(slot)
                    .map_err(Error::io(StoreKind::SwapArea))?;
                FaultSource::Swap(slot)
            }
            Location::Unmaterialized if self.image.contains(page) => {
                self.image
                    .read_page(page, self.memory.frame_mut(frame))
                    .map_err(Error::io(StoreKind::ProgramImage))?;
                FaultSource::ProgramImage
            }
            Location::Unmaterialized => {
                self.memory.zero_frame(frame);
                FaultSource::ZeroFill
            }
            Location::Resident(_) => unreachable!("resident pages returned early"),
        };

        self.table.map(page, frame);
        self.allocator.commit();
        self.stats.record_fault(source);
        log::debug!("page {page} faulted into frame {frame} from {source}");

        Ok(frame)
    }
}
