//! Fixed sizes of the simulated machine.
//!
//! The page size is a compile-time constant. The number of pages, frames and swap slots
//! default to the values below but can be chosen per [`Geometry`], which lets tests build
//! small machines (for example a swap area with a single slot).

use crate::{Error, PageEntry, PageNumber, Result};

/// Number of bits in a page offset.
pub const PAGE_SHIFT: usize = 3;

/// Page size in bytes (8 bytes = 2^3).
pub const PAGE_SIZE: usize = 1 << PAGE_SHIFT;

/// Default number of virtual pages.
pub const NUM_OF_PAGES: usize = 25;

/// Default size of main memory in bytes (5 frames).
pub const MEMORY_SIZE: usize = 40;

/// Default size of the swap area in bytes (25 slots).
pub const SWAP_SIZE: usize = 200;

/// Byte pattern a free swap slot is filled with.
pub const SWAP_EMPTY: u8 = b'0';

/// Page, frame and slot counts for one simulated machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    page_count: usize,
    frame_count: usize,
    slot_count: usize,
}

impl Geometry {
    /// The default machine: a 200 byte address space, 40 bytes of memory and a 200 byte
    /// swap area.
    pub const DEFAULT: Geometry = Geometry {
        page_count: NUM_OF_PAGES,
        frame_count: MEMORY_SIZE / PAGE_SIZE,
        slot_count: SWAP_SIZE / PAGE_SIZE,
    };

    /// Creates a geometry from page, frame and slot counts.
    ///
    /// The result is not checked; [`Geometry::validate`] runs when a simulator is built.
    pub const fn new(page_count: usize, frame_count: usize, slot_count: usize) -> Self {
        Self {
            page_count,
            frame_count,
            slot_count,
        }
    }

    /// Creates a geometry from byte sizes, each of which must be a whole number of pages.
    pub fn from_sizes(address_space: usize, memory: usize, swap: usize) -> Result<Self> {
        if address_space % PAGE_SIZE != 0 {
            return Err(Error::InvalidGeometry(
                "address space size is not a multiple of the page size",
            ));
        }
        if memory % PAGE_SIZE != 0 {
            return Err(Error::InvalidGeometry(
                "memory size is not a multiple of the page size",
            ));
        }
        if swap % PAGE_SIZE != 0 {
            return Err(Error::InvalidGeometry(
                "swap size is not a multiple of the page size",
            ));
        }

        let geometry = Self::new(
            address_space / PAGE_SIZE,
            memory / PAGE_SIZE,
            swap / PAGE_SIZE,
        );
        geometry.validate()?;
        Ok(geometry)
    }

    /// Checks that the machine can hold at least one resident page.
    pub fn validate(&self) -> Result<()> {
        if self.page_count == 0 {
            return Err(Error::InvalidGeometry("address space has no pages"));
        }
        if self.frame_count == 0 {
            return Err(Error::InvalidGeometry("main memory has no frames"));
        }
        // Each count must size both its byte buffer and its bookkeeping table.
        let fits = |count: usize, unit: usize| {
            count
                .checked_mul(unit.max(PAGE_SIZE))
                .is_some_and(|bytes| bytes <= isize::MAX as usize)
        };
        if !fits(self.page_count, size_of::<PageEntry>())
            || !fits(self.frame_count, size_of::<Option<PageNumber>>())
            || !fits(self.slot_count, PAGE_SIZE)
        {
            return Err(Error::InvalidGeometry("size overflows the address width"));
        }
        Ok(())
    }

    /// Returns the number of virtual pages.
    pub const fn page_count(&self) -> usize {
        self.page_count
    }

    /// Returns the number of main memory frames.
    pub const fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Returns the number of swap slots.
    pub const fn slot_count(&self) -> usize {
        self.slot_count
    }

    /// Returns the size of the virtual address space in bytes.
    pub const fn address_space_size(&self) -> usize {
        self.page_count * PAGE_SIZE
    }

    /// Returns the size of main memory in bytes.
    pub const fn memory_size(&self) -> usize {
        self.frame_count * PAGE_SIZE
    }

    /// Returns the size of the swap area in bytes.
    pub const fn swap_size(&self) -> usize {
        self.slot_count * PAGE_SIZE
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Self::DEFAULT
    }
}
