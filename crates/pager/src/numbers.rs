//! Page, frame and swap slot numbers.
//!
//! All three index page-sized units: pages of the address space, frames of main memory
//! and slots of the swap area. Keeping them as distinct types stops a frame index from
//! being used where a slot is expected.

use core::fmt;

use crate::{address::PhysicalAddress, geometry::PAGE_SIZE};

macro_rules! impl_page_number_common {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(transparent)]
        pub struct $name(usize);

        impl $name {
            #[inline]
            pub const fn new(index: usize) -> Self {
                Self(index)
            }

            #[inline]
            pub const fn as_usize(self) -> usize {
                self.0
            }

            /// Returns the offset of the first byte of this unit in its backing storage.
            #[inline]
            pub const fn byte_offset(self) -> usize {
                self.0 * PAGE_SIZE
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

impl_page_number_common!(FrameNumber, "The index of a frame in main memory.");

impl FrameNumber {
    /// Returns the physical address of the first byte of this frame.
    #[inline]
    pub const fn start(self) -> PhysicalAddress {
        PhysicalAddress::new(self.byte_offset())
    }
}

impl_page_number_common!(PageNumber, "The index of a page in the virtual address space.");

impl_page_number_common!(
    SlotNumber,
    "The index of a swap slot.\n\nEach slot holds the bytes of one evicted dirty page."
);
