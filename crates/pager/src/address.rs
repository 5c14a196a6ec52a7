//! Address types and virtual-to-physical translation.
//!
//! Virtual addresses are linear byte addresses into the simulated address space.
//! Physical addresses are byte offsets into main memory.

use core::{fmt, ops::Add};

use crate::{
    FrameNumber, PageNumber,
    geometry::{PAGE_SHIFT, PAGE_SIZE},
};

macro_rules! impl_address_common {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(transparent)]
        pub struct $name(usize);

        impl $name {
            #[inline]
            pub const fn new(byte: usize) -> Self {
                Self(byte)
            }

            #[inline]
            pub const fn as_usize(self) -> usize {
                self.0
            }

            /// Returns the byte's position within its page or frame.
            #[inline]
            pub const fn page_offset(self) -> usize {
                self.0 & (PAGE_SIZE - 1)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({:#x})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

impl_address_common!(PhysicalAddress, "A byte offset into main memory.");

impl PhysicalAddress {
    /// Returns the frame containing this byte.
    #[inline]
    pub const fn frame_number(self) -> FrameNumber {
        FrameNumber::new(self.0 >> PAGE_SHIFT)
    }
}

impl Add<usize> for PhysicalAddress {
    type Output = Self;

    #[inline]
    fn add(self, offset: usize) -> Self {
        Self(self.0 + offset)
    }
}

impl_address_common!(
    VirtualAddress,
    "A linear byte address in the simulated address space.\n\n\
     The page number is the address divided by the page size and the offset is the\n\
     remainder."
);

impl VirtualAddress {
    /// Returns the page containing this byte.
    #[inline]
    pub const fn page_number(self) -> PageNumber {
        PageNumber::new(self.0 >> PAGE_SHIFT)
    }
}

impl TryFrom<isize> for VirtualAddress {
    type Error = AddressError;

    fn try_from(addr: isize) -> Result<Self, Self::Error> {
        usize::try_from(addr)
            .map(Self::new)
            .map_err(|_| AddressError::Negative(addr))
    }
}

/// An access outside the simulated address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressError {
    /// The raw address was negative.
    Negative(isize),
    /// The page number is past the last page.
    OutOfRange {
        address: VirtualAddress,
        page: PageNumber,
        page_count: usize,
    },
}

impl fmt::Display for AddressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Negative(addr) => write!(f, "address {addr} is negative"),
            Self::OutOfRange {
                address,
                page,
                page_count,
            } => write!(
                f,
                "address {address} is on page {page}, but the address space has {page_count} pages"
            ),
        }
    }
}

impl std::error::Error for AddressError {}

/// Splits virtual addresses into page and offset and checks them against the page count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressTranslator {
    page_count: usize,
}

impl AddressTranslator {
    /// Creates a translator for an address space of `page_count` pages.
    pub const fn new(page_count: usize) -> Self {
        Self { page_count }
    }

    /// Returns the number of pages the translator accepts.
    pub const fn page_count(&self) -> usize {
        self.page_count
    }

    /// Translates a virtual address into its page number and offset within the page.
    pub fn translate(&self, address: VirtualAddress) -> Result<(PageNumber, usize), AddressError> {
        let page = address.page_number();
        if page.as_usize() >= self.page_count {
            return Err(AddressError::OutOfRange {
                address,
                page,
                page_count: self.page_count,
            });
        }
        Ok((page, address.page_offset()))
    }

    /// Returns the physical address of `offset` within `frame`.
    #[inline]
    pub fn physical(frame: FrameNumber, offset: usize) -> PhysicalAddress {
        debug_assert!(offset < PAGE_SIZE, "offset must lie within one page");
        frame.start() + offset
    }
}
