//! Page table entries.

use core::fmt;

use crate::{FrameNumber, SlotNumber};

/// Page table entry flags.
///
/// Flags are stored as a raw usize with specific bits representing page state. Validity
/// is not a flag; it follows from the entry's [`Location`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageFlags(usize);

impl PageFlags {
    /// Dirty bit (bit 0).
    const DIRTY: usize = 1 << 0;

    /// Read-only bit (bit 1).
    const READ_ONLY: usize = 1 << 1;

    /// Creates empty page flags (clean and writable).
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Creates page flags from a raw usize value.
    pub const fn from_raw(raw: usize) -> Self {
        Self(raw)
    }

    /// Returns the raw usize value of these flags.
    pub const fn to_raw(self) -> usize {
        self.0
    }

    /// Returns whether the dirty bit is set.
    pub fn is_dirty(self) -> bool {
        (self.0 & Self::DIRTY) != 0
    }

    /// Sets or clears the dirty bit.
    pub fn set_dirty(&mut self, dirty: bool) {
        if dirty {
            self.0 |= Self::DIRTY;
        } else {
            self.0 &= !Self::DIRTY;
        }
    }

    /// Returns whether the read-only bit is set.
    pub fn is_read_only(self) -> bool {
        (self.0 & Self::READ_ONLY) != 0
    }

    /// Sets or clears the read-only bit.
    pub fn set_read_only(&mut self, read_only: bool) {
        if read_only {
            self.0 |= Self::READ_ONLY;
        } else {
            self.0 &= !Self::READ_ONLY;
        }
    }
}

/// Where the authoritative copy of a page lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Location {
    /// Never resident, or evicted while clean. The page is rebuilt from the program image
    /// or by zero-filling.
    #[default]
    Unmaterialized,
    /// Resident in a main memory frame.
    Resident(FrameNumber),
    /// Evicted while dirty; its bytes live in a swap slot.
    Swapped(SlotNumber),
}

impl fmt::Display for Location {
    /// Formats the location the way page table reports show it: the frame or slot index,
    /// or -1 for a page with neither.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unmaterialized => write!(f, "-1"),
            Self::Resident(frame) => write!(f, "{frame}"),
            Self::Swapped(slot) => write!(f, "{slot}"),
        }
    }
}

/// A single page table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageEntry {
    flags: PageFlags,
    location: Location,
}

impl PageEntry {
    /// Creates a non-resident, clean entry.
    pub const fn new(read_only: bool) -> Self {
        let flags = if read_only {
            PageFlags::from_raw(PageFlags::READ_ONLY)
        } else {
            PageFlags::empty()
        };
        Self {
            flags,
            location: Location::Unmaterialized,
        }
    }

    /// Returns the flags for this entry.
    pub fn flags(self) -> PageFlags {
        self.flags
    }

    /// Returns where the page currently lives.
    pub fn location(self) -> Location {
        self.location
    }

    /// Returns whether the page is resident in a frame.
    pub fn is_valid(self) -> bool {
        matches!(self.location, Location::Resident(_))
    }

    /// Returns whether the page was written since it was last loaded.
    pub fn is_dirty(self) -> bool {
        self.flags.is_dirty()
    }

    /// Returns whether stores to this page are rejected.
    pub fn is_read_only(self) -> bool {
        self.flags.is_read_only()
    }

    /// Returns the frame holding the page, if resident.
    pub fn frame(self) -> Option<FrameNumber> {
        match self.location {
            Location::Resident(frame) => Some(frame),
            _ => None,
        }
    }

    /// Returns the swap slot holding the page, if swapped out.
    pub fn swap_slot(self) -> Option<SlotNumber> {
        match self.location {
            Location::Swapped(slot) => Some(slot),
            _ => None,
        }
    }

    pub(crate) fn set_location(&mut self, location: Location) {
        self.location = location;
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.flags.set_dirty(true);
    }
}
