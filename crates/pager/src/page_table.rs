//! The page table and its frame ownership index.
//!
//! Every virtual page has one [`PageEntry`]. Alongside the entries the table keeps a
//! reverse index from frame number to the page resident in it, so eviction can find the
//! occupant of a frame without scanning and the one-page-per-frame rule can be checked.

use crate::{FrameNumber, Location, PageEntry, PageNumber};

/// Ways the page table can disagree with its frame ownership index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvariantViolation {
    /// A resident entry names a frame whose index entry points elsewhere.
    UnownedResident { page: PageNumber, frame: FrameNumber },
    /// An index entry names a page that is not resident in that frame.
    StaleOwner { frame: FrameNumber, page: PageNumber },
}

/// Per-page metadata for the whole address space.
pub struct PageTable {
    /// One entry per virtual page.
    entries: Box<[PageEntry]>,
    /// The page resident in each frame, if any.
    frame_owners: Box<[Option<PageNumber>]>,
}

impl PageTable {
    /// Creates a table with every page non-resident and clean.
    ///
    /// The first `read_only_pages` pages are marked read-only.
    pub fn new(page_count: usize, frame_count: usize, read_only_pages: usize) -> Self {
        let entries = (0..page_count)
            .map(|page| PageEntry::new(page < read_only_pages))
            .collect();

        Self {
            entries,
            frame_owners: vec![None; frame_count].into_boxed_slice(),
        }
    }

    /// Returns the number of entries in this page table.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of frames tracked by the ownership index.
    pub fn frame_count(&self) -> usize {
        self.frame_owners.len()
    }

    /// Returns the entry for `page`.
    ///
    /// # Panics
    /// Panics if `page` is outside the table.
    pub fn entry(&self, page: PageNumber) -> PageEntry {
        assert!(page.as_usize() < self.len(), "page number out of bounds");
        self.entries[page.as_usize()]
    }

    /// Returns the entry for `page`, or None if `page` is outside the table.
    pub fn get(&self, page: PageNumber) -> Option<PageEntry> {
        self.entries.get(page.as_usize()).copied()
    }

    /// Returns the page resident in `frame`, if any.
    pub fn owner(&self, frame: FrameNumber) -> Option<PageNumber> {
        self.frame_owners.get(frame.as_usize()).copied().flatten()
    }

    /// Iterates over all entries with their page numbers.
    pub fn iter(&self) -> impl Iterator<Item = (PageNumber, PageEntry)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .map(|(page, entry)| (PageNumber::new(page), *entry))
    }

    /// Makes `page` resident in `frame`.
    pub(crate) fn map(&mut self, page: PageNumber, frame: FrameNumber) {
        debug_assert!(
            self.owner(frame).is_none(),
            "frame must be vacant before a page is mapped into it"
        );
        debug_assert!(
            !self.entry(page).is_valid(),
            "page must not already be resident"
        );

        self.entries[page.as_usize()].set_location(Location::Resident(frame));
        self.frame_owners[frame.as_usize()] = Some(page);
    }

    /// Removes the page resident in `frame`, recording where its contents now live.
    ///
    /// Returns the page that was evicted, or None if the frame was vacant.
    pub(crate) fn unmap(&mut self, frame: FrameNumber, location: Location) -> Option<PageNumber> {
        debug_assert!(
            !matches!(location, Location::Resident(_)),
            "an evicted page cannot stay resident"
        );

        let page = self.frame_owners[frame.as_usize()].take()?;
        self.entries[page.as_usize()].set_location(location);
        Some(page)
    }

    /// Records a store to `page`.
    pub(crate) fn mark_dirty(&mut self, page: PageNumber) {
        self.entries[page.as_usize()].mark_dirty();
    }

    /// Checks that the entries and the frame ownership index agree.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        for (page, entry) in self.iter() {
            if let Some(frame) = entry.frame() {
                if self.owner(frame) != Some(page) {
                    return Err(InvariantViolation::UnownedResident { page, frame });
                }
            }
        }

        for (frame, owner) in self.frame_owners.iter().enumerate() {
            let frame = FrameNumber::new(frame);
            if let Some(page) = *owner {
                if self.get(page).and_then(PageEntry::frame) != Some(frame) {
                    return Err(InvariantViolation::StaleOwner { frame, page });
                }
            }
        }

        Ok(())
    }
}
