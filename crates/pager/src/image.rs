//! Read-only access to the program image.
//!
//! The image holds the text segment followed by the data segment. Pages that start inside
//! those segments are loaded from it; any tail of such a page past the end of the data
//! segment is zero-filled, as are pages that start past it.

use std::io;

use crate::{PageNumber, geometry::PAGE_SIZE, store::BackingStore};

/// The executable image backing the text and data pages.
pub struct ProgramImage<S> {
    store: S,
    /// Bytes of text plus data.
    loaded_size: usize,
}

impl<S: BackingStore> ProgramImage<S> {
    /// Wraps `store`, sourcing pages from its first `loaded_size` bytes.
    pub fn new(store: S, loaded_size: usize) -> Self {
        Self { store, loaded_size }
    }

    /// Returns the number of bytes sourced from the image.
    pub fn loaded_size(&self) -> usize {
        self.loaded_size
    }

    /// Returns whether `page` starts inside the text or data segment.
    pub fn contains(&self, page: PageNumber) -> bool {
        page.byte_offset() < self.loaded_size
    }

    /// Reads `page` from the image into `frame`.
    ///
    /// Bytes past the end of the data segment are zeroed.
    pub fn read_page(&mut self, page: PageNumber, frame: &mut [u8]) -> io::Result<()> {
        debug_assert_eq!(frame.len(), PAGE_SIZE);
        let start = page.byte_offset();
        let len = self.loaded_size.saturating_sub(start).min(PAGE_SIZE);

        self.store.read_at(start as u64, &mut frame[..len])?;
        frame[len..].fill(0);
        Ok(())
    }

    /// Returns the backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consumes the image, returning the backing store.
    pub fn into_inner(self) -> S {
        self.store
    }
}
