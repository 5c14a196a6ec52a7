//! Segment sizes of the simulated program.

use crate::{Error, Geometry, Result, geometry::PAGE_SIZE};

/// Sizes of the program's segments in bytes.
///
/// The address space is laid out as `[text][data][bss, heap and stack]`. Text and data are
/// backed by the program image; the rest is zero-filled on first touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramLayout {
    pub text_size: usize,
    pub data_size: usize,
    pub bss_heap_stack_size: usize,
}

impl ProgramLayout {
    pub const fn new(text_size: usize, data_size: usize, bss_heap_stack_size: usize) -> Self {
        Self {
            text_size,
            data_size,
            bss_heap_stack_size,
        }
    }

    /// Returns the number of bytes sourced from the program image.
    pub const fn image_size(&self) -> usize {
        self.text_size + self.data_size
    }

    /// Returns the total size of all segments.
    pub const fn total_size(&self) -> usize {
        self.text_size + self.data_size + self.bss_heap_stack_size
    }

    /// Returns the number of pages lying wholly within the text segment.
    pub const fn read_only_pages(&self) -> usize {
        self.text_size / PAGE_SIZE
    }

    /// Checks that the segments fit in the address space of `geometry`.
    pub fn validate(&self, geometry: &Geometry) -> Result<()> {
        let required = self
            .text_size
            .checked_add(self.data_size)
            .and_then(|size| size.checked_add(self.bss_heap_stack_size))
            .unwrap_or(usize::MAX);
        let available = geometry.address_space_size();

        if required > available {
            return Err(Error::InvalidLayout {
                required,
                available,
            });
        }
        Ok(())
    }
}

impl Default for ProgramLayout {
    /// The layout of the stock test program: 40 bytes each of text and data and 120 bytes
    /// of bss, heap and stack.
    fn default() -> Self {
        Self::new(40, 40, 120)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_fills_default_address_space() {
        let layout = ProgramLayout::default();
        assert_eq!(layout.total_size(), Geometry::DEFAULT.address_space_size());
        assert!(layout.validate(&Geometry::DEFAULT).is_ok());
    }

    #[test]
    fn read_only_pages_round_down() {
        assert_eq!(ProgramLayout::new(40, 0, 0).read_only_pages(), 5);
        assert_eq!(ProgramLayout::new(44, 0, 0).read_only_pages(), 5);
        assert_eq!(ProgramLayout::new(7, 0, 0).read_only_pages(), 0);
    }

    #[test]
    fn rejects_oversized_layout() {
        let layout = ProgramLayout::new(100, 100, 1);
        assert!(matches!(
            layout.validate(&Geometry::DEFAULT),
            Err(Error::InvalidLayout {
                required: 201,
                available: 200,
            })
        ));
    }

    #[test]
    fn rejects_overflowing_layout() {
        let layout = ProgramLayout::new(usize::MAX, 1, 0);
        assert!(layout.validate(&Geometry::DEFAULT).is_err());
    }
}
