//! Simulated main memory.

use crate::{FrameNumber, PhysicalAddress, geometry::PAGE_SIZE};

/// Main memory: a fixed number of PAGE_SIZE frames.
///
/// Memory carries no ownership metadata; which page lives in which frame is recorded by
/// the page table.
pub struct MainMemory {
    /// The underlying memory buffer.
    memory: Vec<u8>,
}

impl MainMemory {
    /// Creates zero-filled memory of `frame_count` frames.
    pub fn new(frame_count: usize) -> Self {
        Self {
            memory: vec![0u8; frame_count * PAGE_SIZE],
        }
    }

    /// Returns the number of frames.
    pub fn frame_count(&self) -> usize {
        self.memory.len() / PAGE_SIZE
    }

    /// Returns the size of memory in bytes.
    pub fn size(&self) -> usize {
        self.memory.len()
    }

    /// Reads the byte at `addr`.
    ///
    /// # Panics
    /// Panics if `addr` is outside memory.
    #[inline]
    pub fn read(&self, addr: PhysicalAddress) -> u8 {
        self.memory[addr.as_usize()]
    }

    /// Writes `value` at `addr`.
    ///
    /// # Panics
    /// Panics if `addr` is outside memory.
    #[inline]
    pub fn write(&mut self, addr: PhysicalAddress, value: u8) {
        self.memory[addr.as_usize()] = value;
    }

    /// Returns the bytes of `frame`.
    pub fn frame(&self, frame: FrameNumber) -> &[u8] {
        let start = frame.byte_offset();
        &self.memory[start..start + PAGE_SIZE]
    }

    /// Returns the bytes of `frame` for writing.
    pub fn frame_mut(&mut self, frame: FrameNumber) -> &mut [u8] {
        let start = frame.byte_offset();
        &mut self.memory[start..start + PAGE_SIZE]
    }

    /// Fills `frame` with zero bytes.
    pub fn zero_frame(&mut self, frame: FrameNumber) {
        self.frame_mut(frame).fill(0);
    }

    /// Returns the whole memory contents.
    pub fn as_bytes(&self) -> &[u8] {
        &self.memory
    }
}
