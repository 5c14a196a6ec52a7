//! Printable views of simulator state.
//!
//! Every dumped byte is shown in brackets. Printable ASCII is shown as is; anything else
//! uses the escaped form from [`u8::escape_ascii`], so a zero-filled byte reads
//! as `[\x00]`.

use core::fmt;

use crate::{MainMemory, PageTable, SlotNumber, geometry::PAGE_SIZE};

fn write_byte(f: &mut fmt::Formatter<'_>, byte: u8) -> fmt::Result {
    write!(f, "[{}]", byte.escape_ascii())
}

/// Main memory, one byte per line.
#[derive(Clone, Copy)]
pub struct MemoryDump<'a> {
    memory: &'a MainMemory,
}

impl<'a> MemoryDump<'a> {
    pub fn new(memory: &'a MainMemory) -> Self {
        Self { memory }
    }
}

impl fmt::Display for MemoryDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, " Physical memory")?;
        for &byte in self.memory.as_bytes() {
            write_byte(f, byte)?;
            writeln!(f)?;
        }
        Ok(())
    }
}

/// The page table, one page per line.
///
/// The last column holds the frame of a resident page, the slot of a swapped page, or
/// `-1` for a page with no copy.
#[derive(Clone, Copy)]
pub struct PageTableDump<'a> {
    table: &'a PageTable,
}

impl<'a> PageTableDump<'a> {
    pub fn new(table: &'a PageTable) -> Self {
        Self { table }
    }
}

impl fmt::Display for PageTableDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Valid\tDirty\tPermission\tLocation")?;
        for (_, entry) in self.table.iter() {
            writeln!(
                f,
                "[{}]\t[{}]\t[{}]\t[{}]",
                u8::from(entry.is_valid()),
                u8::from(entry.is_dirty()),
                u8::from(entry.is_read_only()),
                entry.location()
            )?;
        }
        Ok(())
    }
}

/// A snapshot of the swap area, one slot per line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapDump {
    bytes: Vec<u8>,
}

impl SwapDump {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Returns the number of whole slots in the snapshot.
    pub fn slot_count(&self) -> usize {
        self.bytes.len() / PAGE_SIZE
    }

    /// Returns the bytes of `slot`.
    ///
    /// # Panics
    /// Panics if `slot` is past the end of the snapshot.
    pub fn slot(&self, slot: SlotNumber) -> &[u8] {
        let start = slot.byte_offset();
        &self.bytes[start..start + PAGE_SIZE]
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Display for SwapDump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, " Swap memory")?;
        for slot in self.bytes.chunks(PAGE_SIZE) {
            for &byte in slot {
                write_byte(f, byte)?;
                write!(f, "\t")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
