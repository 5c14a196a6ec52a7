//! # Pager
//!
//! A software model of demand-paged virtual memory for a single process. It provides:
//!
//! - Address translation from virtual addresses to page and offset.
//! - A page table with valid, dirty and permission state per page.
//! - Main memory made of fixed-size frames, filled in round-robin order.
//! - A program image that backs the text and data segments.
//! - A swap area that holds evicted dirty pages.
//!
//! Pages are brought in on first access. A clean page that is evicted is rebuilt later from
//! the program image or by zero-filling; a dirty one is written to the lowest free swap slot
//! and read back from there.

mod address;
mod dump;
mod entry;
mod error;
mod fault;
mod frame_allocator;
mod geometry;
mod image;
mod layout;
mod memory;
mod numbers;
mod page_table;
mod simulator;
mod stats;
mod store;
mod swap;

pub use address::{AddressError, AddressTranslator, PhysicalAddress, VirtualAddress};
pub use dump::{MemoryDump, PageTableDump, SwapDump};
pub use entry::{Location, PageEntry, PageFlags};
pub use error::{Error, Result, StoreKind};
pub use fault::FaultSource;
pub use frame_allocator::{Eviction, FrameAllocator};
pub use geometry::{
    Geometry, MEMORY_SIZE, NUM_OF_PAGES, PAGE_SHIFT, PAGE_SIZE, SWAP_EMPTY, SWAP_SIZE,
};
pub use image::ProgramImage;
pub use layout::ProgramLayout;
pub use memory::MainMemory;
pub use numbers::{FrameNumber, PageNumber, SlotNumber};
pub use page_table::{InvariantViolation, PageTable};
pub use simulator::Simulator;
pub use stats::Stats;
pub use store::{BackingStore, MemoryStore};
pub use swap::SwapArea;
