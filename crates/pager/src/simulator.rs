//! The simulated machine and its load/store interface.

use std::fs::{File, OpenOptions};
use std::path::Path;

use crate::{
    AddressTranslator, Error, FrameAllocator, FrameNumber, Geometry, MainMemory, PageEntry,
    PageNumber, PageTable, ProgramImage, ProgramLayout, Result, Stats, StoreKind, SwapArea,
    VirtualAddress,
    dump::{MemoryDump, PageTableDump, SwapDump},
    store::BackingStore,
};

/// One demand-paged address space with its main memory, program image and swap area.
///
/// A simulator exclusively owns all of its state, including both backing-store handles,
/// which are released when it is dropped or shut down.
pub struct Simulator<I = File, S = File> {
    pub(crate) geometry: Geometry,
    pub(crate) layout: ProgramLayout,
    pub(crate) translator: AddressTranslator,
    pub(crate) table: PageTable,
    pub(crate) memory: MainMemory,
    pub(crate) allocator: FrameAllocator,
    pub(crate) image: ProgramImage<I>,
    pub(crate) swap: SwapArea<S>,
    pub(crate) stats: Stats,
}

impl Simulator<File, File> {
    /// Opens a simulator over files with the default geometry.
    ///
    /// The program image is opened read-only. The swap file is created or truncated and
    /// formatted with empty slots.
    pub fn open(
        program: impl AsRef<Path>,
        swap: impl AsRef<Path>,
        layout: ProgramLayout,
    ) -> Result<Self> {
        Self::open_with_geometry(program, swap, layout, Geometry::DEFAULT)
    }

    /// Opens a simulator over files with the given geometry.
    pub fn open_with_geometry(
        program: impl AsRef<Path>,
        swap: impl AsRef<Path>,
        layout: ProgramLayout,
        geometry: Geometry,
    ) -> Result<Self> {
        geometry.validate()?;
        layout.validate(&geometry)?;

        let (program, swap) = (program.as_ref(), swap.as_ref());
        let image = File::open(program).map_err(Error::io(StoreKind::ProgramImage))?;
        // The image handle is dropped on this error path.
        let swap_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(swap)
            .map_err(Error::io(StoreKind::SwapArea))?;

        log::info!(
            "using program image {} and swap file {}",
            program.display(),
            swap.display()
        );
        Self::with_stores(image, swap_file, layout, geometry)
    }
}

impl<I: BackingStore, S: BackingStore> Simulator<I, S> {
    /// Builds a simulator over arbitrary backing stores.
    ///
    /// `swap` is formatted: every slot is overwritten with the empty pattern.
    pub fn with_stores(
        image: I,
        swap: S,
        layout: ProgramLayout,
        geometry: Geometry,
    ) -> Result<Self> {
        geometry.validate()?;
        layout.validate(&geometry)?;

        let swap = SwapArea::format(swap, geometry.slot_count())
            .map_err(Error::io(StoreKind::SwapArea))?;

        log::debug!(
            "simulator ready: {} pages, {} frames, {} swap slots, {} read-only pages",
            geometry.page_count(),
            geometry.frame_count(),
            geometry.slot_count(),
            layout.read_only_pages()
        );

        Ok(Self {
            geometry,
            layout,
            translator: AddressTranslator::new(geometry.page_count()),
            table: PageTable::new(
                geometry.page_count(),
                geometry.frame_count(),
                layout.read_only_pages(),
            ),
            memory: MainMemory::new(geometry.frame_count()),
            allocator: FrameAllocator::new(geometry.frame_count()),
            image: ProgramImage::new(image, layout.image_size()),
            swap,
            stats: Stats::default(),
        })
    }

    /// Reads the byte at `address`, faulting its page in if needed.
    pub fn load(&mut self, address: usize) -> Result<u8> {
        let address = VirtualAddress::new(address);
        let (page, offset) = self.translator.translate(address)?;

        let frame = self.resolve_fault(page)?;
        let value = self.memory.read(AddressTranslator::physical(frame, offset));
        self.stats.loads += 1;

        log::trace!("load {address} (page {page}, frame {frame}) = {value:#04x}");
        Ok(value)
    }

    /// Writes `value` at `address`, faulting its page in if needed and marking it dirty.
    ///
    /// Stores to read-only pages fail without faulting.
    pub fn store(&mut self, address: usize, value: u8) -> Result<()> {
        let address = VirtualAddress::new(address);
        let (page, offset) = self.translator.translate(address)?;
        if self.table.entry(page).is_read_only() {
            return Err(Error::Protection { address, page });
        }

        let frame = self.resolve_fault(page)?;
        self.memory
            .write(AddressTranslator::physical(frame, offset), value);
        self.table.mark_dirty(page);
        self.stats.stores += 1;

        log::trace!("store {address} (page {page}, frame {frame}) = {value:#04x}");
        Ok(())
    }

    /// Flushes the swap area and releases both backing stores.
    pub fn shutdown(self) -> Result<()> {
        let Self { mut swap, stats, .. } = self;
        swap.flush().map_err(Error::io(StoreKind::SwapArea))?;
        log::info!("simulator shut down: {stats}");
        Ok(())
    }

    /// Returns the machine geometry.
    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// Returns the program layout.
    pub fn layout(&self) -> ProgramLayout {
        self.layout
    }

    /// Returns the page table entry for `page`, or None if it is outside the address space.
    pub fn entry(&self, page: PageNumber) -> Option<PageEntry> {
        self.table.get(page)
    }

    /// Returns the page table.
    pub fn page_table(&self) -> &PageTable {
        &self.table
    }

    /// Returns the page resident in `frame`, if any.
    pub fn frame_owner(&self, frame: FrameNumber) -> Option<PageNumber> {
        self.table.owner(frame)
    }

    /// Returns the bytes of `frame`.
    ///
    /// # Panics
    /// Panics if `frame` is outside main memory.
    pub fn frame_bytes(&self, frame: FrameNumber) -> &[u8] {
        self.memory.frame(frame)
    }

    /// Returns main memory.
    pub fn memory(&self) -> &MainMemory {
        &self.memory
    }

    /// Returns the frame allocator.
    pub fn allocator(&self) -> &FrameAllocator {
        &self.allocator
    }

    /// Returns the swap area.
    pub fn swap(&self) -> &SwapArea<S> {
        &self.swap
    }

    /// Returns the program image.
    pub fn image(&self) -> &ProgramImage<I> {
        &self.image
    }

    /// Returns the access and paging counters.
    pub fn stats(&self) -> Stats {
        self.stats
    }

    /// Returns a printable view of main memory.
    pub fn memory_dump(&self) -> MemoryDump<'_> {
        MemoryDump::new(&self.memory)
    }

    /// Returns a printable view of the page table.
    pub fn page_table_dump(&self) -> PageTableDump<'_> {
        PageTableDump::new(&self.table)
    }

    /// Reads the swap area into a printable view.
    pub fn swap_dump(&mut self) -> Result<SwapDump> {
        let bytes = self
            .swap
            .read_all()
            .map_err(Error::io(StoreKind::SwapArea))?;
        Ok(SwapDump::new(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        AddressError, Location, SlotNumber,
        geometry::{PAGE_SIZE, SWAP_EMPTY},
        store::MemoryStore,
    };

    fn image_bytes() -> Vec<u8> {
        // Page n of the image is filled with the digit n.
        (0..10u8)
            .flat_map(|page| [b'0' + page; PAGE_SIZE])
            .collect()
    }

    fn setup_with(geometry: Geometry) -> Simulator<MemoryStore, MemoryStore> {
        Simulator::with_stores(
            MemoryStore::from_bytes(image_bytes()),
            MemoryStore::new(),
            ProgramLayout::default(),
            geometry,
        )
        .unwrap()
    }

    fn setup() -> Simulator<MemoryStore, MemoryStore> {
        setup_with(Geometry::DEFAULT)
    }

    mod construction {
        use super::*;

        #[test]
        fn starts_with_nothing_resident() {
            let sim = setup();
            assert!(sim.page_table().iter().all(|(_, entry)| {
                !entry.is_valid() && !entry.is_dirty() && entry.location() == Location::Unmaterialized
            }));
            assert!(sim.memory().as_bytes().iter().all(|&b| b == 0));
            assert_eq!(sim.swap().free_count(), 25);
            assert!(
                sim.swap()
                    .store()
                    .as_bytes()
                    .iter()
                    .all(|&b| b == SWAP_EMPTY)
            );
        }

        #[test]
        fn text_pages_are_read_only() {
            let sim = setup();
            for page in 0..5 {
                assert!(sim.entry(PageNumber::new(page)).unwrap().is_read_only());
            }
            for page in 5..25 {
                assert!(!sim.entry(PageNumber::new(page)).unwrap().is_read_only());
            }
        }

        #[test]
        fn rejects_layout_larger_than_address_space() {
            let result = Simulator::with_stores(
                MemoryStore::new(),
                MemoryStore::new(),
                ProgramLayout::new(100, 100, 100),
                Geometry::DEFAULT,
            );
            assert!(matches!(result, Err(Error::InvalidLayout { .. })));
        }

        #[test]
        fn rejects_memory_without_frames() {
            let result = Simulator::with_stores(
                MemoryStore::new(),
                MemoryStore::new(),
                ProgramLayout::new(8, 0, 0),
                Geometry::new(4, 0, 4),
            );
            assert!(matches!(result, Err(Error::InvalidGeometry(_))));
        }

        #[test]
        fn rejects_frame_count_too_large_to_allocate() {
            let result = Simulator::with_stores(
                MemoryStore::new(),
                MemoryStore::new(),
                ProgramLayout::default(),
                Geometry::new(25, usize::MAX / 4, 0),
            );
            assert!(matches!(result, Err(Error::InvalidGeometry(_))));
        }
    }

    mod access {
        use super::*;

        #[test]
        fn load_reads_program_image() {
            let mut sim = setup();
            assert_eq!(sim.load(44).unwrap(), b'5');
            assert_eq!(sim.load(2).unwrap(), b'0');
        }

        #[test]
        fn load_of_bss_reads_zero() {
            let mut sim = setup();
            assert_eq!(sim.load(150).unwrap(), 0);
        }

        #[test]
        fn load_after_store() {
            let mut sim = setup();
            sim.store(50, b'X').unwrap();
            assert_eq!(sim.load(50).unwrap(), b'X');
            assert_eq!(sim.load(51).unwrap(), b'6');
        }

        #[test]
        fn store_marks_dirty_even_when_unchanged() {
            let mut sim = setup();
            sim.store(48, b'6').unwrap();
            assert!(sim.entry(PageNumber::new(6)).unwrap().is_dirty());
        }

        #[test]
        fn load_does_not_mark_dirty() {
            let mut sim = setup();
            sim.load(48).unwrap();
            let entry = sim.entry(PageNumber::new(6)).unwrap();
            assert!(entry.is_valid());
            assert!(!entry.is_dirty());
        }

        #[test]
        fn store_to_text_is_rejected() {
            let mut sim = setup();
            sim.load(15).unwrap();
            let before = sim.memory().as_bytes().to_vec();

            let err = sim.store(15, b'Z').unwrap_err();

            assert!(matches!(
                err,
                Error::Protection { address, page }
                    if address == VirtualAddress::new(15) && page == PageNumber::new(1)
            ));
            assert_eq!(sim.memory().as_bytes(), &before[..]);
            assert!(!sim.entry(PageNumber::new(1)).unwrap().is_dirty());
            assert_eq!(sim.load(15).unwrap(), b'1');
        }

        #[test]
        fn store_to_non_resident_text_does_not_fault() {
            let mut sim = setup();
            assert!(sim.store(0, b'Z').is_err());
            assert_eq!(sim.stats().faults, 0);
            assert_eq!(sim.allocator().allocations(), 0);
            assert!(!sim.entry(PageNumber::new(0)).unwrap().is_valid());
        }

        #[test]
        fn out_of_range_address() {
            let mut sim = setup();

            assert!(matches!(
                sim.load(200),
                Err(Error::Addressing(AddressError::OutOfRange { .. }))
            ));
            assert!(matches!(
                sim.store(1_000, b'a'),
                Err(Error::Addressing(AddressError::OutOfRange { .. }))
            ));
            assert_eq!(sim.stats().faults, 0);
            assert_eq!(sim.allocator().allocations(), 0);
            assert!(sim.page_table().iter().all(|(_, entry)| !entry.is_valid()));
        }

        #[test]
        fn last_byte_is_addressable() {
            let mut sim = setup();
            sim.store(199, b'!').unwrap();
            assert_eq!(sim.load(199).unwrap(), b'!');
        }
    }

    mod replacement {
        use super::*;

        #[test]
        fn round_robin_order() {
            let mut sim = setup();
            // Pages 10..15, one per frame.
            for page in 10..15 {
                sim.load(page * PAGE_SIZE).unwrap();
            }
            for frame in 0..5 {
                assert_eq!(
                    sim.frame_owner(FrameNumber::new(frame)),
                    Some(PageNumber::new(10 + frame))
                );
            }

            sim.load(15 * PAGE_SIZE).unwrap();
            assert_eq!(sim.frame_owner(FrameNumber::new(0)), Some(PageNumber::new(15)));
            assert!(!sim.entry(PageNumber::new(10)).unwrap().is_valid());

            sim.load(16 * PAGE_SIZE).unwrap();
            assert_eq!(sim.frame_owner(FrameNumber::new(1)), Some(PageNumber::new(16)));
            assert!(!sim.entry(PageNumber::new(11)).unwrap().is_valid());
            assert!(sim.page_table().check_invariants().is_ok());
        }

        #[test]
        fn resident_hits_do_not_advance_rotation() {
            let mut sim = setup();
            sim.load(80).unwrap();
            sim.load(81).unwrap();
            sim.store(82, b'c').unwrap();
            assert_eq!(sim.allocator().allocations(), 1);
            assert_eq!(sim.allocator().next_frame(), FrameNumber::new(1));
        }

        #[test]
        fn dirty_page_survives_eviction() {
            let mut sim = setup();
            sim.store(100, b'Q').unwrap();
            sim.store(101, b'R').unwrap();
            for page in 13..18 {
                sim.load(page * PAGE_SIZE).unwrap();
            }

            let entry = sim.entry(PageNumber::new(12)).unwrap();
            assert_eq!(entry.location(), Location::Swapped(SlotNumber::new(0)));
            assert!(entry.is_dirty());
            assert_eq!(sim.stats().swap_outs, 1);

            assert_eq!(sim.load(100).unwrap(), b'Q');
            assert_eq!(sim.load(101).unwrap(), b'R');
            assert!(sim.swap().is_free(SlotNumber::new(0)));
            assert_eq!(
                &sim.swap().store().as_bytes()[..PAGE_SIZE],
                &[SWAP_EMPTY; PAGE_SIZE]
            );
        }

        #[test]
        fn reloaded_dirty_page_is_written_out_again() {
            let mut sim = setup_with(Geometry::new(25, 1, 2));
            sim.store(100, b'Q').unwrap();
            sim.load(110).unwrap();
            sim.load(100).unwrap();
            // The page stays dirty after the swap-in, so it goes back to swap.
            sim.load(110).unwrap();

            let entry = sim.entry(PageNumber::new(12)).unwrap();
            assert_eq!(entry.location(), Location::Swapped(SlotNumber::new(0)));
            assert_eq!(&sim.swap().store().as_bytes()[4..5], b"Q");
        }

        #[test]
        fn clean_data_page_reloads_from_image() {
            let mut sim = setup_with(Geometry::new(25, 1, 2));
            assert_eq!(sim.load(60).unwrap(), b'7');
            sim.load(100).unwrap();

            let entry = sim.entry(PageNumber::new(7)).unwrap();
            assert_eq!(entry.location(), Location::Unmaterialized);
            assert_eq!(sim.swap().free_count(), 2);

            assert_eq!(sim.load(60).unwrap(), b'7');
            assert_eq!(sim.stats().image_loads, 2);
        }

        #[test]
        fn clean_bss_page_reloads_as_zero() {
            let mut sim = setup_with(Geometry::new(25, 1, 2));
            sim.load(150).unwrap();
            sim.store(100, b'X').unwrap();
            assert_eq!(sim.load(150).unwrap(), 0);
            assert_eq!(sim.frame_bytes(FrameNumber::new(0)), &[0; PAGE_SIZE]);
        }

        #[test]
        fn swap_exhaustion_keeps_state_consistent() {
            let mut sim = setup_with(Geometry::new(25, 1, 1));
            sim.store(80, b'a').unwrap();
            sim.store(88, b'b').unwrap();

            let err = sim.store(96, b'c').unwrap_err();

            assert!(matches!(err, Error::SwapExhausted { page } if page == PageNumber::new(11)));
            assert_eq!(sim.frame_owner(FrameNumber::new(0)), Some(PageNumber::new(11)));
            assert!(!sim.entry(PageNumber::new(12)).unwrap().is_valid());
            assert!(sim.page_table().check_invariants().is_ok());
            assert_eq!(sim.load(88).unwrap(), b'b');
        }

        #[test]
        fn instances_are_independent() {
            let mut first = setup();
            let mut second = setup();
            first.store(100, b'1').unwrap();
            second.store(100, b'2').unwrap();
            second.load(150).unwrap();

            assert_eq!(first.load(100).unwrap(), b'1');
            assert_eq!(second.load(100).unwrap(), b'2');
            assert_eq!(first.allocator().allocations(), 1);
            assert_eq!(second.allocator().allocations(), 2);
        }
    }

    #[test]
    fn stock_access_sequence() {
        let mut sim = setup();

        assert_eq!(sim.load(44).unwrap(), b'5');
        assert_eq!(sim.load(46).unwrap(), b'5');
        assert_eq!(sim.load(2).unwrap(), b'0');
        sim.store(50, b'X').unwrap();
        assert_eq!(sim.load(16).unwrap(), b'2');
        sim.store(70, b'A').unwrap();
        sim.store(55, b'Y').unwrap();
        assert!(matches!(sim.store(15, b'Z'), Err(Error::Protection { .. })));
        assert_eq!(sim.load(23).unwrap(), b'2');

        let owners: Vec<_> = (0..5)
            .map(|frame| sim.frame_owner(FrameNumber::new(frame)).map(PageNumber::as_usize))
            .collect();
        assert_eq!(owners, [Some(5), Some(0), Some(6), Some(2), Some(8)]);
        assert_eq!(sim.load(50).unwrap(), b'X');
        assert_eq!(sim.load(55).unwrap(), b'Y');
        assert_eq!(sim.stats().evictions, 0);

        // The sixth distinct page takes frame 0 from clean page 5; the eighth takes frame 2
        // from dirty page 6, which goes to swap.
        sim.load(100).unwrap();
        assert_eq!(sim.frame_owner(FrameNumber::new(0)), Some(PageNumber::new(12)));
        sim.load(110).unwrap();
        sim.load(120).unwrap();
        assert_eq!(
            sim.entry(PageNumber::new(6)).unwrap().location(),
            Location::Swapped(SlotNumber::new(0))
        );
        assert_eq!(sim.load(50).unwrap(), b'X');
    }

    mod files {
        use super::*;
        use crate::store::testing::TempFile;

        #[test]
        fn open_formats_swap_file() {
            let program = TempFile::new("open_formats_swap_file.exec");
            let swap = TempFile::new("open_formats_swap_file.swap");
            std::fs::write(program.path(), image_bytes()).unwrap();
            std::fs::write(swap.path(), b"stale contents").unwrap();

            let mut sim =
                Simulator::open(program.path(), swap.path(), ProgramLayout::default()).unwrap();
            sim.store(100, b'Q').unwrap();
            for page in 13..18 {
                sim.load(page * PAGE_SIZE).unwrap();
            }
            assert_eq!(sim.load(44).unwrap(), b'5');
            // Reloading page 12 empties its slot again.
            assert_eq!(sim.load(100).unwrap(), b'Q');
            sim.shutdown().unwrap();

            let contents = std::fs::read(swap.path()).unwrap();
            assert_eq!(contents.len(), crate::geometry::SWAP_SIZE);
            assert!(contents.iter().all(|&b| b == SWAP_EMPTY));
        }

        #[test]
        fn swap_dump_reflects_file() {
            let program = TempFile::new("swap_dump_reflects_file.exec");
            let swap = TempFile::new("swap_dump_reflects_file.swap");
            std::fs::write(program.path(), image_bytes()).unwrap();

            let mut sim = Simulator::open_with_geometry(
                program.path(),
                swap.path(),
                ProgramLayout::default(),
                Geometry::new(25, 1, 2),
            )
            .unwrap();
            sim.store(100, b'Q').unwrap();
            sim.load(110).unwrap();

            let dump = sim.swap_dump().unwrap();
            assert_eq!(dump.slot(SlotNumber::new(0)), b"\0\0\0\0Q\0\0\0");
            assert_eq!(dump.slot(SlotNumber::new(1)), &[SWAP_EMPTY; PAGE_SIZE]);
        }

        #[test]
        fn missing_image_fails_before_creating_swap() {
            let program = TempFile::new("missing_image.exec");
            let swap = TempFile::new("missing_image.swap");

            let result = Simulator::open(program.path(), swap.path(), ProgramLayout::default());

            assert!(matches!(
                result,
                Err(Error::Io {
                    store: StoreKind::ProgramImage,
                    ..
                })
            ));
            assert!(!swap.path().exists());
        }

        #[test]
        fn unopenable_swap_fails() {
            let program = TempFile::new("unopenable_swap.exec");
            std::fs::write(program.path(), image_bytes()).unwrap();
            let swap = TempFile::new("no-such-dir").path().join("swap");

            let result = Simulator::open(program.path(), &swap, ProgramLayout::default());

            assert!(matches!(
                result,
                Err(Error::Io {
                    store: StoreKind::SwapArea,
                    ..
                })
            ));
        }
    }
}
