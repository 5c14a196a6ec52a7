//! Access and paging counters.

use core::fmt;

use crate::{FaultSource, frame_allocator::Eviction};

/// Counters kept by a simulator over its lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub loads: u64,
    pub stores: u64,
    /// Faults resolved successfully.
    pub faults: u64,
    pub image_loads: u64,
    pub zero_fills: u64,
    pub swap_ins: u64,
    pub evictions: u64,
    pub swap_outs: u64,
}

impl Stats {
    pub(crate) fn record_fault(&mut self, source: FaultSource) {
        self.faults += 1;
        match source {
            FaultSource::Swap(_) => self.swap_ins += 1,
            FaultSource::ProgramImage => self.image_loads += 1,
            FaultSource::ZeroFill => self.zero_fills += 1,
        }
    }

    pub(crate) fn record_eviction(&mut self, eviction: &Eviction) {
        self.evictions += 1;
        if eviction.written_to.is_some() {
            self.swap_outs += 1;
        }
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} loads, {} stores, {} faults ({} from image, {} zero-filled, {} from swap), \
             {} evictions ({} written to swap)",
            self.loads,
            self.stores,
            self.faults,
            self.image_loads,
            self.zero_fills,
            self.swap_ins,
            self.evictions,
            self.swap_outs
        )
    }
}
