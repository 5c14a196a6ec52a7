//! Errors reported by the pager.

use core::fmt;
use std::io;

use crate::{AddressError, PageNumber, VirtualAddress};

/// Which backing store an I/O error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    ProgramImage,
    SwapArea,
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProgramImage => write!(f, "program image"),
            Self::SwapArea => write!(f, "swap area"),
        }
    }
}

/// Errors that can occur while simulating memory accesses.
#[derive(Debug)]
pub enum Error {
    /// The address lies outside the address space. Nothing was changed.
    Addressing(AddressError),
    /// A store targeted a read-only page. Nothing was changed.
    Protection {
        address: VirtualAddress,
        page: PageNumber,
    },
    /// A dirty page had to be evicted but every swap slot is occupied.
    SwapExhausted { page: PageNumber },
    /// Reading from or writing to a backing store failed.
    Io { store: StoreKind, source: io::Error },
    /// The machine sizes are unusable.
    InvalidGeometry(&'static str),
    /// The program segments do not fit in the address space.
    InvalidLayout { required: usize, available: usize },
}

impl Error {
    pub(crate) fn io(store: StoreKind) -> impl FnOnce(io::Error) -> Self {
        move |source| Self::Io { store, source }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Addressing(err) => write!(f, "addressing error: {err}"),
            Self::Protection { address, page } => write!(
                f,
                "protection error: store to address {address} on read-only page {page}"
            ),
            Self::SwapExhausted { page } => {
                write!(f, "no free swap slot to evict dirty page {page}")
            }
            Self::Io { store, source } => write!(f, "{store} I/O error: {source}"),
            Self::InvalidGeometry(reason) => write!(f, "invalid geometry: {reason}"),
            Self::InvalidLayout {
                required,
                available,
            } => write!(
                f,
                "program needs {required} bytes but the address space holds {available}"
            ),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Addressing(err) => Some(err),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<AddressError> for Error {
    fn from(err: AddressError) -> Self {
        Self::Addressing(err)
    }
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
