//! Byte-addressable backing stores.
//!
//! The program image and the swap area are both reached through [`BackingStore`], a small
//! positioned-I/O trait. Files implement it for real runs; [`MemoryStore`] keeps the bytes
//! on the host heap so tests can run without touching the filesystem.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};

/// Positioned byte I/O over a random-access store.
pub trait BackingStore {
    /// Fills `buf` with the bytes starting at `offset`.
    ///
    /// Fails with [`io::ErrorKind::UnexpectedEof`] if the store ends before `buf` is full.
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<()>;

    /// Writes all of `buf` starting at `offset`.
    fn write_at(&mut self, offset: u64, buf: &[u8]) -> io::Result<()>;

    /// Pushes buffered writes to the underlying medium.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl BackingStore for File {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        self.seek(SeekFrom::Start(offset))?;
        self.read_exact(buf)
    }

    fn write_at(&mut self, offset: u64, buf: &[u8]) -> io::Result<()> {
        self.seek(SeekFrom::Start(offset))?;
        self.write_all(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Write::flush(self)
    }
}

/// A backing store held in host memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    bytes: Vec<u8>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding `bytes`.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// Returns the store contents.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the length of the store in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true if the store holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Consumes the store, returning its contents.
    pub fn into_inner(self) -> Vec<u8> {
        self.bytes
    }

    fn range(&self, offset: u64, len: usize) -> io::Result<(usize, usize)> {
        let start = usize::try_from(offset)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "offset too large"))?;
        let end = start
            .checked_add(len)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "offset too large"))?;
        Ok((start, end))
    }
}

impl BackingStore for MemoryStore {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        let (start, end) = self.range(offset, buf.len())?;
        let src = self
            .bytes
            .get(start..end)
            .ok_or_else(|| io::Error::from(io::ErrorKind::UnexpectedEof))?;
        buf.copy_from_slice(src);
        Ok(())
    }

    fn write_at(&mut self, offset: u64, buf: &[u8]) -> io::Result<()> {
        let (start, end) = self.range(offset, buf.len())?;
        if self.bytes.len() < end {
            self.bytes.resize(end, 0);
        }
        self.bytes[start..end].copy_from_slice(buf);
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::Cell;
    use std::io;
    use std::path::{Path, PathBuf};
    use std::rc::Rc;

    use super::{BackingStore, MemoryStore};

    /// A path in the system temp directory whose file is removed on drop.
    pub struct TempFile {
        path: PathBuf,
    }

    impl TempFile {
        pub fn new(name: &str) -> Self {
            let path =
                std::env::temp_dir().join(format!("pager-{}-{name}", std::process::id()));
            Self { path }
        }

        pub fn path(&self) -> &Path {
            &self.path
        }
    }

    impl Drop for TempFile {
        fn drop(&mut self) {
            // Tests that never create the file leave nothing to remove.
            let _ = std::fs::remove_file(&self.path);
        }
    }

    /// Switches shared between a test and the [`FaultyStore`] it handed to a simulator.
    #[derive(Clone, Default)]
    pub struct FaultSwitch {
        pub fail_reads: Rc<Cell<bool>>,
        pub fail_writes: Rc<Cell<bool>>,
    }

    /// A memory store whose reads and writes can be made to fail on demand.
    pub struct FaultyStore {
        inner: MemoryStore,
        switch: FaultSwitch,
    }

    impl FaultyStore {
        pub fn new(inner: MemoryStore) -> (Self, FaultSwitch) {
            let switch = FaultSwitch::default();
            let store = Self {
                inner,
                switch: switch.clone(),
            };
            (store, switch)
        }

        pub fn inner(&self) -> &MemoryStore {
            &self.inner
        }
    }

    impl BackingStore for FaultyStore {
        fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
            if self.switch.fail_reads.get() {
                return Err(io::Error::other("injected read failure"));
            }
            self.inner.read_at(offset, buf)
        }

        fn write_at(&mut self, offset: u64, buf: &[u8]) -> io::Result<()> {
            if self.switch.fail_writes.get() {
                return Err(io::Error::other("injected write failure"));
            }
            self.inner.write_at(offset, buf)
        }
    }
}
