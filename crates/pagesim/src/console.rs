//! Defines the console logger that writes log records to standard error.

use std::{
    io::{self, Write},
    sync::atomic::{AtomicBool, Ordering},
};

use log::LevelFilter;
use spin::{Mutex, Once};

pub struct Console {
    has_output: AtomicBool,
    writer: Mutex<Option<Box<dyn Write + Send>>>,
}

static DEFAULT: Once<Console> = Once::new();

impl Console {
    /// Installs the global console, writing to standard error at `level`.
    pub fn init(level: LevelFilter) -> Result<&'static Self, log::SetLoggerError> {
        let console = Self::default();
        console.attach_writer(Box::new(io::stderr()));
        console.install(level)?;
        Ok(console)
    }

    pub fn default() -> &'static Self {
        DEFAULT.call_once(|| Console {
            has_output: AtomicBool::new(false),
            writer: Mutex::new(None),
        })
    }

    pub fn install(&'static self, level: LevelFilter) -> Result<(), log::SetLoggerError> {
        log::set_logger(self)?;
        log::set_max_level(level);
        Ok(())
    }

    pub fn has_output(&self) -> bool {
        self.has_output.load(Ordering::SeqCst)
    }

    pub fn attach_writer(&self, writer: Box<dyn Write + Send>) {
        let mut guard = self.writer.lock();
        *guard = Some(writer);
        self.has_output.store(true, Ordering::SeqCst);
    }
}

impl log::Log for Console {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if let Some(writer) = &mut *self.writer.lock() {
            // Nowhere left to report a failed write to stderr.
            let _ = write_log_entry_to(writer, record);
        }
    }

    fn flush(&self) {
        if let Some(writer) = &mut *self.writer.lock() {
            let _ = writer.flush();
        }
    }
}

/// Maps the number of `-v` flags to a log level.
pub fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn write_log_entry_to(writer: &mut impl Write, record: &log::Record) -> io::Result<()> {
    #[cfg(any(debug_assertions, feature = "detailed-logging"))]
    return writeln!(
        writer,
        "[{} {}:{} {}] {}",
        record.level(),
        record.file().unwrap_or("unknown"),
        record.line().unwrap_or(0),
        record.target(),
        record.args()
    );
    #[cfg(not(any(debug_assertions, feature = "detailed-logging")))]
    return writeln!(writer, "[{:5}] {}", record.level(), record.args());
}
