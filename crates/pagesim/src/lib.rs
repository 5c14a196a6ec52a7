//! Command-line driver for the `pager` simulator.
//!
//! Runs a sequence of loads, stores and reports against a program image and a swap file,
//! printing each result to standard output.

pub mod console;
pub mod script;

use std::{
    error::Error,
    fs,
    io::{self, Write},
    path::PathBuf,
};

use clap::{Parser, Subcommand};
use pager::{BackingStore, Geometry, ProgramLayout, Simulator, VirtualAddress};

use crate::{
    console::Console,
    script::{DEMO, Op, Report},
};

#[derive(Parser)]
#[command(name = "pagesim")]
#[command(about = "Demand-paged virtual memory simulator")]
pub struct Args {
    /// Log more detail (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(flatten)]
    pub sim: SimArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Args)]
pub struct SimArgs {
    /// Program image backing the text and data segments
    #[arg(short, long, default_value = "exec_file")]
    pub program: PathBuf,

    /// Swap file, created or truncated at start
    #[arg(short, long, default_value = "swap_file")]
    pub swap: PathBuf,

    /// Size of the read-only text segment in bytes
    #[arg(long, default_value_t = 40)]
    pub text_size: usize,

    /// Size of the initialized data segment in bytes
    #[arg(long, default_value_t = 40)]
    pub data_size: usize,

    /// Combined size of bss, heap and stack in bytes
    #[arg(long, default_value_t = 120)]
    pub bss_size: usize,

    /// Number of pages in the address space
    #[arg(long, default_value_t = Geometry::DEFAULT.page_count())]
    pub pages: usize,

    /// Number of frames in main memory
    #[arg(long, default_value_t = Geometry::DEFAULT.frame_count())]
    pub frames: usize,

    /// Number of swap slots
    #[arg(long, default_value_t = Geometry::DEFAULT.slot_count())]
    pub slots: usize,
}

impl SimArgs {
    pub fn layout(&self) -> ProgramLayout {
        ProgramLayout::new(self.text_size, self.data_size, self.bss_size)
    }

    pub fn geometry(&self) -> Geometry {
        Geometry::new(self.pages, self.frames, self.slots)
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Run operations given on the command line
    Run {
        /// Operations such as load:44, store:50:X or print:memory
        #[arg(required = true)]
        ops: Vec<Op>,
    },
    /// Run operations from a script file
    Script {
        /// Script with one operation per line
        file: PathBuf,
    },
    /// Run the stock demo access sequence
    Demo,
}

/// Runs the simulator for parsed command-line arguments.
pub fn run(args: Args) -> Result<(), Box<dyn Error>> {
    Console::init(console::level_for(args.verbose))?;

    let ops = match &args.command {
        Command::Run { ops } => ops.clone(),
        Command::Script { file } => script::parse_script(&fs::read_to_string(file)?)?,
        Command::Demo => DEMO.to_vec(),
    };

    let mut sim = Simulator::open_with_geometry(
        &args.sim.program,
        &args.sim.swap,
        args.sim.layout(),
        args.sim.geometry(),
    )?;

    let mut out = io::stdout().lock();
    execute(&mut sim, &ops, &mut out)?;
    out.flush()?;

    sim.shutdown()?;
    Ok(())
}

/// Applies `ops` in order, writing one line per access and the requested reports to `out`.
///
/// Failed accesses are reported as `ERR` lines and do not stop the run.
pub fn execute<I: BackingStore, S: BackingStore>(
    sim: &mut Simulator<I, S>,
    ops: &[Op],
    out: &mut impl Write,
) -> io::Result<()> {
    for &op in ops {
        log::trace!("executing {op}");
        let result = match op {
            Op::Load(address) => VirtualAddress::try_from(address)
                .map_err(pager::Error::from)
                .and_then(|address| sim.load(address.as_usize()))
                .map(|value| writeln!(out, "load {address}: {}", value.escape_ascii())),
            Op::Store(address, value) => VirtualAddress::try_from(address)
                .map_err(pager::Error::from)
                .and_then(|address| sim.store(address.as_usize(), value))
                .map(|()| writeln!(out, "store {address}: {}", value.escape_ascii())),
            Op::Print(report) => print_report(sim, report, out),
        };

        match result {
            Ok(written) => written?,
            Err(err) => {
                log::warn!("{op} failed: {err}");
                writeln!(out, "ERR: {err}")?;
            }
        }
    }
    Ok(())
}

fn print_report<I: BackingStore, S: BackingStore>(
    sim: &mut Simulator<I, S>,
    report: Report,
    out: &mut impl Write,
) -> pager::Result<io::Result<()>> {
    Ok(match report {
        Report::Memory => write!(out, "{}", sim.memory_dump()),
        Report::Swap => write!(out, "{}", sim.swap_dump()?),
        Report::Table => write!(out, "{}", sim.page_table_dump()),
        Report::Stats => writeln!(out, "{}", sim.stats()),
    })
}
