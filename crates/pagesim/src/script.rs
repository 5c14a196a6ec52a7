//! Operation scripts.
//!
//! A script is a list of operations, one per line:
//!
//! ```text
//! # comments and blank lines are skipped
//! load 44
//! store 50 X
//! print memory
//! ```
//!
//! On the command line the same operations are written with colons, as in `load:44` or
//! `store:50:X`. A stored character may be quoted, as in `store 50 ' '`, which is the only
//! way to store a space, a colon or `#`.

use core::{fmt, str::FromStr};

/// A simulator state report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Report {
    Memory,
    Swap,
    Table,
    Stats,
}

impl FromStr for Report {
    type Err = ParseOpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "memory" => Ok(Self::Memory),
            "swap" => Ok(Self::Swap),
            "table" => Ok(Self::Table),
            "stats" => Ok(Self::Stats),
            other => Err(ParseOpError::UnknownReport(other.into())),
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Memory => "memory",
            Self::Swap => "swap",
            Self::Table => "table",
            Self::Stats => "stats",
        })
    }
}

/// A single script operation.
///
/// Addresses are kept signed so that negative addresses reach the simulator and are
/// reported as addressing errors there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Load(isize),
    Store(isize, u8),
    Print(Report),
}

/// The access sequence of the stock demo program.
pub const DEMO: [Op; 11] = [
    Op::Load(44),
    Op::Load(46),
    Op::Load(2),
    Op::Store(50, b'X'),
    Op::Load(16),
    Op::Store(70, b'A'),
    Op::Store(55, b'Y'),
    Op::Store(15, b'Z'),
    Op::Load(23),
    Op::Print(Report::Memory),
    Op::Print(Report::Swap),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOpError {
    Empty,
    UnknownCommand(String),
    UnknownReport(String),
    MissingArgument(&'static str),
    InvalidAddress(String),
    InvalidValue(String),
    TrailingInput(String),
}

impl fmt::Display for ParseOpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty operation"),
            Self::UnknownCommand(cmd) => write!(f, "unknown operation {cmd:?}"),
            Self::UnknownReport(report) => write!(
                f,
                "unknown report {report:?}, expected memory, swap, table or stats"
            ),
            Self::MissingArgument(name) => write!(f, "missing {name}"),
            Self::InvalidAddress(addr) => write!(f, "invalid address {addr:?}"),
            Self::InvalidValue(value) => {
                write!(f, "invalid value {value:?}, expected a single ASCII character")
            }
            Self::TrailingInput(rest) => write!(f, "unexpected {rest:?} after operation"),
        }
    }
}

impl std::error::Error for ParseOpError {}

fn parse_address(s: &str) -> Result<isize, ParseOpError> {
    let invalid = || ParseOpError::InvalidAddress(s.into());
    let (digits, negative) = match s.strip_prefix('-') {
        Some(rest) => (rest, true),
        None => (s, false),
    };
    if digits.starts_with(['+', '-']) {
        return Err(invalid());
    }
    let magnitude = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => isize::from_str_radix(hex, 16),
        None => digits.parse::<isize>(),
    }
    .map_err(|_| invalid())?;

    Ok(if negative { -magnitude } else { magnitude })
}

fn parse_value(s: &str) -> Result<u8, ParseOpError> {
    let unquoted = s
        .strip_prefix('\'')
        .and_then(|rest| rest.strip_suffix('\''))
        .unwrap_or(s);
    match unquoted.as_bytes() {
        [byte] if byte.is_ascii() => Ok(*byte),
        _ => Err(ParseOpError::InvalidValue(s.into())),
    }
}

fn is_separator(c: char) -> bool {
    c == ':' || c.is_ascii_whitespace()
}

/// Returns the length of a `'c'` quoted character at the start of `s`, if there is one.
fn quoted_len(s: &str) -> Option<usize> {
    match s.as_bytes() {
        [b'\'', c, b'\'', ..] if c.is_ascii() => Some(3),
        _ => None,
    }
}

/// Splits an operation into fields. A quoted character is one field even when it is a
/// separator.
fn split_fields(s: &str) -> Vec<&str> {
    let mut fields = Vec::new();
    let mut rest = s.trim_start_matches(is_separator);
    while !rest.is_empty() {
        let end = quoted_len(rest)
            .unwrap_or_else(|| rest.find(is_separator).unwrap_or(rest.len()));
        fields.push(&rest[..end]);
        rest = rest[end..].trim_start_matches(is_separator);
    }
    fields
}

/// Cuts `line` at the first `#` that is not a quoted character.
fn strip_comment(line: &str) -> &str {
    let mut index = 0;
    while index < line.len() {
        if let Some(len) = quoted_len(&line[index..]) {
            index += len;
            continue;
        }
        if line.as_bytes()[index] == b'#' {
            return &line[..index];
        }
        index += line[index..].chars().next().map_or(1, char::len_utf8);
    }
    line
}

impl FromStr for Op {
    type Err = ParseOpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = split_fields(s).into_iter();

        let command = parts.next().ok_or(ParseOpError::Empty)?;
        let mut next = |name| parts.next().ok_or(ParseOpError::MissingArgument(name));
        let op = match command.to_ascii_lowercase().as_str() {
            "load" => Op::Load(parse_address(next("address")?)?),
            "store" => {
                let address = parse_address(next("address")?)?;
                Op::Store(address, parse_value(next("value")?)?)
            }
            "print" => Op::Print(next("report")?.parse()?),
            _ => return Err(ParseOpError::UnknownCommand(command.into())),
        };

        match parts.next() {
            Some(rest) => Err(ParseOpError::TrailingInput(rest.into())),
            None => Ok(op),
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load(address) => write!(f, "load {address}"),
            Self::Store(address, value) => {
                write!(f, "store {address} '{}'", value.escape_ascii())
            }
            Self::Print(report) => write!(f, "print {report}"),
        }
    }
}

/// A script line that failed to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptError {
    pub line: usize,
    pub source: ParseOpError,
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.source)
    }
}

impl std::error::Error for ScriptError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Parses a script, skipping blank lines and `#` comments.
pub fn parse_script(text: &str) -> Result<Vec<Op>, ScriptError> {
    text.lines()
        .enumerate()
        .filter_map(|(index, line)| {
            let line = strip_comment(line).trim();
            (!line.is_empty()).then_some((index + 1, line))
        })
        .map(|(line, op)| op.parse().map_err(|source| ScriptError { line, source }))
        .collect()
}
