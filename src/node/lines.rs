//! Line-oriented zone file helpers
//!
//! A zone file holds one `A` record per line:
//!
//! ```text
//! www.example IN A 10.0.0.7
//!
//! mail.example IN A 10.0.0.8
//! ```
//!
//! Lines are separated by `\n` with no trailing separator. A blank line is a
//! tombstone left behind by a delete; its line number stays occupied so the
//! numbers of every other record are stable.

use crate::common::{Error, Result};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::Path;

/// Separator between owner name and address
pub const RECORD_SEPARATOR: &str = " IN A ";

const LINE_SEPARATOR: u8 = b'\n';

/// A parsed `<owner> IN A <ip>` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneRecord {
    pub owner: String,
    pub ip: String,
}

impl ZoneRecord {
    pub fn new(owner: impl Into<String>, ip: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            ip: ip.into(),
        }
    }

    /// Parse a stored line. Exactly two non-empty segments around the
    /// separator are required.
    pub fn parse(line: &str) -> Result<Self> {
        let parts: Vec<&str> = line.split(RECORD_SEPARATOR).collect();
        match parts.as_slice() {
            [owner, ip] if !owner.is_empty() && !ip.is_empty() => Ok(Self::new(*owner, *ip)),
            _ => Err(Error::Corrupted(format!("malformed zone line: {:?}", line))),
        }
    }

    /// Decode and parse a raw line. Bytes that are not UTF-8 are corruption.
    pub fn decode(line: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(line).map_err(|e| {
            Error::Corrupted(format!("zone line is not valid UTF-8: {}", e))
        })?;
        Self::parse(text)
    }

    pub fn to_line(&self) -> String {
        format!("{}{}{}", self.owner, RECORD_SEPARATOR, self.ip)
    }
}

/// Read every line of `path` as raw bytes.
///
/// Matches a line scanner: no phantom empty line after a trailing separator,
/// and a trailing `\r` is dropped. Lines are not decoded, so one damaged
/// line does not stop the others from being read and rewritten verbatim.
/// A missing file reads as empty.
pub fn read_lines(path: &Path) -> Result<Vec<Vec<u8>>> {
    let content = match fs::read(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut lines: Vec<Vec<u8>> = content
        .split(|b| *b == LINE_SEPARATOR)
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line).to_vec())
        .collect();
    if content.is_empty() || content.ends_with(&[LINE_SEPARATOR]) {
        lines.pop();
    }
    Ok(lines)
}

/// Truncate `path` and write `lines` joined by the line separator.
pub fn rewrite_lines(path: &Path, lines: &[Vec<u8>]) -> Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(&lines.join(&LINE_SEPARATOR))?;
    file.sync_data()?;
    Ok(())
}

/// Append one line. The separator goes before the line unless it is the
/// first line ever written to the file.
pub fn append_line(path: &Path, line: &str, first: bool) -> Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    if !first {
        file.write_all(&[LINE_SEPARATOR])?;
    }
    file.write_all(line.as_bytes())?;
    file.sync_data()?;
    Ok(())
}
