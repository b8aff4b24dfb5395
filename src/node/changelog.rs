//! Per-domain change log
//!
//! Append-only audit trail of every mutation applied to a domain, one command
//! per line. Never read back by the node itself.

use crate::common::Result;
use crate::node::lines::append_line;
use std::fmt;
use std::path::{Path, PathBuf};

/// Change log entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEntry {
    Create { fqdn: String, ip: String },
    Update { fqdn: String, value: String },
    Delete { fqdn: String },
}

impl fmt::Display for ChangeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeEntry::Create { fqdn, ip } => write!(f, "create {} {}", fqdn, ip),
            ChangeEntry::Update { fqdn, value } => write!(f, "update {} {}", fqdn, value),
            ChangeEntry::Delete { fqdn } => write!(f, "delete {}", fqdn),
        }
    }
}

#[derive(Debug)]
pub struct ChangeLog {
    path: PathBuf,
    entries: u64,
}

impl ChangeLog {
    /// A log for a freshly initialised domain; nothing is written until the
    /// first entry.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&mut self, entry: &ChangeEntry) -> Result<()> {
        append_line(&self.path, &entry.to_string(), self.entries == 0)?;
        self.entries += 1;
        tracing::debug!(log = %self.path.display(), %entry, "change log appended");
        Ok(())
    }
}
