//! Management commands
//!
//! ```text
//! create <name>.<domain> <ip>
//! update <name>.<domain> <ip|name> <value>
//! delete <name>.<domain>
//! ```

use crate::common::{Error, QualifiedName, Result};
use crate::node::UpdateOption;

pub const USAGE: &str = "usage:\n\
    \tcreate <name>.<domain> <ip>\n\
    \tupdate <name>.<domain> <ip|name> <value>\n\
    \tdelete <name>.<domain>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Create {
        target: QualifiedName,
        ip: String,
    },
    Update {
        target: QualifiedName,
        option: UpdateOption,
        value: String,
    },
    Delete {
        target: QualifiedName,
    },
}

impl Command {
    /// Parse one input line. Input is case-insensitive and split on whitespace.
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim().to_lowercase();
        let words: Vec<&str> = line.split_whitespace().collect();

        match words.as_slice() {
            ["create", target, ip] => Ok(Command::Create {
                target: QualifiedName::parse(target)?,
                ip: ip.to_string(),
            }),
            ["update", target, option, value] => Ok(Command::Update {
                target: QualifiedName::parse(target)?,
                option: option.parse()?,
                value: value.to_string(),
            }),
            ["delete", target] => Ok(Command::Delete {
                target: QualifiedName::parse(target)?,
            }),
            [] => Err(Error::Usage("empty command".into())),
            [verb @ ("create" | "update" | "delete"), ..] => Err(Error::Usage(format!(
                "wrong number of arguments for {}",
                verb
            ))),
            [verb, ..] => Err(Error::Usage(format!("unknown command: {}", verb))),
        }
    }

    pub fn target(&self) -> &QualifiedName {
        match self {
            Command::Create { target, .. }
            | Command::Update { target, .. }
            | Command::Delete { target } => target,
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            Command::Create { .. } => "create",
            Command::Update { .. } => "update",
            Command::Delete { .. } => "delete",
        }
    }
}
