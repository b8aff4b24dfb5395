//! Qualified name handling (`<name>.<domain>`)

use crate::common::{Error, Result};
use std::fmt;

/// A record name split into its name and domain parts.
///
/// The first dot separates the name from the domain. Both sides must be
/// non-empty and the domain may not contain empty labels, so `www.example`
/// and `www.example.com` parse while `example`, `.example`, `www.` and
/// `www..com` do not.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedName {
    name: String,
    domain: String,
}

impl QualifiedName {
    pub fn parse(qualified: &str) -> Result<Self> {
        // Domains end up in file names.
        if qualified.contains(&['/', '\\'][..]) {
            return Err(Error::InvalidName(format!(
                "'{}' contains a path separator",
                qualified
            )));
        }

        match qualified.split_once('.') {
            Some((name, domain))
                if !name.is_empty()
                    && !name.contains(char::is_whitespace)
                    && !domain.is_empty()
                    && !domain.contains(char::is_whitespace)
                    && domain.split('.').all(|label| !label.is_empty()) =>
            {
                Ok(Self::new(name, domain))
            }
            _ => Err(Error::InvalidName(format!(
                "'{}' is not of the form <name>.<domain>",
                qualified
            ))),
        }
    }

    pub fn new(name: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            domain: domain.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.name, self.domain)
    }
}

impl std::str::FromStr for QualifiedName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
