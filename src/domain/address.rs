//! Recipient address type.
//!
//! An address is accepted when it has the shape `local@domain.tld`: exactly one
//! `@`, no whitespace, a non-empty local part, and a domain with a dot that has
//! at least one character on each side. No DNS or mailbox checks are made.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Why a candidate string is not a usable address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("address is empty")]
    Empty,

    #[error("address contains whitespace")]
    Whitespace,

    #[error("address has no '@'")]
    MissingAt,

    #[error("address has more than one '@'")]
    MultipleAt,

    #[error("address has an empty local part")]
    EmptyLocalPart,

    #[error("domain has no dot-separated suffix")]
    InvalidDomain,
}

/// A syntactically valid email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Parses an address, trimming it with [`trim_entry`] first.
    pub fn parse(raw: &str) -> Result<Self, AddressError> {
        let candidate = trim_entry(raw);
        check(candidate)?;
        Ok(Self(candidate.to_string()))
    }

    /// Returns the address as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

/// Byte order mark some editors put at the start of a text file.
const BOM: char = '\u{feff}';

fn is_blank(c: char) -> bool {
    c.is_whitespace() || c == BOM
}

/// Strips surrounding whitespace and byte order marks from one entry.
pub fn trim_entry(raw: &str) -> &str {
    raw.trim_matches(is_blank)
}

/// Returns whether `candidate` (taken as-is, untrimmed) is a valid address.
pub fn is_valid_email(candidate: &str) -> bool {
    check(candidate).is_ok()
}

fn check(candidate: &str) -> Result<(), AddressError> {
    if candidate.is_empty() {
        return Err(AddressError::Empty);
    }
    if candidate.chars().any(is_blank) {
        return Err(AddressError::Whitespace);
    }

    let (local, domain) = candidate.split_once('@').ok_or(AddressError::MissingAt)?;
    if domain.contains('@') {
        return Err(AddressError::MultipleAt);
    }
    if local.is_empty() {
        return Err(AddressError::EmptyLocalPart);
    }

    // A dot with at least one character before and after it.
    let has_suffix = domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len());
    if !has_suffix {
        return Err(AddressError::InvalidDomain);
    }

    Ok(())
}
