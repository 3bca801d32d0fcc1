//! Recipient list parsing.
//!
//! Free text is read one address per line. Lines are trimmed, blank lines are
//! skipped, and lines that fail the address check are set aside. Duplicates are
//! kept: an address listed twice is sent to twice.

use super::address::{trim_entry, Address, AddressError};

/// A non-blank input line that did not hold a valid address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedLine {
    /// 1-based line number in the original text.
    pub line: usize,
    /// The trimmed line content.
    pub text: String,
    /// Why the line was rejected.
    pub reason: AddressError,
}

/// Result of parsing a block of recipient text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedRecipients {
    /// Valid addresses in input order.
    pub valid: Vec<Address>,
    /// Lines that were dropped, in input order.
    pub rejected: Vec<RejectedLine>,
}

impl ParsedRecipients {
    /// Returns true when no valid address was found.
    pub fn is_empty(&self) -> bool {
        self.valid.is_empty()
    }

    /// Number of valid addresses.
    pub fn len(&self) -> usize {
        self.valid.len()
    }
}

/// Parses newline-separated recipient text.
pub fn parse_recipients(raw: &str) -> ParsedRecipients {
    let mut parsed = ParsedRecipients::default();

    for (index, line) in raw.split('\n').enumerate() {
        let text = trim_entry(line);
        if text.is_empty() {
            continue;
        }

        match Address::parse(text) {
            Ok(address) => parsed.valid.push(address),
            Err(reason) => parsed.rejected.push(RejectedLine {
                line: index + 1,
                text: text.to_string(),
                reason,
            }),
        }
    }

    parsed
}

/// Splits text into trimmed, non-blank lines without validating them.
pub fn split_lines(raw: &str) -> Vec<String> {
    raw.split('\n')
        .map(trim_entry)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}
