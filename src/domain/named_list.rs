//! Named recipient lists ("clients").

use serde::{Deserialize, Serialize};

/// A saved, user-labeled group of raw recipient strings.
///
/// Entries are not validated when saved; they go through the recipient
/// parser when a batch is started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedList {
    /// List name, unique among saved lists.
    pub name: String,
    /// Raw address strings in the order they were saved.
    pub addresses: Vec<String>,
}

impl NamedList {
    /// Joins the entries back into one-per-line text.
    pub fn to_text(&self) -> String {
        self.addresses.join("\n")
    }
}

/// Name and size of a saved list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListSummary {
    /// List name.
    pub name: String,
    /// Number of saved entries.
    pub count: usize,
}
