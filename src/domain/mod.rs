//! Domain layer types for smartsend.
//!
//! Addresses, recipient parsing, the message draft, named lists and the
//! delivery report. Nothing in here performs I/O.

mod address;
mod draft;
mod named_list;
mod recipients;
mod report;
mod types;

pub use address::{is_valid_email, trim_entry, Address, AddressError};
pub use draft::MessageDraft;
pub use named_list::{ListSummary, NamedList};
pub use recipients::{parse_recipients, split_lines, ParsedRecipients, RejectedLine};
pub use report::{BatchStatus, DeliveryOutcome, DeliveryReport, DeliveryStatus};
pub use types::BatchId;
