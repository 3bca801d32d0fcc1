//! The message being composed for a batch.

use serde::{Deserialize, Serialize};

/// Free-text message body sent to every recipient of a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDraft {
    body: String,
}

impl MessageDraft {
    /// Creates a draft from raw text.
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }

    /// Returns true if the body holds nothing but whitespace.
    pub fn is_blank(&self) -> bool {
        self.body.trim().is_empty()
    }

    /// Plain text body, exactly as written.
    pub fn text_content(&self) -> &str {
        &self.body
    }

    /// HTML body: the text wrapped in a paragraph with newlines as `<br>`.
    pub fn html_content(&self) -> String {
        format!("<p>{}</p>", self.body.replace('\n', "<br>"))
    }
}

impl From<String> for MessageDraft {
    fn from(body: String) -> Self {
        Self { body }
    }
}

impl From<&str> for MessageDraft {
    fn from(body: &str) -> Self {
        Self::new(body)
    }
}
