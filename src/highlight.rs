use serde::{Deserialize, Serialize};

mod keyword;
mod reanchor;
mod request;

pub use keyword::{KeywordSearch, keyword_ranges};
pub use reanchor::{REANCHOR_WINDOW, reanchor, reanchor_all};
pub use request::HighlightRequest;

/// A half-open character interval over the flattened text of a document,
/// with a color and an optional note.
///
/// Offsets count Unicode scalar values, not bytes. They are signed so that
/// ranges recorded against an older text snapshot can be carried around
/// unchanged; anything out of bounds is dropped at render time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighlightRange {
    pub start_offset: i64,
    pub end_offset: i64,
    pub color_token: String,
    #[serde(default)]
    pub annotated_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl HighlightRange {
    pub fn new(
        start_offset: i64,
        end_offset: i64,
        color_token: impl Into<String>,
        annotated_text: impl Into<String>,
    ) -> Self {
        Self {
            start_offset,
            end_offset,
            color_token: color_token.into(),
            annotated_text: annotated_text.into(),
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Whether the range carries a non-empty note.
    pub fn has_note(&self) -> bool {
        self.note.as_deref().is_some_and(|note| !note.is_empty())
    }

    pub fn len(&self) -> i64 {
        self.end_offset.saturating_sub(self.start_offset).max(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
