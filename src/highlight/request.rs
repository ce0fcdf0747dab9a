use serde::{Deserialize, Serialize};

use super::HighlightRange;
use crate::flatten::char_slice;

/// What a presentation layer needs to offer "create highlight" for a
/// selection: the selected text, its offsets in the flattened text and an
/// optional page or metadata token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighlightRequest {
    pub selected_text: String,
    pub start_offset: i64,
    pub end_offset: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
}

impl HighlightRequest {
    /// Builds a request from a selection over `flattened`. The ends may come
    /// in either order and are clamped to the text; an empty selection
    /// yields `None`.
    pub fn from_selection(
        flattened: &str,
        anchor: usize,
        focus: usize,
        page: Option<String>,
    ) -> Option<Self> {
        let len = flattened.chars().count();
        let start = anchor.min(focus).min(len);
        let end = anchor.max(focus).min(len);
        if start == end {
            return None;
        }
        Some(Self {
            selected_text: char_slice(flattened, start, end).to_string(),
            start_offset: start as i64,
            end_offset: end as i64,
            page,
        })
    }

    pub fn into_range(self, color_token: impl Into<String>, note: Option<String>) -> HighlightRange {
        HighlightRange {
            start_offset: self.start_offset,
            end_offset: self.end_offset,
            color_token: color_token.into(),
            annotated_text: self.selected_text,
            note: note.filter(|note| !note.is_empty()),
        }
    }
}
