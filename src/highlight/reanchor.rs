use super::HighlightRange;
use crate::flatten::{byte_offset, char_slice};

/// How many characters before the recorded start the repair search begins.
pub const REANCHOR_WINDOW: usize = 10;

/// Makes `range` consistent with `text`.
///
/// The end offset is clamped to the text length. A range whose slice
/// already reads `annotated_text` is kept as is. Otherwise the first
/// occurrence of `annotated_text` at or after `start - REANCHOR_WINDOW`
/// becomes the new position. When nothing is found the (clamped) range is
/// returned unchanged and may render over whatever text now sits there.
pub fn reanchor(range: &HighlightRange, text: &str) -> HighlightRange {
    let text_len = text.chars().count() as i64;
    let mut clamped = range.clone();
    clamped.end_offset = clamped.end_offset.min(text_len);

    if matches_text(&clamped, text) {
        return clamped;
    }

    let search_from = clamped
        .start_offset
        .saturating_sub(REANCHOR_WINDOW as i64)
        .max(0);
    if search_from > text_len {
        tracing::debug!(
            target: "annotext::highlight",
            start = range.start_offset,
            end = range.end_offset,
            "highlight starts past the end of the text, leaving it in place"
        );
        return clamped;
    }

    let from_byte = byte_offset(text, search_from as usize);
    match text[from_byte..].find(clamped.annotated_text.as_str()) {
        Some(found) => {
            let start = search_from + text[from_byte..from_byte + found].chars().count() as i64;
            let len = clamped.annotated_text.chars().count() as i64;
            tracing::debug!(
                target: "annotext::highlight",
                from = range.start_offset,
                to = start,
                "relocated stale highlight"
            );
            HighlightRange {
                start_offset: start,
                end_offset: start + len,
                ..clamped
            }
        }
        None => {
            tracing::debug!(
                target: "annotext::highlight",
                start = range.start_offset,
                end = range.end_offset,
                annotated = %range.annotated_text.escape_debug(),
                "could not repair highlight, keeping recorded offsets"
            );
            clamped
        }
    }
}

/// Reanchors every range against the same text, keeping their order.
pub fn reanchor_all(ranges: &[HighlightRange], text: &str) -> Vec<HighlightRange> {
    ranges.iter().map(|range| reanchor(range, text)).collect()
}

fn matches_text(range: &HighlightRange, text: &str) -> bool {
    if range.start_offset < 0 || range.start_offset > range.end_offset {
        return false;
    }
    char_slice(text, range.start_offset as usize, range.end_offset as usize)
        == range.annotated_text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(start: i64, end: i64, annotated: &str) -> HighlightRange {
        HighlightRange::new(start, end, "#FFFF00", annotated)
    }

    #[test]
    fn matching_range_is_returned_unchanged() {
        let original = range(3, 8, "hello").with_note("keep me");
        assert_eq!(reanchor(&original, "AAAhelloBBB"), original);
    }

    #[test]
    fn stale_range_is_moved_to_nearby_occurrence() {
        let repaired = reanchor(&range(0, 5, "hello"), "AAAhelloBBB");
        assert_eq!((repaired.start_offset, repaired.end_offset), (3, 8));
        assert_eq!(repaired.annotated_text, "hello");
        assert_eq!(repaired.color_token, "#FFFF00");
    }

    #[test]
    fn repair_keeps_color_and_note() {
        let stale = range(20, 25, "hello").with_note("n");
        let repaired = reanchor(&stale, "0123456789012345hello");
        assert_eq!(repaired.start_offset, 16);
        assert_eq!(repaired.end_offset, 21);
        assert_eq!(repaired.note.as_deref(), Some("n"));
    }

    #[test]
    fn search_does_not_look_further_back_than_the_window() {
        let text = "hello 0123456789012345";
        let stale = range(17, 22, "hello");
        let repaired = reanchor(&stale, text);
        assert_eq!((repaired.start_offset, repaired.end_offset), (17, 22));
    }

    #[test]
    fn unrepairable_range_keeps_offsets_with_clamped_end() {
        let stale = range(2, 50, "missing");
        let repaired = reanchor(&stale, "short text");
        assert_eq!((repaired.start_offset, repaired.end_offset), (2, 10));
    }

    #[test]
    fn offsets_are_counted_in_characters() {
        let repaired = reanchor(&range(0, 3, "für"), "ää für");
        assert_eq!((repaired.start_offset, repaired.end_offset), (3, 6));
    }

    #[test]
    fn stale_empty_annotation_collapses_to_window_start() {
        let text = "abcdefghijklmnopqrst";
        let repaired = reanchor(&range(3, 9, ""), text);
        assert_eq!((repaired.start_offset, repaired.end_offset), (0, 0));
        let repaired = reanchor(&range(15, 18, ""), text);
        assert_eq!((repaired.start_offset, repaired.end_offset), (5, 5));
    }

    #[test]
    fn extreme_offsets_do_not_overflow() {
        let repaired = reanchor(&range(i64::MIN, 2, "zz"), "abc");
        assert_eq!((repaired.start_offset, repaired.end_offset), (i64::MIN, 2));
        assert_eq!(range(i64::MIN, i64::MAX, "").len(), i64::MAX);
    }

    #[test]
    fn reanchor_all_preserves_order() {
        let ranges = vec![range(0, 5, "hello"), range(0, 3, "BBB")];
        let repaired = reanchor_all(&ranges, "AAAhelloBBB");
        assert_eq!(repaired[0].start_offset, 3);
        assert_eq!(repaired[1].start_offset, 8);
    }
}
