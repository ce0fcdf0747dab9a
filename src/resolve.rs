//! Sweep-line resolution of overlapping highlights within one text leaf.

use std::ops::Range;

use crate::highlight::HighlightRange;

/// A highlight clipped to the coordinates of a single text leaf.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LocalRange {
    pub start: usize,
    pub end: usize,
    /// Identity of the highlight this was clipped from.
    pub owner: usize,
}

impl LocalRange {
    /// Clips `range` to the leaf covering `[offset, offset + len)` of the
    /// flattened text. Empty, inverted, negative or non-intersecting ranges
    /// yield `None`.
    pub fn clip(range: &HighlightRange, owner: usize, offset: usize, len: usize) -> Option<Self> {
        if range.start_offset < 0 || range.start_offset >= range.end_offset {
            return None;
        }
        let leaf_start = offset as i64;
        let leaf_end = leaf_start + len as i64;
        let start = range.start_offset.clamp(leaf_start, leaf_end) - leaf_start;
        let end = range.end_offset.clamp(leaf_start, leaf_end) - leaf_start;
        if start >= end {
            return None;
        }
        Some(Self {
            start: start as usize,
            end: end as usize,
            owner,
        })
    }
}

/// One piece of resolved output: a character range of the leaf and the
/// owner of the winning highlight, if any.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    pub span: Range<usize>,
    pub owner: Option<usize>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum BoundaryKind {
    Start,
    End,
}

#[derive(Clone, Copy, Debug)]
struct Boundary {
    index: usize,
    kind: BoundaryKind,
    /// Position of the range in the resolver's input, used as its identity.
    slot: usize,
}

/// Splits `[0, len)` into contiguous, non-overlapping segments, each
/// tagged with the highlight that wins over it.
///
/// The winner among overlapping ranges is the one with the greatest
/// clipped start; ties go to whichever entered the active set first. Ranges
/// that are empty or start at or beyond `len` are ignored, ends past `len`
/// are clipped.
pub fn resolve(len: usize, ranges: &[LocalRange]) -> Vec<Segment> {
    let mut events: Vec<Boundary> = Vec::with_capacity(ranges.len() * 2);
    for (slot, range) in ranges.iter().enumerate() {
        let end = range.end.min(len);
        if range.start >= end || range.start >= len {
            continue;
        }
        events.push(Boundary {
            index: range.start,
            kind: BoundaryKind::Start,
            slot,
        });
        events.push(Boundary {
            index: end,
            kind: BoundaryKind::End,
            slot,
        });
    }
    events.sort_by_key(|event| (event.index, event.kind));

    let mut segments = Vec::new();
    let mut active: Vec<usize> = Vec::new();
    let mut cursor = 0;

    for event in events {
        if event.index > cursor {
            segments.push(Segment {
                span: cursor..event.index,
                owner: winner(&active, ranges),
            });
            cursor = event.index;
        }
        match event.kind {
            BoundaryKind::Start => active.push(event.slot),
            BoundaryKind::End => {
                if let Some(pos) = active.iter().position(|slot| *slot == event.slot) {
                    active.remove(pos);
                }
            }
        }
    }

    if cursor < len {
        segments.push(Segment {
            span: cursor..len,
            owner: winner(&active, ranges),
        });
    }

    segments
}

fn winner(active: &[usize], ranges: &[LocalRange]) -> Option<usize> {
    let mut best: Option<&LocalRange> = None;
    for slot in active {
        let candidate = &ranges[*slot];
        if best.is_none_or(|current| candidate.start > current.start) {
            best = Some(candidate);
        }
    }
    best.map(|range| range.owner)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local(start: usize, end: usize, owner: usize) -> LocalRange {
        LocalRange { start, end, owner }
    }

    fn spans(segments: &[Segment]) -> Vec<(usize, usize, Option<usize>)> {
        segments
            .iter()
            .map(|segment| (segment.span.start, segment.span.end, segment.owner))
            .collect()
    }

    fn assert_full_coverage(len: usize, segments: &[Segment]) {
        let mut cursor = 0;
        for segment in segments {
            assert_eq!(segment.span.start, cursor, "gap or overlap in {segments:?}");
            assert!(segment.span.end > segment.span.start, "empty segment in {segments:?}");
            cursor = segment.span.end;
        }
        assert_eq!(cursor, len);
    }

    #[test]
    fn no_ranges_yield_one_plain_segment() {
        assert_eq!(spans(&resolve(5, &[])), vec![(0, 5, None)]);
        assert!(resolve(0, &[]).is_empty());
    }

    #[test]
    fn later_start_wins_overlap() {
        let segments = resolve(15, &[local(0, 10, 0), local(5, 15, 1)]);
        assert_eq!(
            spans(&segments),
            vec![(0, 5, Some(0)), (5, 10, Some(1)), (10, 15, Some(1))]
        );
    }

    #[test]
    fn outer_range_resumes_after_nested_range() {
        let segments = resolve(12, &[local(1, 11, 0), local(4, 6, 1)]);
        assert_eq!(
            spans(&segments),
            vec![
                (0, 1, None),
                (1, 4, Some(0)),
                (4, 6, Some(1)),
                (6, 11, Some(0)),
                (11, 12, None),
            ]
        );
    }

    #[test]
    fn adjacent_ranges_leave_no_gap() {
        let segments = resolve(6, &[local(0, 3, 0), local(3, 6, 1)]);
        assert_eq!(spans(&segments), vec![(0, 3, Some(0)), (3, 6, Some(1))]);
    }

    #[test]
    fn equal_start_goes_to_first_entered() {
        let segments = resolve(4, &[local(0, 4, 7), local(0, 2, 3)]);
        assert_eq!(spans(&segments), vec![(0, 2, Some(7)), (2, 4, Some(7))]);
    }

    #[test]
    fn duplicates_are_removed_by_identity() {
        let segments = resolve(6, &[local(0, 2, 0), local(0, 6, 0)]);
        assert_eq!(spans(&segments), vec![(0, 2, Some(0)), (2, 6, Some(0))]);
        let segments = resolve(6, &[local(1, 3, 4), local(1, 3, 4), local(1, 5, 5)]);
        assert_full_coverage(6, &segments);
        assert_eq!(segments[2].owner, Some(5));
    }

    #[test]
    fn invalid_ranges_are_discarded() {
        let segments = resolve(5, &[local(3, 3, 0), local(4, 2, 1), local(5, 9, 2)]);
        assert_eq!(spans(&segments), vec![(0, 5, None)]);
    }

    #[test]
    fn ends_past_the_leaf_are_clipped() {
        let segments = resolve(5, &[local(2, 40, 0)]);
        assert_eq!(spans(&segments), vec![(0, 2, None), (2, 5, Some(0))]);
    }

    #[test]
    fn segments_cover_leaf_for_dense_overlaps() {
        let ranges: Vec<LocalRange> = (0..20)
            .map(|i| local((i * 7) % 31, (i * 7) % 31 + 1 + (i * 3) % 9, i))
            .collect();
        let segments = resolve(33, &ranges);
        assert_full_coverage(33, &segments);
    }

    #[test]
    fn clip_translates_to_leaf_coordinates() {
        let range = HighlightRange::new(3, 9, "#FFFF00", "");
        let clipped = LocalRange::clip(&range, 2, 5, 10).unwrap();
        assert_eq!((clipped.start, clipped.end), (0, 4));
        assert!(LocalRange::clip(&range, 2, 9, 4).is_none());
        assert!(LocalRange::clip(&HighlightRange::new(-2, 4, "", ""), 0, 0, 10).is_none());
        assert!(LocalRange::clip(&HighlightRange::new(6, 2, "", ""), 0, 0, 10).is_none());
    }
}
