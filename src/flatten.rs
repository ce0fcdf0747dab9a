use crate::markup::{MarkupNode, TagKind};

/// Character injected into the flattened text for every line break.
pub const LINE_BREAK: char = '\n';

/// Number of characters `node` contributes to the flattened text.
pub fn flattened_len(node: &MarkupNode) -> usize {
    match node {
        MarkupNode::Text(text) => text.chars().count(),
        MarkupNode::Element(element) => match element.kind() {
            TagKind::LineBreak => 1,
            TagKind::Rule => 0,
            _ => element.children.iter().map(flattened_len).sum(),
        },
    }
}

/// Plain-text projection of `node`: text nodes in document order with a
/// newline for each line break.
pub fn flatten(node: &MarkupNode) -> String {
    let mut out = String::new();
    flatten_into(node, &mut out);
    out
}

fn flatten_into(node: &MarkupNode, out: &mut String) {
    match node {
        MarkupNode::Text(text) => out.push_str(text),
        MarkupNode::Element(element) => match element.kind() {
            TagKind::LineBreak => out.push(LINE_BREAK),
            TagKind::Rule => {}
            _ => {
                for child in &element.children {
                    flatten_into(child, out);
                }
            }
        },
    }
}

/// Byte index of the `char_idx`-th character, or `text.len()` past the end.
pub(crate) fn byte_offset(text: &str, char_idx: usize) -> usize {
    text.char_indices()
        .nth(char_idx)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len())
}

/// Characters `start..end` of `text`, clamped to its length.
pub(crate) fn char_slice(text: &str, start: usize, end: usize) -> &str {
    let from = byte_offset(text, start);
    let to = byte_offset(text, end.max(start));
    &text[from..to]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::{Element, parse};

    #[test]
    fn line_breaks_count_once_and_rules_not_at_all() {
        let root = parse("a<br/>b<hr/>c").unwrap();
        assert_eq!(flatten(&root), "a\nbc");
        assert_eq!(flattened_len(&root), 4);
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let root = MarkupNode::element("p", vec![MarkupNode::text("héllo ✓")]);
        assert_eq!(flattened_len(&root), 7);
        assert_eq!(flatten(&root).chars().count(), flattened_len(&root));
    }

    #[test]
    fn line_break_children_are_ignored() {
        let br = Element::new("br").with_children(vec![MarkupNode::text("ignored")]);
        let root = MarkupNode::element("p", vec![MarkupNode::text("x"), br.into()]);
        assert_eq!(flatten(&root), "x\n");
        assert_eq!(flattened_len(&root), 2);
    }

    #[test]
    fn char_slice_clamps_to_text() {
        assert_eq!(char_slice("héllo", 1, 3), "él");
        assert_eq!(char_slice("héllo", 3, 99), "lo");
        assert_eq!(char_slice("héllo", 7, 9), "");
        assert_eq!(char_slice("héllo", 3, 1), "");
    }
}
