use std::collections::BTreeMap;

use quick_xml::{Reader, encoding::EncodingError, events::BytesStart, events::Event};
use thiserror::Error;

/// Tag name given to the synthetic element wrapping a parsed fragment.
pub const DOCUMENT_TAG: &str = "#document";

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

#[derive(Debug, Error)]
pub enum MarkupError {
    #[error("malformed markup at byte {position}: {source}")]
    Syntax {
        position: u64,
        #[source]
        source: quick_xml::Error,
    },

    #[error("markup is not valid text: {0}")]
    Encoding(#[from] EncodingError),
}

/// A node of a parsed markup tree. Trees are immutable once built; the
/// renderer only ever reads them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MarkupNode {
    Text(String),
    Element(Element),
}

impl MarkupNode {
    pub fn text(content: impl Into<String>) -> Self {
        MarkupNode::Text(content.into())
    }

    pub fn element(tag: impl Into<String>, children: Vec<MarkupNode>) -> Self {
        MarkupNode::Element(Element::new(tag).with_children(children))
    }
}

impl From<Element> for MarkupNode {
    fn from(element: Element) -> Self {
        MarkupNode::Element(element)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attributes: BTreeMap<String, String>,
    pub children: Vec<MarkupNode>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_children(mut self, children: Vec<MarkupNode>) -> Self {
        self.children = children;
        self
    }

    /// Looks up an attribute by case-insensitive name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        if let Some(value) = self.attributes.get(name) {
            return Some(value.as_str());
        }
        self.attributes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Lower-cased tag name with any namespace prefix removed.
    pub fn local_name(&self) -> String {
        let local = self.tag.rsplit(':').next().unwrap_or(self.tag.as_str());
        local.to_ascii_lowercase()
    }

    pub fn kind(&self) -> TagKind {
        TagKind::from_local_name(&self.local_name())
    }
}

/// The tag semantics the renderer knows about. Everything else is a
/// transparent container.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TagKind {
    Bold,
    Italic,
    Underline,
    Font,
    LineBreak,
    Rule,
    Anchor,
    Container,
}

impl TagKind {
    pub fn from_local_name(name: &str) -> Self {
        match name {
            "b" | "strong" => TagKind::Bold,
            "i" | "em" => TagKind::Italic,
            "u" => TagKind::Underline,
            "font" => TagKind::Font,
            "br" => TagKind::LineBreak,
            "hr" => TagKind::Rule,
            "a" => TagKind::Anchor,
            _ => TagKind::Container,
        }
    }
}

struct Frame {
    element: Element,
    name: String,
}

impl Frame {
    fn root() -> Self {
        Self {
            element: Element::new(DOCUMENT_TAG),
            name: DOCUMENT_TAG.to_string(),
        }
    }

    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(MarkupNode::Text(existing)) = self.element.children.last_mut() {
            existing.push_str(text);
        } else {
            self.element.children.push(MarkupNode::text(text));
        }
    }
}

/// Parses a markup fragment into a tree rooted at a [`DOCUMENT_TAG`] element.
///
/// This is a lenient tokenizer-driven builder, not an HTML5 parser: void
/// elements close themselves, unmatched end tags are skipped and elements
/// still open at the end of input are closed implicitly.
pub fn parse(markup: &str) -> Result<MarkupNode, MarkupError> {
    let mut reader = Reader::from_str(markup);
    {
        let config = reader.config_mut();
        config.trim_text(false);
        config.check_end_names = false;
        config.allow_unmatched_ends = true;
        config.allow_dangling_amp = true;
    }

    let mut stack: Vec<Frame> = vec![Frame::root()];

    loop {
        let event = reader.read_event().map_err(|source| MarkupError::Syntax {
            position: reader.error_position(),
            source,
        })?;
        match event {
            Event::Start(e) => {
                let element = element_from_start(&reader, &e)?;
                let name = element.local_name();
                if VOID_ELEMENTS.contains(&name.as_str()) {
                    attach(&mut stack, element.into());
                } else {
                    stack.push(Frame { element, name });
                }
            }
            Event::Empty(e) => {
                let element = element_from_start(&reader, &e)?;
                attach(&mut stack, element.into());
            }
            Event::End(e) => {
                let local = e.local_name();
                let raw = reader.decoder().decode(local.as_ref())?;
                let name = raw.to_ascii_lowercase();
                close_element(&mut stack, &name);
            }
            Event::Text(e) => {
                let text = e.decode()?;
                current(&mut stack).push_text(&text);
            }
            Event::CData(e) => {
                let text = reader.decoder().decode(&e)?;
                current(&mut stack).push_text(&text);
            }
            Event::GeneralRef(e) => {
                let name = e.decode()?;
                let literal = format!("&{name};");
                match quick_xml::escape::unescape(&literal) {
                    Ok(resolved) => current(&mut stack).push_text(&resolved),
                    Err(_) => current(&mut stack).push_text(&literal),
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    while stack.len() > 1 {
        if let Some(frame) = stack.pop() {
            attach(&mut stack, frame.element.into());
        }
    }

    let root = stack
        .pop()
        .map(|frame| frame.element)
        .unwrap_or_else(|| Element::new(DOCUMENT_TAG));
    Ok(root.into())
}

fn current(stack: &mut Vec<Frame>) -> &mut Frame {
    if stack.is_empty() {
        stack.push(Frame::root());
    }
    let last = stack.len() - 1;
    &mut stack[last]
}

fn attach(stack: &mut Vec<Frame>, node: MarkupNode) {
    current(stack).element.children.push(node);
}

fn close_element(stack: &mut Vec<Frame>, name: &str) {
    let Some(position) = stack
        .iter()
        .skip(1)
        .rposition(|frame| frame.name == name)
        .map(|idx| idx + 1)
    else {
        tracing::trace!(target: "annotext::markup", tag = name, "ignoring unmatched end tag");
        return;
    };
    while stack.len() > position {
        if let Some(frame) = stack.pop() {
            attach(stack, frame.element.into());
        }
    }
}

fn element_from_start(reader: &Reader<&[u8]>, e: &BytesStart<'_>) -> Result<Element, MarkupError> {
    let qname = e.name();
    let tag = reader.decoder().decode(qname.as_ref())?;
    let mut element = Element::new(tag.as_ref());
    for attr in e.html_attributes().flatten() {
        let key = match reader.decoder().decode(attr.key.local_name().as_ref()) {
            Ok(v) => v.to_ascii_lowercase(),
            Err(_) => continue,
        };
        let value = match attr.decode_and_unescape_value(reader.decoder()) {
            Ok(v) => v.into_owned(),
            Err(_) => match reader.decoder().decode(&attr.value) {
                Ok(v) => v.into_owned(),
                Err(_) => continue,
            },
        };
        element.attributes.insert(key, value);
    }
    Ok(element)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn children(node: &MarkupNode) -> &[MarkupNode] {
        match node {
            MarkupNode::Element(element) => &element.children,
            MarkupNode::Text(_) => &[],
        }
    }

    #[test]
    fn parses_nested_inline_markup() {
        let root = parse("Hello <b>bold <i>both</i></b>!").unwrap();
        let expected = MarkupNode::element(
            DOCUMENT_TAG,
            vec![
                MarkupNode::text("Hello "),
                MarkupNode::element(
                    "b",
                    vec![
                        MarkupNode::text("bold "),
                        MarkupNode::element("i", vec![MarkupNode::text("both")]),
                    ],
                ),
                MarkupNode::text("!"),
            ],
        );
        assert_eq!(root, expected);
    }

    #[test]
    fn void_elements_do_not_swallow_siblings() {
        let root = parse("a<br>b<hr>c").unwrap();
        let nodes = children(&root);
        assert_eq!(nodes.len(), 5);
        assert!(matches!(&nodes[1], MarkupNode::Element(e) if e.kind() == TagKind::LineBreak));
        assert_eq!(nodes[2], MarkupNode::text("b"));
        assert!(matches!(&nodes[3], MarkupNode::Element(e) if e.kind() == TagKind::Rule));
    }

    #[test]
    fn reads_anchor_href_and_font_color() {
        let root = parse(r##"<a HREF="https://example.com/?a=1&amp;b=2">x</a><font color="#ff0000">y</font>"##)
            .unwrap();
        let nodes = children(&root);
        let MarkupNode::Element(anchor) = &nodes[0] else {
            panic!("expected anchor element");
        };
        assert_eq!(anchor.kind(), TagKind::Anchor);
        assert_eq!(anchor.attribute("href"), Some("https://example.com/?a=1&b=2"));
        let MarkupNode::Element(font) = &nodes[1] else {
            panic!("expected font element");
        };
        assert_eq!(font.attribute("color"), Some("#ff0000"));
    }

    #[test]
    fn entity_references_merge_into_surrounding_text() {
        let root = parse("fish &amp; chips&nbsp;ok").unwrap();
        assert_eq!(children(&root), &[MarkupNode::text("fish & chips&nbsp;ok")]);
    }

    #[test]
    fn unmatched_and_unclosed_tags_are_tolerated() {
        let root = parse("<b>one</i> two<u>three").unwrap();
        let nodes = children(&root);
        assert_eq!(nodes.len(), 1);
        let MarkupNode::Element(bold) = &nodes[0] else {
            panic!("expected bold element");
        };
        assert_eq!(bold.children.len(), 2);
        assert_eq!(bold.children[0], MarkupNode::text("one two"));
    }

    #[test]
    fn tag_kind_ignores_case_and_namespace() {
        assert_eq!(Element::new("STRONG").kind(), TagKind::Bold);
        assert_eq!(Element::new("html:em").kind(), TagKind::Italic);
        assert_eq!(Element::new("span").kind(), TagKind::Container);
    }
}
