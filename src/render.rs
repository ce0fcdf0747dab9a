use crate::flatten::{LINE_BREAK, flatten};
use crate::highlight::{HighlightRange, KeywordSearch, reanchor_all};
use crate::markup::{self, MarkupError, MarkupNode, TagKind};
use crate::resolve::{LocalRange, resolve};
use crate::style::{StyleDescriptor, compose, decode_color};
use crate::theme::Theme;

/// What the presentation layer should offer when a run is activated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Interaction {
    Highlight { text: String, note: Option<String> },
    Link { href: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunKind {
    Text,
    /// A single injected newline.
    LineBreak,
    /// Zero-width placeholder for a horizontal rule.
    HorizontalRule,
}

/// A contiguous slice of flattened text with one resolved style and at
/// most one interaction.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderRun {
    pub text: String,
    pub style: StyleDescriptor,
    pub interaction: Option<Interaction>,
    pub kind: RunKind,
}

impl RenderRun {
    /// Length in characters, the unit highlight offsets are measured in.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

#[derive(Debug)]
pub struct RenderResult {
    pub runs: Vec<RenderRun>,
    /// Flattened text of the document the runs were produced from.
    pub flattened: String,
    /// The highlight set after keyword generation and reanchoring.
    pub highlights: Vec<HighlightRange>,
}

impl RenderResult {
    /// Concatenated text of all runs.
    pub fn text(&self) -> String {
        self.runs.iter().map(|run| run.text.as_str()).collect()
    }
}

/// Renders a markup tree with the given highlights.
///
/// Ranges generated by `search` are appended after the caller's ranges,
/// then every range is reanchored against the document's flattened text
/// before the render pass.
pub fn render_document(
    root: &MarkupNode,
    highlights: &[HighlightRange],
    search: Option<&KeywordSearch>,
    theme: &Theme,
) -> RenderResult {
    let flattened = flatten(root);

    let mut ranges = highlights.to_vec();
    if let Some(search) = search {
        ranges.extend(search.ranges(&flattened, &theme.search_color_token));
    }
    let ranges = reanchor_all(&ranges, &flattened);

    let text_len = flattened.chars().count() as i64;
    for range in &ranges {
        if range.start_offset < 0 || range.start_offset >= range.end_offset.min(text_len) {
            tracing::debug!(
                target: "annotext::render",
                start = range.start_offset,
                end = range.end_offset,
                text_len,
                "highlight covers no text and will not be drawn"
            );
        }
    }

    let context = RenderContext {
        ranges: &ranges,
        theme,
    };
    let (runs, end) = render_node(root, &theme.base_style(), None, 0, &context);
    debug_assert_eq!(end as i64, text_len);

    RenderResult {
        runs,
        flattened,
        highlights: ranges,
    }
}

/// Parses `source` and renders it. See [`render_document`].
pub fn render_markup(
    source: &str,
    highlights: &[HighlightRange],
    search: Option<&KeywordSearch>,
    theme: &Theme,
) -> Result<RenderResult, MarkupError> {
    let root = markup::parse(source)?;
    Ok(render_document(&root, highlights, search, theme))
}

/// Read-only state shared by every step of one render pass.
pub struct RenderContext<'a> {
    pub ranges: &'a [HighlightRange],
    pub theme: &'a Theme,
}

/// Renders `node`, which starts at `offset` in the flattened text, and
/// returns its runs together with the offset just past it.
///
/// `link` is the href of the innermost enclosing anchor.
pub fn render_node(
    node: &MarkupNode,
    style: &StyleDescriptor,
    link: Option<&str>,
    offset: usize,
    context: &RenderContext<'_>,
) -> (Vec<RenderRun>, usize) {
    let element = match node {
        MarkupNode::Text(text) => {
            let runs = render_text(text, RunKind::Text, style, link, offset, context);
            return (runs, offset + text.chars().count());
        }
        MarkupNode::Element(element) => element,
    };

    match element.kind() {
        TagKind::Bold => {
            render_children(&element.children, &style.clone().bold(), link, offset, context)
        }
        TagKind::Italic => {
            render_children(&element.children, &style.clone().italic(), link, offset, context)
        }
        TagKind::Underline => {
            render_children(&element.children, &style.clone().underlined(), link, offset, context)
        }
        TagKind::Font => {
            let color = element.attribute("color").and_then(decode_color);
            let style = style.clone().with_color(color);
            render_children(&element.children, &style, link, offset, context)
        }
        TagKind::LineBreak => {
            let text = LINE_BREAK.to_string();
            let runs = render_text(&text, RunKind::LineBreak, style, link, offset, context);
            (runs, offset + 1)
        }
        TagKind::Rule => {
            let run = RenderRun {
                text: String::new(),
                style: style.clone(),
                interaction: None,
                kind: RunKind::HorizontalRule,
            };
            (vec![run], offset)
        }
        TagKind::Anchor => {
            let href = element.attribute("href").unwrap_or_default();
            let style = context.theme.link_style(style);
            render_children(&element.children, &style, Some(href), offset, context)
        }
        TagKind::Container => render_children(&element.children, style, link, offset, context),
    }
}

fn render_children(
    children: &[MarkupNode],
    style: &StyleDescriptor,
    link: Option<&str>,
    offset: usize,
    context: &RenderContext<'_>,
) -> (Vec<RenderRun>, usize) {
    let mut runs = Vec::new();
    let mut offset = offset;
    for child in children {
        let (child_runs, next) = render_node(child, style, link, offset, context);
        runs.extend(child_runs);
        offset = next;
    }
    (runs, offset)
}

fn render_text(
    text: &str,
    kind: RunKind,
    style: &StyleDescriptor,
    link: Option<&str>,
    offset: usize,
    context: &RenderContext<'_>,
) -> Vec<RenderRun> {
    let boundaries: Vec<usize> = text
        .char_indices()
        .map(|(idx, _)| idx)
        .chain(std::iter::once(text.len()))
        .collect();
    let len = boundaries.len() - 1;
    if len == 0 {
        return Vec::new();
    }

    let local: Vec<LocalRange> = context
        .ranges
        .iter()
        .enumerate()
        .filter_map(|(owner, range)| LocalRange::clip(range, owner, offset, len))
        .collect();

    resolve(len, &local)
        .into_iter()
        .map(|segment| {
            let slice = &text[boundaries[segment.span.start]..boundaries[segment.span.end]];
            let highlight = segment.owner.map(|owner| &context.ranges[owner]);
            compose_run(slice, kind, style, link, highlight, context.theme)
        })
        .collect()
}

/// Packages a text slice into a run: the highlight decides the background
/// and, if present, the interaction; otherwise an enclosing link does.
pub fn compose_run(
    text: &str,
    kind: RunKind,
    inherited: &StyleDescriptor,
    link: Option<&str>,
    highlight: Option<&HighlightRange>,
    theme: &Theme,
) -> RenderRun {
    let interaction = match (highlight, link) {
        (Some(highlight), _) => Some(Interaction::Highlight {
            text: text.to_string(),
            note: highlight.note.clone(),
        }),
        (None, Some(href)) => Some(Interaction::Link {
            href: href.to_string(),
        }),
        (None, None) => None,
    };
    RenderRun {
        text: text.to_string(),
        style: compose(inherited, highlight, theme),
        interaction,
        kind,
    }
}

#[cfg(test)]
#[path = "render_tests.rs"]
mod render_tests;
