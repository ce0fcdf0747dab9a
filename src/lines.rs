use std::ops::Range;

use ratatui::{
    style::Style,
    text::{Line, Span},
};
use unicode_width::UnicodeWidthChar;

use crate::render::{Interaction, RenderRun, RunKind};
use crate::theme::Theme;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VisualPosition {
    pub line: usize,
    pub column: u16,
}

/// Where an interaction landed on screen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HitRegion {
    pub line: usize,
    pub columns: Range<u16>,
    /// Indices into the line's spans.
    pub spans: Range<usize>,
    pub interaction: Interaction,
}

impl HitRegion {
    pub fn contains(&self, position: VisualPosition) -> bool {
        self.line == position.line && self.columns.contains(&position.column)
    }
}

#[derive(Debug)]
pub struct LinesOutput {
    pub lines: Vec<Line<'static>>,
    pub regions: Vec<HitRegion>,
    pub total_lines: usize,
}

impl LinesOutput {
    pub fn region_at(&self, position: VisualPosition) -> Option<&HitRegion> {
        self.regions.iter().find(|region| region.contains(position))
    }
}

/// Lays runs out as terminal lines: newlines start a new line, rules become
/// a full-width line of the theme's rule glyph. No wrapping happens here.
pub fn to_lines(runs: &[RenderRun], theme: &Theme, width: usize) -> LinesOutput {
    let mut assembler = LineAssembler::new();
    for run in runs {
        match run.kind {
            RunKind::HorizontalRule => assembler.push_rule(theme.rule_char, width.max(1), run),
            RunKind::Text | RunKind::LineBreak => assembler.push_run(run),
        }
    }
    assembler.finish()
}

struct LineAssembler {
    lines: Vec<Line<'static>>,
    spans: Vec<Span<'static>>,
    regions: Vec<HitRegion>,
    column: usize,
}

impl LineAssembler {
    fn new() -> Self {
        Self {
            lines: Vec::new(),
            spans: Vec::new(),
            regions: Vec::new(),
            column: 0,
        }
    }

    fn push_run(&mut self, run: &RenderRun) {
        let style = run.style.to_ratatui();
        let mut pieces = run.text.split('\n').peekable();
        while let Some(piece) = pieces.next() {
            self.push_piece(piece, style, run.interaction.as_ref());
            if pieces.peek().is_some() {
                self.break_line();
            }
        }
    }

    fn push_piece(&mut self, piece: &str, style: Style, interaction: Option<&Interaction>) {
        let mut text = String::with_capacity(piece.len());
        let mut width = 0;
        for ch in piece.chars() {
            match ch {
                '\r' => {}
                '\t' => {
                    text.push_str("    ");
                    width += 4;
                }
                _ => {
                    text.push(ch);
                    width += UnicodeWidthChar::width(ch).unwrap_or(0);
                }
            }
        }
        if text.is_empty() {
            return;
        }

        let start_column = self.column;
        self.column += width;
        self.spans.push(Span::styled(text, style));

        if let Some(interaction) = interaction {
            self.record_region(start_column, interaction.clone());
        }
    }

    fn record_region(&mut self, start_column: usize, interaction: Interaction) {
        let line = self.lines.len();
        let span = self.spans.len() - 1;
        let columns = clamp_column(start_column)..clamp_column(self.column);
        if let Some(last) = self.regions.last_mut() {
            if last.line == line
                && last.interaction == interaction
                && last.spans.end == span
                && last.columns.end == columns.start
            {
                last.spans.end = span + 1;
                last.columns.end = columns.end;
                return;
            }
        }
        self.regions.push(HitRegion {
            line,
            columns,
            spans: span..span + 1,
            interaction,
        });
    }

    fn push_rule(&mut self, glyph: char, width: usize, run: &RenderRun) {
        if !self.spans.is_empty() {
            self.break_line();
        }
        let rule: String = std::iter::repeat_n(glyph, width).collect();
        let style = run.style.to_ratatui();
        self.lines.push(Line::from(vec![Span::styled(rule, style)]));
    }

    fn break_line(&mut self) {
        let spans = std::mem::take(&mut self.spans);
        self.lines.push(Line::from(spans));
        self.column = 0;
    }

    fn finish(mut self) -> LinesOutput {
        if !self.spans.is_empty() || self.lines.is_empty() {
            self.break_line();
        }
        let total_lines = self.lines.len();
        LinesOutput {
            lines: self.lines,
            regions: self.regions,
            total_lines,
        }
    }
}

fn clamp_column(column: usize) -> u16 {
    column.min(u16::MAX as usize) as u16
}

pub fn visible_width(text: &str) -> usize {
    text.chars()
        .map(|ch| UnicodeWidthChar::width(ch).unwrap_or(0))
        .sum()
}

pub fn line_width(line: &Line<'_>) -> usize {
    line.spans
        .iter()
        .map(|span| visible_width(span.content.as_ref()))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlight::HighlightRange;
    use crate::render::render_markup;
    use ratatui::style::Modifier;

    fn lay_out(markup: &str, highlights: &[HighlightRange], width: usize) -> LinesOutput {
        let theme = Theme::default();
        let result = render_markup(markup, highlights, None, &theme).unwrap();
        to_lines(&result.runs, &theme, width)
    }

    fn line_text(line: &Line<'_>) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    #[test]
    fn line_breaks_and_literal_newlines_split_lines() {
        let output = lay_out("one<br>two\nthree", &[], 10);
        let texts: Vec<String> = output.lines.iter().map(line_text).collect();
        assert_eq!(texts, vec!["one", "two", "three"]);
        assert_eq!(output.total_lines, 3);
    }

    #[test]
    fn rule_occupies_its_own_line() {
        let output = lay_out("above<hr>below", &[], 4);
        let texts: Vec<String> = output.lines.iter().map(line_text).collect();
        assert_eq!(texts, vec!["above", "────", "below"]);
    }

    #[test]
    fn empty_document_has_one_empty_line() {
        let output = lay_out("", &[], 10);
        assert_eq!(output.total_lines, 1);
        assert_eq!(line_width(&output.lines[0]), 0);
    }

    #[test]
    fn link_made_of_several_runs_is_one_region() {
        let output = lay_out("go <a href=\"/x\">to <b>here</b></a>!", &[], 20);
        assert_eq!(output.regions.len(), 1);
        let region = &output.regions[0];
        assert_eq!(region.columns, 3..10);
        assert_eq!(region.spans, 1..3);
        assert_eq!(
            region.interaction,
            Interaction::Link {
                href: "/x".to_string()
            }
        );
        let hit = output.region_at(VisualPosition { line: 0, column: 5 });
        assert_eq!(hit, Some(region));
        assert!(output.region_at(VisualPosition { line: 0, column: 10 }).is_none());
    }

    #[test]
    fn highlight_across_a_line_break_gets_a_region_per_line() {
        let highlight = HighlightRange::new(1, 4, "#FFEB3B", "b\nc").with_note("n");
        let output = lay_out("ab<br>cd", &[highlight], 10);
        let lines: Vec<usize> = output.regions.iter().map(|region| region.line).collect();
        assert_eq!(lines, vec![0, 1]);
        assert_eq!(output.regions[1].columns, 0..1);
        let span = &output.lines[0].spans[1];
        assert!(span.style.add_modifier.contains(Modifier::UNDERLINED));
        assert!(span.style.bg.is_some());
    }

    #[test]
    fn wide_characters_advance_columns_by_display_width() {
        let output = lay_out("日本<a href=\"u\">語</a>", &[], 10);
        assert_eq!(output.regions[0].columns, 4..6);
        assert_eq!(line_width(&output.lines[0]), 6);
    }
}
