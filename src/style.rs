use ratatui::style::{Color, Modifier, Style};

use crate::highlight::HighlightRange;
use crate::theme::Theme;

/// An sRGB color with alpha.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub a: u8,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { a: 0xFF, r, g, b }
    }

    pub const fn argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self { a, r, g, b }
    }
}

impl From<Rgba> for Color {
    fn from(color: Rgba) -> Self {
        Color::Rgb(color.r, color.g, color.b)
    }
}

/// Decodes `#RRGGBB` or `#AARRGGBB`. Anything else is "no color".
pub fn decode_color(token: &str) -> Option<Rgba> {
    let hex = token.trim().strip_prefix('#')?;
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let value = u32::from_str_radix(hex, 16).ok()?;
    let [a, r, g, b] = value.to_be_bytes();
    match hex.len() {
        6 => Some(Rgba::rgb(r, g, b)),
        8 => Some(Rgba::argb(a, r, g, b)),
        _ => None,
    }
}

/// The resolved look of a render run.
#[derive(Clone, Debug, PartialEq)]
pub struct StyleDescriptor {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub color: Option<Rgba>,
    pub background_color: Option<Rgba>,
    pub underline_color: Option<Rgba>,
    pub underline_thickness: Option<f32>,
    pub font_family: String,
    pub font_size: f32,
    pub line_height: f32,
}

impl Default for StyleDescriptor {
    fn default() -> Self {
        Theme::default().base_style()
    }
}

impl StyleDescriptor {
    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub fn underlined(mut self) -> Self {
        self.underline = true;
        self
    }

    /// Overrides the foreground color; `None` keeps the inherited one.
    pub fn with_color(mut self, color: Option<Rgba>) -> Self {
        if let Some(color) = color {
            self.color = Some(color);
        }
        self
    }

    /// Terminal approximation of this style. Font metrics and alpha have no
    /// terminal counterpart and are dropped.
    pub fn to_ratatui(&self) -> Style {
        let mut style = Style::default();
        if self.bold {
            style = style.add_modifier(Modifier::BOLD);
        }
        if self.italic {
            style = style.add_modifier(Modifier::ITALIC);
        }
        if self.underline {
            style = style.add_modifier(Modifier::UNDERLINED);
        }
        if let Some(color) = self.color {
            style = style.fg(color.into());
        }
        if let Some(color) = self.background_color {
            style = style.bg(color.into());
        }
        if let Some(color) = self.underline_color {
            style = style.underline_color(color.into());
        }
        style
    }
}

/// Style of a text slice given what it inherits and the highlight winning
/// over it.
pub fn compose(
    inherited: &StyleDescriptor,
    highlight: Option<&HighlightRange>,
    theme: &Theme,
) -> StyleDescriptor {
    let Some(highlight) = highlight else {
        return inherited.clone();
    };
    let mut style = if highlight.has_note() {
        theme.note_style(inherited)
    } else {
        inherited.clone()
    };
    if let Some(background) = decode_color(&highlight.color_token) {
        style.background_color = Some(background);
    }
    style
}
