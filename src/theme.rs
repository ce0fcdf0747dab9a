use crate::style::{Rgba, StyleDescriptor};

/// Theme configuration for rendering
#[derive(Clone, Debug, PartialEq)]
pub struct Theme {
    /// Font family every run inherits from the document root
    pub font_family: String,

    /// Base font size in points
    pub font_size: f32,

    /// Line height as a multiple of the font size
    pub line_height: f32,

    /// Text color for unstyled text (`None` leaves it to the presentation layer)
    pub text_color: Option<Rgba>,

    /// Color for links
    pub link_color: Rgba,

    /// Underline color marking highlights that carry a note
    pub note_underline_color: Rgba,

    /// Underline thickness marking highlights that carry a note
    pub note_underline_thickness: f32,

    /// Color token used for ranges generated by keyword search
    pub search_color_token: String,

    /// Glyph repeated across the width when drawing a horizontal rule
    pub rule_char: char,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            font_family: "serif".to_string(),
            font_size: 16.0,
            line_height: 1.5,
            text_color: None,
            link_color: Rgba::rgb(0x1E, 0x88, 0xE5),
            note_underline_color: Rgba::rgb(0xE5, 0x39, 0x35),
            note_underline_thickness: 2.0,
            search_color_token: "#FFFFEB3B".to_string(),
            rule_char: '─',
        }
    }
}

impl Theme {
    /// Create a new theme with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the style every render pass starts from
    pub fn base_style(&self) -> StyleDescriptor {
        StyleDescriptor {
            bold: false,
            italic: false,
            underline: false,
            color: self.text_color,
            background_color: None,
            underline_color: None,
            underline_thickness: None,
            font_family: self.font_family.clone(),
            font_size: self.font_size,
            line_height: self.line_height,
        }
    }

    /// Get the style for links, derived from the inherited style
    pub fn link_style(&self, inherited: &StyleDescriptor) -> StyleDescriptor {
        let mut style = inherited.clone();
        style.color = Some(self.link_color);
        style.underline = true;
        style
    }

    /// Get the style for a highlight that has a note attached
    pub fn note_style(&self, inherited: &StyleDescriptor) -> StyleDescriptor {
        let mut style = inherited.clone();
        style.underline = true;
        style.underline_color = Some(self.note_underline_color);
        style.underline_thickness = Some(self.note_underline_thickness);
        style
    }
}
