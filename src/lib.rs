//! Renders markup as styled rich-text runs with highlight annotations laid
//! over its flattened text.
//!
//! ```
//! use annotext::{HighlightRange, Theme, render_markup};
//!
//! let highlights = [HighlightRange::new(3, 4, "#FFEB3B", "d")];
//! let result = render_markup("a<a href=\"x\">bc</a>d", &highlights, None, &Theme::default())
//!     .unwrap();
//! assert_eq!(result.text(), "abcd");
//! assert_eq!(result.runs.len(), 3);
//! ```

pub mod flatten;
pub mod highlight;
pub mod lines;
pub mod markup;
pub mod render;
pub mod resolve;
pub mod style;
pub mod theme;

pub use highlight::{HighlightRange, HighlightRequest, KeywordSearch};
pub use markup::{MarkupError, MarkupNode};
pub use render::{Interaction, RenderResult, RenderRun, RunKind, render_document, render_markup};
pub use style::{Rgba, StyleDescriptor, decode_color};
pub use theme::Theme;
