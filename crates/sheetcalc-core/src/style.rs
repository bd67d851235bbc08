//! Cell styling
//!
//! The engine stores and persists styles alongside raw input but never
//! interprets them; applying a style is the renderer's business.

use serde::{Deserialize, Serialize};

/// Visual style attached to a cell
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CellStyle {
    /// Bold font
    #[serde(skip_serializing_if = "is_false")]
    pub bold: bool,
    /// Italic font
    #[serde(skip_serializing_if = "is_false")]
    pub italic: bool,
    /// Underlined text
    #[serde(skip_serializing_if = "is_false")]
    pub underline: bool,
    /// Text color as a CSS-style hex string (e.g. "#1F2937")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_color: Option<String>,
    /// Background color as a CSS-style hex string
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<String>,
    /// Horizontal alignment
    #[serde(skip_serializing_if = "HorizontalAlignment::is_general")]
    pub horizontal: HorizontalAlignment,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl CellStyle {
    /// Create a new default style
    pub fn new() -> Self {
        Self::default()
    }

    /// Set font to bold
    pub fn bold(mut self, bold: bool) -> Self {
        self.bold = bold;
        self
    }

    /// Set font to italic
    pub fn italic(mut self, italic: bool) -> Self {
        self.italic = italic;
        self
    }

    /// Set underline
    pub fn underline(mut self, underline: bool) -> Self {
        self.underline = underline;
        self
    }

    /// Set font color
    pub fn font_color<S: Into<String>>(mut self, color: S) -> Self {
        self.font_color = Some(color.into());
        self
    }

    /// Set fill color (solid background)
    pub fn fill_color<S: Into<String>>(mut self, color: S) -> Self {
        self.fill_color = Some(color.into());
        self
    }

    /// Set horizontal alignment
    pub fn horizontal_alignment(mut self, align: HorizontalAlignment) -> Self {
        self.horizontal = align;
        self
    }

    /// True when nothing differs from the default style
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Horizontal text alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizontalAlignment {
    /// Numbers right, text left
    #[default]
    General,
    Left,
    Center,
    Right,
}

impl HorizontalAlignment {
    fn is_general(&self) -> bool {
        matches!(self, HorizontalAlignment::General)
    }
}
