//! Font metrics for measuring item names and detail lines.
//!
//! The presentation layer owns the real fonts; it hands us per-character width tables
//! (plus ascent/descent) so layout can be computed without touching a toolkit. Unmeasured
//! characters fall back to the table's average width.

use std::collections::HashMap;

/// Font metrics for a specific font configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct FontMetrics {
    /// Font identifier (e.g., "sans-400-12")
    pub font_id: String,
    /// Map of code point → width in pixels
    widths: HashMap<u32, f32>,
    /// Average width for unmeasured characters
    average_width: f32,
    /// Pixels above the baseline
    pub ascent: u32,
    /// Pixels below the baseline
    pub descent: u32,
}

impl FontMetrics {
    /// Creates new font metrics from measured widths
    pub fn new(font_id: String, widths: HashMap<u32, f32>, ascent: u32, descent: u32) -> Self {
        let average_width = if widths.is_empty() {
            0.0
        } else {
            widths.values().sum::<f32>() / widths.len() as f32
        };

        Self {
            font_id,
            widths,
            average_width,
            ascent,
            descent,
        }
    }

    /// Creates metrics where every character has the same width.
    pub fn monospace(font_id: &str, char_width: f32, ascent: u32, descent: u32) -> Self {
        Self {
            font_id: font_id.to_string(),
            widths: HashMap::new(),
            average_width: char_width,
            ascent,
            descent,
        }
    }

    /// Gets the width of a character, falling back to average if not found
    fn get_char_width(&self, code_point: u32) -> f32 {
        self.widths.get(&code_point).copied().unwrap_or(self.average_width)
    }

    /// Calculates the total width of a text string
    pub fn calculate_text_width(&self, text: &str) -> f32 {
        text.chars().map(|c| self.get_char_width(c as u32)).sum()
    }

    /// Text width rounded up to whole pixels, as layout works in integers.
    pub fn text_width(&self, text: &str) -> u32 {
        self.calculate_text_width(text).ceil() as u32
    }

    /// Line height (ascent + descent).
    pub fn height(&self) -> u32 {
        self.ascent + self.descent
    }
}

/// The two fonts a filer window draws with.
#[derive(Debug, Clone, PartialEq)]
pub struct Fonts {
    /// Proportional font used for item names
    pub item: FontMetrics,
    /// Fixed-width font used for the Full Info detail line
    pub fixed: FontMetrics,
}

impl Default for Fonts {
    fn default() -> Self {
        Self {
            item: FontMetrics::monospace("sans-400-12", 7.0, 11, 3),
            fixed: FontMetrics::monospace("mono-400-10", 6.0, 10, 2),
        }
    }
}
