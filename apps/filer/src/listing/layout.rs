//! Per-style item box sizing, grid geometry and hit testing.
//!
//! Everything here is pure arithmetic over item measurements and font metrics; the
//! presentation layer draws into the rectangles this module computes.

use serde::{Deserialize, Serialize};

use crate::file_system::Measurements;
use crate::font_metrics::Fonts;

pub const MAX_ICON_HEIGHT: u32 = 42;
pub const MAX_ICON_WIDTH: u32 = 48;
pub const SMALL_ICON_HEIGHT: u32 = 20;
pub const SMALL_ICON_WIDTH: u32 = 24;
/// Narrowest box a window uses, however short its names
pub const MIN_ITEM_WIDTH: u32 = 64;
/// Upper bound for both truncate limits
pub const MAX_TRUNCATE: u32 = 250;

// ============================================================================
// Display style
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Hash)]
pub enum DisplayStyle {
    #[default]
    #[serde(rename = "Large Icons")]
    LargeIcons,
    #[serde(rename = "Small Icons")]
    SmallIcons,
    #[serde(rename = "Full Info")]
    FullInfo,
}

impl DisplayStyle {
    pub const ALL: [DisplayStyle; 3] = [DisplayStyle::LargeIcons, DisplayStyle::SmallIcons, DisplayStyle::FullInfo];

    /// Name as stored in the options file.
    pub fn name(self) -> &'static str {
        match self {
            DisplayStyle::LargeIcons => "Large Icons",
            DisplayStyle::SmallIcons => "Small Icons",
            DisplayStyle::FullInfo => "Full Info",
        }
    }

    /// Case-insensitive inverse of `name`.
    pub fn from_name(name: &str) -> Option<DisplayStyle> {
        Self::ALL
            .into_iter()
            .find(|style| style.name().eq_ignore_ascii_case(name.trim()))
    }
}

/// Name width limits, in pixels, for the two icon styles.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Truncation {
    pub large: u32,
    pub small: u32,
}

impl Truncation {
    /// Both limits clamped to `MAX_TRUNCATE`.
    pub fn new(large: u32, small: u32) -> Self {
        Self {
            large: large.min(MAX_TRUNCATE),
            small: small.min(MAX_TRUNCATE),
        }
    }
}

impl Default for Truncation {
    fn default() -> Self {
        Self::new(89, 250)
    }
}

impl std::fmt::Display for Truncation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.large, self.small)
    }
}

// ============================================================================
// Geometry
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSize {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.y >= self.y
            && i64::from(point.x) < i64::from(self.x) + i64::from(self.width)
            && i64::from(point.y) < i64::from(self.y) + i64::from(self.height)
    }
}

/// Width of one item's box in `style`.
pub fn item_width(style: DisplayStyle, m: &Measurements, truncation: Truncation) -> u32 {
    match style {
        DisplayStyle::FullInfo => MAX_ICON_WIDTH + 12 + m.details_width.max(m.name_width),
        DisplayStyle::SmallIcons => SMALL_ICON_WIDTH + 12 + m.name_width.min(truncation.small),
        DisplayStyle::LargeIcons => m.icon.width.max(m.name_width.min(truncation.large)) + 4,
    }
}

/// Box height in `style`. The same for every item.
pub fn item_height(style: DisplayStyle, fonts: &Fonts) -> u32 {
    let text_height = fonts.item.height();
    match style {
        DisplayStyle::FullInfo => MAX_ICON_HEIGHT + 4,
        DisplayStyle::SmallIcons => text_height.max(SMALL_ICON_HEIGHT) + 4,
        DisplayStyle::LargeIcons => text_height + MAX_ICON_HEIGHT + 8,
    }
}

/// Smallest box that fits every item, and never narrower than `min_width`.
///
/// Always looks at all items: removing the widest one must shrink the box.
pub fn fit_size<'a>(
    style: DisplayStyle,
    items: impl IntoIterator<Item = &'a Measurements>,
    truncation: Truncation,
    fonts: &Fonts,
    min_width: u32,
) -> ItemSize {
    let width = items
        .into_iter()
        .map(|m| item_width(style, m, truncation))
        .fold(min_width, u32::max);
    ItemSize {
        width,
        height: item_height(style, fonts),
    }
}

/// Number of columns that fit in `viewport_width`. At least one.
pub fn columns(viewport_width: u32, size: ItemSize) -> usize {
    if size.width == 0 {
        return 1;
    }
    ((viewport_width / size.width) as usize).max(1)
}

/// Box of item `index` in a grid filled row by row.
pub fn item_rect(index: usize, columns: usize, size: ItemSize) -> Rect {
    let columns = columns.max(1);
    let column = (index % columns) as i64;
    let row = (index / columns) as i64;
    Rect {
        x: (column * i64::from(size.width)).clamp(0, i64::from(i32::MAX)) as i32,
        y: (row * i64::from(size.height)).clamp(0, i64::from(i32::MAX)) as i32,
        width: size.width,
        height: size.height,
    }
}

/// Grid cell under `point`, with the point translated into that cell.
pub fn cell_at(point: Point, columns: usize, size: ItemSize, count: usize) -> Option<(usize, Point)> {
    if point.x < 0 || point.y < 0 || size.width == 0 || size.height == 0 {
        return None;
    }
    let column = point.x as u32 / size.width;
    let row = point.y as u32 / size.height;
    if column as usize >= columns.max(1) {
        return None;
    }
    let index = row as usize * columns.max(1) + column as usize;
    if index >= count {
        return None;
    }
    let local = Point::new(
        point.x - (column * size.width) as i32,
        point.y - (row * size.height) as i32,
    );
    Some((index, local))
}

// ============================================================================
// Hit testing
// ============================================================================

/// Whether `point` (relative to the item's box) is on the item's icon or text.
pub fn hit_test(style: DisplayStyle, m: &Measurements, fonts: &Fonts, point: Point, size: ItemSize) -> bool {
    let x = i64::from(point.x);
    let y = i64::from(point.y);
    let width = i64::from(size.width);
    let height = i64::from(size.height);
    let icon_width = i64::from(m.icon.width);
    let icon_height = i64::from(m.icon.height);
    let name_width = i64::from(m.name_width);

    match style {
        DisplayStyle::LargeIcons => {
            let text_height = i64::from(fonts.item.height());
            let image_y = (i64::from(MAX_ICON_HEIGHT) - icon_height).max(0);
            let image_limit = (icon_width >> 1) + 2;
            let text_limit = (name_width >> 1) + 2;

            // Too high up (don't worry about too low)
            if y < image_y {
                return false;
            }
            let x_limit = if y <= image_y + icon_height + 2 {
                image_limit
            } else if y > height - text_height - 2 {
                text_limit
            } else {
                image_limit.min(text_limit)
            };
            (x - (width >> 1)).abs() < x_limit
        }
        DisplayStyle::SmallIcons => {
            let image_y = (i64::from(SMALL_ICON_HEIGHT) - icon_height).max(0);
            let low_top = height - i64::from(fonts.fixed.descent) - 2 - i64::from(fonts.item.ascent);
            let icon_column = i64::from(SMALL_ICON_WIDTH).min(icon_width);

            if x < icon_column + 2 {
                return x > 2 && y > image_y;
            }
            let x = x - (i64::from(SMALL_ICON_WIDTH) + 4);
            y >= low_top && x < name_width
        }
        DisplayStyle::FullInfo => {
            let image_y = (i64::from(MAX_ICON_HEIGHT) - icon_height).max(0);
            let low_top = height - i64::from(fonts.fixed.descent) - 2 - i64::from(fonts.fixed.ascent);

            if x < icon_width + 2 {
                return x > 2 && y > image_y;
            }
            let x = x - (i64::from(MAX_ICON_WIDTH) + 8);
            if y >= low_top {
                x < i64::from(m.details_width)
            } else if y >= low_top - i64::from(fonts.item.height()) {
                x < name_width
            } else {
                false
            }
        }
    }
}
