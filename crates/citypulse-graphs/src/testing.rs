//! Helpers for tests that rasterize charts

use plotters::style::IntoFont;

use crate::style::ChartStyle;

/// Whether the default chart font resolves to an installed system font.
///
/// Text layout through the `ttf` backend fails without one, so tests that
/// rasterize frames return early when this is `false`.
pub fn system_font_available() -> bool {
    let font = ChartStyle::default().label_font;
    (font.family.as_str(), font.size).into_font().box_size("Kyiv").is_ok()
}
