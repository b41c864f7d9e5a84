//! Colors, fonts and figure layout shared by the animation and the static plots

use plotters::style::RGBColor;
use serde::{Deserialize, Serialize};

/// Palette used to color one line per entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum ColorScheme {
    /// Ten-color categorical palette
    #[default]
    Default,
    /// High-contrast palette
    Vibrant,
    /// Grayscale
    Monochrome,
    /// Hex colors such as `#1f77b4`
    Custom(Vec<String>),
}

impl ColorScheme {
    /// Resolve the palette; never empty
    pub fn colors(&self) -> Vec<RGBColor> {
        let colors = match self {
            Self::Default => vec![
                RGBColor(31, 119, 180),
                RGBColor(255, 127, 14),
                RGBColor(44, 160, 44),
                RGBColor(214, 39, 40),
                RGBColor(148, 103, 189),
                RGBColor(140, 86, 75),
                RGBColor(227, 119, 194),
                RGBColor(127, 127, 127),
                RGBColor(188, 189, 34),
                RGBColor(23, 190, 207),
            ],
            Self::Vibrant => vec![
                RGBColor(230, 25, 75),
                RGBColor(60, 180, 75),
                RGBColor(255, 225, 25),
                RGBColor(0, 130, 200),
                RGBColor(245, 130, 48),
                RGBColor(145, 30, 180),
                RGBColor(70, 240, 240),
                RGBColor(240, 50, 230),
            ],
            Self::Monochrome => vec![
                RGBColor(0, 0, 0),
                RGBColor(64, 64, 64),
                RGBColor(128, 128, 128),
                RGBColor(192, 192, 192),
            ],
            Self::Custom(colors) => colors.iter().map(|c| parse_color(c)).collect(),
        };

        if colors.is_empty() {
            vec![RGBColor(0, 0, 0)]
        } else {
            colors
        }
    }

    /// Color of the `index`-th series, cycling through the palette
    pub fn color_for(&self, index: usize) -> RGBColor {
        let colors = self.colors();
        colors[index % colors.len()]
    }
}

/// Parse a `#rrggbb` color, falling back to black
pub fn parse_color(color: &str) -> RGBColor {
    if let Some(hex) = color.strip_prefix('#') {
        if hex.len() == 6 {
            if let (Ok(r), Ok(g), Ok(b)) = (
                u8::from_str_radix(&hex[0..2], 16),
                u8::from_str_radix(&hex[2..4], 16),
                u8::from_str_radix(&hex[4..6], 16),
            ) {
                return RGBColor(r, g, b);
            }
        }
    }
    RGBColor(0, 0, 0)
}

/// Font family and size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontConfig {
    /// Family name understood by the font backend
    pub family: String,
    /// Size in pixels
    pub size: u32,
}

impl FontConfig {
    fn sized(size: u32) -> Self {
        Self {
            family: "sans-serif".to_string(),
            size,
        }
    }
}

/// Styling for every chart the crate draws
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartStyle {
    /// Line palette
    pub color_scheme: ColorScheme,
    /// Figure background
    pub background_color: String,
    /// Boundary fill
    pub land_color: String,
    /// Boundary outline
    pub border_color: String,
    /// Size-varying activity markers
    pub activity_color: String,
    /// Opacity of activity markers
    pub activity_opacity: f64,
    /// Figure title font
    pub title_font: FontConfig,
    /// Axis descriptions and panel captions
    pub axis_font: FontConfig,
    /// Entity labels and tick labels
    pub label_font: FontConfig,
    /// Margin around each panel in pixels
    pub margin: u32,
    /// Share of the figure height given to the trend panel
    pub trend_height_ratio: f64,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            color_scheme: ColorScheme::Default,
            background_color: "#FFFFFF".to_string(),
            land_color: "#EEEEEE".to_string(),
            border_color: "#888888".to_string(),
            activity_color: "#FF0000".to_string(),
            activity_opacity: 0.3,
            title_font: FontConfig::sized(22),
            axis_font: FontConfig::sized(16),
            label_font: FontConfig::sized(12),
            margin: 12,
            trend_height_ratio: 0.4,
        }
    }
}

impl ChartStyle {
    /// Parsed background color
    pub fn background(&self) -> RGBColor {
        parse_color(&self.background_color)
    }

    /// Parsed boundary fill
    pub fn land(&self) -> RGBColor {
        parse_color(&self.land_color)
    }

    /// Parsed boundary outline
    pub fn border(&self) -> RGBColor {
        parse_color(&self.border_color)
    }

    /// Parsed activity marker color
    pub fn activity(&self) -> RGBColor {
        parse_color(&self.activity_color)
    }

    /// Pixel height of the trend panel inside a figure body of `height` pixels
    pub fn trend_panel_height(&self, height: u32) -> u32 {
        let ratio = self.trend_height_ratio.clamp(0.1, 0.9);
        (f64::from(height) * ratio).round() as u32
    }
}

/// Radius in pixels of a marker whose size is an area in square points
pub fn marker_radius(size: f64) -> u32 {
    if size.is_finite() && size > 0.0 {
        (size.sqrt() / 2.0).round() as u32
    } else {
        0
    }
}
