use std::fmt;

use serde::{Deserialize, Serialize};

pub type Rgb = [f32; 3];

/// `0xRRGGBB` to opaque RGBA.
pub fn hex_rgba(hex: u32) -> [f32; 4] {
    let channel = |shift: u32| ((hex >> shift) & 0xFF) as f32 / 255.0;
    [channel(16), channel(8), channel(0), 1.0]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorError {
    Invalid(String),
}

impl fmt::Display for ColorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorError::Invalid(s) => {
                write!(f, "'{s}' is not a valid RGB or hex color expression")
            }
        }
    }
}

impl std::error::Error for ColorError {}

/// Lit and shaded tones of one wellbore state plus its label background.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Color {
    pub col1: Rgb,
    pub col2: Rgb,
    pub label_bg: u32,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ColorType {
    Default,
    Highlight,
    MultiHighlight,
    Selected,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Colors {
    pub font_color: u32,
    pub interact_font_color: u32,
    pub default: Color,
    pub highlight: Color,
    pub multi_highlight: Color,
    pub selected: Color,
}

impl Default for Colors {
    fn default() -> Self {
        Self {
            font_color: 0x000000,
            interact_font_color: 0x01747d,
            default: Color {
                col1: [0.3, 0.3, 0.3],
                col2: [0.05, 0.05, 0.05],
                label_bg: 0xFFFFFF,
            },
            highlight: Color {
                col1: [0.0, 1.0, 1.0],
                col2: [0.0, 0.7, 0.7],
                label_bg: 0x00FFFF,
            },
            multi_highlight: Color {
                col1: [0.0, 1.0, 1.0],
                col2: [0.0, 0.7, 0.7],
                label_bg: 0x00FFFF,
            },
            selected: Color {
                col1: [1.0, 0.0, 0.0],
                col2: [0.5, 0.0, 0.0],
                label_bg: 0xFFFFFF,
            },
        }
    }
}

impl Colors {
    pub fn from_input(input: &InputColors) -> Self {
        let mut out = Self::default();
        if let Some(c) = input.font_color {
            out.font_color = c;
        }
        if let Some(c) = input.interact_font_color {
            out.interact_font_color = c;
        }
        transfer(
            &mut out.default,
            input.default_color1,
            input.default_color2,
            input.default_label_bg,
        );
        transfer(
            &mut out.highlight,
            input.highlight_color1,
            input.highlight_color2,
            input.highlight_label_bg,
        );
        transfer(
            &mut out.multi_highlight,
            input.multi_highlight_color1,
            input.multi_highlight_color2,
            input.multi_highlight_label_bg,
        );
        transfer(
            &mut out.selected,
            input.selected_color1,
            input.selected_color2,
            input.selected_label_bg,
        );
        out
    }

    pub fn get(&self, kind: ColorType) -> Color {
        match kind {
            ColorType::Default => self.default,
            ColorType::Highlight => self.highlight,
            ColorType::MultiHighlight => self.multi_highlight,
            ColorType::Selected => self.selected,
        }
    }
}

fn transfer(target: &mut Color, col1: Option<Rgb>, col2: Option<Rgb>, label_bg: Option<u32>) {
    if let Some(c) = col1 {
        target.col1 = c;
    }
    if let Some(c) = col2 {
        target.col2 = c;
    }
    if let Some(c) = label_bg {
        target.label_bg = c;
    }
}

/// Partial overrides of [`Colors`], as supplied per group.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InputColors {
    pub font_color: Option<u32>,
    pub interact_font_color: Option<u32>,
    pub default_color1: Option<Rgb>,
    pub default_color2: Option<Rgb>,
    pub default_label_bg: Option<u32>,
    pub highlight_color1: Option<Rgb>,
    pub highlight_color2: Option<Rgb>,
    pub highlight_label_bg: Option<u32>,
    pub multi_highlight_color1: Option<Rgb>,
    pub multi_highlight_color2: Option<Rgb>,
    pub multi_highlight_label_bg: Option<u32>,
    pub selected_color1: Option<Rgb>,
    pub selected_color2: Option<Rgb>,
    pub selected_label_bg: Option<u32>,
}

/// Parses `rgb(r, g, b)`, `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`, a few
/// named colors and `transparent` into RGBA bytes.
pub fn parse_css_color(input: &str) -> Result<[u8; 4], ColorError> {
    let s = input.trim();
    let invalid = || ColorError::Invalid(input.to_string());

    if let Some(named) = named_color(s) {
        return Ok(named);
    }

    if let Some(body) = s.strip_prefix("rgb(").and_then(|b| b.strip_suffix(')')) {
        let parts: Vec<&str> = body.split(',').map(str::trim).collect();
        let [r, g, b] = parts.as_slice() else {
            return Err(invalid());
        };
        let channel = |v: &str| v.parse::<u8>().map_err(|_| invalid());
        return Ok([channel(r)?, channel(g)?, channel(b)?, 255]);
    }

    let Some(hex) = s.strip_prefix('#') else {
        return Err(invalid());
    };
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    parse_hex(hex).ok_or_else(invalid)
}

fn parse_hex(hex: &str) -> Option<[u8; 4]> {
    let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    match hex.len() {
        3 => Some([nibble(0)?, nibble(1)?, nibble(2)?, 255]),
        4 => Some([nibble(0)?, nibble(1)?, nibble(2)?, nibble(3)?]),
        6 => Some([byte(0)?, byte(2)?, byte(4)?, 255]),
        8 => Some([byte(0)?, byte(2)?, byte(4)?, byte(6)?]),
        _ => None,
    }
}

fn named_color(s: &str) -> Option<[u8; 4]> {
    let rgba = match s.to_ascii_lowercase().as_str() {
        "transparent" => [0, 0, 0, 0],
        "black" => [0, 0, 0, 255],
        "white" => [255, 255, 255, 255],
        "red" => [255, 0, 0, 255],
        "green" => [0, 128, 0, 255],
        "blue" => [0, 0, 255, 255],
        "cyan" | "aqua" => [0, 255, 255, 255],
        "yellow" => [255, 255, 0, 255],
        "gray" | "grey" => [128, 128, 128, 255],
        _ => return None,
    };
    Some(rgba)
}

/// Parsed color as normalized `[r, g, b]`, alpha dropped.
pub fn parse_rgb(input: &str) -> Result<Rgb, ColorError> {
    let [r, g, b, _] = parse_css_color(input)?;
    Ok([r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0])
}

/// Parsed color as normalized `[r, g, b, a]`.
pub fn parse_rgba(input: &str) -> Result<[f32; 4], ColorError> {
    let [r, g, b, a] = parse_css_color(input)?;
    Ok([
        r as f32 / 255.0,
        g as f32 / 255.0,
        b as f32 / 255.0,
        a as f32 / 255.0,
    ])
}

/// Log class to color entry of a completion colormap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorOffset {
    pub color: String,
    pub offset: f64,
    #[serde(default)]
    pub label: Option<String>,
}

/// Texture payload for a colormap: one RGBA row of colors followed by one row
/// holding each offset as little-endian `f32` bytes.
pub fn colormap_to_flat_array(colormap: &[ColorOffset]) -> Result<Vec<u8>, ColorError> {
    let mut colors = Vec::with_capacity(colormap.len() * 8);
    let mut offsets = Vec::with_capacity(colormap.len() * 4);
    for entry in colormap {
        colors.extend_from_slice(&parse_css_color(&entry.color)?);
        offsets.extend_from_slice(&(entry.offset as f32).to_le_bytes());
    }
    colors.extend(offsets);
    Ok(colors)
}

const DEFAULT_LOG_COLORS: [(f64, [u8; 3], &str); 52] = [
    (0.0, [245, 245, 245], "Sognefjord Fm. 6.2.1 / Nordland Gp. / Hordaland Green Clay"),
    (1.0, [0, 0, 0], "Draupne Fm."),
    (2.0, [15, 245, 252], "Sognefjord Fm. 6.2.2"),
    (3.0, [28, 71, 188], "Sognefjord Fm. 6.1.2"),
    (4.0, [245, 245, 245], "Sognefjord Fm. 6.1.1"),
    (5.0, [70, 70, 253], "Sognefjord Fm. 5.3.2"),
    (6.0, [245, 245, 245], "Sognefjord Fm. 5.3.1"),
    (7.0, [29, 29, 221], "Sognefjord Fm. 5.2.2"),
    (8.0, [245, 245, 245], "Sognefjord Fm. 5.2.1"),
    (9.0, [18, 18, 119], "Sognefjord Fm. 5.1.2"),
    (10.0, [245, 245, 245], "Sognefjord Fm. 5.1.1"),
    (11.0, [130, 140, 130], "Sognefjord Fm. 4.5"),
    (12.0, [62, 252, 62], "Sognefjord Fm. 4.4.2"),
    (13.0, [245, 245, 245], "Sognefjord Fm. 4.4.1"),
    (14.0, [89, 232, 91], "Sognefjord Fm. 4.3.2"),
    (15.0, [245, 245, 245], "Sognefjord Fm. 4.3.1"),
    (16.0, [10, 183, 10], "Sognefjord Fm. 4.2.2"),
    (17.0, [245, 245, 245], "Sognefjord Fm. 4.2.1"),
    (18.0, [29, 125, 29], "Sognefjord Fm. 4.1.2"),
    (19.0, [245, 245, 245], "Sognefjord Fm. 4.1.1"),
    (20.0, [82, 78, 75], "Sognefjord Fm. 3.6 / 3.5"),
    (21.0, [244, 143, 86], "Sognefjord Fm. 3.4.2"),
    (22.0, [245, 245, 245], "Sognefjord Fm. 3.4.1"),
    (23.0, [255, 109, 18], "Sognefjord Fm. 3.3.3"),
    (24.0, [255, 109, 18], "Sognefjord Fm. 3.3.2"),
    (25.0, [245, 245, 245], "Sognefjord Fm. 3.3.1"),
    (26.0, [255, 20, 20], "Sognefjord Fm. 3.2.2"),
    (27.0, [245, 245, 245], "Sognefjord Fm. 3.2.1"),
    (28.0, [255, 30, 170], "Sognefjord Fm. 3.1.2"),
    (29.0, [245, 245, 245], "Sognefjord Fm. 3.1.1"),
    (30.0, [149, 10, 10], "Sognefjord Fm. 2.2.2"),
    (31.0, [245, 245, 245], "Sognefjord Fm. 2.2.1"),
    (32.0, [94, 31, 31], "Sognefjord Fm. 2.1.2"),
    (33.0, [245, 245, 245], "Sognefjord Fm. 2.1.1"),
    (34.0, [0, 255, 0], "Fensfjord Fm. 6.3.2"),
    (35.0, [245, 245, 245], "Fensfjord Fm. 6.3.1"),
    (36.0, [255, 204, 0], "Fensfjord Fm. 6.2.2"),
    (37.0, [245, 245, 245], "Fensfjord Fm. 6.2.1"),
    (38.0, [255, 255, 0], "Fensfjord Fm. 6.1.2"),
    (39.0, [245, 245, 245], "Fensfjord Fm. 6.1.1"),
    (40.0, [0, 255, 0], "Fensfjord Fm. 5.2.2"),
    (41.0, [245, 245, 245], "Fensfjord Fm. 5.2.1"),
    (42.0, [29, 125, 29], "Fensfjord Fm. 5.1.2"),
    (43.0, [245, 245, 245], "Fensfjord Fm. 5.1.1"),
    (44.0, [255, 204, 0], "Fensfjord Fm. 4"),
    (45.0, [0, 255, 0], "Fensfjord Fm. 3"),
    (46.0, [255, 255, 0], "Fensfjord Fm. 2"),
    (47.0, [29, 125, 29], "Fensfjord Fm. 1"),
    (48.0, [79, 148, 205], "Krossfjord Fm."),
    (49.0, [230, 123, 155], "Heather A Unit"),
    (50.0, [255, 181, 197], "Heather C Unit"),
    (99.0, [245, 245, 245], "Sognefjord Fm. 6.2.1 / Nordland Gp. / Hordaland Green Clay"),
];

/// Colormap used for log coloring when a group supplies none.
pub fn default_log_colormap() -> Vec<ColorOffset> {
    DEFAULT_LOG_COLORS
        .iter()
        .map(|(offset, [r, g, b], label)| ColorOffset {
            color: format!("rgb({r}, {g}, {b})"),
            offset: *offset,
            label: Some(label.to_string()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{
        ColorOffset, ColorType, Colors, InputColors, colormap_to_flat_array, default_log_colormap,
        hex_rgba, parse_css_color, parse_rgb,
    };
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn hex_font_colors_expand_to_rgba() {
        assert_eq!(hex_rgba(0xFF0000), [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(hex_rgba(0x000000), [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn parses_supported_forms() {
        assert_eq!(parse_css_color("rgb(1, 2, 3)"), Ok([1, 2, 3, 255]));
        assert_eq!(parse_css_color("rgb(1,2,3)"), Ok([1, 2, 3, 255]));
        assert_eq!(parse_css_color("#ffeeaa"), Ok([255, 238, 170, 255]));
        assert_eq!(parse_css_color("#ffeeaa80"), Ok([255, 238, 170, 128]));
        assert_eq!(parse_css_color("#0f0"), Ok([0, 255, 0, 255]));
        assert_eq!(parse_css_color("transparent"), Ok([0, 0, 0, 0]));
        assert_eq!(parse_css_color("Cyan"), Ok([0, 255, 255, 255]));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_css_color("rgb(1, 2)").is_err());
        assert!(parse_css_color("rgb(1, 2, 300)").is_err());
        assert!(parse_css_color("#12345").is_err());
        assert!(parse_css_color("#gggggg").is_err());
        assert!(parse_css_color("teal-ish").is_err());
    }

    #[test]
    fn rgb_is_normalized() {
        assert_eq!(parse_rgb("rgb(255, 0, 51)"), Ok([1.0, 0.0, 0.2]));
    }

    #[test]
    fn flat_array_has_color_row_then_offset_row() {
        let map = vec![
            ColorOffset {
                color: "rgb(1, 2, 3)".to_string(),
                offset: 0.0,
                label: None,
            },
            ColorOffset {
                color: "#ffffff".to_string(),
                offset: 1.0,
                label: None,
            },
        ];
        let flat = colormap_to_flat_array(&map).unwrap();
        assert_eq!(flat.len(), 16);
        assert_eq!(&flat[..8], &[1, 2, 3, 255, 255, 255, 255, 255]);
        assert_eq!(&flat[8..12], &0.0f32.to_le_bytes());
        assert_eq!(&flat[12..], &1.0f32.to_le_bytes());
    }

    #[test]
    fn default_colormap_parses() {
        let map = default_log_colormap();
        assert_eq!(map.len(), 52);
        assert_eq!(map.last().map(|c| c.offset), Some(99.0));
        assert!(colormap_to_flat_array(&map).is_ok());
    }

    #[test]
    fn input_colors_override_defaults() {
        let input: InputColors = serde_json::from_value(json!({
            "defaultColor1": [1.0, 0.5, 0.0],
            "selectedLabelBg": 255
        }))
        .unwrap();
        let colors = Colors::from_input(&input);
        assert_eq!(colors.default.col1, [1.0, 0.5, 0.0]);
        assert_eq!(colors.default.col2, [0.05, 0.05, 0.05]);
        assert_eq!(colors.get(ColorType::Selected).label_bg, 255);
        assert_eq!(colors.get(ColorType::Highlight), Colors::default().highlight);
    }
}
