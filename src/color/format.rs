use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::model::{Hsla, Hsva, Rgba};
use crate::error::StoreError;

/// Decimal places used for alpha regardless of the configured precision.
pub const ALPHA_PRECISION: u32 = 3;

/// Output color format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorFormat {
    Hex,
    Hsl,
    Hsv,
    Rgb,
}

impl ColorFormat {
    /// Formats in display order.
    pub const ALL: [ColorFormat; 4] = [
        ColorFormat::Hex,
        ColorFormat::Hsl,
        ColorFormat::Hsv,
        ColorFormat::Rgb,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ColorFormat::Hex => "hex",
            ColorFormat::Hsl => "hsl",
            ColorFormat::Hsv => "hsv",
            ColorFormat::Rgb => "rgb",
        }
    }
}

impl fmt::Display for ColorFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColorFormat {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hex" => Ok(ColorFormat::Hex),
            "hsl" => Ok(ColorFormat::Hsl),
            "hsv" => Ok(ColorFormat::Hsv),
            "rgb" => Ok(ColorFormat::Rgb),
            _ => Err(StoreError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Whether colors are produced as CSS strings or as objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatType {
    Object,
    #[default]
    String,
}

impl fmt::Display for FormatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatType::Object => f.write_str("object"),
            FormatType::String => f.write_str("string"),
        }
    }
}

impl FromStr for FormatType {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "object" => Ok(FormatType::Object),
            "string" => Ok(FormatType::String),
            _ => Err(StoreError::UnsupportedFormatType(s.to_string())),
        }
    }
}

/// A converted color.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ColorValue {
    Text(String),
    Rgb(Rgba),
    Hsl(Hsla),
    Hsv(Hsva),
}

impl ColorValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ColorValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl fmt::Display for ColorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorValue::Text(text) => f.write_str(text),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

/// How [`convert`] renders a color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorOptions {
    pub format: ColorFormat,
    pub format_type: FormatType,
    /// Decimal places for hue, saturation, lightness and value.
    pub precision: u32,
}

impl Default for ColorOptions {
    fn default() -> Self {
        Self {
            format: ColorFormat::Hsl,
            format_type: FormatType::String,
            precision: 0,
        }
    }
}

/// Round to `precision` decimal places. Never returns `-0`.
pub fn round(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision.min(10) as i32);
    (value * factor).round() / factor + 0.0
}

/// Round a hue, folding a result of `360` back to `0`.
pub fn round_hue(h: f64, precision: u32) -> f64 {
    let h = round(h, precision);
    if h >= 360.0 {
        0.0
    } else {
        h
    }
}

fn hex_byte(value: f64) -> String {
    format!("{:02x}", value.round().clamp(0.0, 255.0) as u8)
}

/// `#rrggbb`, or `#rrggbbaa` when translucent.
pub fn to_hex(hsva: &Hsva) -> String {
    let rgb = hsva.to_rgba();
    let mut hex = format!("#{}{}{}", hex_byte(rgb.r), hex_byte(rgb.g), hex_byte(rgb.b));
    if hsva.a < 1.0 {
        hex.push_str(&hex_byte(hsva.a * 255.0));
    }
    hex
}

/// CSS `hsl()`/`hsla()` string for the color.
pub fn css_hsl(hsva: &Hsva, precision: u32, with_alpha: bool) -> String {
    let hsl = hsva.to_hsla();
    let (h, s, l) = (
        round_hue(hsl.h, precision),
        round(hsl.s, precision),
        round(hsl.l, precision),
    );
    if with_alpha {
        format!("hsla({}, {}%, {}%, {})", h, s, l, round(hsl.a, ALPHA_PRECISION))
    } else {
        format!("hsl({}, {}%, {}%)", h, s, l)
    }
}

fn triple(name: &str, values: [f64; 3], percent: bool, alpha: f64) -> String {
    let unit = if percent { "%" } else { "" };
    let [x, y, z] = values;
    if alpha < 1.0 {
        format!(
            "{}a({}, {}{}, {}{}, {})",
            name,
            x,
            y,
            unit,
            z,
            unit,
            round(alpha, ALPHA_PRECISION)
        )
    } else {
        format!("{}({}, {}{}, {}{})", name, x, y, unit, z, unit)
    }
}

/// Render `hsva` in the requested format.
pub fn convert(hsva: &Hsva, options: &ColorOptions) -> ColorValue {
    let p = options.precision;
    let a = round(hsva.a, ALPHA_PRECISION);

    match (options.format, options.format_type) {
        (ColorFormat::Hex, _) => ColorValue::Text(to_hex(hsva)),
        (ColorFormat::Rgb, format_type) => {
            let rgb = hsva.to_rgba();
            let rgb = Rgba {
                r: round(rgb.r, p),
                g: round(rgb.g, p),
                b: round(rgb.b, p),
                a,
            };
            match format_type {
                FormatType::Object => ColorValue::Rgb(rgb),
                FormatType::String => ColorValue::Text(triple("rgb", [rgb.r, rgb.g, rgb.b], false, a)),
            }
        }
        (ColorFormat::Hsl, format_type) => {
            let hsl = hsva.to_hsla();
            let hsl = Hsla {
                h: round_hue(hsl.h, p),
                s: round(hsl.s, p),
                l: round(hsl.l, p),
                a,
            };
            match format_type {
                FormatType::Object => ColorValue::Hsl(hsl),
                FormatType::String => ColorValue::Text(triple("hsl", [hsl.h, hsl.s, hsl.l], true, a)),
            }
        }
        (ColorFormat::Hsv, format_type) => {
            let hsv = Hsva {
                h: round_hue(hsva.h, p),
                s: round(hsva.s, p),
                v: round(hsva.v, p),
                a,
            };
            match format_type {
                FormatType::Object => ColorValue::Hsv(hsv),
                FormatType::String => ColorValue::Text(triple("hsv", [hsv.h, hsv.s, hsv.v], true, a)),
            }
        }
    }
}
