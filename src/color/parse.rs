use std::fmt;

use serde_json::{Map, Value};

use super::format::{ColorFormat, FormatType};
use super::model::{Hsla, Hsva, Rgba};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorParseError {
    /// Blank input.
    Empty,
    /// Not a hex string, a known function, or a color object.
    UnknownFormat(String),
    /// `#` followed by something other than 3, 4, 6 or 8 hex digits.
    InvalidHex(String),
    /// A component could not be read as a number.
    InvalidComponent {
        format: &'static str,
        component: String,
    },
    /// The function had the wrong number of arguments.
    ComponentCount {
        format: &'static str,
        found: usize,
    },
    /// A JSON value that is neither a string nor an object.
    NotAColor(String),
}

impl fmt::Display for ColorParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorParseError::Empty => write!(f, "empty color"),
            ColorParseError::UnknownFormat(input) => write!(f, "unrecognised color: {}", input),
            ColorParseError::InvalidHex(input) => write!(f, "invalid hex color: {}", input),
            ColorParseError::InvalidComponent { format, component } => {
                write!(f, "invalid {} component: {}", format, component)
            }
            ColorParseError::ComponentCount { format, found } => {
                write!(f, "{} expects 3 or 4 components, found {}", format, found)
            }
            ColorParseError::NotAColor(value) => write!(f, "not a color value: {}", value),
        }
    }
}

impl std::error::Error for ColorParseError {}

/// A parsed color with the format it was written in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedColor {
    pub hsva: Hsva,
    pub format: ColorFormat,
    pub format_type: FormatType,
}

/// Parse a hex digit string without the leading `#`.
///
/// The second value is `false` for the 3 and 6 digit forms, which carry no
/// alpha.
pub fn parse_hex(input: &str) -> Result<(Rgba, bool), ColorParseError> {
    let digits = input.trim().trim_start_matches('#');
    let invalid = || ColorParseError::InvalidHex(input.to_string());
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }

    let expanded: String = match digits.len() {
        3 | 4 => digits.chars().flat_map(|c| [c, c]).collect(),
        6 | 8 => digits.to_string(),
        _ => return Err(invalid()),
    };
    let byte = |i: usize| {
        u8::from_str_radix(&expanded[i..i + 2], 16)
            .map(f64::from)
            .map_err(|_| invalid())
    };

    let has_alpha = expanded.len() == 8;
    let a = if has_alpha { byte(6)? / 255.0 } else { 1.0 };
    Ok((Rgba::new(byte(0)?, byte(2)?, byte(4)?, a), has_alpha))
}

fn number(format: &'static str, raw: &str) -> Result<(f64, bool), ColorParseError> {
    let raw = raw.trim();
    let (digits, percent) = match raw.strip_suffix('%') {
        Some(digits) => (digits, true),
        None => (raw.strip_suffix("deg").unwrap_or(raw), false),
    };
    match digits.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok((value, percent)),
        _ => Err(ColorParseError::InvalidComponent {
            format,
            component: raw.to_string(),
        }),
    }
}

fn alpha(format: &'static str, raw: Option<&str>) -> Result<f64, ColorParseError> {
    match raw {
        None => Ok(1.0),
        Some(raw) => {
            let (value, percent) = number(format, raw)?;
            Ok(if percent { value / 100.0 } else { value })
        }
    }
}

fn components(body: &str) -> Vec<&str> {
    let (main, slash_alpha) = match body.split_once('/') {
        Some((main, alpha)) => (main, Some(alpha.trim())),
        None => (body, None),
    };
    let mut parts: Vec<&str> = if main.contains(',') {
        main.split(',').map(str::trim).collect()
    } else {
        main.split_whitespace().collect()
    };
    parts.extend(slash_alpha);
    parts
}

fn parse_function(name: &str, body: &str) -> Result<ParsedColor, ColorParseError> {
    let (format, label) = match name {
        "rgb" | "rgba" => (ColorFormat::Rgb, "rgb"),
        "hsl" | "hsla" => (ColorFormat::Hsl, "hsl"),
        "hsv" | "hsva" => (ColorFormat::Hsv, "hsv"),
        _ => return Err(ColorParseError::UnknownFormat(format!("{}({})", name, body))),
    };

    let parts = components(body);
    if !(3..=4).contains(&parts.len()) {
        return Err(ColorParseError::ComponentCount {
            format: label,
            found: parts.len(),
        });
    }
    let (x, x_pct) = number(label, parts[0])?;
    let (y, y_pct) = number(label, parts[1])?;
    let (z, z_pct) = number(label, parts[2])?;
    let a = alpha(label, parts.get(3).copied())?;

    let hsva = match format {
        ColorFormat::Rgb => {
            let channel = |value: f64, percent: bool| if percent { value * 2.55 } else { value };
            Rgba::new(channel(x, x_pct), channel(y, y_pct), channel(z, z_pct), a).to_hsva()
        }
        ColorFormat::Hsl => Hsla::new(x, y, z, a).to_hsva(),
        _ => Hsva::new(x, y, z, a),
    };

    Ok(ParsedColor {
        hsva,
        format,
        format_type: FormatType::String,
    })
}

/// Parse a CSS-style color string and detect its format.
pub fn parse_str(input: &str) -> Result<ParsedColor, ColorParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ColorParseError::Empty);
    }

    if trimmed.starts_with('#') {
        let (rgba, _) = parse_hex(trimmed)?;
        return Ok(ParsedColor {
            hsva: rgba.to_hsva(),
            format: ColorFormat::Hex,
            format_type: FormatType::String,
        });
    }

    let lower = trimmed.to_ascii_lowercase();
    match (lower.find('('), lower.strip_suffix(')')) {
        (Some(open), Some(without_close)) => {
            parse_function(lower[..open].trim(), &without_close[open + 1..])
        }
        _ => Err(ColorParseError::UnknownFormat(input.to_string())),
    }
}

fn field(object: &Map<String, Value>, key: &str) -> Option<f64> {
    object.get(key).and_then(Value::as_f64)
}

fn parse_object(object: &Map<String, Value>) -> Result<ParsedColor, ColorParseError> {
    let a = match object.get("a") {
        None | Some(Value::Null) => 1.0,
        Some(value) => value.as_f64().ok_or_else(|| ColorParseError::InvalidComponent {
            format: "alpha",
            component: value.to_string(),
        })?,
    };

    let rgb = (field(object, "r"), field(object, "g"), field(object, "b"));
    let hsl = (field(object, "h"), field(object, "s"), field(object, "l"));
    let hsv = (field(object, "h"), field(object, "s"), field(object, "v"));

    let (hsva, format) = match (rgb, hsl, hsv) {
        ((Some(r), Some(g), Some(b)), _, _) => (Rgba::new(r, g, b, a).to_hsva(), ColorFormat::Rgb),
        (_, (Some(h), Some(s), Some(l)), _) => (Hsla::new(h, s, l, a).to_hsva(), ColorFormat::Hsl),
        (_, _, (Some(h), Some(s), Some(v))) => (Hsva::new(h, s, v, a), ColorFormat::Hsv),
        _ => return Err(ColorParseError::NotAColor(Value::Object(object.clone()).to_string())),
    };

    Ok(ParsedColor {
        hsva,
        format,
        format_type: FormatType::Object,
    })
}

/// Parse a color given as a JSON string or object.
pub fn parse_value(value: &Value) -> Result<ParsedColor, ColorParseError> {
    match value {
        Value::String(text) => parse_str(text),
        Value::Object(object) => parse_object(object),
        other => Err(ColorParseError::NotAColor(other.to_string())),
    }
}
