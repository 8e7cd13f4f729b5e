use serde::{Deserialize, Serialize};

fn opaque() -> f64 {
    1.0
}

fn is_opaque(a: &f64) -> bool {
    *a >= 1.0
}

/// Saturation and value, both `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Sv {
    pub s: f64,
    pub v: f64,
}

impl Sv {
    pub fn new(s: f64, v: f64) -> Self {
        Self {
            s: unit(s, 100.0),
            v: unit(v, 100.0),
        }
    }

    /// Same pair pulled back into range. Fields are public, so a struct
    /// literal can hold anything.
    pub fn clamped(self) -> Self {
        Self::new(self.s, self.v)
    }
}

/// Canonical color: hue `0..360`, saturation and value `0..=100`, alpha `0..=1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hsva {
    pub h: f64,
    pub s: f64,
    pub v: f64,
    #[serde(default = "opaque", skip_serializing_if = "is_opaque")]
    pub a: f64,
}

/// Red, green and blue `0..=255`, alpha `0..=1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    #[serde(default = "opaque", skip_serializing_if = "is_opaque")]
    pub a: f64,
}

/// Hue `0..360`, saturation and lightness `0..=100`, alpha `0..=1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hsla {
    pub h: f64,
    pub s: f64,
    pub l: f64,
    #[serde(default = "opaque", skip_serializing_if = "is_opaque")]
    pub a: f64,
}

/// Wrap a hue into `0..360`.
pub fn normalize_hue(h: f64) -> f64 {
    if !h.is_finite() {
        return 0.0;
    }
    let h = h.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs.
    if h >= 360.0 {
        0.0
    } else {
        h
    }
}

/// Clamp alpha into `0..=1`; non-finite input is opaque.
pub fn normalize_alpha(a: f64) -> f64 {
    if a.is_finite() {
        a.clamp(0.0, 1.0)
    } else {
        1.0
    }
}

fn unit(value: f64, max: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, max)
    } else {
        0.0
    }
}

impl Hsva {
    /// Build a color, wrapping hue and clamping the other channels.
    pub fn new(h: f64, s: f64, v: f64, a: f64) -> Self {
        Self {
            h: normalize_hue(h),
            s: unit(s, 100.0),
            v: unit(v, 100.0),
            a: normalize_alpha(a),
        }
    }

    /// Default color: opaque red.
    pub fn red() -> Self {
        Self::new(0.0, 100.0, 100.0, 1.0)
    }

    pub fn sv(&self) -> Sv {
        Sv {
            s: self.s,
            v: self.v,
        }
    }

    /// No hue information survives an RGB round trip.
    pub fn is_achromatic(&self) -> bool {
        self.s == 0.0 || self.v == 0.0
    }

    pub fn to_rgba(&self) -> Rgba {
        let s = self.s / 100.0;
        let v = self.v / 100.0;
        let c = v * s;
        let h = normalize_hue(self.h) / 60.0;
        let x = c * (1.0 - (h % 2.0 - 1.0).abs());
        let m = v - c;

        let (r, g, b) = match h as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };

        Rgba {
            r: (r + m) * 255.0,
            g: (g + m) * 255.0,
            b: (b + m) * 255.0,
            a: self.a,
        }
    }

    /// Hue carries over unchanged, including for grays and black.
    pub fn to_hsla(&self) -> Hsla {
        let s = self.s / 100.0;
        let v = self.v / 100.0;
        let l = v * (1.0 - s / 2.0);
        let sl = if l <= 0.0 || l >= 1.0 {
            0.0
        } else {
            (v - l) / l.min(1.0 - l)
        };

        Hsla {
            h: self.h,
            s: sl * 100.0,
            l: l * 100.0,
            a: self.a,
        }
    }

    /// WCAG relative luminance of the opaque color.
    pub fn luminance(&self) -> f64 {
        self.to_rgba().luminance()
    }

    /// Whether white text reads better than black on this color.
    pub fn is_dark(&self) -> bool {
        self.luminance() <= DARK_LUMINANCE
    }
}

impl Default for Hsva {
    fn default() -> Self {
        Self::red()
    }
}

/// Luminance where contrast against black equals contrast against white.
pub const DARK_LUMINANCE: f64 = 0.179_129;

impl Rgba {
    pub fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self {
            r: unit(r, 255.0),
            g: unit(g, 255.0),
            b: unit(b, 255.0),
            a: normalize_alpha(a),
        }
    }

    /// Convert to HSV. Achromatic colors report hue `0`.
    pub fn to_hsva(&self) -> Hsva {
        let r = self.r / 255.0;
        let g = self.g / 255.0;
        let b = self.b / 255.0;
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let d = max - min;

        let h = if d == 0.0 {
            0.0
        } else if max == r {
            60.0 * ((g - b) / d).rem_euclid(6.0)
        } else if max == g {
            60.0 * ((b - r) / d + 2.0)
        } else {
            60.0 * ((r - g) / d + 4.0)
        };
        let s = if max == 0.0 { 0.0 } else { d / max };

        Hsva::new(h, s * 100.0, max * 100.0, self.a)
    }

    pub fn is_gray(&self) -> bool {
        self.r == self.g && self.g == self.b
    }

    pub fn luminance(&self) -> f64 {
        fn channel(c: f64) -> f64 {
            let c = c / 255.0;
            if c <= 0.039_28 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        }
        0.2126 * channel(self.r) + 0.7152 * channel(self.g) + 0.0722 * channel(self.b)
    }
}

impl Hsla {
    pub fn new(h: f64, s: f64, l: f64, a: f64) -> Self {
        Self {
            h: normalize_hue(h),
            s: unit(s, 100.0),
            l: unit(l, 100.0),
            a: normalize_alpha(a),
        }
    }

    /// Hue carries over unchanged.
    pub fn to_hsva(&self) -> Hsva {
        let s = self.s / 100.0;
        let l = self.l / 100.0;
        let v = l + s * l.min(1.0 - l);
        let sv = if v <= 0.0 { 0.0 } else { 2.0 * (1.0 - l / v) };
        Hsva::new(self.h, sv * 100.0, v * 100.0, self.a)
    }
}
