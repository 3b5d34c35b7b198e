//! Color conversions between Hue CIE xy / mirek values and display RGB.

use serde::{Deserialize, Serialize};

use crate::api::XY;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Default for Rgb {
    fn default() -> Self {
        Self::BLACK
    }
}

impl Rgb {
    pub const BLACK: Self = Self::new(0, 0, 0);
    pub const WHITE: Self = Self::new(255, 255, 255);

    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    #[must_use]
    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Whether this color carries no meaningful value.
    ///
    /// Pure white is what unset/default colors render as, so it is the
    /// sentinel here, in spite of the name.
    #[must_use]
    pub const fn is_black(self) -> bool {
        self.r == 255 && self.g == 255 && self.b == 255
    }

    /// Channel-wise mean (alpha included), truncating.
    #[must_use]
    pub const fn mix(self, other: Self) -> Self {
        const fn mean(a: u8, b: u8) -> u8 {
            ((a as u16 + b as u16) / 2) as u8
        }

        Self {
            r: mean(self.r, other.r),
            g: mean(self.g, other.g),
            b: mean(self.b, other.b),
            a: mean(self.a, other.a),
        }
    }

    /// Parse `#rrggbb` (the leading `#` is optional)
    #[must_use]
    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

fn gamma_encode(v: f64) -> f64 {
    if v <= 0.003_130_8 {
        12.92 * v
    } else {
        (1.0 + 0.055) * v.powf(1.0 / 2.4) - 0.055
    }
}

fn gamma_decode(v: f64) -> f64 {
    if v > 0.040_45 {
        ((v + 0.055) / (1.0 + 0.055)).powf(2.4)
    } else {
        v / 12.92
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn channel_from_unit(v: f64) -> u8 {
    let mut v = v * 255.0;
    // mirror negative values instead of clamping them to zero: gives far
    // better hues for coordinates outside the gamut
    if v < 0.0 {
        v = -v;
    }
    if v > 255.0 {
        v = 0.0;
    }
    v.round() as u8
}

/// Convert CIE 1931 xy plus brightness (0-255) to RGB, normalized to the
/// brightest channel.
#[must_use]
pub fn xy_bri_to_rgb(xy: XY, bri: u8) -> Rgb {
    let XY { x, y } = xy;
    if y <= 0.0 {
        return Rgb::BLACK;
    }

    let z = 1.0 - x - y;
    let big_y = f64::from(bri) / 255.0;
    let big_x = (big_y / y) * x;
    let big_z = (big_y / y) * z;

    let r = gamma_encode(big_x * 1.612 - big_y * 0.203 - big_z * 0.302);
    let g = gamma_encode(-big_x * 0.509 + big_y * 1.412 + big_z * 0.066);
    let b = gamma_encode(big_x * 0.026 - big_y * 0.072 + big_z * 0.962);

    let max = r.max(g).max(b);

    Rgb::new(
        channel_from_unit(r / max),
        channel_from_unit(g / max),
        channel_from_unit(b / max),
    )
}

/// Convert RGB to the CIE xy coordinate sent to the bridge.
///
/// Black has no chromaticity and maps to the origin.
#[must_use]
pub fn rgb_to_xy(color: Rgb) -> XY {
    let red = gamma_decode(f64::from(color.r) / 255.0);
    let green = gamma_decode(f64::from(color.g) / 255.0);
    let blue = gamma_decode(f64::from(color.b) / 255.0);

    let big_x = red * 0.649_926 + green * 0.103_455 + blue * 0.197_109;
    let big_y = red * 0.234_327 + green * 0.743_075 + blue * 0.022_598;
    let big_z = green * 0.053_077 + blue * 1.035_763;

    let sum = big_x + big_y + big_z;
    if sum <= 0.0 {
        return XY::new(0.0, 0.0);
    }

    XY::new(big_x / sum, big_y / sum)
}

/// Approximate the RGB appearance of a black body at `kelvin`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn kelvin_to_rgb(kelvin: u32) -> Rgb {
    let temp = f64::from(kelvin.clamp(1000, 40000)) / 100.0;

    let red = if temp <= 66.0 {
        255.0
    } else {
        329.698_727_446 * (temp - 60.0).powf(-0.133_204_759_2)
    };

    let green = if temp <= 66.0 {
        99.470_802_586_1 * temp.ln() - 161.119_568_166_1
    } else {
        288.122_169_528_3 * (temp - 60.0).powf(-0.075_514_849_2)
    };

    let blue = if temp >= 66.0 {
        255.0
    } else if temp <= 19.0 {
        0.0
    } else {
        138.517_731_223_1 * (temp - 10.0).ln() - 305.044_792_730_7
    };

    Rgb::new(
        red.clamp(0.0, 255.0) as u8,
        green.clamp(0.0, 255.0) as u8,
        blue.clamp(0.0, 255.0) as u8,
    )
}

/// Map mirek onto the 2000K..6500K range supported by Hue bulbs.
///
/// 153 mirek is the coldest (6500K), 500 mirek the warmest (2000K) value.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn mirek_to_kelvin(mirek: f64) -> u32 {
    let mirek = (mirek as i32).clamp(153, 500);
    (6500.0 - (4500.0 / 347.0) * f64::from(mirek - 153)) as u32
}

/// Display color of a color temperature given in mirek.
#[must_use]
pub fn mirek_to_rgb(mirek: f64) -> Rgb {
    kelvin_to_rgb(mirek_to_kelvin(mirek))
}
