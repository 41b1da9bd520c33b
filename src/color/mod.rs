//! Hex color handling and the coloring policy used by the scene compiler.
//!
//! [`ColorHex`] is the only color type that reaches a scene document. It
//! always holds an uppercase `#RRGGBB` string; parsing accepts 3 or 6 hex
//! digits with an optional leading `#`.

pub mod confidence;
pub mod policy;

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{ColorFormatError, MolmountError};

/// A validated, normalized `#RRGGBB` color.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColorHex(Cow<'static, str>);

impl ColorHex {
    /// Wrap a string that is already in `#RRGGBB` uppercase form.
    ///
    /// Only used for the built-in palettes; everything else goes through
    /// [`ColorHex::parse`].
    pub(crate) const fn from_normalized(hex: &'static str) -> Self {
        Self(Cow::Borrowed(hex))
    }

    /// Parse and normalize a 3- or 6-digit hex color.
    ///
    /// `"#abc"` becomes `"#AABBCC"`; a missing `#` is tolerated.
    pub fn parse(input: &str) -> Result<Self, ColorFormatError> {
        let trimmed = input.trim();
        let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
        if digits.len() != 3 && digits.len() != 6 {
            return Err(ColorFormatError::WrongLength(input.to_owned()));
        }
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ColorFormatError::InvalidDigit(input.to_owned()));
        }

        let expanded: String = if digits.len() == 3 {
            digits.chars().flat_map(|c| [c, c]).collect()
        } else {
            digits.to_owned()
        };
        Ok(Self(Cow::Owned(format!("#{}", expanded.to_ascii_uppercase()))))
    }

    /// Build a color from 8-bit channels.
    #[must_use]
    pub fn from_rgb([r, g, b]: [u8; 3]) -> Self {
        Self(Cow::Owned(format!("#{r:02X}{g:02X}{b:02X}")))
    }

    /// The 8-bit channels of this color.
    #[must_use]
    pub fn to_rgb(&self) -> [u8; 3] {
        let channel = |range: std::ops::Range<usize>| {
            self.0
                .get(range)
                .and_then(|s| u8::from_str_radix(s, 16).ok())
                .unwrap_or(0)
        };
        [channel(1..3), channel(3..5), channel(5..7)]
    }

    /// The normalized `#RRGGBB` string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The color as `0xRRGGBB`, the form most engines take for backgrounds.
    #[must_use]
    pub fn to_u32(&self) -> u32 {
        let [r, g, b] = self.to_rgb();
        (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b)
    }
}

impl fmt::Display for ColorHex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ColorHex {
    type Err = ColorFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for ColorHex {
    type Error = ColorFormatError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl Serialize for ColorHex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ColorHex {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

// ── Shades ───────────────────────────────────────────────────────────────

#[derive(Clone, Copy)]
enum Shade {
    Lighten(f64),
    Base,
    Darken(f64),
}

/// Lightest to darkest; [`make_shades`] cycles through these.
const SHADE_STEPS: [Shade; 6] = [
    Shade::Lighten(0.5),
    Shade::Lighten(0.25),
    Shade::Base,
    Shade::Darken(0.1),
    Shade::Darken(0.25),
    Shade::Darken(0.4),
];

fn mix_channel(value: u8, target: u8, factor: f64) -> u8 {
    let value = f64::from(value);
    (value + (f64::from(target) - value) * factor).round() as u8
}

/// Produce `count` shades of `color`, cycling through six lighten/darken
/// steps.
pub fn make_shades(
    color: &ColorHex,
    count: usize,
) -> Result<Vec<ColorHex>, MolmountError> {
    if count < 1 {
        return Err(MolmountError::configuration(
            "shade count must be at least 1",
        ));
    }

    let base = color.to_rgb();
    let palette: Vec<ColorHex> = SHADE_STEPS
        .iter()
        .map(|step| match *step {
            Shade::Lighten(f) => {
                ColorHex::from_rgb(base.map(|c| mix_channel(c, 255, f)))
            }
            Shade::Darken(f) => {
                ColorHex::from_rgb(base.map(|c| mix_channel(c, 0, f)))
            }
            Shade::Base => ColorHex::from_rgb(base),
        })
        .collect();

    Ok(palette.iter().cycle().take(count).cloned().collect())
}
