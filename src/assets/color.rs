use crate::foundation::core::Rgba8Premul;
use serde::{Deserialize, Serialize};

/// Straight-alpha RGBA8 color as written in profiles (`"#RRGGBB"`, `"#RRGGBBAA"`, `"#RGB"`,
/// `"transparent"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha (255 = opaque).
    pub a: u8,
}

impl Color {
    /// Opaque color from channels.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Color from channels with explicit alpha.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Fully transparent.
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    /// Parse a CSS-like hex color or `transparent`.
    pub fn parse(s: &str) -> Result<Self, String> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("transparent") {
            return Ok(Self::TRANSPARENT);
        }
        let hex = s.strip_prefix('#').unwrap_or(s);

        fn hex_byte(pair: &str) -> Result<u8, String> {
            u8::from_str_radix(pair, 16).map_err(|_| format!("invalid hex byte \"{pair}\""))
        }
        fn hex_nibble(c: &str) -> Result<u8, String> {
            let v = u8::from_str_radix(c, 16).map_err(|_| format!("invalid hex digit \"{c}\""))?;
            Ok(v * 17)
        }

        if !hex.is_ascii() {
            return Err(format!("invalid color \"{s}\""));
        }
        match hex.len() {
            3 => Ok(Self::rgb(
                hex_nibble(&hex[0..1])?,
                hex_nibble(&hex[1..2])?,
                hex_nibble(&hex[2..3])?,
            )),
            6 => Ok(Self::rgb(
                hex_byte(&hex[0..2])?,
                hex_byte(&hex[2..4])?,
                hex_byte(&hex[4..6])?,
            )),
            8 => Ok(Self::rgba(
                hex_byte(&hex[0..2])?,
                hex_byte(&hex[2..4])?,
                hex_byte(&hex[4..6])?,
                hex_byte(&hex[6..8])?,
            )),
            _ => Err(format!(
                "color \"{s}\" must be #RGB, #RRGGBB, #RRGGBBAA or transparent"
            )),
        }
    }

    /// Hex form used when writing profiles.
    pub fn to_hex(self) -> String {
        if self.a == 0 {
            return "transparent".to_owned();
        }
        if self.a == 255 {
            format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }

    /// Premultiplied form for raster ops.
    pub fn to_premul(self) -> Rgba8Premul {
        Rgba8Premul::from_straight_rgba(self.r, self.g, self.b, self.a)
    }

    /// `true` when fully transparent.
    pub fn is_transparent(self) -> bool {
        self.a == 0
    }
}

impl std::str::FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Color {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/color.rs"]
mod tests;
