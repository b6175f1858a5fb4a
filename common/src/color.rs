//! RGBA color values and parsing.
//!
//! Colors arrive either as packed `0xRRGGBBAA` numerics, as `#RRGGBB` /
//! `#RRGGBBAA` strings (the leading `#` is optional), or as the literal
//! `transparent` sentinel. Unrecognized forms never fail a render call;
//! they fall back to the option field's documented default.

use serde::{Deserialize, Deserializer, Serialize};

/// A packed RGBA8 color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgba(pub [u8; 4]);

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba([0, 0, 0, 0]);

    /// Unpack a `0xRRGGBBAA` value.
    pub fn from_packed(v: u32) -> Self {
        Rgba([
            ((v >> 24) & 0xFF) as u8,
            ((v >> 16) & 0xFF) as u8,
            ((v >> 8) & 0xFF) as u8,
            (v & 0xFF) as u8,
        ])
    }

    /// Pack into `0xRRGGBBAA`.
    pub fn to_packed(self) -> u32 {
        let [r, g, b, a] = self.0;
        (u32::from(r) << 24) | (u32::from(g) << 16) | (u32::from(b) << 8) | u32::from(a)
    }

    /// Parse `#RRGGBB`, `#RRGGBBAA` (leading `#` optional) or `transparent`.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("transparent") {
            return Some(Rgba::TRANSPARENT);
        }
        let hex = s.strip_prefix('#').unwrap_or(s);
        match hex.len() {
            6 => {
                let v = u32::from_str_radix(hex, 16).ok()?;
                Some(Rgba::from_packed((v << 8) | 0xFF))
            }
            8 => {
                let v = u32::from_str_radix(hex, 16).ok()?;
                Some(Rgba::from_packed(v))
            }
            _ => None,
        }
    }

    /// Parse with a fallback for unrecognized forms.
    pub fn parse_or(s: &str, fallback: Rgba) -> Self {
        Rgba::parse(s).unwrap_or(fallback)
    }

    /// Channels normalized to `[0, 1]`.
    pub fn to_f32(self) -> [f32; 4] {
        let [r, g, b, a] = self.0;
        [
            f32::from(r) / 255.0,
            f32::from(g) / 255.0,
            f32::from(b) / 255.0,
            f32::from(a) / 255.0,
        ]
    }
}

/// A color as it appears in a configuration record: packed numeric or text.
#[derive(Deserialize)]
#[serde(untagged)]
enum ColorSpec {
    Packed(u32),
    Text(String),
}

impl ColorSpec {
    fn resolve_or(self, fallback: Rgba) -> Rgba {
        match self {
            ColorSpec::Packed(v) => Rgba::from_packed(v),
            ColorSpec::Text(s) => Rgba::parse_or(&s, fallback),
        }
    }
}

/// Deserialize a color field, falling back to `fallback` on any
/// unrecognized form instead of failing the whole record.
pub fn deserialize_or<'de, D>(deserializer: D, fallback: Rgba) -> Result<Rgba, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(ColorSpec::deserialize(deserializer).map_or(fallback, |spec| spec.resolve_or(fallback)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rgb_and_rgba() {
        assert_eq!(Rgba::parse("#282828"), Some(Rgba([0x28, 0x28, 0x28, 0xFF])));
        assert_eq!(Rgba::parse("282828"), Some(Rgba([0x28, 0x28, 0x28, 0xFF])));
        assert_eq!(
            Rgba::parse("#11223344"),
            Some(Rgba([0x11, 0x22, 0x33, 0x44]))
        );
    }

    #[test]
    fn test_parse_transparent_sentinel() {
        assert_eq!(Rgba::parse("transparent"), Some(Rgba::TRANSPARENT));
        assert_eq!(Rgba::parse("  TRANSPARENT "), Some(Rgba::TRANSPARENT));
    }

    #[test]
    fn test_unrecognized_falls_back() {
        let fallback = Rgba([1, 2, 3, 4]);
        assert_eq!(Rgba::parse_or("not-a-color", fallback), fallback);
        assert_eq!(Rgba::parse_or("#12345", fallback), fallback);
    }

    #[test]
    fn test_packed_round_trip() {
        let c = Rgba::from_packed(0x282828FF);
        assert_eq!(c, Rgba([0x28, 0x28, 0x28, 0xFF]));
        assert_eq!(c.to_packed(), 0x282828FF);
    }
}
