//! Per-effect render option records.
//!
//! Every field has a documented default; missing fields in a deserialized
//! record always resolve to that default, never an error. Numeric ranges
//! are enforced by `clamped()`, which every render entry point applies;
//! an out-of-range scale is silently clamped to the nearest bound.

use serde::{Deserialize, Deserializer, Serialize};

use crate::color::{self, Rgba};

/// Options for the CRT emulation effect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrtOptions {
    /// Integer upscale factor, clamped to `[2, 32]`.
    pub scale: u32,
    /// Horizontal barrel distortion strength.
    pub warp_x: f32,
    /// Vertical barrel distortion strength.
    pub warp_y: f32,
    /// Scanline falloff exponent coefficient (negative).
    pub scan_hardness: f32,
    /// Scanline darkening opacity, clamped to `[0, 1]`.
    pub scan_opacity: f32,
    /// Shadow mask opacity, clamped to `[0, 1]`.
    pub mask_opacity: f32,
    pub enable_warp: bool,
    pub enable_scanlines: bool,
    pub enable_mask: bool,
}

impl Default for CrtOptions {
    fn default() -> Self {
        Self {
            scale: 3,
            warp_x: 0.015,
            warp_y: 0.02,
            scan_hardness: -4.0,
            scan_opacity: 0.5,
            mask_opacity: 0.3,
            enable_warp: true,
            enable_scanlines: true,
            enable_mask: true,
        }
    }
}

impl CrtOptions {
    pub fn clamped(mut self) -> Self {
        self.scale = self.scale.clamp(2, 32);
        self.scan_opacity = self.scan_opacity.clamp(0.0, 1.0);
        self.mask_opacity = self.mask_opacity.clamp(0.0, 1.0);
        self
    }
}

/// Hexagon cell orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HexOrientation {
    #[serde(rename = "flat-top")]
    FlatTop,
    #[serde(rename = "pointy-top")]
    PointyTop,
}

impl std::str::FromStr for HexOrientation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "flat-top" | "flat" => Ok(HexOrientation::FlatTop),
            "pointy-top" | "pointy" => Ok(HexOrientation::PointyTop),
            other => Err(format!(
                "unknown orientation '{other}' (expected flat-top or pointy-top)"
            )),
        }
    }
}

/// Options for the hexagonal remapping effect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HexOptions {
    /// Hexagon radius in output pixels, clamped to `[2, 32]`.
    pub scale: u32,
    pub orientation: HexOrientation,
    pub draw_borders: bool,
    /// Cell border color; default `#282828`.
    #[serde(deserialize_with = "de_border_color")]
    pub border_color: Rgba,
    /// Canvas color outside the source grid; default transparent.
    #[serde(deserialize_with = "de_background_color")]
    pub background_color: Rgba,
    /// Border probe radius in output pixels.
    pub border_thickness: u32,
}

impl Default for HexOptions {
    fn default() -> Self {
        Self {
            scale: 16,
            orientation: HexOrientation::FlatTop,
            draw_borders: false,
            border_color: Rgba([0x28, 0x28, 0x28, 0xFF]),
            background_color: Rgba::TRANSPARENT,
            border_thickness: 1,
        }
    }
}

impl HexOptions {
    pub fn clamped(mut self) -> Self {
        self.scale = self.scale.clamp(2, 32);
        self
    }
}

fn de_border_color<'de, D: Deserializer<'de>>(d: D) -> Result<Rgba, D::Error> {
    color::deserialize_or(d, HexOptions::default().border_color)
}

fn de_background_color<'de, D: Deserializer<'de>>(d: D) -> Result<Rgba, D::Error> {
    color::deserialize_or(d, HexOptions::default().background_color)
}

/// Options for the xBRZ edge-directed upscaler.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct XbrzOptions {
    /// Integer upscale factor, clamped to `[2, 6]`. Each factor has its own
    /// compiled program variant.
    pub scale: u32,
    /// YCbCr distance below which two colors count as equal, `[0, 255]`.
    /// Zero degenerates to exact-equality blending.
    pub equal_color_tolerance: f64,
    pub steep_direction_threshold: f64,
    pub dominant_direction_threshold: f64,
    pub center_direction_bias: f64,
}

impl Default for XbrzOptions {
    fn default() -> Self {
        Self {
            scale: 2,
            equal_color_tolerance: 30.0,
            steep_direction_threshold: 2.2,
            dominant_direction_threshold: 3.6,
            center_direction_bias: 4.0,
        }
    }
}

impl XbrzOptions {
    pub fn clamped(mut self) -> Self {
        self.scale = self.scale.clamp(2, 6);
        self.equal_color_tolerance = self.equal_color_tolerance.clamp(0.0, 255.0);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_table() {
        let crt = CrtOptions::default();
        assert_eq!(crt.scale, 3);
        assert_eq!(crt.warp_x, 0.015);
        assert_eq!(crt.warp_y, 0.02);
        assert_eq!(crt.scan_hardness, -4.0);
        assert!(crt.enable_warp && crt.enable_scanlines && crt.enable_mask);

        let hex = HexOptions::default();
        assert_eq!(hex.scale, 16);
        assert_eq!(hex.orientation, HexOrientation::FlatTop);
        assert!(!hex.draw_borders);
        assert_eq!(hex.border_color.to_packed(), 0x282828FF);
        assert_eq!(hex.background_color, Rgba::TRANSPARENT);
        assert_eq!(hex.border_thickness, 1);

        let xbrz = XbrzOptions::default();
        assert_eq!(xbrz.scale, 2);
        assert_eq!(xbrz.equal_color_tolerance, 30.0);
        assert_eq!(xbrz.steep_direction_threshold, 2.2);
        assert_eq!(xbrz.dominant_direction_threshold, 3.6);
        assert_eq!(xbrz.center_direction_bias, 4.0);
    }

    #[test]
    fn test_scale_clamping_is_silent() {
        let crt = CrtOptions {
            scale: 1,
            ..Default::default()
        };
        assert_eq!(crt.clamped().scale, 2);
        let crt = CrtOptions {
            scale: 100,
            ..Default::default()
        };
        assert_eq!(crt.clamped().scale, 32);

        let xbrz = XbrzOptions {
            scale: 9,
            ..Default::default()
        };
        assert_eq!(xbrz.clamped().scale, 6);
        let xbrz = XbrzOptions {
            scale: 0,
            ..Default::default()
        };
        assert_eq!(xbrz.clamped().scale, 2);
    }

    #[test]
    fn test_missing_fields_resolve_to_defaults() {
        let opts: CrtOptions = serde_json::from_str("{\"scale\": 4}").unwrap();
        assert_eq!(opts.scale, 4);
        assert_eq!(opts.warp_x, 0.015);
        assert!(opts.enable_mask);

        let opts: HexOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(opts, HexOptions::default());
    }

    #[test]
    fn test_color_fields_accept_all_forms() {
        let opts: HexOptions = serde_json::from_str(
            "{\"border_color\": \"#FF0000\", \"background_color\": 4278190335}",
        )
        .unwrap();
        assert_eq!(opts.border_color, Rgba([0xFF, 0, 0, 0xFF]));
        // 4278190335 == 0xFF0000FF
        assert_eq!(opts.background_color, Rgba([0xFF, 0, 0, 0xFF]));

        let opts: HexOptions =
            serde_json::from_str("{\"border_color\": \"bogus\", \"background_color\": \"transparent\"}")
                .unwrap();
        assert_eq!(opts.border_color, HexOptions::default().border_color);
        assert_eq!(opts.background_color, Rgba::TRANSPARENT);
    }
}
