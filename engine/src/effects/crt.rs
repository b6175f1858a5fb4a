//! CRT emulation: barrel distortion, scanlines and shadow mask compositing.
//!
//! The per-pixel pipeline, in order: warp the normalized output coordinate,
//! bilinearly sample the source, square-linearize, darken by scanline and
//! period-6 RGB triad mask, let bright pixels partially bypass the darkening
//! (bloom), square-root back and emit with the sampled alpha.

use common::{CrtOptions, PixelBuffer};
use rayon::prelude::*;

/// Output dimensions for a CRT render: exactly `(w·scale, h·scale)`.
pub fn output_dimensions(src_w: u32, src_h: u32, scale: u32) -> (u32, u32) {
    let scale = scale.clamp(2, 32);
    (src_w * scale, src_h * scale)
}

/// Render the CRT effect on the CPU.
pub fn render(input: &PixelBuffer, opts: &CrtOptions) -> PixelBuffer {
    let opts = opts.clamped();
    let (out_w, out_h) = output_dimensions(input.width, input.height, opts.scale);
    if out_w == 0 || out_h == 0 {
        return PixelBuffer::transparent(out_w, out_h);
    }
    let mut data = vec![0u8; out_w as usize * out_h as usize * 4];

    data.par_chunks_exact_mut(out_w as usize * 4)
        .enumerate()
        .for_each(|(y, row)| {
            for x in 0..out_w {
                let rgba = shade_pixel(input, &opts, x, y as u32, out_w, out_h);
                let i = x as usize * 4;
                row[i..i + 4].copy_from_slice(&rgba);
            }
        });

    PixelBuffer {
        data,
        width: out_w,
        height: out_h,
    }
}

/// Evaluate one output pixel. Shared by the renderer loop and the tests;
/// the WGSL kernel implements the same sequence.
pub fn shade_pixel(
    input: &PixelBuffer,
    opts: &CrtOptions,
    x: u32,
    y: u32,
    out_w: u32,
    out_h: u32,
) -> [u8; 4] {
    let mut u = x as f32 / out_w as f32;
    let mut v = y as f32 / out_h as f32;

    if opts.enable_warp {
        let dc_x = (u - 0.5).abs();
        let dc_y = (v - 0.5).abs();
        let dc2_x = dc_x * dc_x;
        let dc2_y = dc_y * dc_y;
        let wu = 0.5 + (u - 0.5) * (1.0 + dc2_y * 0.3 * opts.warp_x);
        let wv = 0.5 + (v - 0.5) * (1.0 + dc2_x * 0.4 * opts.warp_y);
        if !(0.0..1.0).contains(&wu) || !(0.0..1.0).contains(&wv) {
            return [0, 0, 0, 0];
        }
        u = wu;
        v = wv;
    }

    let (mut r, mut g, mut b, a) = sample_bilinear(input, u, v);
    // A fully transparent sample short-circuits the whole composite.
    if a < 1.0 {
        return [0, 0, 0, 0];
    }

    // Cheap gamma approximation: square to linear light.
    r *= r;
    g *= g;
    b *= b;

    let scan = if opts.enable_scanlines {
        let d = (v * input.height as f32).fract() - 0.5;
        let line = (d * d * opts.scan_hardness).exp();
        (1.0 - opts.scan_opacity) + line * opts.scan_opacity
    } else {
        1.0
    };

    let mask = if opts.enable_mask {
        // Period-6 triad: two columns each of R, G, B.
        let base = 1.0 - opts.mask_opacity;
        let band = (x % 6) / 2;
        let mut m = [base; 3];
        m[band as usize] += opts.mask_opacity;
        m
    } else {
        [1.0; 3]
    };

    let luma = r * 0.299 + g * 0.587 + b * 0.114;
    let bloom = luma * 0.7;

    // Bright pixels partially bypass the mask/scanline darkening.
    let compose = |c: f32, m: f32| c * (m * scan * (1.0 - bloom) + bloom);
    r = compose(r, mask[0]);
    g = compose(g, mask[1]);
    b = compose(b, mask[2]);

    // Round to nearest, matching unorm texture stores.
    [
        (r.max(0.0).sqrt() * 255.0 + 0.5).clamp(0.0, 255.0) as u8,
        (g.max(0.0).sqrt() * 255.0 + 0.5).clamp(0.0, 255.0) as u8,
        (b.max(0.0).sqrt() * 255.0 + 0.5).clamp(0.0, 255.0) as u8,
        (a + 0.5).clamp(0.0, 255.0) as u8,
    ]
}

/// Bilinear sample at normalized `(u, v)`, returning channels in source
/// scale: RGB in `[0, 1]`, alpha in `[0, 255]`.
fn sample_bilinear(input: &PixelBuffer, u: f32, v: f32) -> (f32, f32, f32, f32) {
    let src_w = input.width as usize;
    let src_h = input.height as usize;
    let sx = u * input.width as f32;
    let sy = v * input.height as f32;

    let x0 = (sx as usize).min(src_w - 1);
    let y0 = (sy as usize).min(src_h - 1);
    let x1 = (x0 + 1).min(src_w - 1);
    let y1 = (y0 + 1).min(src_h - 1);
    let wx = sx - x0 as f32;
    let wy = sy - y0 as f32;

    let at = |px: usize, py: usize, c: usize| input.data[(py * src_w + px) * 4 + c] as f32;
    let lerp2 = |c: usize| {
        let top = at(x0, y0, c) * (1.0 - wx) + at(x1, y0, c) * wx;
        let bot = at(x0, y1, c) * (1.0 - wx) + at(x1, y1, c) * wx;
        top * (1.0 - wy) + bot * wy
    };

    (
        lerp2(0) / 255.0,
        lerp2(1) / 255.0,
        lerp2(2) / 255.0,
        lerp2(3),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_options() -> CrtOptions {
        CrtOptions {
            scale: 2,
            enable_warp: false,
            enable_scanlines: false,
            enable_mask: false,
            ..Default::default()
        }
    }

    fn quad_input() -> PixelBuffer {
        let mut buf = PixelBuffer::transparent(2, 2);
        buf.set_pixel(0, 0, [255, 0, 0, 255]);
        buf.set_pixel(1, 0, [0, 255, 0, 255]);
        buf.set_pixel(0, 1, [0, 0, 255, 255]);
        buf.set_pixel(1, 1, [255, 255, 0, 255]);
        buf
    }

    #[test]
    fn test_output_dimensions_scale_product() {
        assert_eq!(output_dimensions(7, 5, 3), (21, 15));
        // Out-of-range scales clamp, never error.
        assert_eq!(output_dimensions(4, 4, 1), (8, 8));
        assert_eq!(output_dimensions(4, 4, 1000), (128, 128));
    }

    #[test]
    fn test_disabled_effects_pass_colors_through() {
        let out = render(&quad_input(), &flat_options());
        assert_eq!((out.width, out.height), (4, 4));

        // (0,0) samples the source texel exactly; linearize/delinearize
        // round-trips within quantization.
        let px = out.pixel(0, 0);
        assert!(px[0] >= 254 && px[1] <= 1 && px[2] <= 1);
        assert_eq!(px[3], 255);

        // No darkening anywhere: every pixel stays fully opaque.
        for y in 0..out.height {
            for x in 0..out.width {
                assert_eq!(out.pixel(x, y)[3], 255);
            }
        }
    }

    #[test]
    fn test_quantization_rounds_to_nearest() {
        // With every stage disabled the composite factor is exactly 1.0,
        // so the linearize/delinearize round trip must reproduce the input
        // byte for byte; truncation would land one below.
        let input = PixelBuffer::filled(3, 3, [200, 200, 200, 255]);
        let opts = CrtOptions {
            scale: 3,
            enable_warp: false,
            enable_scanlines: false,
            enable_mask: false,
            ..Default::default()
        };
        let out = render(&input, &opts);
        for px in out.data.chunks_exact(4) {
            assert_eq!(px, [200, 200, 200, 255]);
        }
    }

    #[test]
    fn test_empty_source_renders_empty() {
        let out = render(&PixelBuffer::transparent(0, 0), &flat_options());
        assert_eq!((out.width, out.height), (0, 0));
        assert!(out.data.is_empty());
    }

    #[test]
    fn test_warp_escape_is_transparent_black() {
        let opts = CrtOptions {
            scale: 2,
            enable_scanlines: false,
            enable_mask: false,
            ..Default::default()
        };
        let out = render(&quad_input(), &opts);
        // The top-left device pixel warps outside the unit square.
        assert_eq!(out.pixel(0, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn test_transparent_source_stays_transparent() {
        let input = PixelBuffer::transparent(2, 2);
        let out = render(&input, &flat_options());
        assert!(out.data.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_scanlines_darken_rows_unevenly() {
        let input = PixelBuffer::filled(2, 2, [200, 200, 200, 255]);
        let opts = CrtOptions {
            scale: 8,
            enable_warp: false,
            enable_mask: false,
            ..Default::default()
        };
        let out = render(&input, &opts);
        let center_row = out.pixel(0, 4)[0]; // v ≈ row center, brightest
        let edge_row = out.pixel(0, 0)[0];
        assert!(center_row > edge_row);
    }

    #[test]
    fn test_mask_tints_columns_by_triad() {
        let input = PixelBuffer::filled(6, 1, [180, 180, 180, 255]);
        let opts = CrtOptions {
            scale: 2,
            enable_warp: false,
            enable_scanlines: false,
            mask_opacity: 1.0,
            ..Default::default()
        };
        let out = render(&input, &opts);
        // Columns 0-1 keep red, suppress green/blue.
        let px = out.pixel(0, 0);
        assert!(px[0] > px[1] && px[0] > px[2]);
        // Columns 2-3 keep green.
        let px = out.pixel(2, 0);
        assert!(px[1] > px[0] && px[1] > px[2]);
        // Columns 4-5 keep blue.
        let px = out.pixel(4, 0);
        assert!(px[2] > px[0] && px[2] > px[1]);
    }
}
