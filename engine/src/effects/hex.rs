//! Hexagonal-cell remapping.
//!
//! Each output pixel is converted to fractional axial hex coordinates,
//! rounded to the nearest cell with the cube-coordinate correction, then
//! mapped back to the offset column/row that addresses the source image.
//! Cells outside the source grid take the configured background color.
//! Border detection probes the output-pixel neighborhood for cell changes.

use common::{HexOptions, HexOrientation, PixelBuffer};
use rayon::prelude::*;

const SQRT3: f32 = 1.732_050_8;

/// Closed-form hex grid geometry for one `(scale, orientation)` pair.
///
/// `m00..m11` is the pixel-to-axial linear map; `offset_x/offset_y` place
/// the center of cell `(0, 0)` inside the canvas.
pub struct HexGeometry {
    orientation: HexOrientation,
    size: f32,
    m00: f32,
    m01: f32,
    m10: f32,
    m11: f32,
    offset_x: f32,
    offset_y: f32,
}

impl HexGeometry {
    pub fn new(scale: u32, orientation: HexOrientation) -> Self {
        let size = scale.clamp(2, 32) as f32;

        let (offset_x, offset_y) = match orientation {
            HexOrientation::FlatTop => (size, size * SQRT3 * 0.5),
            HexOrientation::PointyTop => (size * SQRT3 * 0.5, size),
        };

        let (m00, m01, m10, m11) = match orientation {
            HexOrientation::FlatTop => {
                (2.0 / 3.0 / size, 0.0, -1.0 / 3.0 / size, SQRT3 / 3.0 / size)
            }
            HexOrientation::PointyTop => {
                (SQRT3 / 3.0 / size, -1.0 / 3.0 / size, 0.0, 2.0 / 3.0 / size)
            }
        };

        Self {
            orientation,
            size,
            m00,
            m01,
            m10,
            m11,
            offset_x,
            offset_y,
        }
    }

    /// Output canvas size for a `src_w` x `src_h` source grid. A grid with
    /// no cells has no canvas.
    pub fn output_dimensions(&self, src_w: u32, src_h: u32) -> (u32, u32) {
        if src_w == 0 || src_h == 0 {
            return (0, 0);
        }
        let w = (src_w - 1) as f32;
        let h = (src_h - 1) as f32;
        let size = self.size;

        match self.orientation {
            HexOrientation::FlatTop => {
                let out_w = w * (size * 1.5) + size * 2.0;
                let out_h = h * (size * SQRT3) + size * SQRT3 + size * SQRT3 * 0.5;
                (out_w.ceil() as u32, out_h.ceil() as u32)
            }
            HexOrientation::PointyTop => {
                let out_w = w * (size * SQRT3) + size * SQRT3 + size * SQRT3 * 0.5;
                let out_h = h * (size * 1.5) + size * 2.0;
                (out_w.ceil() as u32, out_h.ceil() as u32)
            }
        }
    }

    /// Fractional axial coordinates of an output pixel.
    fn pixel_to_axial(&self, x: f32, y: f32) -> (f32, f32) {
        let ax = x - self.offset_x;
        let ay = y - self.offset_y;
        (self.m00 * ax + self.m01 * ay, self.m10 * ax + self.m11 * ay)
    }

    /// Round fractional axial coordinates to the nearest integer hex,
    /// recomputing whichever of q, r, s drifted most so that q+r+s = 0.
    fn axial_round(q: f32, r: f32) -> (i32, i32) {
        let s = -q - r;
        let mut qi = q.round();
        let mut ri = r.round();
        let si = s.round();

        let q_diff = (qi - q).abs();
        let r_diff = (ri - r).abs();
        let s_diff = (si - s).abs();

        if q_diff > r_diff && q_diff > s_diff {
            qi = -ri - si;
        } else if r_diff > s_diff {
            ri = -qi - si;
        }
        (qi as i32, ri as i32)
    }

    /// Offset column/row addressing the source image for an integer hex.
    fn axial_to_grid(&self, q: i32, r: i32) -> (i32, i32) {
        match self.orientation {
            HexOrientation::FlatTop => (q, r + (q - (q & 1)) / 2),
            HexOrientation::PointyTop => (q + (r - (r & 1)) / 2, r),
        }
    }

    /// Pixel-to-axial matrix in row-major order, for the GPU uniforms.
    pub fn matrix(&self) -> [f32; 4] {
        [self.m00, self.m01, self.m10, self.m11]
    }

    /// Canvas position of the center of cell `(0, 0)`.
    pub fn origin(&self) -> [f32; 2] {
        [self.offset_x, self.offset_y]
    }

    /// The source cell an output pixel resolves to.
    pub fn cell_at(&self, x: f32, y: f32) -> (i32, i32) {
        let (q, r) = self.pixel_to_axial(x, y);
        let (qi, ri) = Self::axial_round(q, r);
        self.axial_to_grid(qi, ri)
    }
}

/// Output canvas size, callable before any render. Guaranteed to match the
/// dimensions of an actual render with the same parameters.
pub fn output_dimensions(
    src_w: u32,
    src_h: u32,
    scale: u32,
    orientation: HexOrientation,
) -> (u32, u32) {
    HexGeometry::new(scale, orientation).output_dimensions(src_w, src_h)
}

/// Render the hexagonal remap on the CPU.
pub fn render(input: &PixelBuffer, opts: &HexOptions) -> PixelBuffer {
    let opts = opts.clamped();
    let geometry = HexGeometry::new(opts.scale, opts.orientation);
    let (out_w, out_h) = geometry.output_dimensions(input.width, input.height);
    if out_w == 0 || out_h == 0 {
        return PixelBuffer::transparent(out_w, out_h);
    }
    let mut data = vec![0u8; out_w as usize * out_h as usize * 4];

    data.par_chunks_exact_mut(out_w as usize * 4)
        .enumerate()
        .for_each(|(y, row)| {
            for x in 0..out_w {
                let rgba = shade_pixel(input, &opts, &geometry, x, y as u32);
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

/// Evaluate one output pixel. The WGSL kernel implements the same
/// procedure.
pub fn shade_pixel(
    input: &PixelBuffer,
    opts: &HexOptions,
    geometry: &HexGeometry,
    x: u32,
    y: u32,
) -> [u8; 4] {
    let (col, row) = geometry.cell_at(x as f32, y as f32);

    let in_bounds =
        col >= 0 && row >= 0 && (col as u32) < input.width && (row as u32) < input.height;
    if !in_bounds {
        return opts.background_color.0;
    }

    if opts.draw_borders && opts.border_thickness > 0 && is_border(geometry, opts, x, y, (col, row))
    {
        return opts.border_color.0;
    }

    input.pixel(col as u32, row as u32)
}

/// Probe every neighbor offset within ±thickness; a cell change anywhere in
/// the probe window classifies the pixel as border. Growing the thickness
/// only widens the window, so the border pixel set is monotone in it.
fn is_border(
    geometry: &HexGeometry,
    opts: &HexOptions,
    x: u32,
    y: u32,
    center: (i32, i32),
) -> bool {
    let t = opts.border_thickness as i32;
    for dy in -t..=t {
        for dx in -t..=t {
            if dx == 0 && dy == 0 {
                continue;
            }
            let nx = x as i32 + dx;
            let ny = y as i32 + dy;
            if geometry.cell_at(nx as f32, ny as f32) != center {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Rgba;

    fn gradient_input(w: u32, h: u32) -> PixelBuffer {
        let mut buf = PixelBuffer::transparent(w, h);
        for y in 0..h {
            for x in 0..w {
                buf.set_pixel(x, y, [(x * 40) as u8, (y * 40) as u8, 128, 255]);
            }
        }
        buf
    }

    #[test]
    fn test_dimension_query_closed_form() {
        // 1x1 source, scale 16, flat-top: ceil(2·16) x ceil(16·√3·1.5).
        assert_eq!(output_dimensions(1, 1, 16, HexOrientation::FlatTop), (32, 42));
    }

    #[test]
    fn test_dimension_query_matches_render() {
        let input = gradient_input(4, 3);
        for orientation in [HexOrientation::FlatTop, HexOrientation::PointyTop] {
            let opts = HexOptions {
                scale: 7,
                orientation,
                ..Default::default()
            };
            let out = render(&input, &opts);
            assert_eq!(
                (out.width, out.height),
                output_dimensions(4, 3, 7, orientation)
            );
        }
    }

    #[test]
    fn test_scale_clamps_silently() {
        assert_eq!(
            output_dimensions(2, 2, 0, HexOrientation::FlatTop),
            output_dimensions(2, 2, 2, HexOrientation::FlatTop)
        );
        assert_eq!(
            output_dimensions(2, 2, 99, HexOrientation::FlatTop),
            output_dimensions(2, 2, 32, HexOrientation::FlatTop)
        );
    }

    #[test]
    fn test_every_source_cell_is_reachable() {
        let input = gradient_input(4, 4);
        let opts = HexOptions {
            scale: 8,
            ..Default::default()
        };
        let geometry = HexGeometry::new(opts.scale, opts.orientation);
        let (out_w, out_h) = geometry.output_dimensions(4, 4);

        let mut seen = [[false; 4]; 4];
        for y in 0..out_h {
            for x in 0..out_w {
                let (col, row) = geometry.cell_at(x as f32, y as f32);
                if (0..4).contains(&col) && (0..4).contains(&row) {
                    seen[row as usize][col as usize] = true;
                }
            }
        }
        for row in 0..4 {
            for col in 0..4 {
                assert!(seen[row][col], "cell ({col}, {row}) never mapped");
            }
        }
    }

    #[test]
    fn test_zero_dimension_source_yields_empty_canvas() {
        assert_eq!(output_dimensions(0, 3, 16, HexOrientation::FlatTop), (0, 0));
        assert_eq!(output_dimensions(3, 0, 16, HexOrientation::PointyTop), (0, 0));

        let out = render(&PixelBuffer::transparent(0, 0), &HexOptions::default());
        assert_eq!((out.width, out.height), (0, 0));
        assert!(out.data.is_empty());
    }

    #[test]
    fn test_out_of_grid_takes_background() {
        let input = gradient_input(2, 2);
        let opts = HexOptions {
            scale: 8,
            background_color: Rgba([9, 9, 9, 9]),
            ..Default::default()
        };
        let out = render(&input, &opts);
        // The top-left canvas corner lies outside cell (0,0).
        assert_eq!(out.pixel(0, 0), [9, 9, 9, 9]);
    }

    fn count_border_pixels(thickness: u32) -> usize {
        let input = PixelBuffer::filled(3, 3, [10, 200, 10, 255]);
        let opts = HexOptions {
            scale: 10,
            draw_borders: true,
            border_thickness: thickness,
            border_color: Rgba([255, 0, 255, 255]),
            ..Default::default()
        };
        let out = render(&input, &opts);
        out.data
            .chunks_exact(4)
            .filter(|px| *px == [255, 0, 255, 255])
            .count()
    }

    #[test]
    fn test_border_count_monotone_in_thickness() {
        let t1 = count_border_pixels(1);
        let t2 = count_border_pixels(2);
        let t3 = count_border_pixels(3);
        assert!(t1 > 0);
        assert!(t2 >= t1);
        assert!(t3 >= t2);
    }

    #[test]
    fn test_borders_disabled_by_default() {
        let input = PixelBuffer::filled(3, 3, [10, 200, 10, 255]);
        let out = render(&input, &HexOptions { scale: 10, ..Default::default() });
        let border = HexOptions::default().border_color.0;
        assert!(out.data.chunks_exact(4).all(|px| px != border));
    }
}
