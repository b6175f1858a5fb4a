//! Edge-directed xBRZ-style upscaling.
//!
//! For each source pixel the 4×4 corner quads around it are classified by
//! comparing two diagonal cost sums in YCbCr space; corners that win a
//! direction are then blended toward the nearer neighbor color, applied
//! over four 90°-rotated passes. Every scale factor carries its own table
//! of sub-pixel blend positions and weights, so the gradated line and
//! corner shapes differ between 2x and 6x.
//!
//! Out-of-bounds neighbors replicate the nearest edge pixel, so a uniform
//! image contains no edges anywhere and reproduces exactly. Transparent
//! pixels inside the image participate in distance computations through
//! the alpha-modulated term.

use common::{PixelBuffer, XbrzOptions};
use rayon::prelude::*;

type Px = [u8; 4];

/// Per-corner blend classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlendDecision {
    None,
    Normal,
    Dominant,
}

/// Output dimensions: exactly `(w·scale, h·scale)` with scale in `[2, 6]`.
pub fn output_dimensions(src_w: u32, src_h: u32, scale: u32) -> (u32, u32) {
    let scale = scale.clamp(2, 6);
    (src_w * scale, src_h * scale)
}

/// Render the xBRZ upscale on the CPU.
///
/// Dispatch is an explicit per-scale match: each factor is its own
/// monomorphized variant, mirroring the per-scale compiled program table on
/// the GPU side. There is no generic N-scale path.
pub fn render(input: &PixelBuffer, opts: &XbrzOptions) -> PixelBuffer {
    let opts = opts.clamped();
    match opts.scale {
        2 => scale_image::<2>(input, &opts),
        3 => scale_image::<3>(input, &opts),
        4 => scale_image::<4>(input, &opts),
        5 => scale_image::<5>(input, &opts),
        6 => scale_image::<6>(input, &opts),
        _ => unreachable!("scale clamped to [2, 6]"),
    }
}

fn scale_image<const N: usize>(input: &PixelBuffer, opts: &XbrzOptions) -> PixelBuffer {
    let src_w = input.width as usize;
    let src_h = input.height as usize;
    let out_w = src_w * N;
    let out_h = src_h * N;
    if src_w == 0 || src_h == 0 {
        return PixelBuffer::transparent(out_w as u32, out_h as u32);
    }
    let mut data = vec![0u8; out_w * out_h * 4];

    // One band of N output rows per source row.
    data.par_chunks_exact_mut(out_w * 4 * N)
        .enumerate()
        .for_each(|(sy, band)| {
            for sx in 0..src_w {
                let win = Window::fetch(input, sx as i32, sy as i32);
                let cell = scale_cell::<N>(&win, opts);
                for (j, cell_row) in cell.iter().enumerate() {
                    let off = (j * out_w + sx * N) * 4;
                    for (i, px) in cell_row.iter().enumerate() {
                        band[off + i * 4..off + i * 4 + 4].copy_from_slice(px);
                    }
                }
            }
        });

    PixelBuffer {
        data,
        width: out_w as u32,
        height: out_h as u32,
    }
}

/// 5×5 neighborhood around one source pixel, edge-replicated at the
/// image boundary.
struct Window {
    p: [[Px; 5]; 5],
}

impl Window {
    fn fetch(input: &PixelBuffer, cx: i32, cy: i32) -> Self {
        let mut p = [[[0u8; 4]; 5]; 5];
        for (dy, row) in p.iter_mut().enumerate() {
            for (dx, px) in row.iter_mut().enumerate() {
                let x = (cx + dx as i32 - 2).clamp(0, input.width as i32 - 1);
                let y = (cy + dy as i32 - 2).clamp(0, input.height as i32 - 1);
                *px = input.pixel(x as u32, y as u32);
            }
        }
        Self { p }
    }

    /// Pixel at offset `(dx, dy)` from the center, `|dx|, |dy| <= 2`.
    fn at(&self, dx: i32, dy: i32) -> Px {
        self.p[(dy + 2) as usize][(dx + 2) as usize]
    }
}

/// Fast inexact-equality key: `65536·R + 256·G + B` (alpha ignored).
fn key(p: Px) -> u32 {
    (u32::from(p[0]) << 16) | (u32::from(p[1]) << 8) | u32::from(p[2])
}

/// Perceptual color distance in YCbCr space, alpha-modulated so that
/// differing-alpha neighbors contribute proportionally less.
fn dist(a: Px, b: Px) -> f64 {
    const K_B: f64 = 0.0593;
    const K_R: f64 = 0.2627;
    const K_G: f64 = 1.0 - K_B - K_R;
    const SCALE_B: f64 = 0.5 / (1.0 - K_B);
    const SCALE_R: f64 = 0.5 / (1.0 - K_R);

    let dr = f64::from(a[0]) - f64::from(b[0]);
    let dg = f64::from(a[1]) - f64::from(b[1]);
    let db = f64::from(a[2]) - f64::from(b[2]);

    let y = K_R * dr + K_G * dg + K_B * db;
    let cb = SCALE_B * (db - y);
    let cr = SCALE_R * (dr - y);
    let d = (y * y + cb * cb + cr * cr).sqrt();

    let a1 = f64::from(a[3]) / 255.0;
    let a2 = f64::from(b[3]) / 255.0;
    d * a1.min(a2) + (a1 - a2).abs() * 255.0
}

/// Offset rotated by `r` 90° steps.
fn rotate(r: usize, dx: i32, dy: i32) -> (i32, i32) {
    match r {
        0 => (dx, dy),
        1 => (-dy, dx),
        2 => (-dx, -dy),
        3 => (dy, -dx),
        _ => unreachable!(),
    }
}

/// Classify the corner quad processed by rotation `r` (r = 0 is the
/// bottom-right corner of the center pixel).
///
/// The quad's two diagonal cost sums weigh the continuation of each
/// diagonal through the surrounding 4×4 window, with the straight-through
/// pair weighted by `center_direction_bias`. The center's corner blends
/// only when its own diagonal wins, its separated pixels are unequal, and
/// the margin decides NORMAL vs DOMINANT.
fn corner_decision(win: &Window, r: usize, opts: &XbrzOptions) -> BlendDecision {
    let p = |dx: i32, dy: i32| {
        let (rx, ry) = rotate(r, dx, dy);
        win.at(rx, ry)
    };

    let f = p(0, 0);
    let g = p(1, 0);
    let j = p(0, 1);
    let k = p(1, 1);

    if (key(f) == key(g) && key(j) == key(k)) || (key(f) == key(j) && key(g) == key(k)) {
        return BlendDecision::None;
    }

    let w = opts.center_direction_bias;
    let jg = dist(p(-1, 1), f)
        + dist(f, p(1, -1))
        + dist(p(0, 2), k)
        + dist(k, p(2, 0))
        + w * dist(j, g);
    let fk = dist(p(-1, 0), j)
        + dist(j, p(1, 2))
        + dist(p(0, -1), g)
        + dist(g, p(2, 1))
        + w * dist(f, k);

    if jg < fk && key(f) != key(g) && key(f) != key(j) {
        if opts.dominant_direction_threshold * jg < fk {
            BlendDecision::Dominant
        } else {
            BlendDecision::Normal
        }
    } else {
        BlendDecision::None
    }
}

/// One sub-pixel write: blend `weight` of the neighbor color into position
/// `(row, col)` of the rotated cell frame, with the processed corner at
/// `(N-1, N-1)`.
pub(crate) struct CellWrite {
    pub(crate) row: i8,
    pub(crate) col: i8,
    pub(crate) weight: f64,
}

const fn cw(row: i8, col: i8, weight: f64) -> CellWrite {
    CellWrite { row, col, weight }
}

/// The five blend shapes of one scale factor. Line blends step the edge
/// with gradated weights at scale-specific positions; the corner tables
/// model a rounded corner whose sub-pixel coverage grows with the cell.
#[derive(Clone, Copy)]
pub(crate) struct BlendTables {
    pub(crate) shallow: &'static [CellWrite],
    pub(crate) steep: &'static [CellWrite],
    pub(crate) both: &'static [CellWrite],
    pub(crate) diagonal: &'static [CellWrite],
    pub(crate) corner: &'static [CellWrite],
}

const TABLES_2X: BlendTables = BlendTables {
    shallow: &[cw(1, 0, 0.25), cw(1, 1, 0.75)],
    steep: &[cw(0, 1, 0.25), cw(1, 1, 0.75)],
    both: &[cw(1, 0, 0.25), cw(0, 1, 0.25), cw(1, 1, 5.0 / 6.0)],
    diagonal: &[cw(1, 1, 0.5)],
    corner: &[cw(1, 1, 1.0 - std::f64::consts::FRAC_PI_4)],
};

const TABLES_3X: BlendTables = BlendTables {
    shallow: &[cw(2, 0, 0.25), cw(1, 2, 0.25), cw(2, 1, 0.75), cw(2, 2, 1.0)],
    steep: &[cw(0, 2, 0.25), cw(2, 1, 0.25), cw(1, 2, 0.75), cw(2, 2, 1.0)],
    both: &[
        cw(2, 0, 0.25),
        cw(0, 2, 0.25),
        cw(2, 1, 0.75),
        cw(1, 2, 0.75),
        cw(2, 2, 1.0),
    ],
    // The off-corner eighth blends stay off the cell edges so the odd
    // center row cannot conflict with the opposite rotation.
    diagonal: &[cw(1, 2, 0.125), cw(2, 1, 0.125), cw(2, 2, 0.875)],
    corner: &[cw(2, 2, 0.4545939598)],
};

const TABLES_4X: BlendTables = BlendTables {
    shallow: &[
        cw(3, 0, 0.25),
        cw(2, 2, 0.25),
        cw(3, 1, 0.75),
        cw(2, 3, 0.75),
        cw(3, 2, 1.0),
        cw(3, 3, 1.0),
    ],
    steep: &[
        cw(0, 3, 0.25),
        cw(2, 2, 0.25),
        cw(1, 3, 0.75),
        cw(3, 2, 0.75),
        cw(2, 3, 1.0),
        cw(3, 3, 1.0),
    ],
    both: &[
        cw(3, 0, 0.25),
        cw(0, 3, 0.25),
        cw(3, 1, 0.75),
        cw(1, 3, 0.75),
        cw(2, 2, 1.0 / 3.0),
        cw(3, 2, 1.0),
        cw(2, 3, 1.0),
        cw(3, 3, 1.0),
    ],
    diagonal: &[cw(3, 2, 0.5), cw(2, 3, 0.5), cw(3, 3, 1.0)],
    corner: &[
        cw(3, 3, 0.6848532563),
        cw(3, 2, 0.08677704501),
        cw(2, 3, 0.08677704501),
    ],
};

const TABLES_5X: BlendTables = BlendTables {
    shallow: &[
        cw(4, 0, 0.25),
        cw(3, 2, 0.25),
        cw(2, 4, 0.25),
        cw(4, 1, 0.75),
        cw(3, 3, 0.75),
        cw(4, 2, 1.0),
        cw(4, 3, 1.0),
        cw(4, 4, 1.0),
        cw(3, 4, 1.0),
    ],
    steep: &[
        cw(0, 4, 0.25),
        cw(2, 3, 0.25),
        cw(4, 2, 0.25),
        cw(1, 4, 0.75),
        cw(3, 3, 0.75),
        cw(2, 4, 1.0),
        cw(3, 4, 1.0),
        cw(4, 4, 1.0),
        cw(4, 3, 1.0),
    ],
    both: &[
        cw(0, 4, 0.25),
        cw(2, 3, 0.25),
        cw(1, 4, 0.75),
        cw(4, 0, 0.25),
        cw(3, 2, 0.25),
        cw(4, 1, 0.75),
        cw(3, 3, 2.0 / 3.0),
        cw(2, 4, 1.0),
        cw(3, 4, 1.0),
        cw(4, 4, 1.0),
        cw(4, 2, 1.0),
        cw(4, 3, 1.0),
    ],
    diagonal: &[
        cw(4, 2, 0.125),
        cw(3, 3, 0.125),
        cw(2, 4, 0.125),
        cw(4, 3, 0.875),
        cw(3, 4, 0.875),
        cw(4, 4, 1.0),
    ],
    corner: &[
        cw(4, 4, 0.8631434088),
        cw(4, 3, 0.2306749731),
        cw(3, 4, 0.2306749731),
    ],
};

const TABLES_6X: BlendTables = BlendTables {
    shallow: &[
        cw(5, 0, 0.25),
        cw(4, 2, 0.25),
        cw(3, 4, 0.25),
        cw(5, 1, 0.75),
        cw(4, 3, 0.75),
        cw(3, 5, 0.75),
        cw(5, 2, 1.0),
        cw(5, 3, 1.0),
        cw(5, 4, 1.0),
        cw(5, 5, 1.0),
        cw(4, 4, 1.0),
        cw(4, 5, 1.0),
    ],
    steep: &[
        cw(0, 5, 0.25),
        cw(2, 4, 0.25),
        cw(4, 3, 0.25),
        cw(1, 5, 0.75),
        cw(3, 4, 0.75),
        cw(5, 3, 0.75),
        cw(2, 5, 1.0),
        cw(3, 5, 1.0),
        cw(4, 5, 1.0),
        cw(5, 5, 1.0),
        cw(4, 4, 1.0),
        cw(5, 4, 1.0),
    ],
    both: &[
        cw(0, 5, 0.25),
        cw(2, 4, 0.25),
        cw(1, 5, 0.75),
        cw(3, 4, 0.75),
        cw(5, 0, 0.25),
        cw(4, 2, 0.25),
        cw(5, 1, 0.75),
        cw(4, 3, 0.75),
        cw(2, 5, 1.0),
        cw(3, 5, 1.0),
        cw(4, 5, 1.0),
        cw(5, 5, 1.0),
        cw(4, 4, 1.0),
        cw(5, 4, 1.0),
        cw(5, 2, 1.0),
        cw(5, 3, 1.0),
    ],
    diagonal: &[
        cw(5, 3, 0.5),
        cw(4, 4, 0.5),
        cw(3, 5, 0.5),
        cw(4, 5, 1.0),
        cw(5, 4, 1.0),
        cw(5, 5, 1.0),
    ],
    corner: &[
        cw(5, 5, 0.9711013910),
        cw(4, 5, 0.4236372243),
        cw(5, 4, 0.4236372243),
        cw(5, 3, 0.05652034508),
        cw(3, 5, 0.05652034508),
    ],
};

/// Sub-pixel blend tables for a scale factor in `[2, 6]`. Shared with the
/// GPU side, which bakes the dense form into each compiled program.
pub(crate) fn blend_tables(scale: usize) -> BlendTables {
    match scale {
        2 => TABLES_2X,
        3 => TABLES_3X,
        4 => TABLES_4X,
        5 => TABLES_5X,
        6 => TABLES_6X,
        _ => unreachable!("scale clamped to [2, 6]"),
    }
}

/// Compute one N×N output cell, applying the corner procedure with a
/// 90°-rotated neighbor permutation per corner and accumulating blends
/// progressively through the scale's sub-pixel table.
fn scale_cell<const N: usize>(win: &Window, opts: &XbrzOptions) -> [[Px; N]; N] {
    let decisions = [
        corner_decision(win, 0, opts),
        corner_decision(win, 1, opts),
        corner_decision(win, 2, opts),
        corner_decision(win, 3, opts),
    ];

    let e = win.at(0, 0);
    if decisions.iter().all(|&d| d == BlendDecision::None) {
        return [[e; N]; N];
    }

    let tables = blend_tables(N);
    let mut cell = [[to_f64(e); N]; N];

    for r in 0..4 {
        if decisions[r] == BlendDecision::None {
            continue;
        }

        let p = |dx: i32, dy: i32| {
            let (rx, ry) = rotate(r, dx, dy);
            win.at(rx, ry)
        };
        let b = p(0, -1);
        let c = p(1, -1);
        let d = p(-1, 0);
        let e = p(0, 0);
        let f = p(1, 0);
        let g = p(-1, 1);
        let h = p(0, 1);
        let i = p(1, 1);

        let eq = |x: Px, y: Px| dist(x, y) < opts.equal_color_tolerance;

        // Suppress full line blends that would fight an adjacent corner or
        // fill an L-shape; those cases get the corner-only weight.
        let top_right = decisions[(r + 3) % 4];
        let bottom_left = decisions[(r + 1) % 4];
        let do_line_blend = if decisions[r] == BlendDecision::Dominant {
            true
        } else if top_right != BlendDecision::None && !eq(e, g) {
            false
        } else if bottom_left != BlendDecision::None && !eq(e, c) {
            false
        } else if !eq(e, i) && eq(g, h) && eq(h, i) && eq(i, f) && eq(f, c) {
            false
        } else {
            true
        };

        // Blend toward whichever adjacent neighbor is closer to the center.
        let px = if dist(e, f) <= dist(e, h) { f } else { h };

        let writes = if do_line_blend {
            let fg = dist(f, g);
            let hc = dist(h, c);
            let shallow =
                opts.steep_direction_threshold * fg <= hc && key(e) != key(g) && key(d) != key(g);
            let steep =
                opts.steep_direction_threshold * hc <= fg && key(e) != key(c) && key(b) != key(c);

            if shallow && steep {
                tables.both
            } else if shallow {
                tables.shallow
            } else if steep {
                tables.steep
            } else {
                tables.diagonal
            }
        } else {
            tables.corner
        };

        // Table positions are in this rotation's frame; rotate each back to
        // its real cell position and blend there, accumulating over
        // rotations.
        let pxf = to_f64(px);
        let n = N as i32;
        for wr in writes {
            let (x, y) = rotate(
                r,
                2 * i32::from(wr.col) - (n - 1),
                2 * i32::from(wr.row) - (n - 1),
            );
            let cq = &mut cell[((y + n - 1) / 2) as usize][((x + n - 1) / 2) as usize];
            for ch in 0..4 {
                cq[ch] = cq[ch] * (1.0 - wr.weight) + pxf[ch] * wr.weight;
            }
        }
    }

    let mut out = [[[0u8; 4]; N]; N];
    for (row, cell_row) in cell.iter().enumerate() {
        for (col, cpx) in cell_row.iter().enumerate() {
            for ch in 0..4 {
                out[row][col][ch] = (cpx[ch] + 0.5).clamp(0.0, 255.0) as u8;
            }
        }
    }
    out
}

fn to_f64(p: Px) -> [f64; 4] {
    [
        f64::from(p[0]),
        f64::from(p[1]),
        f64::from(p[2]),
        f64::from(p[3]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Px = [220, 40, 40, 255];
    const BLUE: Px = [40, 40, 220, 255];

    #[test]
    fn test_output_dimensions_and_clamping() {
        assert_eq!(output_dimensions(3, 5, 4), (12, 20));
        assert_eq!(output_dimensions(3, 5, 0), (6, 10));
        assert_eq!(output_dimensions(3, 5, 99), (18, 30));
    }

    #[test]
    fn test_uniform_input_is_identity_at_every_scale() {
        for scale in 2..=6u32 {
            for tolerance in [0.0, 30.0, 255.0] {
                let input = PixelBuffer::filled(4, 4, RED);
                let opts = XbrzOptions {
                    scale,
                    equal_color_tolerance: tolerance,
                    ..Default::default()
                };
                let out = render(&input, &opts);
                assert_eq!((out.width, out.height), (4 * scale, 4 * scale));
                for px in out.data.chunks_exact(4) {
                    assert_eq!(px, RED, "scale {scale} tolerance {tolerance}");
                }
            }
        }
    }

    #[test]
    fn test_straight_edges_stay_unblended() {
        // Vertical edge between two half-planes: every corner quad has two
        // equal pairs (edge replication included), which short-circuits to
        // no blending anywhere.
        let mut input = PixelBuffer::transparent(4, 4);
        for y in 0..4 {
            for x in 0..4 {
                input.set_pixel(x, y, if x < 2 { RED } else { BLUE });
            }
        }
        let out = render(&input, &XbrzOptions::default());
        for px in out.data.chunks_exact(4) {
            assert!(px == RED || px == BLUE);
        }
    }

    #[test]
    fn test_diagonal_line_produces_blended_colors() {
        // A diagonal stripe over a uniform field must trigger corner
        // blending next to the stripe, producing non-source colors.
        let mut input = PixelBuffer::filled(3, 3, RED);
        for i in 0..3 {
            input.set_pixel(i, i, BLUE);
        }
        let out = render(&input, &XbrzOptions::default());
        let blended = out
            .data
            .chunks_exact(4)
            .filter(|px| *px != RED && *px != BLUE)
            .count();
        assert!(blended > 0, "diagonal produced no blended pixels");
    }

    #[test]
    fn test_zero_tolerance_still_blends_diagonals() {
        let mut input = PixelBuffer::filled(3, 3, RED);
        for i in 0..3 {
            input.set_pixel(i, i, BLUE);
        }
        let opts = XbrzOptions {
            equal_color_tolerance: 0.0,
            ..Default::default()
        };
        let out = render(&input, &opts);
        assert_eq!((out.width, out.height), (6, 6));
        let blended = out
            .data
            .chunks_exact(4)
            .filter(|px| *px != RED && *px != BLUE)
            .count();
        assert!(blended > 0);
    }

    #[test]
    fn test_transparent_input_never_panics() {
        let input = PixelBuffer::transparent(3, 3);
        for scale in 2..=6 {
            let opts = XbrzOptions {
                scale,
                ..Default::default()
            };
            let out = render(&input, &opts);
            assert_eq!(out.width, 3 * scale);
        }
    }

    #[test]
    fn test_empty_source_renders_empty() {
        let out = render(&PixelBuffer::transparent(0, 4), &XbrzOptions::default());
        assert_eq!((out.width, out.height), (0, 8));
        assert!(out.data.is_empty());
    }

    #[test]
    fn test_blend_tables_stay_inside_their_cells() {
        for scale in 2..=6usize {
            let tables = blend_tables(scale);
            for (name, writes) in [
                ("shallow", tables.shallow),
                ("steep", tables.steep),
                ("both", tables.both),
                ("diagonal", tables.diagonal),
                ("corner", tables.corner),
            ] {
                let mut seen = vec![false; scale * scale];
                for wr in writes {
                    let (row, col) = (wr.row as usize, wr.col as usize);
                    assert!(row < scale && col < scale, "{name} {scale}x out of cell");
                    assert!(!seen[row * scale + col], "{name} {scale}x duplicate write");
                    seen[row * scale + col] = true;
                    assert!(wr.weight > 0.0 && wr.weight <= 1.0);
                }
            }
        }
    }

    /// RED field with a BLUE main diagonal. The cell of source pixel
    /// (1, 0) blends a shallow line along its left edge from the
    /// bottom-left corner only; the other three corners stay NONE.
    fn diagonal_field() -> PixelBuffer {
        let mut input = PixelBuffer::filled(5, 5, RED);
        for i in 0..5 {
            input.set_pixel(i, i, BLUE);
        }
        input
    }

    // 25% and 75% BLUE over RED, quantized.
    const QUARTER: Px = [175, 40, 85, 255];
    const THREE_QUARTER: Px = [85, 40, 175, 255];

    #[test]
    fn test_scale3_shallow_blend_matches_subpixel_table() {
        let out = render(
            &diagonal_field(),
            &XbrzOptions {
                scale: 3,
                ..Default::default()
            },
        );
        // Cell of source (1, 0) spans output x 3..6, y 0..3. The shallow
        // table steps the left edge: quarter, three-quarter, full, with a
        // quarter spilling one column inward, and leaves the rest alone.
        assert_eq!(out.pixel(3, 0), QUARTER);
        assert_eq!(out.pixel(3, 1), THREE_QUARTER);
        assert_eq!(out.pixel(3, 2), BLUE);
        assert_eq!(out.pixel(4, 2), QUARTER);
        assert_eq!(out.pixel(4, 0), RED);
        assert_eq!(out.pixel(4, 1), RED);
        assert_eq!(out.pixel(5, 1), RED);
        assert_eq!(out.pixel(5, 2), RED);
    }

    #[test]
    fn test_scale6_shallow_blend_steps_along_the_edge() {
        let out = render(
            &diagonal_field(),
            &XbrzOptions {
                scale: 6,
                ..Default::default()
            },
        );
        // Cell of source (1, 0) spans output x 6..12, y 0..6. The edge
        // descends one column every two rows with gradated steps.
        assert_eq!(out.pixel(6, 0), QUARTER);
        assert_eq!(out.pixel(6, 1), THREE_QUARTER);
        assert_eq!(out.pixel(6, 2), BLUE);
        assert_eq!(out.pixel(6, 5), BLUE);
        assert_eq!(out.pixel(7, 2), QUARTER);
        assert_eq!(out.pixel(7, 3), THREE_QUARTER);
        assert_eq!(out.pixel(7, 4), BLUE);
        assert_eq!(out.pixel(8, 4), QUARTER);
        assert_eq!(out.pixel(8, 5), THREE_QUARTER);
        assert_eq!(out.pixel(9, 0), RED);
        assert_eq!(out.pixel(8, 0), RED);

        // Four distinct colors inside one cell; a per-quadrant composite
        // could never produce a stepped gradient like this.
        let mut colors = std::collections::HashSet::new();
        for j in 0..6 {
            for i in 0..6 {
                colors.insert(out.pixel(6 + i, j));
            }
        }
        assert!(colors.len() >= 4);
    }

    #[test]
    fn test_corner_decision_prefers_continuous_diagonal() {
        // Center red with a blue diagonal through its lower-right quad:
        // the f-k diagonal is continuous, so the j/g corners blend, not
        // the center's own.
        let mut input = PixelBuffer::filled(4, 4, RED);
        input.set_pixel(1, 1, BLUE);
        input.set_pixel(2, 2, BLUE);
        let win = Window::fetch(&input, 1, 1);
        let opts = XbrzOptions::default();
        assert_eq!(corner_decision(&win, 0, &opts), BlendDecision::None);

        // The neighbor to the right sees the same quad from its
        // bottom-left corner and does blend.
        let win = Window::fetch(&input, 2, 1);
        assert_ne!(corner_decision(&win, 1, &opts), BlendDecision::None);
    }
}
