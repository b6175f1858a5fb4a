//! Shared GPU resource pool.
//!
//! Compiled programs, the input texture and the output canvas for each
//! effect kind live in a [`ResourceSet`] owned by the pool. Sets are built
//! lazily on first acquire and refcounted: every renderer holding a set
//! counts as one owner, and the set is freed when the last owner releases
//! it. The canvas inside a set only ever grows.

use std::sync::{Arc, Mutex, MutexGuard};

use common::{EffectKind, PixelBuffer, RenderError};

use crate::effects::xbrz;
use crate::gpu::context::GpuContext;
use crate::gpu::pipeline::{self, ComputePipelineBuilder, bind_group_entries};
use crate::gpu::texture::{Canvas, InputTexture};

const CRT_SHADER: &str = include_str!("shaders/crt.wgsl");
const HEX_SHADER: &str = include_str!("shaders/hex.wgsl");
const XBRZ_SHADER: &str = include_str!("shaders/xbrz.wgsl");

/// Upscale factors the xBRZ program table is compiled for.
pub const XBRZ_SCALES: [u32; 5] = [2, 3, 4, 5, 6];

pub struct DeviceResourcePool {
    context: Arc<GpuContext>,
    entries: Mutex<[Option<PoolEntry>; 3]>,
}

struct PoolEntry {
    set: Arc<ResourceSet>,
    owners: usize,
}

impl DeviceResourcePool {
    pub fn new(context: Arc<GpuContext>) -> Self {
        Self {
            context,
            entries: Mutex::new([None, None, None]),
        }
    }

    pub fn context(&self) -> &Arc<GpuContext> {
        &self.context
    }

    /// Acquire a refcounted handle on an effect kind's resource set,
    /// building the set on first use. The handle releases its ownership
    /// when dropped.
    pub fn acquire(self: &Arc<Self>, kind: EffectKind) -> Result<PoolHandle, RenderError> {
        let set = {
            let mut entries = self.entries.lock().expect("resource pool poisoned");
            let slot = &mut entries[kind.index()];
            if let Some(entry) = slot {
                entry.owners += 1;
                log::debug!("{} resources re-acquired ({} owners)", kind, entry.owners);
                entry.set.clone()
            } else {
                log::debug!("compiling {kind} programs");
                let set = Arc::new(ResourceSet::build(&self.context, kind)?);
                *slot = Some(PoolEntry {
                    set: set.clone(),
                    owners: 1,
                });
                set
            }
        };
        Ok(PoolHandle {
            pool: self.clone(),
            set,
        })
    }

    /// Drop one ownership of a kind's resource set, freeing it when the
    /// count reaches zero. Releasing an unowned kind is a no-op.
    fn release(&self, kind: EffectKind) {
        let mut entries = self.entries.lock().expect("resource pool poisoned");
        let slot = &mut entries[kind.index()];
        if let Some(entry) = slot {
            entry.owners -= 1;
            if entry.owners == 0 {
                log::debug!("freeing {kind} resources");
                *slot = None;
            }
        }
    }

    /// Number of live owners of a kind's resources, for diagnostics.
    pub fn owner_count(&self, kind: EffectKind) -> usize {
        let entries = self.entries.lock().expect("resource pool poisoned");
        entries[kind.index()].as_ref().map_or(0, |e| e.owners)
    }
}

impl std::fmt::Debug for DeviceResourcePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("DeviceResourcePool");
        for kind in EffectKind::ALL {
            s.field(kind.name(), &self.owner_count(kind));
        }
        s.finish()
    }
}

/// One ownership of an effect kind's resource set. Dropping the handle
/// releases it; the last release frees the set.
pub struct PoolHandle {
    pool: Arc<DeviceResourcePool>,
    set: Arc<ResourceSet>,
}

impl PoolHandle {
    pub fn set(&self) -> &ResourceSet {
        &self.set
    }

    pub fn context(&self) -> &Arc<GpuContext> {
        self.pool.context()
    }
}

impl Drop for PoolHandle {
    fn drop(&mut self) {
        self.pool.release(self.set.kind);
    }
}

/// Compiled programs plus the resident textures for one effect kind.
pub struct ResourceSet {
    kind: EffectKind,
    bind_group_layout: wgpu::BindGroupLayout,
    // (scale, program); single-program effects use scale key 0.
    programs: Vec<(u32, wgpu::ComputePipeline)>,
    input: Mutex<Option<InputTexture>>,
    canvas: Mutex<Option<Canvas>>,
}

impl ResourceSet {
    fn build(context: &GpuContext, kind: EffectKind) -> Result<Self, RenderError> {
        let device = &context.device;
        let bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Retrofx Bind Group Layout"),
                entries: &[
                    bind_group_entries::texture(0),
                    bind_group_entries::storage_texture(1),
                    bind_group_entries::uniform_buffer(2),
                ],
            });
        let layout =
            pipeline::create_pipeline_layout(device, "Retrofx Pipeline Layout", &[
                &bind_group_layout,
            ]);

        let programs = match kind {
            EffectKind::Crt => vec![(
                0,
                ComputePipelineBuilder::new(device, CRT_SHADER)
                    .with_label("crt")
                    .with_layout(&layout)
                    .build(kind)?,
            )],
            EffectKind::Hex => vec![(
                0,
                ComputePipelineBuilder::new(device, HEX_SHADER)
                    .with_label("hex")
                    .with_layout(&layout)
                    .build(kind)?,
            )],
            EffectKind::Xbrz => {
                // One specialized program per supported factor; the scale
                // constant and its sub-pixel blend tables are baked in at
                // compile time.
                let mut programs = Vec::with_capacity(XBRZ_SCALES.len());
                for scale in XBRZ_SCALES {
                    let source = specialize_xbrz(scale);
                    let label = format!("xbrz{scale}x");
                    let program = ComputePipelineBuilder::new(device, &source)
                        .with_label(&label)
                        .with_layout(&layout)
                        .build(kind)?;
                    programs.push((scale, program));
                }
                programs
            }
        };

        Ok(Self {
            kind,
            bind_group_layout,
            programs,
            input: Mutex::new(None),
            canvas: Mutex::new(None),
        })
    }

    pub fn kind(&self) -> EffectKind {
        self.kind
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }

    /// The program for a scale. Single-program effects pass 0; xBRZ scales
    /// must match the compiled table exactly.
    pub fn program(&self, scale: u32) -> Result<&wgpu::ComputePipeline, RenderError> {
        self.programs
            .iter()
            .find(|(s, _)| *s == scale)
            .map(|(_, p)| p)
            .ok_or(RenderError::UnsupportedScale(scale))
    }

    /// Upload the source image, reallocating the input texture if its size
    /// changed since the previous render.
    pub fn upload_input(
        &self,
        context: &GpuContext,
        image: &PixelBuffer,
    ) -> MutexGuard<'_, Option<InputTexture>> {
        let mut input = self.input.lock().expect("input texture poisoned");
        let needs_alloc = input
            .as_ref()
            .is_none_or(|t| t.width != image.width || t.height != image.height);
        if needs_alloc {
            log::debug!(
                "{}: allocating {}x{} input texture",
                self.kind,
                image.width,
                image.height
            );
            *input = Some(InputTexture::new(&context.device, image.width, image.height));
        }
        input
            .as_ref()
            .expect("input texture just allocated")
            .upload(&context.queue, image);
        input
    }

    /// Make the canvas at least `width` x `height`. Capacity never shrinks.
    pub fn ensure_canvas(
        &self,
        context: &GpuContext,
        width: u32,
        height: u32,
    ) -> MutexGuard<'_, Option<Canvas>> {
        let mut canvas = self.canvas.lock().expect("canvas poisoned");
        let (new_w, new_h) = match canvas.as_ref() {
            Some(c) if c.fits(width, height) => return canvas,
            Some(c) => (c.width.max(width), c.height.max(height)),
            None => (width, height),
        };
        log::debug!("{}: growing canvas to {}x{}", self.kind, new_w, new_h);
        *canvas = Some(Canvas::new(&context.device, new_w, new_h));
        canvas
    }
}

/// Specialize the xBRZ kernel template for one scale factor: the scale
/// constant plus the dense per-case sub-pixel weight tables.
fn specialize_xbrz(scale: u32) -> String {
    let tables = xbrz::blend_tables(scale as usize);
    XBRZ_SHADER
        .replace("{{SCALE}}", &scale.to_string())
        .replace("{{CELLS}}", &(scale * scale).to_string())
        .replace("{{SHALLOW}}", &dense_weights(tables.shallow, scale))
        .replace("{{STEEP}}", &dense_weights(tables.steep, scale))
        .replace("{{BOTH}}", &dense_weights(tables.both, scale))
        .replace("{{DIAGONAL}}", &dense_weights(tables.diagonal, scale))
        .replace("{{CORNER}}", &dense_weights(tables.corner, scale))
}

/// Row-major weight matrix literal for the WGSL table declarations.
fn dense_weights(writes: &[xbrz::CellWrite], scale: u32) -> String {
    let n = scale as usize;
    let mut dense = vec![0.0f64; n * n];
    for wr in writes {
        dense[wr.row as usize * n + wr.col as usize] = wr.weight;
    }
    let cells: Vec<String> = dense.iter().map(|w| format!("{w:?}")).collect();
    cells.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xbrz_specialization_fills_every_placeholder() {
        for scale in XBRZ_SCALES {
            let source = specialize_xbrz(scale);
            assert!(!source.contains("{{"), "unfilled placeholder at {scale}x");
            assert!(source.contains(&format!("const SCALE: u32 = {scale}u;")));
            // Each dense table carries one weight per cell.
            let cells = scale * scale;
            assert!(source.contains(&format!("array<f32, {cells}>")));
        }
    }

    #[test]
    fn test_dense_weights_are_row_major() {
        let writes = [xbrz::blend_tables(3).diagonal, xbrz::blend_tables(3).corner];
        for table in writes {
            let dense = dense_weights(table, 3);
            assert_eq!(dense.matches(", ").count(), 8);
        }
        // The 3x corner table writes only the (2, 2) position.
        let corner = dense_weights(xbrz::blend_tables(3).corner, 3);
        assert!(corner.starts_with("0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, "));
    }
}
