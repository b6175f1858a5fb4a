//! Per-effect GPU renderers.
//!
//! Each renderer owns one [`PoolHandle`] on its effect's resource set;
//! dropping the renderer releases the handle. Rendering follows the same
//! sequence for every effect: clamp options, check device liveness, upload
//! the source, grow the canvas if needed, dispatch the compute program and
//! read the output rectangle back.

use std::sync::Arc;

use common::{CrtOptions, EffectKind, HexOptions, PixelBuffer, RenderError, XbrzOptions};
use wgpu::util::DeviceExt;

use crate::effects::{crt, hex, xbrz};
use crate::gpu::pool::{DeviceResourcePool, PoolHandle};

const WORKGROUP: u32 = 8;

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct CrtUniforms {
    out_w: u32,
    out_h: u32,
    src_w: u32,
    src_h: u32,
    warp_x: f32,
    warp_y: f32,
    scan_hardness: f32,
    scan_opacity: f32,
    mask_opacity: f32,
    enable_warp: u32,
    enable_scanlines: u32,
    enable_mask: u32,
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct HexUniforms {
    out_w: u32,
    out_h: u32,
    src_w: u32,
    src_h: u32,
    matrix: [f32; 4],
    origin: [f32; 2],
    draw_borders: u32,
    border_thickness: u32,
    border_color: [f32; 4],
    background_color: [f32; 4],
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct XbrzUniforms {
    out_w: u32,
    out_h: u32,
    src_w: u32,
    src_h: u32,
    equal_color_tolerance: f32,
    steep_direction_threshold: f32,
    dominant_direction_threshold: f32,
    center_direction_bias: f32,
}

/// CRT emulation on the GPU.
pub struct CrtRenderer {
    handle: PoolHandle,
}

impl CrtRenderer {
    pub fn new(pool: Arc<DeviceResourcePool>) -> Result<Self, RenderError> {
        Ok(Self {
            handle: pool.acquire(EffectKind::Crt)?,
        })
    }

    pub fn output_dimensions(&self, src_w: u32, src_h: u32, scale: u32) -> (u32, u32) {
        crt::output_dimensions(src_w, src_h, scale)
    }

    pub fn render(
        &self,
        input: &PixelBuffer,
        opts: &CrtOptions,
    ) -> Result<PixelBuffer, RenderError> {
        let opts = opts.clamped();
        let (out_w, out_h) = crt::output_dimensions(input.width, input.height, opts.scale);
        let uniforms = CrtUniforms {
            out_w,
            out_h,
            src_w: input.width,
            src_h: input.height,
            warp_x: opts.warp_x,
            warp_y: opts.warp_y,
            scan_hardness: opts.scan_hardness,
            scan_opacity: opts.scan_opacity,
            mask_opacity: opts.mask_opacity,
            enable_warp: opts.enable_warp.into(),
            enable_scanlines: opts.enable_scanlines.into(),
            enable_mask: opts.enable_mask.into(),
        };
        execute(
            &self.handle,
            0,
            input,
            out_w,
            out_h,
            bytemuck::bytes_of(&uniforms),
        )
    }
}

/// Hexagonal remapping on the GPU.
pub struct HexRenderer {
    handle: PoolHandle,
}

impl HexRenderer {
    pub fn new(pool: Arc<DeviceResourcePool>) -> Result<Self, RenderError> {
        Ok(Self {
            handle: pool.acquire(EffectKind::Hex)?,
        })
    }

    pub fn output_dimensions(&self, src_w: u32, src_h: u32, opts: &HexOptions) -> (u32, u32) {
        let opts = opts.clamped();
        hex::output_dimensions(src_w, src_h, opts.scale, opts.orientation)
    }

    pub fn render(
        &self,
        input: &PixelBuffer,
        opts: &HexOptions,
    ) -> Result<PixelBuffer, RenderError> {
        let opts = opts.clamped();
        let geometry = hex::HexGeometry::new(opts.scale, opts.orientation);
        let (out_w, out_h) = geometry.output_dimensions(input.width, input.height);
        let uniforms = HexUniforms {
            out_w,
            out_h,
            src_w: input.width,
            src_h: input.height,
            matrix: geometry.matrix(),
            origin: geometry.origin(),
            draw_borders: opts.draw_borders.into(),
            border_thickness: opts.border_thickness,
            border_color: opts.border_color.to_f32(),
            background_color: opts.background_color.to_f32(),
        };
        execute(
            &self.handle,
            0,
            input,
            out_w,
            out_h,
            bytemuck::bytes_of(&uniforms),
        )
    }
}

/// xBRZ upscaling on the GPU.
pub struct XbrzRenderer {
    handle: PoolHandle,
}

impl XbrzRenderer {
    pub fn new(pool: Arc<DeviceResourcePool>) -> Result<Self, RenderError> {
        Ok(Self {
            handle: pool.acquire(EffectKind::Xbrz)?,
        })
    }

    pub fn output_dimensions(&self, src_w: u32, src_h: u32, scale: u32) -> (u32, u32) {
        xbrz::output_dimensions(src_w, src_h, scale)
    }

    pub fn render(
        &self,
        input: &PixelBuffer,
        opts: &XbrzOptions,
    ) -> Result<PixelBuffer, RenderError> {
        let opts = opts.clamped();
        let (out_w, out_h) = xbrz::output_dimensions(input.width, input.height, opts.scale);
        let uniforms = XbrzUniforms {
            out_w,
            out_h,
            src_w: input.width,
            src_h: input.height,
            equal_color_tolerance: opts.equal_color_tolerance as f32,
            steep_direction_threshold: opts.steep_direction_threshold as f32,
            dominant_direction_threshold: opts.dominant_direction_threshold as f32,
            center_direction_bias: opts.center_direction_bias as f32,
        };
        // Program selection is exact-match against the compiled table.
        execute(
            &self.handle,
            opts.scale,
            input,
            out_w,
            out_h,
            bytemuck::bytes_of(&uniforms),
        )
    }
}

/// Shared dispatch-and-readback path.
fn execute(
    handle: &PoolHandle,
    scale_key: u32,
    input: &PixelBuffer,
    out_w: u32,
    out_h: u32,
    uniforms: &[u8],
) -> Result<PixelBuffer, RenderError> {
    let context = handle.context();
    let set = handle.set();
    if context.is_lost() {
        return Err(RenderError::DeviceLost);
    }
    let program = set.program(scale_key)?;

    let input_guard = set.upload_input(context, input);
    let canvas_guard = set.ensure_canvas(context, out_w, out_h);
    let input_texture = input_guard.as_ref().expect("input texture allocated");
    let canvas = canvas_guard.as_ref().expect("canvas allocated");

    let device = &context.device;
    let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Retrofx Uniforms"),
        contents: uniforms,
        usage: wgpu::BufferUsages::UNIFORM,
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Retrofx Bind Group"),
        layout: set.bind_group_layout(),
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&input_texture.view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(&canvas.view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: uniform_buffer.as_entire_binding(),
            },
        ],
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Retrofx Render Encoder"),
    });
    {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("Retrofx Compute Pass"),
            timestamp_writes: None,
        });
        pass.set_pipeline(program);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.dispatch_workgroups(out_w.div_ceil(WORKGROUP), out_h.div_ceil(WORKGROUP), 1);
    }
    context.queue.submit(Some(encoder.finish()));

    log::debug!(
        "{}: dispatched {}x{} -> {}x{}",
        set.kind(),
        input.width,
        input.height,
        out_w,
        out_h
    );
    canvas.read_rect(device, &context.queue, out_w, out_h)
}
