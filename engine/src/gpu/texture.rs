//! Texture upload and readback.

use common::{PixelBuffer, RenderError};

/// Sampled input texture holding the current source image.
///
/// Reallocated whenever the incoming image size differs from the resident
/// one; re-used (contents overwritten) when it matches.
pub struct InputTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub width: u32,
    pub height: u32,
}

impl InputTexture {
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Retrofx Input Texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            width,
            height,
        }
    }

    /// Upload RGBA8 rows. The buffer is tightly packed, no row padding.
    pub fn upload(&self, queue: &wgpu::Queue, input: &PixelBuffer) {
        queue.write_texture(
            self.texture.as_image_copy(),
            &input.data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(self.width * 4),
                rows_per_image: Some(self.height),
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
    }
}

/// Write-only storage canvas the compute kernels render into.
///
/// Capacity only grows: a render needing a smaller output re-uses the
/// existing texture and reads back just its rectangle.
pub struct Canvas {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Retrofx Canvas"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::STORAGE_BINDING | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            width,
            height,
        }
    }

    pub fn fits(&self, width: u32, height: u32) -> bool {
        self.width >= width && self.height >= height
    }

    /// Read the top-left `width` x `height` rectangle back to the CPU.
    pub fn read_rect(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        width: u32,
        height: u32,
    ) -> Result<PixelBuffer, RenderError> {
        let width = width.min(self.width);
        let height = height.min(self.height);

        // Rows in the staging buffer must be 256-byte aligned.
        let unpadded_bytes_per_row = width * 4;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded_bytes_per_row = unpadded_bytes_per_row.div_ceil(align) * align;
        let buffer_size = u64::from(padded_bytes_per_row) * u64::from(height);

        let staging_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Retrofx Readback Buffer"),
            size: buffer_size,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Retrofx Readback Encoder"),
        });
        encoder.copy_texture_to_buffer(
            self.texture.as_image_copy(),
            wgpu::TexelCopyBufferInfo {
                buffer: &staging_buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        let submission_index = queue.submit(Some(encoder.finish()));

        let buffer_slice = staging_buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });

        device
            .poll(wgpu::PollType::Wait {
                submission_index: Some(submission_index),
                timeout: None,
            })
            .map_err(|e| RenderError::Readback(format!("device poll failed: {e}")))?;

        rx.recv()
            .map_err(|_| RenderError::Readback("buffer mapping callback dropped".into()))?
            .map_err(|e| RenderError::Readback(format!("buffer mapping failed: {e}")))?;

        let mapped = buffer_slice.get_mapped_range();

        // Strip the row padding; channels are already RGBA.
        let mut data = vec![0u8; (width * height * 4) as usize];
        for row in 0..height {
            let src = (row * padded_bytes_per_row) as usize;
            let dst = (row * unpadded_bytes_per_row) as usize;
            data[dst..dst + unpadded_bytes_per_row as usize]
                .copy_from_slice(&mapped[src..src + unpadded_bytes_per_row as usize]);
        }

        drop(mapped);
        staging_buffer.unmap();

        Ok(PixelBuffer {
            data,
            width,
            height,
        })
    }
}
