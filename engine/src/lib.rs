//! Retrofx rendering engine.
//!
//! Three pixel-art effects over RGBA8 [`PixelBuffer`]s:
//!
//! - **crt**: barrel distortion, scanlines and shadow mask emulation
//! - **hex**: remapping onto a hexagonal cell grid
//! - **xbrz**: edge-directed integer upscaling
//!
//! Each effect exists twice: a software path under [`effects`] (exposed
//! through [`cpu::CpuRenderer`]) and a wgpu compute path under [`gpu`].
//! Both evaluate the same per-pixel procedures; for identical inputs and
//! options they agree up to 8-bit quantization.
//!
//! GPU renderers share device resources through
//! [`gpu::DeviceResourcePool`]; programs for an effect are compiled on the
//! first renderer of that kind and freed when the last one drops.

pub use common::{
    CrtOptions, EffectKind, HexOptions, HexOrientation, PixelBuffer, RenderError, Rgba,
    XbrzOptions,
};

pub mod cpu;
pub mod effects;
pub mod gpu;

pub use cpu::CpuRenderer;
pub use gpu::{CrtRenderer, DeviceResourcePool, GpuContext, HexRenderer, PoolHandle, XbrzRenderer};
