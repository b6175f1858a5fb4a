//! GPU-accelerated rendering module using wgpu.
//!
//! Architecture:
//! - `context`: wgpu device/queue management
//! - `pool`: refcounted per-effect resource sets (programs and textures)
//! - `renderer`: per-effect render entry points
//! - `pipeline`: compute pipeline creation
//! - `texture`: texture upload and readback
//!
//! The compute kernels under `shaders/` evaluate the same per-pixel
//! procedures as [`crate::effects`].

pub mod context;
pub mod pipeline;
pub mod pool;
pub mod renderer;
pub mod texture;

pub use context::GpuContext;
pub use pool::{DeviceResourcePool, PoolHandle};
pub use renderer::{CrtRenderer, HexRenderer, XbrzRenderer};

/// Check if GPU rendering is available on this system.
pub fn is_available() -> bool {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    });
    pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions::default())).is_ok()
}
