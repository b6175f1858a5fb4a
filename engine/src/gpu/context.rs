//! GPU context management - handles wgpu device/queue initialization.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use common::RenderError;

/// GPU context containing device, queue, and adapter info.
///
/// A lost device is recorded in a flag rather than panicking; every render
/// checks it up front and reports [`RenderError::DeviceLost`] so the caller
/// can rebuild the context.
pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub adapter_info: wgpu::AdapterInfo,
    pub limits: wgpu::Limits,
    lost: Arc<AtomicBool>,
}

impl GpuContext {
    /// Create a new GPU context.
    ///
    /// This initializes wgpu with the best available adapter (GPU).
    /// On Linux, this will typically use Vulkan.
    pub async fn new() -> Result<Self, RenderError> {
        log::info!("Initializing GPU context...");

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| RenderError::BackendUnavailable(format!("no suitable adapter: {e}")))?;

        let adapter_info = adapter.get_info();
        log::info!(
            "Selected GPU adapter: {} ({:?})",
            adapter_info.name,
            adapter_info.backend
        );

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Retrofx Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                ..Default::default()
            })
            .await
            .map_err(|e| RenderError::BackendUnavailable(format!("device request failed: {e}")))?;

        let lost = Arc::new(AtomicBool::new(false));
        let lost_flag = lost.clone();
        device.set_device_lost_callback(move |reason, message| {
            log::error!("GPU device lost ({reason:?}): {message}");
            lost_flag.store(true, Ordering::SeqCst);
        });

        let limits = device.limits();
        log::info!("GPU context initialized successfully");
        log::info!("  Backend: {:?}", adapter_info.backend);
        log::info!(
            "  Max Texture Size: {}x{}",
            limits.max_texture_dimension_2d,
            limits.max_texture_dimension_2d
        );

        Ok(Self {
            device,
            queue,
            adapter_info,
            limits,
            lost,
        })
    }

    /// Blocking convenience wrapper around [`GpuContext::new`].
    pub fn new_blocking() -> Result<Self, RenderError> {
        pollster::block_on(Self::new())
    }

    /// Whether the device has been lost since creation.
    pub fn is_lost(&self) -> bool {
        self.lost.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for GpuContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuContext")
            .field("adapter", &self.adapter_info.name)
            .field("backend", &self.adapter_info.backend)
            .field("lost", &self.is_lost())
            .finish()
    }
}
