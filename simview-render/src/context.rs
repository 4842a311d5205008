//! GPU context — owns `wgpu::Device`, `Queue`, and optional `Surface`.
//!
//! Windowed construction is the normal path; the headless path exists so
//! pipeline creation can be exercised in tests and CI runners without a
//! display.

use thiserror::Error;
use wgpu::{
    Adapter, Device, DeviceDescriptor, Instance, InstanceDescriptor, Queue,
    RequestAdapterOptions, Surface, SurfaceConfiguration, TextureFormat, TextureUsages,
};

#[derive(Error, Debug)]
pub enum GpuError {
    #[error("no suitable GPU adapter found")]
    NoAdapter,
    #[error("failed to request device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("failed to create window surface: {0}")]
    CreateSurface(String),
}

/// Device, queue, and (when windowed) the swap-chain surface.
pub struct GpuContext {
    pub device: Device,
    pub queue: Queue,
    pub adapter: Adapter,
    /// Present only when rendering to a window.
    pub surface: Option<Surface<'static>>,
    pub surface_config: Option<SurfaceConfiguration>,
    pub surface_format: TextureFormat,
}

impl GpuContext {
    /// Create a context with no surface, for tests and off-screen use.
    pub async fn new_headless() -> Result<Self, GpuError> {
        let instance = Instance::new(&InstanceDescriptor::default());
        let (device, queue, adapter) = Self::request_device(&instance, None).await?;
        Ok(Self {
            device,
            queue,
            adapter,
            surface: None,
            surface_config: None,
            surface_format: TextureFormat::Bgra8UnormSrgb,
        })
    }

    /// Create a context presenting to `window`.
    ///
    /// `window` is any `raw-window-handle` surface target; the desktop
    /// crate passes an `Arc<winit::window::Window>`.
    pub async fn new_windowed<W>(window: W, width: u32, height: u32) -> Result<Self, GpuError>
    where
        W: wgpu::WasmNotSendSync + Into<wgpu::SurfaceTarget<'static>>,
    {
        let instance = Instance::new(&InstanceDescriptor::default());
        let surface = instance
            .create_surface(window)
            .map_err(|e| GpuError::CreateSurface(e.to_string()))?;
        let (device, queue, adapter) = Self::request_device(&instance, Some(&surface)).await?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(caps.formats[0]);

        let config = SurfaceConfiguration {
            usage: TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            desired_maximum_frame_latency: 2,
            alpha_mode: caps.alpha_modes[0],
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        Ok(Self {
            device,
            queue,
            adapter,
            surface: Some(surface),
            surface_config: Some(config),
            surface_format: format,
        })
    }

    async fn request_device(
        instance: &Instance,
        compatible_surface: Option<&Surface<'static>>,
    ) -> Result<(Device, Queue, Adapter), GpuError> {
        let adapter = instance
            .request_adapter(&RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::LowPower,
                compatible_surface,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(
                &DeviceDescriptor {
                    label: Some("simview-device"),
                    ..Default::default()
                },
                None,
            )
            .await?;

        Ok((device, queue, adapter))
    }

    /// Reconfigure the swap chain after a window resize.  No-op when
    /// headless or when either dimension is zero (minimized window).
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        if let (Some(surface), Some(config)) = (&self.surface, &mut self.surface_config) {
            config.width = width;
            config.height = height;
            surface.configure(&self.device, config);
        }
    }

    /// Current surface dimensions, or `(0, 0)` when headless.
    pub fn surface_size(&self) -> (u32, u32) {
        self.surface_config
            .as_ref()
            .map(|c| (c.width, c.height))
            .unwrap_or((0, 0))
    }
}

// ===================================================================
// Tests
// ===================================================================
