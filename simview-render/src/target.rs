//! Window present target: uploads the rasterized frame and blits it onto
//! the swap chain.

use simview_core::{Color, Point};
use tiny_skia::Pixmap;

use crate::blit::{BlitPipeline, FrameUniform};
use crate::context::{GpuContext, GpuError};
use crate::surface::{PresentTarget, SurfaceError};

/// GPU-backed [`PresentTarget`] over a window swap chain.
pub struct WindowTarget {
    gpu: GpuContext,
    blit: BlitPipeline,
}

impl WindowTarget {
    /// Create a target presenting to `window`.
    ///
    /// `frame_size` is the raster buffer size; the frame texture is
    /// recreated automatically if the buffer is later resized.
    pub async fn new<W>(
        window: W,
        window_size: (u32, u32),
        frame_size: (u32, u32),
    ) -> Result<Self, GpuError>
    where
        W: wgpu::WasmNotSendSync + Into<wgpu::SurfaceTarget<'static>>,
    {
        let gpu = GpuContext::new_windowed(window, window_size.0, window_size.1).await?;
        let blit = BlitPipeline::new(&gpu.device, gpu.surface_format, frame_size);
        Ok(Self { gpu, blit })
    }

    /// Reconfigure the swap chain after the window was resized.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.gpu.resize(width, height);
    }
}

impl PresentTarget for WindowTarget {
    fn size(&self) -> (u32, u32) {
        self.gpu.surface_size()
    }

    fn present(
        &mut self,
        frame: &Pixmap,
        position: Point,
        background: Color,
    ) -> Result<(), SurfaceError> {
        let surface = self
            .gpu
            .surface
            .as_ref()
            .ok_or_else(|| SurfaceError::NotSupported("headless context".to_string()))?;

        let frame_size = (frame.width(), frame.height());
        self.blit
            .upload_frame(&self.gpu.device, &self.gpu.queue, frame.data(), frame_size);
        let uniform = FrameUniform::new(self.size(), (position.x, position.y), frame_size);
        self.blit.upload_uniform(&self.gpu.queue, &uniform);

        let output = surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("present_encoder"),
            });
        {
            let [r, g, b] = background.to_f64_rgb();
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("present_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a: 1.0 }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.blit.draw(&mut pass);
        }

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}
