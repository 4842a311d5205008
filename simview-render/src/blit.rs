//! Textured-quad pipeline that copies the rasterized frame to the window.
//!
//! One frame texture, one uniform carrying the pixel-space placement, one
//! draw call.  The quad is generated from the vertex index in the shader,
//! so no vertex buffers are bound.

use bytemuck::{Pod, Zeroable};
use wgpu::{
    AddressMode, BindGroup, BindGroupDescriptor, BindGroupEntry, BindGroupLayout,
    BindGroupLayoutDescriptor, BindGroupLayoutEntry, BindingResource, BindingType, BlendState,
    Buffer, BufferBindingType, BufferDescriptor, BufferUsages, ColorTargetState, ColorWrites,
    Device, Extent3d, FilterMode, FragmentState, MultisampleState, PipelineCompilationOptions,
    PipelineLayoutDescriptor, PrimitiveState, PrimitiveTopology, Queue, RenderPass,
    RenderPipeline, RenderPipelineDescriptor, Sampler, SamplerBindingType, SamplerDescriptor,
    ShaderModuleDescriptor, ShaderStages, Texture, TextureDescriptor, TextureDimension,
    TextureFormat, TextureSampleType, TextureUsages, TextureViewDimension, VertexState,
};

/// Pixel-space placement of the frame quad inside the window.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct FrameUniform {
    /// Window size in pixels.
    pub viewport: [f32; 2],
    /// Top-left corner of the quad in window pixels.
    pub position: [f32; 2],
    /// Quad size in pixels (the raster buffer size).
    pub size: [f32; 2],
    /// Padding for 16-byte uniform alignment.
    pub _pad: [f32; 2],
}

impl FrameUniform {
    pub fn new(viewport: (u32, u32), position: (f64, f64), size: (u32, u32)) -> Self {
        Self {
            viewport: [viewport.0 as f32, viewport.1 as f32],
            position: [position.0 as f32, position.1 as f32],
            size: [size.0 as f32, size.1 as f32],
            _pad: [0.0; 2],
        }
    }
}

/// Owns the wgpu pipeline, frame texture, and bind group for the blit.
pub struct BlitPipeline {
    pipeline: RenderPipeline,
    uniform_buffer: Buffer,
    sampler: Sampler,
    bind_group_layout: BindGroupLayout,
    bind_group: BindGroup,
    texture: Texture,
    texture_size: (u32, u32),
}

impl BlitPipeline {
    pub fn new(device: &Device, surface_format: TextureFormat, frame_size: (u32, u32)) -> Self {
        let shader = device.create_shader_module(ShaderModuleDescriptor {
            label: Some("blit_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/blit.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("blit_bgl"),
            entries: &[
                BindGroupLayoutEntry {
                    binding: 0,
                    visibility: ShaderStages::VERTEX,
                    ty: BindingType::Buffer {
                        ty: BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                BindGroupLayoutEntry {
                    binding: 1,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Texture {
                        sample_type: TextureSampleType::Float { filterable: true },
                        view_dimension: TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                BindGroupLayoutEntry {
                    binding: 2,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Sampler(SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("blit_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some("blit_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: PipelineCompilationOptions::default(),
                buffers: &[],
            },
            fragment: Some(FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: PipelineCompilationOptions::default(),
                targets: &[Some(ColorTargetState {
                    format: surface_format,
                    blend: Some(BlendState::ALPHA_BLENDING),
                    write_mask: ColorWrites::ALL,
                })],
            }),
            primitive: PrimitiveState {
                topology: PrimitiveTopology::TriangleList,
                ..PrimitiveState::default()
            },
            depth_stencil: None,
            multisample: MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let uniform_buffer = device.create_buffer(&BufferDescriptor {
            label: Some("blit_frame_uniform"),
            size: std::mem::size_of::<FrameUniform>() as u64,
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let sampler = device.create_sampler(&SamplerDescriptor {
            label: Some("blit_sampler"),
            address_mode_u: AddressMode::ClampToEdge,
            address_mode_v: AddressMode::ClampToEdge,
            // The frame is presented 1:1, nearest keeps it pixel exact.
            mag_filter: FilterMode::Nearest,
            min_filter: FilterMode::Nearest,
            ..Default::default()
        });

        let texture = Self::create_frame_texture(device, frame_size);
        let bind_group = Self::create_bind_group(
            device,
            &bind_group_layout,
            &uniform_buffer,
            &texture,
            &sampler,
        );

        Self {
            pipeline,
            uniform_buffer,
            sampler,
            bind_group_layout,
            bind_group,
            texture,
            texture_size: frame_size,
        }
    }

    fn create_frame_texture(device: &Device, (width, height): (u32, u32)) -> Texture {
        device.create_texture(&TextureDescriptor {
            label: Some("blit_frame_texture"),
            size: Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format: TextureFormat::Rgba8UnormSrgb,
            usage: TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
            view_formats: &[],
        })
    }

    fn create_bind_group(
        device: &Device,
        layout: &BindGroupLayout,
        uniform_buffer: &Buffer,
        texture: &Texture,
        sampler: &Sampler,
    ) -> BindGroup {
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        device.create_bind_group(&BindGroupDescriptor {
            label: Some("blit_bg"),
            layout,
            entries: &[
                BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                BindGroupEntry {
                    binding: 1,
                    resource: BindingResource::TextureView(&view),
                },
                BindGroupEntry {
                    binding: 2,
                    resource: BindingResource::Sampler(sampler),
                },
            ],
        })
    }

    /// Upload this frame's RGBA pixels, recreating the texture if the
    /// raster buffer was resized since the last frame.
    pub fn upload_frame(
        &mut self,
        device: &Device,
        queue: &Queue,
        pixels: &[u8],
        size: (u32, u32),
    ) {
        if size != self.texture_size {
            self.texture = Self::create_frame_texture(device, size);
            self.texture_size = size;
            self.bind_group = Self::create_bind_group(
                device,
                &self.bind_group_layout,
                &self.uniform_buffer,
                &self.texture,
                &self.sampler,
            );
        }

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * size.0),
                rows_per_image: Some(size.1),
            },
            Extent3d {
                width: size.0,
                height: size.1,
                depth_or_array_layers: 1,
            },
        );
    }

    /// Upload the quad placement for this frame.
    pub fn upload_uniform(&self, queue: &Queue, uniform: &FrameUniform) {
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(uniform));
    }

    /// Record the blit draw into an open render pass.
    pub fn draw(&self, pass: &mut RenderPass<'_>) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.draw(0..6, 0..1);
    }

    pub fn texture_size(&self) -> (u32, u32) {
        self.texture_size
    }
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::GpuContext;

    #[test]
    fn test_frame_uniform_layout() {
        // Must stay a multiple of 16 bytes for uniform binding.
        assert_eq!(std::mem::size_of::<FrameUniform>(), 32);
        let u = FrameUniform::new((800, 600), (10.5, 20.0), (640, 480));
        assert_eq!(u.viewport, [800.0, 600.0]);
        assert_eq!(u.position, [10.5, 20.0]);
        assert_eq!(u.size, [640.0, 480.0]);
    }

    #[test]
    fn test_pipeline_creation_headless() {
        // May fail on CI runners without any adapter — skip gracefully.
        if let Ok(gpu) = pollster::block_on(GpuContext::new_headless()) {
            let blit = BlitPipeline::new(&gpu.device, gpu.surface_format, (64, 64));
            assert_eq!(blit.texture_size(), (64, 64));
        }
    }

    #[test]
    fn test_upload_frame_recreates_texture_on_resize() {
        if let Ok(gpu) = pollster::block_on(GpuContext::new_headless()) {
            let mut blit = BlitPipeline::new(&gpu.device, gpu.surface_format, (4, 4));
            let pixels = vec![0u8; 8 * 8 * 4];
            blit.upload_frame(&gpu.device, &gpu.queue, &pixels, (8, 8));
            assert_eq!(blit.texture_size(), (8, 8));
        }
    }
}
