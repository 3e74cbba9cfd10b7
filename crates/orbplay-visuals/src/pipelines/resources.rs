use nalgebra as na;

use crate::render_window::{ActiveRenderWindow, RenderContext};

/// GPU resources (buffers, bind groups)
/// that are shared between multiple render pipelines.
pub(crate) struct SharedResources {
    pub viewport_uniform_buf: wgpu::Buffer,
    /// Bind group for things that are constant for a frame.
    pub frame_bind_group: wgpu::BindGroup,
    pub frame_bind_group_layout: wgpu::BindGroupLayout,
}

/// Uniform buffer describing the render target.
#[derive(Clone, Copy, Debug, encase::ShaderType)]
struct ViewportUniforms {
    // viewport resolution used for converting pixels to clip space
    resolution: na::Vector2<f32>,
}

impl SharedResources {
    pub fn new(window: &ActiveRenderWindow) -> Self {
        let viewport_uniform_buf_size = <ViewportUniforms as encase::ShaderType>::min_size();
        let viewport_uniform_buf = window.device.create_buffer(&wgpu::BufferDescriptor {
            size: viewport_uniform_buf_size.get(),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            label: Some("viewport"),
            mapped_at_creation: false,
        });

        let frame_bind_group_layout =
            window
                .device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    entries: &[wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::VERTEX,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: Some(viewport_uniform_buf_size),
                        },
                        count: None,
                    }],
                    label: Some("frame"),
                });
        let frame_bind_group = window.device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &frame_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: viewport_uniform_buf.as_entire_binding(),
            }],
            label: Some("frame"),
        });

        Self {
            viewport_uniform_buf,
            frame_bind_group,
            frame_bind_group_layout,
        }
    }

    pub fn upload_frame_uniforms(&self, ctx: &mut RenderContext) {
        let uniforms = ViewportUniforms {
            resolution: na::Vector2::new(ctx.viewport_size.0 as f32, ctx.viewport_size.1 as f32),
        };
        let mut uniform_bytes = encase::UniformBuffer::new(Vec::new());
        if let Err(err) = uniform_bytes.write(&uniforms) {
            log::error!("Failed to encode viewport uniforms: {err}");
            return;
        }
        ctx.queue
            .write_buffer(&self.viewport_uniform_buf, 0, &uniform_bytes.into_inner());
    }
}
