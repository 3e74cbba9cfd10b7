use std::mem::size_of;

use crate::{
    layout::Vertex,
    render_window::{ActiveRenderWindow, RenderContext},
};

use super::SharedResources;

/// Draws flat-colored triangles given in pixel coordinates.
///
/// Markers, line segments, axes frames and legend boxes
/// are all turned into triangles by the layout code,
/// so this one pipeline draws everything except text.
pub(crate) struct ShapesPipeline {
    pipeline: wgpu::RenderPipeline,
    vertex_buf: Option<wgpu::Buffer>,
    /// Number of vertices that fit in the vertex buffer.
    vertex_capacity: usize,
}

impl ShapesPipeline {
    pub fn new(window: &ActiveRenderWindow, res: &SharedResources) -> Self {
        let label = Some("shapes");

        let shader = window
            .device
            .create_shader_module(wgpu::include_wgsl!("../shaders/shapes.wgsl"));

        let pipeline_layout = window
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label,
                bind_group_layouts: &[&res.frame_bind_group_layout],
                push_constant_ranges: &[],
            });
        let pipeline = window
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label,
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: "vs_main",
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: size_of::<Vertex>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x4],
                    }],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: "fs_main",
                    targets: &[Some(wgpu::ColorTargetState {
                        format: window.swapchain_format(),
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    front_face: wgpu::FrontFace::Ccw,
                    // layout doesn't care about winding order
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: window.multisample_state(),
                multiview: None,
                cache: None,
            });

        Self {
            pipeline,
            vertex_buf: None,
            vertex_capacity: 0,
        }
    }

    pub fn draw(&mut self, res: &SharedResources, ctx: &mut RenderContext, vertices: &[Vertex]) {
        // the first pass of a frame also clears the screen,
        // so a pass is started even if there's nothing to draw
        if vertices.is_empty() {
            let _pass = ctx.pass("shapes");
            return;
        }

        // grow the buffer if needed, with some slack to avoid reallocating every frame
        if vertices.len() > self.vertex_capacity || self.vertex_buf.is_none() {
            let capacity = vertices.len().next_power_of_two();
            self.vertex_buf = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("shape vertices"),
                size: (capacity * size_of::<Vertex>()) as u64,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
            self.vertex_capacity = capacity;
        }
        let Some(vertex_buf) = &self.vertex_buf else {
            return;
        };
        ctx.queue
            .write_buffer(vertex_buf, 0, bytemuck::cast_slice(vertices));

        let byte_len = (vertices.len() * size_of::<Vertex>()) as u64;
        let mut pass = ctx.pass("shapes");
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &res.frame_bind_group, &[]);
        pass.set_vertex_buffer(0, vertex_buf.slice(..byte_len));
        pass.draw(0..vertices.len() as u32, 0..1);
    }
}
