use glyphon as gh;
use nalgebra as na;

use crate::{
    layout::{TextAnchor, TextItem, LINE_HEIGHT},
    render_window::{ActiveRenderWindow, RenderContext},
};

pub(crate) struct TextPipeline {
    font_system: gh::FontSystem,
    swash_cache: gh::SwashCache,
    viewport: gh::Viewport,
    atlas: gh::TextAtlas,
    renderer: gh::TextRenderer,
    /// Glyphon requires us to draw all the text in one call,
    /// so we collect each text request into a queue and flush it at the end of a frame.
    draw_queue: Vec<TextBuffer>,
}

/// A text buffer ready for rendering, created with [`TextPipeline::create_buffer`].
struct TextBuffer {
    buffer: gh::Buffer,
    position: na::Vector2<f32>,
    anchor: TextAnchor,
    color: gh::Color,
}

impl TextPipeline {
    pub fn new(window: &ActiveRenderWindow) -> Self {
        let font_system = gh::FontSystem::new();
        let swash_cache = gh::SwashCache::new();
        let cache = gh::Cache::new(&window.device);
        let viewport = gh::Viewport::new(&window.device, &cache);
        let mut atlas = gh::TextAtlas::new(
            &window.device,
            &window.queue,
            &cache,
            window.swapchain_format(),
        );
        let renderer =
            gh::TextRenderer::new(&mut atlas, &window.device, window.multisample_state(), None);

        Self {
            font_system,
            swash_cache,
            viewport,
            atlas,
            renderer,
            draw_queue: Vec::new(),
        }
    }

    /// Lay out a piece of text for rendering.
    fn create_buffer(&mut self, item: &TextItem) -> TextBuffer {
        let mut buffer = gh::Buffer::new(
            &mut self.font_system,
            gh::Metrics {
                font_size: item.font_size,
                line_height: item.font_size * LINE_HEIGHT,
            },
        );

        buffer.set_size(&mut self.font_system, None, None);
        buffer.set_text(
            &mut self.font_system,
            &item.text,
            gh::Attrs::new().family(gh::Family::SansSerif),
            gh::Shaping::Advanced,
        );
        buffer.shape_until_scroll(&mut self.font_system, false);

        let [r, g, b, a] = item.color;
        TextBuffer {
            buffer,
            position: item.position,
            anchor: item.anchor,
            color: gh::Color::rgba(r, g, b, a),
        }
    }

    /// Create a text buffer and queue it to be drawn this frame.
    pub fn queue(&mut self, item: &TextItem) {
        let buf = self.create_buffer(item);
        self.draw_queue.push(buf);
    }

    /// Draw all text buffers that have been queued during this frame.
    pub fn draw(&mut self, ctx: &mut RenderContext) {
        self.viewport.update(
            ctx.queue,
            gh::Resolution {
                width: ctx.viewport_size.0,
                height: ctx.viewport_size.1,
            },
        );

        let areas = self.draw_queue.iter().map(|buf| {
            let width = buf
                .buffer
                .layout_runs()
                .map(|l| l.line_w)
                .max_by(f32::total_cmp)
                .unwrap_or(0.);
            let height = buf
                .buffer
                .layout_runs()
                .last()
                .map(|l| l.line_top + l.line_height)
                .unwrap_or(0.);

            use TextAnchor::*;
            let top_left = buf.position
                - match buf.anchor {
                    TopLeft => na::Vector2::zeros(),
                    TopMid => na::Vector2::new(width / 2., 0.),
                    TopRight => na::Vector2::new(width, 0.),
                    MidLeft => na::Vector2::new(0., height / 2.),
                    Center => na::Vector2::new(width / 2., height / 2.),
                    MidRight => na::Vector2::new(width, height / 2.),
                    BottomLeft => na::Vector2::new(0., height),
                    BottomMid => na::Vector2::new(width / 2., height),
                    BottomRight => na::Vector2::new(width, height),
                };

            gh::TextArea {
                buffer: &buf.buffer,
                left: top_left.x,
                top: top_left.y,
                scale: 1.,
                bounds: gh::TextBounds {
                    left: top_left.x as i32,
                    top: top_left.y as i32,
                    right: (top_left.x + width + 1.) as i32,
                    bottom: (top_left.y + height + 1.) as i32,
                },
                default_color: buf.color,
                custom_glyphs: &[],
            }
        });

        let prepared = self.renderer.prepare(
            ctx.device,
            ctx.queue,
            &mut self.font_system,
            &mut self.atlas,
            &self.viewport,
            areas,
            &mut self.swash_cache,
        );
        self.draw_queue.clear();
        if let Err(err) = prepared {
            log::error!("Failed to prepare text: {err}");
            return;
        }

        let mut pass = ctx.pass("text");
        if let Err(err) = self.renderer.render(&self.atlas, &self.viewport, &mut pass) {
            log::error!("Failed to render text: {err}");
        }
        drop(pass);
        self.atlas.trim();
    }
}
