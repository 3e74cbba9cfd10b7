mod resources;
use resources::SharedResources;

mod shapes;
use shapes::ShapesPipeline;

mod text;
use text::TextPipeline;

//

use crate::{
    figure::Figure,
    layout,
    render_window::{ActiveRenderWindow, RenderContext},
};

/// Draws [`Figure`]s into a render window.
pub(crate) struct Renderer {
    shapes_pl: ShapesPipeline,
    text_pl: TextPipeline,
    // some GPU resources are shared between different pipelines
    resources: SharedResources,
}

impl Renderer {
    pub fn new(window: &ActiveRenderWindow) -> Self {
        let resources = SharedResources::new(window);
        Self {
            shapes_pl: ShapesPipeline::new(window, &resources),
            text_pl: TextPipeline::new(window),
            resources,
        }
    }

    /// Draw a figure, replacing everything on the screen.
    ///
    /// `scale` is the ratio of physical to logical pixels.
    pub fn draw_figure(&mut self, ctx: &mut RenderContext, figure: &Figure, scale: f32) {
        let scene = layout::compose(figure, ctx.viewport_size, scale);
        self.resources.upload_frame_uniforms(ctx);
        self.shapes_pl.draw(&self.resources, ctx, &scene.vertices);
        for item in &scene.texts {
            self.text_pl.queue(item);
        }
        self.text_pl.draw(ctx);
    }
}
