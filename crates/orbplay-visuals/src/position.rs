//! The position view: every body's path through the plane so far.

use itertools::Itertools;
use orbplay_core::{total_frames, BodyCount, FrameSelector, TraceStore};

use crate::{
    animation::{FrameRenderer, RenderFailure},
    color_map::{builtin_color_maps, BodyColors, Palette},
    figure::{Figure, Layer},
};

/// Parameters for a [`PositionRenderer`].
#[derive(Clone, Debug)]
pub struct PositionParams {
    /// Palette the body colors are sampled from.
    /// Default: [`tab10`][builtin_color_maps::tab10].
    pub palette: Palette,
    /// Side length of a marker in logical pixels. Default: 3.
    pub marker_size: f32,
    /// Opacity of the markers. Default: 0.7.
    pub alpha: f32,
}

impl Default for PositionParams {
    fn default() -> Self {
        Self {
            palette: builtin_color_maps::tab10(),
            marker_size: 3.,
            alpha: 0.7,
        }
    }
}

/// Draws every sample position visible in a frame as a scatter plot,
/// one color per body.
///
/// The view has a single panel titled with the elapsed simulated time.
pub struct PositionRenderer<'a> {
    store: &'a TraceStore,
    body_count: BodyCount,
    selector: FrameSelector,
    colors: BodyColors,
    params: PositionParams,
}

impl<'a> PositionRenderer<'a> {
    /// Create a renderer for the bodies `1..=body_count` of a trace.
    ///
    /// `body_count` should come from
    /// [`TraceStore::check_body_count`][orbplay_core::TraceStore::check_body_count].
    pub fn new(
        store: &'a TraceStore,
        body_count: BodyCount,
        selector: FrameSelector,
        params: PositionParams,
    ) -> Self {
        let colors = BodyColors::assign(body_count, &params.palette);
        Self {
            store,
            body_count,
            selector,
            colors,
            params,
        }
    }

    /// The colors assigned to the bodies.
    #[inline]
    pub fn colors(&self) -> &BodyColors {
        &self.colors
    }
}

impl FrameRenderer for PositionRenderer<'_> {
    fn name(&self) -> &str {
        "position"
    }

    fn total_frames(&self) -> usize {
        total_frames(self.store.len(), self.body_count)
    }

    fn render_frame(&mut self, frame: usize, figure: &mut Figure) -> Vec<RenderFailure> {
        figure.reset(1);
        let panel = &mut figure.panels[0];
        let window = self.selector.window(self.store, frame);
        let mut failures = Vec::new();

        for (body, color) in self.colors.iter() {
            let points = window.body(body).map(|r| r.position).collect_vec();
            if points.is_empty() {
                if window.is_populated() {
                    failures.push(RenderFailure::MissingBody {
                        frame,
                        body,
                        cutoff: window.cutoff(),
                    });
                }
                continue;
            }
            panel.layers.push(Layer::scatter(
                format!("Body {body}"),
                color,
                self.params.alpha,
                self.params.marker_size,
                points,
            ));
        }

        panel.title = format!("Time: {:.6} sec", window.elapsed());
        panel.x_label = "X Position".to_string();
        panel.y_label = "Y Position".to_string();
        panel.legend = true;

        failures
    }
}
