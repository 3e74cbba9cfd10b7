//! The kinematics view: acceleration and velocity of every body over time.

use itertools::Itertools;
use orbplay_core::{
    total_frames, BodyId, Channel, ConfigurationError, FrameSelector, TraceStore, Vec2,
};

use crate::{
    animation::{FrameRenderer, RenderFailure},
    color_map::{builtin_color_maps, BodyColors, Palette},
    figure::{Figure, Layer},
};

/// A quantity plotted against time, with the symbol used in titles.
#[derive(Clone, Debug, PartialEq)]
pub struct Series {
    /// Where the values come from.
    pub channel: Channel,
    /// Short name shown in parentheses in titles and labels, e.g. `ax`.
    pub symbol: String,
}

impl Series {
    /// Create a series from a channel and its symbol.
    pub fn new(channel: Channel, symbol: impl Into<String>) -> Self {
        Self {
            channel,
            symbol: symbol.into(),
        }
    }
}

/// Parameters for a [`KinematicsRenderer`].
#[derive(Clone, Debug)]
pub struct KinematicsParams {
    /// Quantity shown in the left panel. Default: `Ax` as `ax`.
    pub acceleration: Series,
    /// Quantity shown in the right panel. Default: `Ux` as `ux`.
    pub velocity: Series,
    /// Palette the body colors are sampled from.
    /// Default: [`rainbow`][builtin_color_maps::rainbow].
    pub palette: Palette,
    /// Width of the lines in logical pixels. Default: 1.5.
    pub line_width: f32,
    /// Space between the two panels as a fraction of the panel width. Default: 0.3.
    pub wspace: f32,
}

impl Default for KinematicsParams {
    fn default() -> Self {
        Self {
            acceleration: Series::new(Channel::AccelerationX, "ax"),
            velocity: Series::new(Channel::VelocityX, "ux"),
            palette: Palette::Continuous(builtin_color_maps::rainbow()),
            line_width: 1.5,
            wspace: 0.3,
        }
    }
}

impl KinematicsParams {
    /// Plot the vertical components `Ay` and `Uy` instead of the horizontal ones.
    ///
    /// These are optional columns, so the store is needed to look them up.
    pub fn vertical(store: &TraceStore) -> Result<Self, ConfigurationError> {
        Ok(Self {
            acceleration: Series::new(store.channel("Ay")?, "ay"),
            velocity: Series::new(store.channel("Uy")?, "uy"),
            ..Default::default()
        })
    }
}

/// Draws acceleration and velocity against time
/// as two side-by-side panels with one growing line per body.
///
/// The set of bodies is whatever distinct ids the trace contains.
pub struct KinematicsRenderer<'a> {
    store: &'a TraceStore,
    selector: FrameSelector,
    bodies: Vec<BodyId>,
    colors: BodyColors,
    params: KinematicsParams,
}

impl<'a> KinematicsRenderer<'a> {
    /// Create a renderer for all bodies present in a trace.
    pub fn new(store: &'a TraceStore, selector: FrameSelector, params: KinematicsParams) -> Self {
        let bodies = store.distinct_body_ids().collect_vec();
        let colors = BodyColors::for_bodies(bodies.iter().copied(), &params.palette);
        Self {
            store,
            selector,
            bodies,
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

impl FrameRenderer for KinematicsRenderer<'_> {
    fn name(&self) -> &str {
        "kinematics"
    }

    fn total_frames(&self) -> usize {
        self.store
            .inferred_body_count()
            .map_or(0, |count| total_frames(self.store.len(), count))
    }

    fn render_frame(&mut self, frame: usize, figure: &mut Figure) -> Vec<RenderFailure> {
        figure.reset(2);
        figure.wspace = self.params.wspace;
        let (left, right) = figure.panels.split_at_mut(1);
        let (acc_panel, vel_panel) = (&mut left[0], &mut right[0]);

        let window = self.selector.window(self.store, frame);
        let acc = &self.params.acceleration;
        let vel = &self.params.velocity;
        let mut failures = Vec::new();

        for &body in &self.bodies {
            let samples = window.body(body);
            if samples.clone().next().is_none() {
                if window.is_populated() {
                    failures.push(RenderFailure::MissingBody {
                        frame,
                        body,
                        cutoff: window.cutoff(),
                    });
                }
                continue;
            }
            let Some(color) = self.colors.get(body) else {
                continue;
            };
            let label = format!("Body {body}");
            let width = self.params.line_width;

            let acc_points = samples
                .clone()
                .map(|r| Vec2::new(r.time, r.value(acc.channel)))
                .collect();
            acc_panel
                .layers
                .push(Layer::line(label.clone(), color, width, acc_points));

            let vel_points = samples
                .map(|r| Vec2::new(r.time, r.value(vel.channel)))
                .collect();
            vel_panel
                .layers
                .push(Layer::line(label, color, width, vel_points));
        }

        for (panel, series, quantity) in [
            (acc_panel, acc, "Acceleration"),
            (vel_panel, vel, "Velocity"),
        ] {
            panel.title = format!("{quantity} ({}) vs Time (Frame {frame})", series.symbol);
            panel.x_label = "Time".to_string();
            panel.y_label = format!("{quantity} ({})", series.symbol);
            panel.legend = true;
        }

        failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::figure::LayerStyle;

    fn store() -> TraceStore {
        TraceStore::parse(
            "Time Body Mass Sx Sy Ux Uy Ax Ay
             0.00 1 1.0 0 0  1.0  2.0 -1.0 -2.0
             0.00 2 1.0 1 0 -1.0 -2.0  1.0  2.0
             0.01 1 1.0 0 0  1.1  2.1 -0.9 -1.9
             0.01 2 1.0 1 0 -1.1 -2.1  0.9  1.9",
        )
        .unwrap()
    }

    #[test]
    fn two_panels_with_titles() {
        let store = store();
        let mut rend =
            KinematicsRenderer::new(&store, FrameSelector::default(), KinematicsParams::default());
        assert_eq!(rend.total_frames(), 2);

        let mut fig = Figure::default();
        let failures = rend.render_frame(1, &mut fig);
        assert!(failures.is_empty());
        assert_eq!(fig.panels.len(), 2);
        assert_eq!(fig.wspace, 0.3);

        let [acc, vel] = &fig.panels[..] else {
            panic!("expected two panels");
        };
        assert_eq!(acc.title, "Acceleration (ax) vs Time (Frame 1)");
        assert_eq!(vel.title, "Velocity (ux) vs Time (Frame 1)");
        assert_eq!(acc.x_label, "Time");
        assert_eq!(vel.x_label, "Time");
        assert_eq!(acc.layers.len(), 2);
        assert_eq!(vel.layers.len(), 2);

        let body_1 = &acc.layers[0];
        assert_eq!(body_1.label, "Body 1");
        assert!(matches!(body_1.style, LayerStyle::Line { .. }));
        assert_eq!(
            body_1.points,
            [Vec2::new(0., -1.), Vec2::new(0.01, -0.9)]
        );
        assert_eq!(
            vel.layers[1].points,
            [Vec2::new(0., -1.), Vec2::new(0.01, -1.1)]
        );
    }

    #[test]
    fn vertical_components() {
        let store = store();
        let params = KinematicsParams::vertical(&store).unwrap();
        let mut rend = KinematicsRenderer::new(&store, FrameSelector::default(), params);
        let mut fig = Figure::default();
        rend.render_frame(0, &mut fig);
        assert_eq!(fig.panels[0].title, "Acceleration (ay) vs Time (Frame 0)");
        assert_eq!(fig.panels[1].title, "Velocity (uy) vs Time (Frame 0)");
        assert_eq!(fig.panels[0].layers[0].points, [Vec2::new(0., -2.)]);
        assert_eq!(fig.panels[1].layers[1].points, [Vec2::new(0., -2.)]);
    }

    #[test]
    fn vertical_needs_columns() {
        let store = TraceStore::parse("Time Body Sx Sy Ax Ux\n0 1 0 0 0 0").unwrap();
        assert!(matches!(
            KinematicsParams::vertical(&store),
            Err(ConfigurationError::UnknownChannel(_))
        ));
    }

    #[test]
    fn bodies_inferred_from_trace() {
        let store = store();
        let rend =
            KinematicsRenderer::new(&store, FrameSelector::default(), KinematicsParams::default());
        let rainbow = builtin_color_maps::rainbow();
        assert_eq!(rend.colors().len(), 2);
        assert_eq!(rend.colors().get(BodyId(1)), Some(rainbow.sample(0.)));
        assert_eq!(rend.colors().get(BodyId(2)), Some(rainbow.sample(1.)));
    }

    #[test]
    fn rendering_is_idempotent() {
        let store = store();
        let mut rend =
            KinematicsRenderer::new(&store, FrameSelector::default(), KinematicsParams::default());
        let mut first = Figure::default();
        rend.render_frame(1, &mut first);
        let mut fig = Figure::default();
        rend.render_frame(0, &mut fig);
        rend.render_frame(1, &mut fig);
        assert_eq!(fig, first);
    }

    #[test]
    fn empty_trace_has_no_frames() {
        let store = TraceStore::parse("Time Body Sx Sy Ax Ux").unwrap();
        let mut rend =
            KinematicsRenderer::new(&store, FrameSelector::default(), KinematicsParams::default());
        assert_eq!(rend.total_frames(), 0);
        let mut fig = Figure::default();
        assert!(rend.render_frame(0, &mut fig).is_empty());
        assert!(fig.is_blank());
    }
}
