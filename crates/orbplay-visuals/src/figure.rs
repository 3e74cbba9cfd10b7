//! A retained description of what a view shows in one frame.
//!
//! Frame renderers fill a [`Figure`] with titles, labels and data layers,
//! and a surface turns it into pixels.
//! Keeping the two apart lets the animation logic run without a window,
//! and makes it possible to compare the output of two renders directly.

use orbplay_core::Vec2;

use crate::color_map::Color;

/// Everything drawn in one view for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Figure {
    /// Subplots, laid out left to right.
    pub panels: Vec<Panel>,
    /// Horizontal space between panels
    /// as a fraction of the average panel width.
    pub wspace: f32,
}

impl Default for Figure {
    fn default() -> Self {
        Self {
            panels: Vec::new(),
            wspace: 0.2,
        }
    }
}

impl Figure {
    /// Create an empty figure with the given number of panels.
    pub fn with_panels(panel_count: usize) -> Self {
        let mut fig = Self::default();
        fig.reset(panel_count);
        fig
    }

    /// Clear everything drawn so far and make sure there are exactly `panel_count` panels.
    ///
    /// Allocations are kept for reuse in the next frame.
    pub fn reset(&mut self, panel_count: usize) {
        self.panels.truncate(panel_count);
        for panel in &mut self.panels {
            panel.clear();
        }
        self.panels.resize_with(panel_count, Panel::default);
    }

    /// Whether nothing has been drawn in any panel.
    pub fn is_blank(&self) -> bool {
        self.panels.iter().all(|p| p.layers.is_empty())
    }
}

/// A single set of axes with its decorations and data.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Panel {
    /// Text shown above the axes.
    pub title: String,
    /// Label of the horizontal axis.
    pub x_label: String,
    /// Label of the vertical axis.
    pub y_label: String,
    /// Whether to show a legend listing the labels of the layers.
    pub legend: bool,
    /// Data layers, drawn in order.
    pub layers: Vec<Layer>,
}

impl Panel {
    /// Remove all layers and text.
    pub fn clear(&mut self) {
        self.title.clear();
        self.x_label.clear();
        self.y_label.clear();
        self.legend = false;
        self.layers.clear();
    }

    /// The smallest rectangle containing every point of every layer,
    /// or `None` if there are no points.
    pub fn data_bounds(&self) -> Option<Bounds> {
        let mut points = self.layers.iter().flat_map(|l| l.points.iter());
        let first = points.next()?;
        Some(points.fold(
            Bounds {
                min: *first,
                max: *first,
            },
            |b, p| Bounds {
                min: b.min.inf(p),
                max: b.max.sup(p),
            },
        ))
    }
}

/// An axis-aligned bounding rectangle in data coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    /// The corner with the smallest coordinates.
    pub min: Vec2,
    /// The corner with the largest coordinates.
    pub max: Vec2,
}

/// A series of data points drawn with one color and style.
#[derive(Clone, Debug, PartialEq)]
pub struct Layer {
    /// Text shown for this layer in the legend.
    pub label: String,
    /// Base color of the layer.
    pub color: Color,
    /// Opacity multiplied onto the color's own alpha.
    pub alpha: f32,
    /// How the points are drawn.
    pub style: LayerStyle,
    /// The data points in data coordinates.
    pub points: Vec<Vec2>,
}

/// How the points of a [`Layer`] are drawn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LayerStyle {
    /// Each point as a separate square marker.
    Scatter {
        /// Side length of the marker in logical pixels.
        marker_size: f32,
    },
    /// The points connected in order by line segments.
    Line {
        /// Width of the line in logical pixels.
        width: f32,
    },
}

impl Layer {
    /// A layer of scattered markers.
    pub fn scatter(
        label: impl Into<String>,
        color: Color,
        alpha: f32,
        marker_size: f32,
        points: Vec<Vec2>,
    ) -> Self {
        Self {
            label: label.into(),
            color,
            alpha,
            style: LayerStyle::Scatter { marker_size },
            points,
        }
    }

    /// An opaque polyline.
    pub fn line(label: impl Into<String>, color: Color, width: f32, points: Vec<Vec2>) -> Self {
        Self {
            label: label.into(),
            color,
            alpha: 1.,
            style: LayerStyle::Line { width },
            points,
        }
    }
}
