//! Turning a [`Figure`] into shapes and text in pixel space.
//!
//! Geometry follows the usual subplot conventions:
//! axes fill the middle of the figure with fixed fractional margins,
//! data limits get a 5% margin on each side,
//! and ticks are placed at round numbers.
//!
//! Pixel coordinates have their origin at the top left corner of the viewport
//! with the y axis pointing down.

use itertools::{izip, Itertools};
use nalgebra as na;
use orbplay_core::Vec2;

use crate::{
    color_map::Color,
    figure::{Figure, LayerStyle, Panel},
};

type Px = na::Vector2<f32>;

// subplot margins as fractions of the figure size
const LEFT: f32 = 0.125;
const RIGHT: f32 = 0.9;
const BOTTOM: f32 = 0.11;
const TOP: f32 = 0.88;

/// Fraction of the data span added on each side of the data limits.
const DATA_MARGIN: f64 = 0.05;
const MAX_TICKS: usize = 6;

// sizes in logical pixels
const FONT_SIZE: f32 = 12.;
const TITLE_FONT_SIZE: f32 = 14.;
const LEGEND_FONT_SIZE: f32 = 11.;
pub(crate) const LINE_HEIGHT: f32 = 1.3;
/// Rough average glyph width relative to the font size,
/// used to size the legend box before text is shaped.
const CHAR_WIDTH: f32 = 0.6;
const TICK_LENGTH: f32 = 4.;
const PAD: f32 = 4.;
const FRAME_WIDTH: f32 = 1.;

const INK: Color = [0, 0, 0, u8::MAX];
const LEGEND_BORDER: Color = [204, 204, 204, u8::MAX];
const LEGEND_BACKGROUND: Color = [u8::MAX; 4];

/// A vertex of the triangles drawn by the shapes pipeline.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub(crate) struct Vertex {
    /// Position in pixels.
    pub position: [f32; 2],
    /// Color in linear RGB with straight alpha.
    pub color: [f32; 4],
}

/// Where to place a piece of text relative to its position.
///
/// For example, with an anchor of `TopMid`, the text will be placed
/// relative to position `x` as follows:
/// ```text
/// ----x----
/// |content|
/// ---------
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[allow(unused)]
pub(crate) enum TextAnchor {
    TopLeft,
    TopMid,
    TopRight,
    MidLeft,
    Center,
    MidRight,
    BottomLeft,
    BottomMid,
    BottomRight,
}

/// A piece of text to draw.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct TextItem {
    pub text: String,
    pub position: Px,
    pub anchor: TextAnchor,
    /// Font size in physical pixels.
    pub font_size: f32,
    pub color: Color,
}

/// Everything needed to draw a figure:
/// a triangle list and a set of text items.
#[derive(Clone, Debug, Default)]
pub(crate) struct Scene {
    pub vertices: Vec<Vertex>,
    pub texts: Vec<TextItem>,
}

impl Scene {
    fn triangle(&mut self, corners: [Px; 3], color: [f32; 4]) {
        self.vertices.extend(corners.map(|p| Vertex {
            position: [p.x, p.y],
            color,
        }));
    }

    /// An axis-aligned rectangle.
    fn quad(&mut self, min: Px, max: Px, color: [f32; 4]) {
        let (tr, bl) = (Px::new(max.x, min.y), Px::new(min.x, max.y));
        self.triangle([min, bl, tr], color);
        self.triangle([tr, bl, max], color);
    }

    /// A straight line of the given width with square ends.
    fn segment(&mut self, start: Px, end: Px, width: f32, color: [f32; 4]) {
        let dir = end - start;
        let len = dir.norm();
        if len <= f32::EPSILON {
            return;
        }
        let normal = Px::new(-dir.y, dir.x) * (0.5 * width / len);
        self.triangle([start + normal, start - normal, end + normal], color);
        self.triangle([end + normal, start - normal, end - normal], color);
    }

    /// The outline of a rectangle, drawn inside-out around the edges.
    fn outline(&mut self, rect: Rect, width: f32, color: [f32; 4]) {
        let hw = 0.5 * width;
        let (min, max) = (rect.min, rect.max);
        self.quad(Px::new(min.x - hw, min.y - hw), Px::new(max.x + hw, min.y + hw), color);
        self.quad(Px::new(min.x - hw, max.y - hw), Px::new(max.x + hw, max.y + hw), color);
        self.quad(Px::new(min.x - hw, min.y + hw), Px::new(min.x + hw, max.y - hw), color);
        self.quad(Px::new(max.x - hw, min.y + hw), Px::new(max.x + hw, max.y - hw), color);
    }

    fn text(&mut self, text: &str, position: Px, anchor: TextAnchor, font_size: f32) {
        if text.is_empty() {
            return;
        }
        self.texts.push(TextItem {
            text: text.to_string(),
            position,
            anchor,
            font_size,
            color: INK,
        });
    }
}

/// An axis-aligned rectangle in pixel space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Rect {
    pub min: Px,
    pub max: Px,
}

impl Rect {
    #[inline]
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    #[inline]
    pub fn center(&self) -> Px {
        (self.min + self.max) / 2.
    }
}

/// A closed interval of data values with a nonzero span.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    const UNIT: Self = Self { min: 0., max: 1. };

    /// Limits for data spanning `min..=max`, with margins added.
    ///
    /// A single value gets a range around it
    /// so that it's drawn in the middle of the axes.
    pub fn autoscale(min: f64, max: f64) -> Self {
        if max > min {
            let margin = DATA_MARGIN * (max - min);
            return Self {
                min: min - margin,
                max: max + margin,
            };
        }
        // tiny magnitudes round to a zero pad
        let pad = match DATA_MARGIN * min.abs() {
            pad if pad > 0. && min - pad < min + pad => pad,
            _ => DATA_MARGIN,
        };
        Self::autoscale(min - pad, min + pad)
    }

    #[inline]
    pub fn span(&self) -> f64 {
        self.max - self.min
    }
}

/// Placement of the axes of each panel in a figure of the given size.
pub(crate) fn panel_rects(count: usize, wspace: f32, size: Px) -> Vec<Rect> {
    if count == 0 {
        return Vec::new();
    }
    let (left, right) = (LEFT * size.x, RIGHT * size.x);
    let (top, bottom) = ((1. - TOP) * size.y, (1. - BOTTOM) * size.y);
    // n panels and n-1 gaps, each gap `wspace` panel widths wide
    let n = count as f32;
    let panel_width = (right - left) / (n + (n - 1.) * wspace);
    let stride = panel_width * (1. + wspace);
    (0..count)
        .map(|i| {
            let x = left + i as f32 * stride;
            Rect {
                min: Px::new(x, top),
                max: Px::new(x + panel_width, bottom),
            }
        })
        .collect()
}

/// Round numbers to place ticks at.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Ticks {
    pub step: f64,
    pub values: Vec<f64>,
}

/// Pick ticks at multiples of 1, 2 or 5 times a power of ten,
/// at most about `max_ticks` of them, all within the range.
pub(crate) fn nice_ticks(range: Range, max_ticks: usize) -> Ticks {
    let raw_step = range.span() / max_ticks.max(1) as f64;
    let magnitude = 10f64.powf(raw_step.log10().floor());
    let step = [1., 2., 5., 10.]
        .into_iter()
        .map(|m| m * magnitude)
        .find(|&s| s >= raw_step)
        .unwrap_or(10. * magnitude);

    let first = (range.min / step).ceil();
    let tolerance = step * 1e-9;
    let values = (0..)
        .map(|i| (first + i as f64) * step)
        .take_while(|&t| t <= range.max + tolerance)
        // avoid printing "-0"
        .map(|t| if t.abs() < tolerance { 0. } else { t })
        .collect();
    Ticks { step, values }
}

/// Format a tick value with just enough decimals for the tick step.
pub(crate) fn format_tick(value: f64, step: f64) -> String {
    let decimals = (-step.log10().floor()).max(0.) as usize;
    format!("{value:.decimals$}")
}

/// Convert an sRGB color and extra opacity into the shader's vertex color.
pub(crate) fn linear_color(color: Color, alpha: f32) -> [f32; 4] {
    let lin: palette::LinSrgb<f32> = palette::Srgb::new(color[0], color[1], color[2]).into_linear();
    let a = color[3] as f32 / u8::MAX as f32 * alpha;
    [lin.red, lin.green, lin.blue, a]
}

/// Mapping from data coordinates to pixels for one panel.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Axes {
    pub rect: Rect,
    pub x: Range,
    pub y: Range,
}

impl Axes {
    /// Fit the axes limits to the data in the panel.
    pub fn fit(panel: &Panel, rect: Rect) -> Self {
        let (x, y) = match panel.data_bounds() {
            Some(b) => (
                Range::autoscale(b.min.x, b.max.x),
                Range::autoscale(b.min.y, b.max.y),
            ),
            None => (Range::UNIT, Range::UNIT),
        };
        Self { rect, x, y }
    }

    #[inline]
    pub fn x_to_pixel(&self, x: f64) -> f32 {
        self.rect.min.x + ((x - self.x.min) / self.x.span()) as f32 * self.rect.width()
    }

    #[inline]
    pub fn y_to_pixel(&self, y: f64) -> f32 {
        self.rect.max.y - ((y - self.y.min) / self.y.span()) as f32 * self.rect.height()
    }

    #[inline]
    pub fn to_pixel(&self, p: &Vec2) -> Px {
        Px::new(self.x_to_pixel(p.x), self.y_to_pixel(p.y))
    }
}

/// Lay out a whole figure in a viewport of the given size in physical pixels.
///
/// `scale` is the ratio of physical to logical pixels.
pub(crate) fn compose(figure: &Figure, viewport: (u32, u32), scale: f32) -> Scene {
    let mut scene = Scene::default();
    let size = Px::new(viewport.0 as f32, viewport.1 as f32);
    let rects = panel_rects(figure.panels.len(), figure.wspace, size);
    for (panel, rect) in izip!(&figure.panels, rects) {
        compose_panel(&mut scene, panel, rect, scale);
    }
    scene
}

fn compose_panel(scene: &mut Scene, panel: &Panel, rect: Rect, scale: f32) {
    let axes = Axes::fit(panel, rect);

    // data first so that the frame and legend are drawn over it
    for layer in &panel.layers {
        let color = linear_color(layer.color, layer.alpha);
        match layer.style {
            LayerStyle::Scatter { marker_size } => {
                let half = Px::repeat(0.5 * marker_size * scale);
                for p in &layer.points {
                    let center = axes.to_pixel(p);
                    scene.quad(center - half, center + half, color);
                }
            }
            LayerStyle::Line { width } => {
                for (a, b) in layer.points.iter().tuple_windows() {
                    scene.segment(axes.to_pixel(a), axes.to_pixel(b), width * scale, color);
                }
            }
        }
    }

    let ink = linear_color(INK, 1.);
    let line_w = FRAME_WIDTH * scale;
    let hw = 0.5 * line_w;
    let tick_len = TICK_LENGTH * scale;
    let pad = PAD * scale;
    let font = FONT_SIZE * scale;

    scene.outline(rect, line_w, ink);

    let x_ticks = nice_ticks(axes.x, MAX_TICKS);
    for &t in &x_ticks.values {
        let x = axes.x_to_pixel(t);
        let base = rect.max.y;
        scene.quad(Px::new(x - hw, base), Px::new(x + hw, base + tick_len), ink);
        scene.text(
            &format_tick(t, x_ticks.step),
            Px::new(x, base + tick_len + pad),
            TextAnchor::TopMid,
            font,
        );
    }
    let y_ticks = nice_ticks(axes.y, MAX_TICKS);
    for &t in &y_ticks.values {
        let y = axes.y_to_pixel(t);
        let base = rect.min.x;
        scene.quad(Px::new(base - tick_len, y - hw), Px::new(base, y + hw), ink);
        scene.text(
            &format_tick(t, y_ticks.step),
            Px::new(base - tick_len - pad, y),
            TextAnchor::MidRight,
            font,
        );
    }

    let center = rect.center();
    let below_ticks = rect.max.y + tick_len + 2. * pad + font * LINE_HEIGHT;
    scene.text(
        &panel.x_label,
        Px::new(center.x, below_ticks),
        TextAnchor::TopMid,
        font,
    );
    // the y label sits above the top left corner, with the title above that
    let mut above = rect.min.y - pad;
    if !panel.y_label.is_empty() {
        scene.text(
            &panel.y_label,
            Px::new(rect.min.x, above),
            TextAnchor::BottomLeft,
            font,
        );
        above -= font * LINE_HEIGHT + pad;
    }
    scene.text(
        &panel.title,
        Px::new(center.x, above),
        TextAnchor::BottomMid,
        TITLE_FONT_SIZE * scale,
    );

    if panel.legend && !panel.layers.is_empty() {
        compose_legend(scene, panel, rect, scale);
    }
}

/// A box in the upper right corner of the axes listing every layer.
fn compose_legend(scene: &mut Scene, panel: &Panel, rect: Rect, scale: f32) {
    let font = LEGEND_FONT_SIZE * scale;
    let line_h = font * LINE_HEIGHT;
    let pad = PAD * scale;
    let swatch_w = 2. * font;
    let longest = panel
        .layers
        .iter()
        .map(|l| l.label.chars().count())
        .max()
        .unwrap_or(0);
    let text_w = longest as f32 * CHAR_WIDTH * font;
    let size = Px::new(
        3. * pad + swatch_w + text_w,
        2. * pad + line_h * panel.layers.len() as f32,
    );
    let min = Px::new(rect.max.x - pad - size.x, rect.min.y + pad);
    let legend_rect = Rect {
        min,
        max: min + size,
    };

    scene.quad(
        legend_rect.min,
        legend_rect.max,
        linear_color(LEGEND_BACKGROUND, 0.8),
    );
    scene.outline(legend_rect, scale, linear_color(LEGEND_BORDER, 1.));

    for (i, layer) in panel.layers.iter().enumerate() {
        let y = min.y + pad + line_h * (i as f32 + 0.5);
        let swatch_start = Px::new(min.x + pad, y);
        let swatch_end = Px::new(min.x + pad + swatch_w, y);
        let color = linear_color(layer.color, layer.alpha);
        match layer.style {
            LayerStyle::Scatter { marker_size } => {
                let half = Px::repeat(0.5 * (marker_size * scale).max(0.5 * font));
                let center = (swatch_start + swatch_end) / 2.;
                scene.quad(center - half, center + half, color);
            }
            LayerStyle::Line { width } => {
                scene.segment(swatch_start, swatch_end, width * scale, color);
            }
        }
        scene.text(
            &layer.label,
            Px::new(swatch_end.x + pad, y),
            TextAnchor::MidLeft,
            font,
        );
    }
}
