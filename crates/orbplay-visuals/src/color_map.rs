//! Color maps and palettes for telling bodies apart.
//!
//! Each body gets a fixed color for the whole playback.
//! Colors are sampled from a [`Palette`] at evenly spaced points in `[0, 1]`,
//! so the first body always gets the color at 0 and the last one the color at 1.

use std::collections::BTreeMap;

use itertools::izip;
use orbplay_core::{BodyCount, BodyId};

/// Colors are represented as 8-bit sRGB values with an alpha channel.
pub type Color = [u8; 4];
pub(crate) const LUT_SIZE: usize = 256;

/// A continuous map from the interval `[0, 1]` to colors.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorMap {
    /// Name used to select the map with [`Palette::by_name`].
    pub name: String,
    /// The color map expressed as a lookup table.
    ///
    /// This doesn't restrict us to interpolating in any specific color space
    /// and makes sampling a single index operation.
    pub(crate) lut: [Color; LUT_SIZE],
}

impl ColorMap {
    /// Create a color map from an [`enterpolation`] curve
    /// interpolating [`palette`] colors.
    pub fn from_curve<Curve, C>(name: impl Into<String>, curve: Curve) -> Self
    where
        C: palette::IntoColor<palette::Srgb>,
        Curve: enterpolation::Curve<f32, Output = C>,
    {
        let vals = curve.take(LUT_SIZE);
        let mut lut = [[0; 4]; LUT_SIZE];
        for (color, lut_val) in izip!(vals, lut.iter_mut()) {
            let c: palette::Srgb = color.into_color();
            *lut_val = [as_u8(c.red), as_u8(c.green), as_u8(c.blue), u8::MAX];
        }
        Self {
            name: name.into(),
            lut,
        }
    }

    /// Create a color map from a function
    /// that takes a float value between 0 and 1 and returns a color.
    pub fn from_fn(name: impl Into<String>, curve: impl Fn(f32) -> Color) -> Self {
        // minus one because we have LUT_SIZE points
        // and thus (LUT_SIZE-1) gaps between points in the interval
        let increment = 1.0 / (LUT_SIZE - 1) as f32;
        Self {
            name: name.into(),
            lut: std::array::from_fn(|i| curve(increment * i as f32)),
        }
    }

    /// Get the color at a point in `[0, 1]`.
    ///
    /// Values outside the interval are clamped to its ends.
    pub fn sample(&self, x: f64) -> Color {
        self.lut[quantize(x, LUT_SIZE)]
    }
}

/// A set of colors to assign to bodies.
#[derive(Clone, Debug, PartialEq)]
pub enum Palette {
    /// A short list of distinct colors.
    ///
    /// The interval `[0, 1]` is split into equal parts, one per color.
    /// With more bodies than colors, some bodies share a color.
    Discrete {
        /// Name used to select the palette with [`Palette::by_name`].
        name: String,
        /// The colors in order.
        colors: Vec<Color>,
    },
    /// A smooth gradient.
    Continuous(ColorMap),
}

impl Palette {
    /// Look up one of the [builtin palettes][builtin_color_maps] by name.
    pub fn by_name(name: &str) -> Option<Self> {
        builtin_color_maps::all_builtins()
            .into_iter()
            .find(|p| p.name() == name)
    }

    /// The name of the palette.
    pub fn name(&self) -> &str {
        match self {
            Self::Discrete { name, .. } => name,
            Self::Continuous(map) => &map.name,
        }
    }

    /// Get the color at a point in `[0, 1]`.
    pub fn sample(&self, x: f64) -> Color {
        match self {
            Self::Discrete { colors, .. } => match colors.len() {
                0 => [0, 0, 0, u8::MAX],
                len => colors[quantize(x, len)],
            },
            Self::Continuous(map) => map.sample(x),
        }
    }
}

/// Map a point in `[0, 1]` to one of `len` equally sized bins.
///
/// The point 1 belongs to the last bin.
fn quantize(x: f64, len: usize) -> usize {
    let scaled = (x.clamp(0., 1.) * len as f64).floor() as usize;
    scaled.min(len - 1)
}

fn as_u8(channel: f32) -> u8 {
    (u8::MAX as f32 * channel.clamp(0., 1.)).round() as u8
}

/// `count` evenly spaced points from 0 to 1 inclusive.
///
/// A single point is placed at 0.
pub fn sample_points(count: usize) -> impl ExactSizeIterator<Item = f64> {
    let step = if count > 1 {
        1. / (count - 1) as f64
    } else {
        0.
    };
    (0..count).map(move |i| i as f64 * step)
}

/// The color assigned to each body of a trace.
#[derive(Clone, Debug, PartialEq)]
pub struct BodyColors {
    colors: BTreeMap<BodyId, Color>,
}

impl BodyColors {
    /// Assign colors to the bodies `1..=count`.
    pub fn assign(count: BodyCount, palette: &Palette) -> Self {
        Self::for_bodies(count.ids(), palette)
    }

    /// Assign colors to the given bodies,
    /// sampling the palette in the order the bodies are given.
    ///
    /// Bodies appearing more than once keep the color of their last position.
    pub fn for_bodies(bodies: impl ExactSizeIterator<Item = BodyId>, palette: &Palette) -> Self {
        let points = sample_points(bodies.len());
        Self {
            colors: izip!(bodies, points)
                .map(|(body, x)| (body, palette.sample(x)))
                .collect(),
        }
    }

    /// The color of a body, if one was assigned.
    #[inline]
    pub fn get(&self, body: BodyId) -> Option<Color> {
        self.colors.get(&body).copied()
    }

    /// Iterate over bodies and their colors in ascending order of id.
    pub fn iter(&self) -> impl Iterator<Item = (BodyId, Color)> + '_ {
        self.colors.iter().map(|(&body, &color)| (body, color))
    }

    /// The number of bodies with a color.
    #[inline]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Whether no body has a color.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

pub mod builtin_color_maps {
    //! A collection of premade palettes.
    //!
    //! Contains the following:
    //! - [`tab10`], the default for positions
    //! - [`rainbow`], the default for kinematics
    //! - [`sunset`]
    //! - [`molentum`]

    use super::{Color, ColorMap, Palette};
    use enterpolation::linear::ConstEquidistantLinear;
    use palette::{FromColor, Oklab, Srgb};

    /// Convenience function for converting colors
    /// given as sRGB hexadecimal codes in 0xRRGGBB format
    /// (easily obtained from standard color pickers) to Oklab.
    ///
    /// Interpolating in Oklab gives nice perceptually uniform gradients,
    /// which is desirable for color maps.
    fn srgb_hex(val: u32) -> Oklab {
        let srgb_u8 = Srgb::from(val);
        let srgb_float: Srgb<f32> = srgb_u8.into_format();
        Oklab::from_color(srgb_float)
    }

    /// Convenience function for converting floating point sRGB values
    /// to an Oklab color.
    fn srgb_float(r: f32, g: f32, b: f32) -> Oklab {
        Oklab::from_color(Srgb::new(r, g, b))
    }

    /// An opaque 8-bit color from a 0xRRGGBB code.
    fn hex_color(val: u32) -> Color {
        let c: Srgb<u8> = Srgb::from(val);
        [c.red, c.green, c.blue, u8::MAX]
    }

    /// Convenience function to make a color map
    /// as an array of equally spaced colors in Oklab space.
    fn linear_equidistant<const COUNT: usize>(name: &str, colors: [Oklab; COUNT]) -> ColorMap {
        ColorMap::from_curve(name, ConstEquidistantLinear::equidistant_unchecked(colors))
    }

    /// A collection of all builtin palettes.
    pub fn all_builtins() -> Vec<Palette> {
        vec![
            tab10(),
            Palette::Continuous(rainbow()),
            Palette::Continuous(sunset()),
            Palette::Continuous(molentum()),
        ]
    }

    /// Ten distinct colors that are easy to tell apart.
    pub fn tab10() -> Palette {
        Palette::Discrete {
            name: "tab10".to_string(),
            colors: [
                0x1f77b4, 0xff7f0e, 0x2ca02c, 0xd62728, 0x9467bd, 0x8c564b, 0xe377c2, 0x7f7f7f,
                0xbcbd22, 0x17becf,
            ]
            .into_iter()
            .map(hex_color)
            .collect(),
        }
    }

    /// A full sweep from purple through blue, green and yellow to red.
    pub fn rainbow() -> ColorMap {
        ColorMap::from_fn("rainbow", |x| {
            let r = (2. * x - 0.5).abs();
            let g = (std::f32::consts::PI * x).sin();
            let b = (std::f32::consts::FRAC_PI_2 * x).cos();
            [super::as_u8(r), super::as_u8(g), super::as_u8(b), u8::MAX]
        })
    }

    /// A perceptually uniform map from dark blue to bright yellow.
    pub fn sunset() -> ColorMap {
        linear_equidistant(
            "sunset",
            [
                srgb_float(0.00, 0.05, 0.20),
                srgb_float(0.70, 0.10, 0.20),
                srgb_float(0.95, 0.90, 0.30),
            ],
        )
    }

    /// A blue and lime color scheme.
    pub fn molentum() -> ColorMap {
        linear_equidistant(
            "molentum",
            [srgb_hex(0x161f2e), srgb_hex(0x278c63), srgb_hex(0xbada55)],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{builtin_color_maps::*, *};
    use itertools::Itertools;

    #[test]
    fn sample_points_are_evenly_spaced() {
        assert_eq!(sample_points(0).count(), 0);
        assert_eq!(sample_points(1).collect_vec(), [0.]);
        assert_eq!(sample_points(3).collect_vec(), [0., 0.5, 1.]);
    }

    #[test]
    fn discrete_palette_bins() {
        let tab = tab10();
        let Palette::Discrete { colors, .. } = &tab else {
            panic!("tab10 should be discrete");
        };
        assert_eq!(colors.len(), 10);
        assert_eq!(colors[0], [0x1f, 0x77, 0xb4, 255]);
        assert_eq!(tab.sample(0.), colors[0]);
        assert_eq!(tab.sample(0.5), colors[5]);
        // the end of the interval falls into the last bin
        assert_eq!(tab.sample(1.), colors[9]);
        assert_eq!(tab.sample(7.), colors[9]);
        assert_eq!(tab.sample(-1.), colors[0]);
    }

    #[test]
    fn ten_bodies_get_distinct_colors() {
        let count = BodyCount::new(10).unwrap();
        let colors = BodyColors::assign(count, &tab10());
        assert_eq!(colors.len(), 10);
        assert!(colors.iter().map(|(_, c)| c).all_unique());
    }

    #[test]
    fn assignment_is_deterministic() {
        for n in 1..=12 {
            let count = BodyCount::new(n).unwrap();
            for palette in all_builtins() {
                let first = BodyColors::assign(count, &palette);
                let second = BodyColors::assign(count, &palette);
                assert_eq!(first, second);
                assert_eq!(first.len(), n);
                assert!(count.ids().all(|id| first.get(id).is_some()));
            }
        }
    }

    #[test]
    fn first_and_last_body_take_the_ends() {
        let map = rainbow();
        let count = BodyCount::new(4).unwrap();
        let colors = BodyColors::assign(count, &Palette::Continuous(map.clone()));
        assert_eq!(colors.get(BodyId(1)), Some(map.lut[0]));
        assert_eq!(colors.get(BodyId(4)), Some(map.lut[LUT_SIZE - 1]));
        assert_eq!(colors.get(BodyId(5)), None);
    }

    #[test]
    fn rainbow_ends() {
        let map = rainbow();
        // purple at the start, red at the end
        assert_eq!(map.sample(0.), [128, 0, 255, 255]);
        assert_eq!(map.sample(1.), [255, 0, 0, 255]);
    }

    #[test]
    fn colors_for_arbitrary_ids() {
        let ids = [BodyId(3), BodyId(7)];
        let colors = BodyColors::for_bodies(ids.into_iter(), &tab10());
        assert_eq!(colors.get(BodyId(3)), Some(tab10().sample(0.)));
        assert_eq!(colors.get(BodyId(7)), Some(tab10().sample(1.)));
    }

    #[test]
    fn palettes_by_name() {
        for name in ["tab10", "rainbow", "sunset", "molentum"] {
            assert_eq!(Palette::by_name(name).map(|p| p.name().to_string()), Some(name.into()));
        }
        assert_eq!(Palette::by_name("viridis"), None);
    }
}
