//! Animated views of multi-body simulation traces.
//!
//! A view is a [`FrameRenderer`] that draws any frame of a trace into a [`Figure`].
//! Wrap one in an [`Animation`] and play it on a [`Surface`],
//! either a [`RenderWindow`] for watching in real time
//! or a [`HeadlessSurface`] for running without a display.
//! [`play_concurrently`] plays several sessions side by side.

#![warn(missing_docs)]

mod animation;
#[doc(inline)]
pub use animation::{
    Animation, AnimationParams, FrameRenderer, PlaybackEnd, PlaybackState, RenderFailure, Tick,
};

mod color_map;
#[doc(inline)]
pub use color_map::{builtin_color_maps, BodyColors, Color, ColorMap, Palette};

mod figure;
#[doc(inline)]
pub use figure::{Bounds, Figure, Layer, LayerStyle, Panel};

mod headless;
#[doc(inline)]
pub use headless::{CloseWhen, HeadlessParams, HeadlessSurface};

mod kinematics;
#[doc(inline)]
pub use kinematics::{KinematicsParams, KinematicsRenderer, Series};

pub(crate) mod layout;

pub(crate) mod pipelines;

mod playback;
#[doc(inline)]
pub use playback::{
    play_concurrently, PlaybackReport, Session, SessionError, SessionOutcome, SessionSummary,
    SessionTask, Surface,
};

mod position;
#[doc(inline)]
pub use position::{PositionParams, PositionRenderer};

mod render_window;
#[doc(inline)]
pub use render_window::{RenderWindow, WindowError, WindowParams};

pub use palette;
