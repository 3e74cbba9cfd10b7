//! This is the core crate containing the data side of `orbplay`
//! (everything except the visuals):
//! loading a simulation trace, validating it against the expected body count,
//! and cutting it into per-frame windows.
//! See the `orbplay` crate's documentation for an overview.

#![warn(missing_docs)]

pub mod record;
#[doc(inline)]
pub use record::{BodyCount, BodyId, Channel, TraceRecord};

pub mod store;
#[doc(inline)]
pub use store::{ConfigurationError, DataFormatError, TraceError, TraceStore};

pub mod window;
#[doc(inline)]
pub use window::{total_frames, FrameSelector, FrameWindow, DEFAULT_DT};

// nalgebra re-exports of common types for convenience

pub use nalgebra as na;
/// Type alias for a 2D `nalgebra` vector.
pub type Vec2 = na::Vector2<f64>;
