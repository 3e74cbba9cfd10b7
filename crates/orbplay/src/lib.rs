//! `orbplay` plays back the trace of a multi-body simulation
//! as two animations running side by side:
//! a scatter plot of every body's path through the plane,
//! and the acceleration and velocity of every body against time.
//!
//! The data side lives in `orbplay-core`, re-exported at the root of this crate.
//! The animations are in [`visuals`].
//! [`app`] puts the two together the way the `orbplay` binary runs them.
//!
//! ```text
//! orbplay 3 --trace data.txt
//! ```

#![warn(missing_docs)]

#[doc(inline)]
pub use orbplay_core::*;

pub use orbplay_visuals as visuals;

pub mod app;
pub mod cli;
mod viewer;
