//! Frame-by-frame playback control.

use std::time::Duration;

use orbplay_core::BodyId;

use crate::figure::Figure;

/// Something that can draw any single frame of an animation into a [`Figure`].
///
/// Rendering must be idempotent:
/// calling [`render_frame`][Self::render_frame] twice with the same frame
/// must produce the same figure,
/// regardless of what was rendered in between.
pub trait FrameRenderer {
    /// Short name of the view, used in logs.
    fn name(&self) -> &str;

    /// The number of frames in the animation.
    fn total_frames(&self) -> usize;

    /// Replace the contents of `figure` with the given frame.
    ///
    /// Problems that only affect part of the frame are returned
    /// instead of aborting the render.
    fn render_frame(&mut self, frame: usize, figure: &mut Figure) -> Vec<RenderFailure>;
}

/// A problem encountered while rendering a frame
/// that caused part of the frame to be left out.
#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum RenderFailure {
    /// A body has no samples visible in the frame
    /// even though other bodies do.
    #[error("frame {frame}: body {body} has no samples up to t = {cutoff}")]
    MissingBody {
        /// The frame being rendered.
        frame: usize,
        /// The body with no samples.
        body: BodyId,
        /// The time cutoff of the frame.
        cutoff: f64,
    },
}

/// What to do after the last frame has been shown.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlaybackEnd {
    /// Keep showing the last frame until stopped.
    #[default]
    Halt,
    /// Start over from the first frame.
    Loop,
}

/// Parameters to control aspects of an [`Animation`].
#[derive(Clone, Copy, Debug)]
pub struct AnimationParams {
    /// Wall-clock time between consecutive frames. Default: 1 ms.
    ///
    /// This is a lower bound;
    /// frames that take longer to draw delay the following ones
    /// rather than causing frames to be skipped.
    pub interval: Duration,
    /// Behavior after the last frame. Default: [`PlaybackEnd::Halt`].
    pub end: PlaybackEnd,
}

impl Default for AnimationParams {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(1),
            end: PlaybackEnd::default(),
        }
    }
}

/// Lifecycle of an [`Animation`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackState {
    /// Created but not started.
    Idle,
    /// Started and not yet stopped.
    Running {
        /// The frame that the next tick will render.
        next_frame: usize,
    },
    /// Stopped; will not render anything anymore.
    Stopped,
}

/// The result of advancing an [`Animation`] by one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tick {
    /// A frame was rendered into the figure.
    Rendered {
        /// The frame that was rendered.
        frame: usize,
    },
    /// Playback has reached the end and is holding the last frame
    /// (or there are no frames at all).
    Holding,
    /// The animation is not running.
    Inactive,
}

/// An animation driven by a [`FrameRenderer`].
///
/// The animation doesn't keep time by itself.
/// A surface calls [`tick`][Self::tick] every
/// [`interval`][AnimationParams::interval]
/// and displays [`figure`][Self::figure] whenever a frame was rendered.
/// See [`HeadlessSurface`][crate::HeadlessSurface]
/// and [`RenderWindow`][crate::RenderWindow].
pub struct Animation<R: FrameRenderer> {
    renderer: R,
    params: AnimationParams,
    frame_count: usize,
    state: PlaybackState,
    figure: Figure,
    frames_rendered: usize,
    failures: usize,
}

impl<R: FrameRenderer> Animation<R> {
    /// Create an animation of every frame the renderer offers.
    pub fn new(renderer: R, params: AnimationParams) -> Self {
        let frame_count = renderer.total_frames();
        Self {
            renderer,
            params,
            frame_count,
            state: PlaybackState::Idle,
            figure: Figure::default(),
            frames_rendered: 0,
            failures: 0,
        }
    }

    /// Begin playback from the first frame.
    ///
    /// Has no effect unless the animation is idle.
    pub fn start(&mut self) {
        if self.state != PlaybackState::Idle {
            return;
        }
        log::info!(
            "Starting {} animation: {} frames at {:?} intervals",
            self.renderer.name(),
            self.frame_count,
            self.params.interval,
        );
        self.state = PlaybackState::Running { next_frame: 0 };
    }

    /// Render the next frame, if there is one.
    ///
    /// Rendering failures are logged as warnings and don't stop playback.
    pub fn tick(&mut self) -> Tick {
        let PlaybackState::Running { next_frame } = self.state else {
            return Tick::Inactive;
        };
        if next_frame >= self.frame_count {
            return Tick::Holding;
        }

        let failures = self.renderer.render_frame(next_frame, &mut self.figure);
        for failure in &failures {
            log::warn!("{} view: {failure}", self.renderer.name());
        }
        self.failures += failures.len();
        self.frames_rendered += 1;

        let following = next_frame + 1;
        let following = match self.params.end {
            PlaybackEnd::Loop if following == self.frame_count => 0,
            _ => following,
        };
        self.state = PlaybackState::Running {
            next_frame: following,
        };
        log::trace!("{} view: rendered frame {next_frame}", self.renderer.name());
        Tick::Rendered { frame: next_frame }
    }

    /// Stop playback. Further ticks do nothing.
    pub fn stop(&mut self) {
        if self.state != PlaybackState::Stopped {
            log::info!(
                "Stopping {} animation after {} frames",
                self.renderer.name(),
                self.frames_rendered
            );
        }
        self.state = PlaybackState::Stopped;
    }

    /// The current lifecycle state.
    #[inline]
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Whether the animation has been started and not stopped.
    #[inline]
    pub fn is_running(&self) -> bool {
        matches!(self.state, PlaybackState::Running { .. })
    }

    /// The most recently rendered frame.
    #[inline]
    pub fn figure(&self) -> &Figure {
        &self.figure
    }

    /// The number of frames in the animation.
    #[inline]
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// How many times a frame has been rendered, counting repeats when looping.
    #[inline]
    pub fn frames_rendered(&self) -> usize {
        self.frames_rendered
    }

    /// How many rendering failures have been reported so far.
    #[inline]
    pub fn failures(&self) -> usize {
        self.failures
    }

    /// The parameters the animation was created with.
    #[inline]
    pub fn params(&self) -> &AnimationParams {
        &self.params
    }

    /// The renderer producing the frames.
    #[inline]
    pub fn renderer(&self) -> &R {
        &self.renderer
    }
}
