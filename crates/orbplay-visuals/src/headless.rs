//! Playing animations without a window.

use std::{convert::Infallible, thread};

use web_time::Instant;

use crate::{
    animation::{Animation, FrameRenderer, Tick},
    playback::Surface,
};

/// When a [`HeadlessSurface`] stops playing an animation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CloseWhen {
    /// Once every frame has been rendered at least once.
    #[default]
    Finished,
    /// After this many ticks, whether they rendered anything or not.
    AfterTicks(usize),
}

/// Parameters for a [`HeadlessSurface`].
#[derive(Clone, Copy, Debug, Default)]
pub struct HeadlessParams {
    /// When to stop. Default: [`CloseWhen::Finished`].
    pub close: CloseWhen,
    /// Wait for the animation's interval between frames
    /// like a window would. Default: false, frames are rendered back to back.
    pub realtime: bool,
}

/// A surface that renders every frame into the animation's figure
/// but doesn't display it anywhere.
///
/// This runs the same tick loop as a [`RenderWindow`][crate::RenderWindow]
/// without needing a display or a GPU.
#[derive(Clone, Debug, Default)]
pub struct HeadlessSurface {
    params: HeadlessParams,
    ticks: usize,
}

impl HeadlessSurface {
    /// Create a headless surface.
    pub fn new(params: HeadlessParams) -> Self {
        Self { params, ticks: 0 }
    }

    /// The number of ticks performed by the most recent run.
    #[inline]
    pub fn ticks(&self) -> usize {
        self.ticks
    }
}

impl Surface for HeadlessSurface {
    type Error = Infallible;

    fn run_animation<R: FrameRenderer>(
        &mut self,
        anim: &mut Animation<R>,
    ) -> Result<(), Infallible> {
        self.ticks = 0;
        anim.start();
        let mut next_tick = Instant::now();

        loop {
            if self.params.realtime {
                let now = Instant::now();
                if now < next_tick {
                    thread::sleep(next_tick - now);
                }
            }

            let tick = anim.tick();
            self.ticks += 1;
            if let Tick::Rendered { .. } = tick {
                next_tick = Instant::now() + anim.params().interval;
            }

            let done = match (tick, self.params.close) {
                // a stopped animation will never do anything again
                (Tick::Inactive, _) => true,
                (_, CloseWhen::AfterTicks(limit)) => self.ticks >= limit,
                (Tick::Holding, CloseWhen::Finished) => true,
                (Tick::Rendered { .. }, CloseWhen::Finished) => {
                    anim.frames_rendered() >= anim.frame_count()
                }
            };
            if done {
                break;
            }
        }

        log::debug!(
            "Headless playback done after {} ticks, {} frames rendered",
            self.ticks,
            anim.frames_rendered()
        );
        anim.stop();
        Ok(())
    }
}
