//! Loading a trace and playing both views of it, as the `orbplay` binary does.

use anyhow::Context;
use orbplay_core::{total_frames, BodyCount, ConfigurationError, FrameSelector, TraceStore};
use orbplay_visuals::{
    play_concurrently, Animation, HeadlessParams, HeadlessSurface, KinematicsParams,
    KinematicsRenderer, PlaybackReport, PositionParams, PositionRenderer, RenderWindow, Session,
    SessionOutcome, SessionTask,
};

use crate::{
    cli::{Args, View},
    viewer,
};

/// A trace that has been checked against the command line options
/// and is ready to be played.
#[derive(Debug)]
pub struct Playback {
    store: TraceStore,
    body_count: BodyCount,
    kinematics: KinematicsParams,
}

impl Playback {
    /// Load the trace named in `args` and validate it.
    ///
    /// Everything that could stop a view from playing is checked here,
    /// before any view is started.
    pub fn load(args: &Args) -> anyhow::Result<Self> {
        let store = TraceStore::open(&args.trace)
            .with_context(|| format!("Failed to load trace {}", args.trace.display()))?;
        Self::new(store, args)
    }

    /// Validate an already loaded trace.
    pub fn new(store: TraceStore, args: &Args) -> anyhow::Result<Self> {
        let body_count = store.check_body_count(args.bodies)?;
        let kinematics = kinematics_params(&store, args)?;
        log::info!(
            "Trace has {} samples of {} bodies, {} frames",
            store.len(),
            body_count,
            total_frames(store.len(), body_count),
        );
        Ok(Self {
            store,
            body_count,
            kinematics,
        })
    }

    /// The loaded trace.
    #[inline]
    pub fn store(&self) -> &TraceStore {
        &self.store
    }

    /// Animation of the position view.
    pub fn position_animation(&self, args: &Args) -> Animation<PositionRenderer<'_>> {
        let params = PositionParams {
            palette: args.position_palette.clone(),
            ..Default::default()
        };
        let renderer =
            PositionRenderer::new(&self.store, self.body_count, FrameSelector::default(), params);
        Animation::new(renderer, args.animation_params())
    }

    /// Animation of the kinematics view.
    pub fn kinematics_animation(&self, args: &Args) -> Animation<KinematicsRenderer<'_>> {
        let renderer = KinematicsRenderer::new(
            &self.store,
            FrameSelector::default(),
            self.kinematics.clone(),
        );
        Animation::new(renderer, args.animation_params())
    }

    /// Play both views at once without windows.
    pub fn play_headless(&self, args: &Args) -> PlaybackReport {
        let surface_params = HeadlessParams::default();
        let position = self.position_animation(args);
        let kinematics = self.kinematics_animation(args);
        play_concurrently(vec![
            SessionTask::new(View::Position.name(), move || {
                Session::new(HeadlessSurface::new(surface_params), position).run()
            }),
            SessionTask::new(View::Kinematics.name(), move || {
                Session::new(HeadlessSurface::new(surface_params), kinematics).run()
            }),
        ])
    }

    /// Play one view in a window in this process.
    pub fn play_in_window(&self, args: &Args, view: View) -> anyhow::Result<PlaybackReport> {
        let window = RenderWindow::new(view.window_params())?;
        let result = match view {
            View::Position => Session::new(window, self.position_animation(args)).run(),
            View::Kinematics => Session::new(window, self.kinematics_animation(args)).run(),
        };
        Ok(PlaybackReport {
            outcomes: vec![SessionOutcome {
                name: view.name().to_string(),
                result,
            }],
        })
    }
}

fn kinematics_params(store: &TraceStore, args: &Args) -> Result<KinematicsParams, ConfigurationError> {
    let params = if args.vertical {
        KinematicsParams::vertical(store)?
    } else {
        KinematicsParams::default()
    };
    Ok(KinematicsParams {
        palette: args.kinematics_palette.clone(),
        ..params
    })
}

/// Run the program with the given options.
///
/// Errors are returned for problems with the trace or options,
/// which are detected before anything is played.
/// Failures of individual views are recorded in the report instead.
pub fn run(args: &Args) -> anyhow::Result<PlaybackReport> {
    let playback = Playback::load(args)?;
    match args.view {
        Some(view) => playback.play_in_window(args, view),
        None if args.headless => Ok(playback.play_headless(args)),
        None => {
            // viewers load their own copies of the trace
            drop(playback);
            viewer::play_in_viewers(args)
        }
    }
}
