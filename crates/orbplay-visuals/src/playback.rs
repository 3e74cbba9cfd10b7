//! Running animations on surfaces, several at the same time.

use std::{any::Any, thread};

use crate::animation::{Animation, FrameRenderer};

/// Something an [`Animation`] can be played on.
pub trait Surface {
    /// Error that stops the surface from playing.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Start the animation and keep ticking it until the surface closes.
    ///
    /// The animation is stopped when this returns.
    fn run_animation<R: FrameRenderer>(
        &mut self,
        anim: &mut Animation<R>,
    ) -> Result<(), Self::Error>;
}

/// One animation bound to the surface it plays on.
pub struct Session<S: Surface, R: FrameRenderer> {
    surface: S,
    animation: Animation<R>,
}

impl<S: Surface, R: FrameRenderer> Session<S, R> {
    /// Pair an animation with a surface.
    pub fn new(surface: S, animation: Animation<R>) -> Self {
        Self { surface, animation }
    }

    /// Play the animation until the surface closes.
    pub fn run(mut self) -> Result<SessionSummary, SessionError> {
        self.surface
            .run_animation(&mut self.animation)
            .map_err(|err| SessionError::Surface(Box::new(err)))?;
        Ok(SessionSummary {
            frames_rendered: self.animation.frames_rendered(),
            render_failures: self.animation.failures(),
        })
    }
}

/// Statistics of a finished session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionSummary {
    /// Frames rendered, counting repeats when looping.
    pub frames_rendered: usize,
    /// Number of partial rendering failures.
    pub render_failures: usize,
}

/// Reasons a session didn't finish normally.
#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    /// The surface failed.
    #[error("Rendering surface failed")]
    Surface(#[source] Box<dyn std::error::Error + Send + Sync>),
    /// The session panicked. Contains the panic message.
    #[error("Session panicked: {0}")]
    Panicked(String),
    /// The thread or process running the session couldn't be started.
    #[error("Failed to start the session")]
    Spawn(#[source] std::io::Error),
    /// A viewer process exited with a failure status.
    #[error("Viewer process exited unsuccessfully ({0})")]
    ViewerFailed(std::process::ExitStatus),
}

/// A named session waiting to be run by [`play_concurrently`].
///
/// The closure may borrow data that outlives the call to `play_concurrently`,
/// typically the [`TraceStore`][orbplay_core::TraceStore] being visualized.
pub struct SessionTask<'a> {
    name: String,
    run: Box<dyn FnOnce() -> Result<SessionSummary, SessionError> + Send + 'a>,
}

impl<'a> SessionTask<'a> {
    /// Create a task from a closure that runs a session to completion.
    pub fn new(
        name: impl Into<String>,
        run: impl FnOnce() -> Result<SessionSummary, SessionError> + Send + 'a,
    ) -> Self {
        Self {
            name: name.into(),
            run: Box::new(run),
        }
    }

    /// The name of the task.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// How a single session of [`play_concurrently`] ended.
#[derive(Debug)]
pub struct SessionOutcome {
    /// Name the session was given.
    pub name: String,
    /// What the session returned.
    pub result: Result<SessionSummary, SessionError>,
}

/// Outcomes of all sessions run by [`play_concurrently`], in the order they were given.
#[derive(Debug, Default)]
pub struct PlaybackReport {
    /// One entry per session.
    pub outcomes: Vec<SessionOutcome>,
}

impl PlaybackReport {
    /// Whether every session finished without errors.
    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }

    /// Sessions that ended with an error.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &SessionError)> + '_ {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|err| (o.name.as_str(), err)))
    }
}

/// Run every task on its own thread and wait for all of them to finish.
///
/// Tasks are independent:
/// an error or panic in one is recorded in its outcome
/// and doesn't interrupt the others.
pub fn play_concurrently(tasks: Vec<SessionTask<'_>>) -> PlaybackReport {
    let outcomes = thread::scope(|scope| {
        let handles: Vec<_> = tasks
            .into_iter()
            .map(|task| {
                let name = task.name;
                let run = task.run;
                let handle = thread::Builder::new()
                    .name(name.clone())
                    .spawn_scoped(scope, run);
                (name, handle)
            })
            .collect();

        handles
            .into_iter()
            .map(|(name, handle)| {
                let result = match handle {
                    Ok(handle) => handle.join().unwrap_or_else(|payload| {
                        Err(SessionError::Panicked(panic_message(payload.as_ref())))
                    }),
                    Err(err) => Err(SessionError::Spawn(err)),
                };
                match &result {
                    Ok(summary) => log::info!(
                        "{name} session finished: {} frames rendered, {} render failures",
                        summary.frames_rendered,
                        summary.render_failures,
                    ),
                    Err(err) => log::error!("{name} session failed: {err}"),
                }
                SessionOutcome { name, result }
            })
            .collect()
    });

    PlaybackReport { outcomes }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
