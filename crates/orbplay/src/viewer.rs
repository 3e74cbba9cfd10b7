//! Windowed playback with one viewer process per view.
//!
//! A process can only have one window event loop,
//! so each view runs in a copy of this program started with `--view`.

use std::{ffi::OsString, path::Path, process::Command};

use anyhow::Context;
use orbplay_visuals::{
    play_concurrently, PlaybackReport, SessionError, SessionSummary, SessionTask,
};

use crate::cli::{Args, View};

/// Launch a viewer for every view and wait until all of them have been closed.
pub(crate) fn play_in_viewers(args: &Args) -> anyhow::Result<PlaybackReport> {
    let exe = std::env::current_exe().context("Failed to locate the orbplay executable")?;
    let tasks = View::ALL
        .into_iter()
        .map(|view| {
            let view_args = args.view_args(view);
            let exe = exe.as_path();
            SessionTask::new(view.name(), move || run_viewer(exe, view, &view_args))
        })
        .collect();
    Ok(play_concurrently(tasks))
}

/// Run one viewer process to completion.
///
/// The viewer's own statistics stay in its process,
/// so a successful run reports an empty summary.
fn run_viewer(exe: &Path, view: View, args: &[OsString]) -> Result<SessionSummary, SessionError> {
    let mut child = Command::new(exe)
        .args(args)
        .spawn()
        .map_err(SessionError::Spawn)?;
    log::debug!("Started {} viewer as process {}", view.name(), child.id());

    let status = child.wait().map_err(SessionError::Spawn)?;
    if status.success() {
        Ok(SessionSummary::default())
    } else {
        Err(SessionError::ViewerFailed(status))
    }
}
