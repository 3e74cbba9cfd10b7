//! Command line options.

use std::{ffi::OsString, path::PathBuf, time::Duration};

use clap::{Parser, ValueEnum};
use orbplay_visuals::{AnimationParams, Palette, PlaybackEnd, WindowParams};

/// Play back a multi-body simulation trace as animated plots.
#[derive(Parser, Clone, Debug)]
#[command(name = "orbplay", version)]
pub struct Args {
    /// Number of bodies in the simulation.
    #[arg(value_name = "BODIES")]
    pub bodies: usize,
    /// Trace file to play.
    #[arg(long, default_value = "data.txt")]
    pub trace: PathBuf,
    /// Minimum wall-clock time between frames, in milliseconds.
    #[arg(long, default_value_t = 1)]
    pub interval_ms: u64,
    /// Start over after the last frame instead of holding it.
    #[arg(long = "loop")]
    pub looping: bool,
    /// Render every frame without opening windows, then exit.
    #[arg(long)]
    pub headless: bool,
    /// Plot the vertical components `Ay` and `Uy` in the kinematics view.
    #[arg(long)]
    pub vertical: bool,
    /// Colors of the position view: tab10, rainbow, sunset or molentum.
    #[arg(long, default_value = "tab10", value_parser = parse_palette)]
    pub position_palette: Palette,
    /// Colors of the kinematics view: tab10, rainbow, sunset or molentum.
    #[arg(long, default_value = "rainbow", value_parser = parse_palette)]
    pub kinematics_palette: Palette,
    /// Show a single view in this process.
    #[arg(long, value_enum, hide = true)]
    pub view: Option<View>,
}

fn parse_palette(name: &str) -> Result<Palette, String> {
    Palette::by_name(name).ok_or_else(|| format!("unknown palette `{name}`"))
}

/// One of the two animated views.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum View {
    /// Body positions as a scatter plot.
    Position,
    /// Acceleration and velocity against time.
    Kinematics,
}

impl View {
    /// Every view, in launch order.
    pub const ALL: [View; 2] = [View::Position, View::Kinematics];

    /// Name of the view as given on the command line.
    pub fn name(self) -> &'static str {
        match self {
            View::Position => "position",
            View::Kinematics => "kinematics",
        }
    }

    /// Where and how large the view's window is.
    ///
    /// The windows are placed next to each other.
    pub fn window_params(self) -> WindowParams {
        let (title, position) = match self {
            View::Position => ("Position", (0, 0)),
            View::Kinematics => ("Kinematics", (760, 30)),
        };
        WindowParams {
            title,
            width: 760,
            height: 760,
            position: Some(position),
            ..Default::default()
        }
    }
}

impl Args {
    /// Playback timing and end behavior.
    pub fn animation_params(&self) -> AnimationParams {
        AnimationParams {
            interval: Duration::from_millis(self.interval_ms),
            end: if self.looping {
                PlaybackEnd::Loop
            } else {
                PlaybackEnd::Halt
            },
        }
    }

    /// Arguments for running this program again showing only `view`.
    pub fn view_args(&self, view: View) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            self.bodies.to_string().into(),
            "--trace".into(),
            self.trace.clone().into(),
            "--interval-ms".into(),
            self.interval_ms.to_string().into(),
            "--position-palette".into(),
            self.position_palette.name().into(),
            "--kinematics-palette".into(),
            self.kinematics_palette.name().into(),
            "--view".into(),
            view.name().into(),
        ];
        if self.looping {
            args.push("--loop".into());
        }
        if self.vertical {
            args.push("--vertical".into());
        }
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("orbplay").chain(args.iter().copied()))
    }

    #[test]
    fn defaults() {
        let args = parse(&["3"]).unwrap();
        assert_eq!(args.bodies, 3);
        assert_eq!(args.trace, PathBuf::from("data.txt"));
        assert_eq!(args.interval_ms, 1);
        assert!(!args.looping && !args.headless && !args.vertical);
        assert_eq!(args.position_palette.name(), "tab10");
        assert_eq!(args.kinematics_palette.name(), "rainbow");
        assert_eq!(args.view, None);

        let anim = args.animation_params();
        assert_eq!(anim.interval, Duration::from_millis(1));
        assert_eq!(anim.end, PlaybackEnd::Halt);
    }

    #[test]
    fn body_count_is_required() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["three"]).is_err());
        assert!(parse(&["-2"]).is_err());
    }

    #[test]
    fn unknown_palette_is_rejected() {
        assert!(parse(&["2", "--position-palette", "viridis"]).is_err());
    }

    #[test]
    fn view_args_reproduce_options() {
        let args = parse(&[
            "4",
            "--trace",
            "runs/orbit.txt",
            "--interval-ms",
            "20",
            "--loop",
            "--vertical",
            "--kinematics-palette",
            "sunset",
        ])
        .unwrap();

        let view_args = args.view_args(View::Kinematics);
        let relaunched = Args::try_parse_from(
            std::iter::once(OsString::from("orbplay")).chain(view_args),
        )
        .unwrap();

        assert_eq!(relaunched.view, Some(View::Kinematics));
        assert_eq!(relaunched.bodies, 4);
        assert_eq!(relaunched.trace, PathBuf::from("runs/orbit.txt"));
        assert_eq!(relaunched.interval_ms, 20);
        assert!(relaunched.looping);
        assert!(relaunched.vertical);
        assert!(!relaunched.headless);
        assert_eq!(relaunched.position_palette, args.position_palette);
        assert_eq!(relaunched.kinematics_palette.name(), "sunset");
    }

    #[test]
    fn windows_side_by_side() {
        let position = View::Position.window_params();
        let kinematics = View::Kinematics.window_params();
        assert_eq!((position.width, position.height), (760, 760));
        assert_eq!(position.position, Some((0, 0)));
        assert_eq!(kinematics.position, Some((760, 30)));
    }
}
