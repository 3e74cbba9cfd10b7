//! End-to-end playback of trace files without windows.

use std::io::Write;

use clap::Parser;
use orbplay::{
    app::{self, Playback},
    cli::{Args, View},
    visuals::{
        play_concurrently, CloseWhen, HeadlessParams, HeadlessSurface, PlaybackEnd, Session,
        SessionError, SessionTask, Surface,
    },
    ConfigurationError, DataFormatError, TraceError,
};

/// Two bodies circling each other, four samples each.
const TWO_BODIES: &str = "\
    Time   Body     Sx     Sy     Ux     Uy     Ax     Ay
0.000000      1  -1.00   0.00   0.00   1.00   1.00   0.00
0.000000      2   1.00   0.00   0.00  -1.00  -1.00   0.00
0.010000      1  -0.99   0.01   0.01   0.99   0.99  -0.01
0.010000      2   0.99  -0.01  -0.01  -0.99  -0.99   0.01
0.020000      1  -0.98   0.02   0.02   0.98   0.98  -0.02
0.020000      2   0.98  -0.02  -0.02  -0.98  -0.98   0.02
0.030000      1  -0.96   0.03   0.03   0.96   0.96  -0.03
0.030000      2   0.96  -0.03  -0.03  -0.96  -0.96   0.03
";

fn trace_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn args(trace: &tempfile::NamedTempFile, extra: &[&str]) -> Args {
    let trace = trace.path().to_str().unwrap();
    let argv = ["orbplay", "--trace", trace, "--headless"]
        .into_iter()
        .chain(extra.iter().copied());
    Args::try_parse_from(argv).unwrap()
}

#[test]
fn both_views_play_every_frame() {
    let trace = trace_file(TWO_BODIES);
    let report = app::run(&args(&trace, &["2"])).unwrap();

    assert!(report.all_succeeded());
    let names: Vec<&str> = report.outcomes.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, [View::Position.name(), View::Kinematics.name()]);
    for outcome in &report.outcomes {
        let summary = outcome.result.as_ref().unwrap();
        // 8 samples of 2 bodies
        assert_eq!(summary.frames_rendered, 4, "{} view", outcome.name);
        assert_eq!(summary.render_failures, 0, "{} view", outcome.name);
    }
}

#[test]
fn vertical_components() {
    let trace = trace_file(TWO_BODIES);
    let args = args(&trace, &["2", "--vertical"]);
    let playback = Playback::load(&args).unwrap();

    let mut anim = playback.kinematics_animation(&args);
    HeadlessSurface::default().run_animation(&mut anim).unwrap();

    let panels = &anim.figure().panels;
    assert_eq!(panels[0].title, "Acceleration (ay) vs Time (Frame 3)");
    assert_eq!(panels[0].y_label, "Acceleration (ay)");
    assert_eq!(panels[1].y_label, "Velocity (uy)");
    // last sample of body 1
    assert_eq!(panels[1].layers[0].points.last().map(|p| p.y), Some(0.96));
}

#[test]
fn body_count_mismatch_is_fatal() {
    let trace = trace_file(TWO_BODIES);
    let err = app::run(&args(&trace, &["3"])).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<TraceError>(),
        Some(TraceError::Configuration(
            ConfigurationError::BodyCountMismatch { found: 2, .. }
        ))
    ));
}

#[test]
fn body_id_out_of_range_is_fatal() {
    let trace = trace_file(TWO_BODIES);
    let err = app::run(&args(&trace, &["1"])).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<TraceError>(),
        Some(TraceError::DataFormat(DataFormatError::BodyOutOfRange { .. }))
    ));
}

#[test]
fn vertical_needs_columns() {
    let trace = trace_file(
        "Time Body Sx Sy Ux Ax\n\
         0.0 1 0.0 0.0 0.0 0.0\n",
    );
    let err = app::run(&args(&trace, &["1", "--vertical"])).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ConfigurationError>(),
        Some(ConfigurationError::UnknownChannel(name)) if name == "Ay"
    ));
}

#[test]
fn missing_trace_file() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("data.txt");
    let args = Args::try_parse_from([
        "orbplay",
        "2",
        "--headless",
        "--trace",
        missing.to_str().unwrap(),
    ])
    .unwrap();
    let err = app::run(&args).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<TraceError>(),
        Some(TraceError::Io(_))
    ));
}

#[test]
fn body_missing_from_part_of_the_trace() {
    // body 2 only appears from the second time step on
    let trace = trace_file(
        "Time Body Sx Sy Ux Ax\n\
         0.00 1 0.0 0.0 0.0 0.0\n\
         0.01 1 0.1 0.0 0.0 0.0\n\
         0.01 2 1.0 0.0 0.0 0.0\n\
         0.02 1 0.2 0.0 0.0 0.0\n\
         0.02 2 1.1 0.0 0.0 0.0\n",
    );
    let report = app::run(&args(&trace, &["2"])).unwrap();
    assert!(report.all_succeeded());
    let position = report.outcomes[0].result.as_ref().unwrap();
    assert_eq!(position.frames_rendered, 2);
    assert_eq!(position.render_failures, 1);
}

#[test]
fn failing_view_does_not_stop_the_other() {
    let trace = trace_file(TWO_BODIES);
    let args = args(&trace, &["2"]);
    let playback = Playback::load(&args).unwrap();
    let kinematics = playback.kinematics_animation(&args);

    let report = play_concurrently(vec![
        SessionTask::new("position", || -> Result<_, SessionError> {
            panic!("position view crashed")
        }),
        SessionTask::new("kinematics", move || {
            Session::new(HeadlessSurface::default(), kinematics).run()
        }),
    ]);

    assert!(matches!(
        &report.outcomes[0].result,
        Err(SessionError::Panicked(msg)) if msg == "position view crashed"
    ));
    let kinematics = report.outcomes[1].result.as_ref().unwrap();
    assert_eq!(kinematics.frames_rendered, 4);
}

#[test]
fn looping_plays_past_the_end() {
    let trace = trace_file(TWO_BODIES);
    let args = args(&trace, &["2", "--loop"]);
    let playback = Playback::load(&args).unwrap();

    let mut anim = playback.position_animation(&args);
    assert_eq!(anim.frame_count(), 4);
    assert_eq!(anim.params().end, PlaybackEnd::Loop);

    let mut surface = HeadlessSurface::new(HeadlessParams {
        close: CloseWhen::AfterTicks(6),
        realtime: false,
    });
    surface.run_animation(&mut anim).unwrap();
    assert_eq!(anim.frames_rendered(), 6);
    // frames 0 1 2 3 0 1
    assert_eq!(anim.figure().panels[0].title, "Time: 0.010000 sec");
}
