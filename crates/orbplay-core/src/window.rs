//! Selecting the part of a trace that is visible in each animation frame.
//!
//! Frame `i` shows every sample with `time <= i * dt`,
//! so the visible part of the trace only ever grows as the animation advances.
//! Nothing is interpolated; a frame whose cutoff falls between two samples
//! simply shows the earlier one.

use crate::{BodyCount, BodyId, TraceRecord, TraceStore};

/// The simulated time between two consecutive frames, in seconds.
pub const DEFAULT_DT: f64 = 0.01;

/// The number of frames in an animation of a trace
/// with `record_count` samples of `body_count` bodies.
///
/// This is `floor(record_count / body_count)`.
/// If the record count isn't divisible by the body count,
/// the remainder is never shown on its own frame.
#[inline]
pub fn total_frames(record_count: usize, body_count: BodyCount) -> usize {
    record_count / body_count.get()
}

/// Maps frame indices to time cutoffs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameSelector {
    dt: f64,
}

impl Default for FrameSelector {
    fn default() -> Self {
        Self { dt: DEFAULT_DT }
    }
}

impl FrameSelector {
    /// Create a selector with the given time step.
    ///
    /// # Panics
    ///
    /// Panics if `dt` is not a positive finite number.
    pub fn new(dt: f64) -> Self {
        assert!(
            dt.is_finite() && dt > 0.,
            "Frame time step must be positive, got {dt}"
        );
        Self { dt }
    }

    /// The time step between frames.
    #[inline]
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// The latest sample time visible in the given frame.
    #[inline]
    pub fn cutoff(&self, frame: usize) -> f64 {
        frame as f64 * self.dt
    }

    /// Get the view of the trace visible in the given frame.
    pub fn window<'a>(&self, store: &'a TraceStore, frame: usize) -> FrameWindow<'a> {
        FrameWindow {
            store,
            frame,
            cutoff: self.cutoff(frame),
        }
    }
}

/// The samples of a trace visible in one frame.
///
/// This is a cheap view that borrows the store;
/// a new one is made for each frame rather than updating an old one.
#[derive(Clone, Copy, Debug)]
pub struct FrameWindow<'a> {
    store: &'a TraceStore,
    frame: usize,
    cutoff: f64,
}

impl<'a> FrameWindow<'a> {
    /// Index of the frame this window belongs to.
    #[inline]
    pub fn frame(&self) -> usize {
        self.frame
    }

    /// The latest sample time included in the window.
    #[inline]
    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    /// Simulated time elapsed at this frame.
    ///
    /// Same as the cutoff, since the animation starts at time zero.
    #[inline]
    pub fn elapsed(&self) -> f64 {
        self.cutoff
    }

    /// Visible samples of one body, in file order.
    pub fn body(&self, body: BodyId) -> impl Iterator<Item = &'a TraceRecord> + Clone + 'a {
        self.store.filter_by_time_and_body(self.cutoff, body)
    }

    /// All visible samples, in file order.
    pub fn records(&self) -> impl Iterator<Item = &'a TraceRecord> + 'a {
        let cutoff = self.cutoff;
        self.store
            .records()
            .iter()
            .filter(move |record| record.time <= cutoff)
    }

    /// Whether any sample at all is visible.
    ///
    /// If the window is populated but some body has no samples in it,
    /// that body is missing from the trace for this part of the timeline.
    #[inline]
    pub fn is_populated(&self) -> bool {
        self.store
            .earliest_time()
            .is_some_and(|earliest| earliest <= self.cutoff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use itertools::Itertools;

    fn store(text: &str) -> TraceStore {
        TraceStore::parse(text).unwrap()
    }

    #[test]
    fn two_body_scenario() {
        let store = store(
            "Time Body Sx Sy Ax Ux
             0    1    0  0  0  0
             0    2    1  0  0  0
             0.01 1    0  1  0  0
             0.01 2    1  1  0  0",
        );
        let count = store.check_body_count(2).unwrap();
        assert_eq!(total_frames(store.len(), count), 2);

        let sel = FrameSelector::default();

        let w0 = sel.window(&store, 0);
        assert_eq!(w0.cutoff(), 0.);
        let times = w0.records().map(|r| (r.time, r.body.0)).collect_vec();
        assert_eq!(times, [(0., 1), (0., 2)]);

        let w1 = sel.window(&store, 1);
        assert_relative_eq!(w1.cutoff(), 0.01);
        assert_eq!(w1.records().count(), 4);
        assert_eq!(w1.body(BodyId(2)).count(), 2);
    }

    #[test]
    fn frame_count_truncates() {
        for n in 1..=7 {
            let count = BodyCount::new(n).unwrap();
            for records in 0..50 {
                let frames = total_frames(records, count);
                assert!(frames * n <= records);
                assert!(records - frames * n < n);
            }
        }
    }

    #[test]
    fn windows_grow_monotonically() {
        // three bodies, irregular sampling, body 3 only appears later
        let store = store(
            "Time  Body Sx Sy Ax Ux
             0.000 1    0  0  0  0
             0.000 2    0  0  0  0
             0.013 1    1  0  0  0
             0.020 2    1  0  0  0
             0.031 3    0  0  0  0
             0.047 1    2  0  0  0
             0.050 3    1  0  0  0
             0.052 2    2  0  0  0",
        );
        let sel = FrameSelector::default();
        for frame in 0..8 {
            let earlier = sel.window(&store, frame);
            let later = sel.window(&store, frame + 1);
            assert!(later.cutoff() >= earlier.cutoff());
            for body in store.distinct_body_ids() {
                let before = earlier.body(body).collect_vec();
                let after = later.body(body).collect_vec();
                assert!(before.iter().all(|r| after.contains(r)));
            }
        }

        let w2 = sel.window(&store, 2);
        assert!(w2.is_populated());
        assert_eq!(w2.body(BodyId(3)).count(), 0);
        assert_eq!(sel.window(&store, 4).body(BodyId(3)).count(), 1);
    }

    #[test]
    fn frame_zero_before_first_sample() {
        let store = store("Time Body Sx Sy Ax Ux\n0.001 1 0 0 0 0");
        let w = FrameSelector::default().window(&store, 0);
        assert!(!w.is_populated());
        assert_eq!(w.records().count(), 0);
        assert!(FrameSelector::default().window(&store, 1).is_populated());
    }

    #[test]
    fn custom_time_step() {
        let sel = FrameSelector::new(0.25);
        assert_eq!(sel.dt(), 0.25);
        assert_eq!(sel.cutoff(3), 0.75);
    }

    #[test]
    #[should_panic]
    fn zero_time_step_is_rejected() {
        FrameSelector::new(0.);
    }
}
