//! Types describing individual samples of a simulation trace.

use std::{fmt, num::NonZeroUsize};

use crate::Vec2;

/// Identifier of a simulated body.
///
/// Trace files number bodies starting from 1,
/// and that numbering is kept as is.
/// Use [`index`][Self::index] to get a zero-based index into per-body arrays.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BodyId(pub u32);

impl BodyId {
    /// Zero-based index of the body.
    ///
    /// # Panics
    ///
    /// Panics in debug builds if the id is 0,
    /// which the trace loader never produces.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize - 1
    }
}

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The number of bodies in a trace, `N`.
///
/// Always at least one.
/// Obtained from [`TraceStore::check_body_count`][crate::TraceStore::check_body_count],
/// which also verifies it against the bodies actually present in the trace.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BodyCount(NonZeroUsize);

impl BodyCount {
    /// Create a body count, returning `None` if `count` is zero.
    #[inline]
    pub fn new(count: usize) -> Option<Self> {
        NonZeroUsize::new(count).map(Self)
    }

    /// Get the count as a plain integer.
    #[inline]
    pub fn get(self) -> usize {
        self.0.get()
    }

    /// Iterate over the ids `1..=N` in ascending order.
    pub fn ids(self) -> impl ExactSizeIterator<Item = BodyId> + Clone {
        (1..self.get() as u32 + 1).map(BodyId)
    }

    /// Whether the id lies in the range `1..=N`.
    #[inline]
    pub fn contains(self, id: BodyId) -> bool {
        id.0 >= 1 && id.0 as usize <= self.get()
    }
}

impl fmt::Display for BodyCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A numeric quantity stored for every sample,
/// i.e. a column of the trace file.
///
/// The required columns have their own variants.
/// Any other columns the file carries are available as [`Channel::Extra`],
/// looked up by name with [`TraceStore::channel`][crate::TraceStore::channel].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Simulated time, column `Time`.
    Time,
    /// X coordinate of the position, column `Sx`.
    PositionX,
    /// Y coordinate of the position, column `Sy`.
    PositionY,
    /// X component of the acceleration, column `Ax`.
    AccelerationX,
    /// X component of the velocity, column `Ux`.
    VelocityX,
    /// An additional column, by its index among the extra columns of the store.
    Extra(usize),
}

impl Channel {
    /// Look up one of the required channels by its column name.
    pub fn required(name: &str) -> Option<Self> {
        match name {
            "Time" => Some(Self::Time),
            "Sx" => Some(Self::PositionX),
            "Sy" => Some(Self::PositionY),
            "Ax" => Some(Self::AccelerationX),
            "Ux" => Some(Self::VelocityX),
            _ => None,
        }
    }
}

/// One sample of the trace: the state of one body at one instant.
#[derive(Clone, Debug, PartialEq)]
pub struct TraceRecord {
    /// Simulated time of the sample in seconds.
    pub time: f64,
    /// The body this sample describes.
    pub body: BodyId,
    /// Position in the simulation plane (`Sx`, `Sy`).
    pub position: Vec2,
    /// X component of the acceleration (`Ax`).
    pub acceleration_x: f64,
    /// X component of the velocity (`Ux`).
    pub velocity_x: f64,
    /// Values of the extra columns,
    /// in the order of [`TraceStore::extra_columns`][crate::TraceStore::extra_columns].
    pub extra: Vec<f64>,
}

impl TraceRecord {
    /// Get the value of a channel.
    ///
    /// # Panics
    ///
    /// Panics if given an [`Extra`][Channel::Extra] channel
    /// that doesn't belong to the store this record came from.
    pub fn value(&self, channel: Channel) -> f64 {
        match channel {
            Channel::Time => self.time,
            Channel::PositionX => self.position.x,
            Channel::PositionY => self.position.y,
            Channel::AccelerationX => self.acceleration_x,
            Channel::VelocityX => self.velocity_x,
            Channel::Extra(idx) => self.extra[idx],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_count_ids() {
        assert_eq!(BodyCount::new(0), None);
        let count = BodyCount::new(3).unwrap();
        assert_eq!(count.ids().len(), 3);
        itertools::assert_equal(count.ids(), [BodyId(1), BodyId(2), BodyId(3)]);
        assert!(count.contains(BodyId(3)));
        assert!(!count.contains(BodyId(4)));
        assert!(!count.contains(BodyId(0)));
        assert_eq!(BodyId(3).index(), 2);
    }

    #[test]
    fn channel_values() {
        let rec = TraceRecord {
            time: 0.5,
            body: BodyId(1),
            position: Vec2::new(1., 2.),
            acceleration_x: 3.,
            velocity_x: 4.,
            extra: vec![5.],
        };
        assert_eq!(rec.value(Channel::Time), 0.5);
        assert_eq!(rec.value(Channel::PositionY), 2.);
        assert_eq!(rec.value(Channel::AccelerationX), 3.);
        assert_eq!(rec.value(Channel::VelocityX), 4.);
        assert_eq!(rec.value(Channel::Extra(0)), 5.);
        assert_eq!(Channel::required("Ux"), Some(Channel::VelocityX));
        assert_eq!(Channel::required("Uy"), None);
    }
}
