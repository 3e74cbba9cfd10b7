//! Loading and querying simulation traces.
//!
//! A trace is a whitespace-delimited table with a header row
//! followed by one row per sample of one body at one instant:
//!
//! ```text
//!     Time   Body   Mass     Sx     Sy     Ux     Uy     Ax     Ay
//! 0.001000      1   1.00  -0.50   0.00   0.00   1.00   3.00   0.00
//! 0.001000      2   1.00   0.50   0.00   0.00  -1.00  -3.00   0.00
//! ```
//!
//! The columns `Time Body Sx Sy Ax Ux` are required and may appear in any order.
//! All other columns must be numeric too
//! and are kept as extra [`Channel`]s that can be looked up by name.

use std::{
    collections::{BTreeMap, HashSet},
    path::Path,
};

use itertools::Itertools;

use crate::{BodyCount, BodyId, Channel, TraceRecord, Vec2};

/// The columns every trace must have.
pub const REQUIRED_COLUMNS: [&str; 6] = ["Time", "Body", "Sx", "Sy", "Ax", "Ux"];

/// Error in the contents of a trace.
///
/// Line numbers count from 1 and include the header and any blank lines.
#[derive(thiserror::Error, Debug)]
pub enum DataFormatError {
    /// The trace contains nothing but whitespace.
    #[error("Trace contains no header row")]
    MissingHeader,
    /// One of the [`REQUIRED_COLUMNS`] is not in the header.
    #[error("Trace header is missing the required column `{0}`")]
    MissingColumn(&'static str),
    /// A column name appears more than once in the header.
    #[error("Trace header contains the column `{0}` more than once")]
    DuplicateColumn(String),
    /// A data row has a different number of fields than the header.
    #[error("Line {line}: expected {expected} fields, found {found}")]
    FieldCount {
        /// Line of the trace the problem is on.
        line: usize,
        /// Number of columns in the header.
        expected: usize,
        /// Number of fields on the line.
        found: usize,
    },
    /// A field doesn't parse as a number.
    #[error("Line {line}: value `{value}` in column `{column}` is not a number")]
    NotNumeric {
        /// Line of the trace the problem is on.
        line: usize,
        /// Name of the column the field is in.
        column: String,
        /// The field as written.
        value: String,
    },
    /// A field parses as a number, but it is infinite or NaN.
    #[error("Line {line}: value `{value}` in column `{column}` is not finite")]
    NotFinite {
        /// Line of the trace the problem is on.
        line: usize,
        /// Name of the column the field is in.
        column: String,
        /// The field as written.
        value: String,
    },
    /// The `Body` field is not a positive integer.
    #[error("Line {line}: `{value}` is not a valid body id")]
    InvalidBodyId {
        /// Line of the trace the problem is on.
        line: usize,
        /// The field as written.
        value: String,
    },
    /// The `Time` field is negative.
    #[error("Line {line}: negative time {time}")]
    NegativeTime {
        /// Line of the trace the problem is on.
        line: usize,
        /// The time as parsed.
        time: f64,
    },
    /// The same body appears twice at the same time.
    #[error("Line {line}: duplicate sample for body {body} at time {time}")]
    DuplicateSample {
        /// Line of the trace the problem is on.
        line: usize,
        /// The body the sample belongs to.
        body: BodyId,
        /// Time of the sample.
        time: f64,
    },
    /// A body id is larger than the number of bodies in the simulation.
    #[error("Body id {body} is outside the range 1..={body_count}")]
    BodyOutOfRange {
        /// The offending id.
        body: BodyId,
        /// Number of bodies given.
        body_count: BodyCount,
    },
}

/// Error in the parameters a trace is played back with.
#[derive(thiserror::Error, Debug)]
pub enum ConfigurationError {
    /// The body count given was zero.
    #[error("Body count must be at least 1")]
    NoBodies,
    /// The body count given disagrees with the trace contents.
    #[error("Expected {expected} bodies, but the trace contains {found} distinct body ids")]
    BodyCountMismatch {
        /// Number of bodies given.
        expected: BodyCount,
        /// Number of distinct body ids in the trace.
        found: usize,
    },
    /// A channel was requested by a name that isn't a column of the trace.
    #[error("Trace has no column named `{0}`")]
    UnknownChannel(String),
}

/// Any error in getting a trace ready for playback.
#[derive(thiserror::Error, Debug)]
pub enum TraceError {
    /// Reading the trace file failed.
    #[error("Failed to read the trace file")]
    Io(#[from] std::io::Error),
    #[allow(missing_docs)]
    #[error(transparent)]
    DataFormat(#[from] DataFormatError),
    #[allow(missing_docs)]
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

/// An immutable, fully loaded simulation trace.
///
/// Created once with [`open`][Self::open] or [`parse`][Self::parse]
/// and then shared by reference between everything that reads it.
/// There is no way to modify a store after construction,
/// so it can be read from any number of threads at once.
#[derive(Clone, Debug)]
pub struct TraceStore {
    records: Vec<TraceRecord>,
    extra_columns: Vec<String>,
    // indices into `records` for each body, in original order
    by_body: BTreeMap<BodyId, Vec<usize>>,
    earliest_time: Option<f64>,
}

impl TraceStore {
    /// Read and parse a trace file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, TraceError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let store = Self::parse(&text)?;
        log::info!(
            "Loaded {} samples of {} bodies from {}",
            store.len(),
            store.by_body.len(),
            path.display(),
        );
        Ok(store)
    }

    /// Parse a trace from text. See the [module-level docs][self] for the format.
    pub fn parse(text: &str) -> Result<Self, DataFormatError> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(idx, line)| (idx + 1, line))
            .filter(|(_, line)| !line.trim().is_empty());

        let (_, header) = lines.next().ok_or(DataFormatError::MissingHeader)?;
        let layout = ColumnLayout::from_header(header)?;

        let mut records = Vec::new();
        // times compared by bit pattern, which is exact since -0.0 is folded into 0.0
        let mut seen: HashSet<(u64, BodyId)> = HashSet::new();
        for (line, row) in lines {
            let fields = row.split_whitespace().collect_vec();
            if fields.len() != layout.names.len() {
                return Err(DataFormatError::FieldCount {
                    line,
                    expected: layout.names.len(),
                    found: fields.len(),
                });
            }
            let record = layout.parse_row(line, &fields)?;
            if !seen.insert((record.time.to_bits(), record.body)) {
                return Err(DataFormatError::DuplicateSample {
                    line,
                    body: record.body,
                    time: record.time,
                });
            }
            records.push(record);
        }

        let extra_columns = layout
            .extra
            .iter()
            .map(|&col| layout.names[col].to_string())
            .collect();
        Ok(Self::from_records(records, extra_columns))
    }

    fn from_records(records: Vec<TraceRecord>, extra_columns: Vec<String>) -> Self {
        let mut by_body: BTreeMap<BodyId, Vec<usize>> = BTreeMap::new();
        for (idx, record) in records.iter().enumerate() {
            by_body.entry(record.body).or_default().push(idx);
        }
        let earliest_time = records.iter().map(|r| r.time).min_by(f64::total_cmp);
        Self {
            records,
            extra_columns,
            by_body,
            earliest_time,
        }
    }

    /// Verify a body count given from outside against the trace.
    ///
    /// Every body id must lie in `1..=requested`
    /// and the trace must contain exactly `requested` distinct bodies.
    pub fn check_body_count(&self, requested: usize) -> Result<BodyCount, TraceError> {
        let count = BodyCount::new(requested).ok_or(ConfigurationError::NoBodies)?;
        // ids are sorted, so the last one is the largest
        if let Some(&body) = self.by_body.keys().next_back() {
            if !count.contains(body) {
                return Err(DataFormatError::BodyOutOfRange {
                    body,
                    body_count: count,
                }
                .into());
            }
        }
        let found = self.by_body.len();
        if found != count.get() {
            return Err(ConfigurationError::BodyCountMismatch {
                expected: count,
                found,
            }
            .into());
        }
        Ok(count)
    }

    /// The number of distinct bodies in the trace,
    /// or `None` if the trace has no samples.
    #[inline]
    pub fn inferred_body_count(&self) -> Option<BodyCount> {
        BodyCount::new(self.by_body.len())
    }

    /// Total number of samples.
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the trace has no samples at all.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All samples in file order.
    #[inline]
    pub fn records(&self) -> &[TraceRecord] {
        &self.records
    }

    /// Names of the columns beyond the required ones, in file order.
    #[inline]
    pub fn extra_columns(&self) -> &[String] {
        &self.extra_columns
    }

    /// Look up a channel by its column name.
    pub fn channel(&self, name: &str) -> Result<Channel, ConfigurationError> {
        if let Some(channel) = Channel::required(name) {
            return Ok(channel);
        }
        self.extra_columns
            .iter()
            .position(|col| col == name)
            .map(Channel::Extra)
            .ok_or_else(|| ConfigurationError::UnknownChannel(name.to_string()))
    }

    /// The ids of all bodies in the trace in ascending order.
    pub fn distinct_body_ids(&self) -> impl ExactSizeIterator<Item = BodyId> + Clone + '_ {
        self.by_body.keys().copied()
    }

    /// All samples of one body in file order.
    pub fn body_records(&self, body: BodyId) -> impl Iterator<Item = &TraceRecord> + Clone + '_ {
        self.by_body
            .get(&body)
            .into_iter()
            .flatten()
            .map(move |&idx| &self.records[idx])
    }

    /// Samples of one body with `time <= max_time`, in file order.
    pub fn filter_by_time_and_body(
        &self,
        max_time: f64,
        body: BodyId,
    ) -> impl Iterator<Item = &TraceRecord> + Clone + '_ {
        self.body_records(body)
            .filter(move |record| record.time <= max_time)
    }

    /// The earliest sample time in the trace.
    #[inline]
    pub fn earliest_time(&self) -> Option<f64> {
        self.earliest_time
    }
}

/// Positions of the columns in a trace, determined from the header.
struct ColumnLayout<'a> {
    names: Vec<&'a str>,
    time: usize,
    body: usize,
    sx: usize,
    sy: usize,
    ax: usize,
    ux: usize,
    extra: Vec<usize>,
}

impl<'a> ColumnLayout<'a> {
    fn from_header(header: &'a str) -> Result<Self, DataFormatError> {
        let names = header.split_whitespace().collect_vec();
        if let Some(dup) = names.iter().duplicates().next() {
            return Err(DataFormatError::DuplicateColumn(dup.to_string()));
        }

        let find = |name: &'static str| {
            names
                .iter()
                .position(|&n| n == name)
                .ok_or(DataFormatError::MissingColumn(name))
        };
        let [time, body, sx, sy, ax, ux] = [
            find("Time")?,
            find("Body")?,
            find("Sx")?,
            find("Sy")?,
            find("Ax")?,
            find("Ux")?,
        ];
        let extra = (0..names.len())
            .filter(|col| !REQUIRED_COLUMNS.contains(&names[*col]))
            .collect();

        Ok(Self {
            names,
            time,
            body,
            sx,
            sy,
            ax,
            ux,
            extra,
        })
    }

    fn parse_row(&self, line: usize, fields: &[&str]) -> Result<TraceRecord, DataFormatError> {
        let number = |col: usize| -> Result<f64, DataFormatError> {
            let raw = fields[col];
            let value: f64 = raw.parse().map_err(|_| DataFormatError::NotNumeric {
                line,
                column: self.names[col].to_string(),
                value: raw.to_string(),
            })?;
            if !value.is_finite() {
                return Err(DataFormatError::NotFinite {
                    line,
                    column: self.names[col].to_string(),
                    value: raw.to_string(),
                });
            }
            Ok(value)
        };

        let time = number(self.time)?;
        if time < 0. {
            return Err(DataFormatError::NegativeTime { line, time });
        }
        // fold -0.0 into 0.0
        let time = if time == 0. { 0. } else { time };

        Ok(TraceRecord {
            time,
            body: parse_body_id(line, fields[self.body])?,
            position: Vec2::new(number(self.sx)?, number(self.sy)?),
            acceleration_x: number(self.ax)?,
            velocity_x: number(self.ux)?,
            extra: self
                .extra
                .iter()
                .map(|&col| number(col))
                .collect::<Result<_, _>>()?,
        })
    }
}

/// Body ids are positive integers,
/// but a float spelling with no fractional part (`2.0`) is accepted too.
fn parse_body_id(line: usize, raw: &str) -> Result<BodyId, DataFormatError> {
    let invalid = || DataFormatError::InvalidBodyId {
        line,
        value: raw.to_string(),
    };
    let id = match raw.parse::<u32>() {
        Ok(id) => id,
        Err(_) => {
            let float: f64 = raw.parse().map_err(|_| invalid())?;
            if float.fract() != 0. || !(1. ..=u32::MAX as f64).contains(&float) {
                return Err(invalid());
            }
            float as u32
        }
    };
    if id == 0 {
        return Err(invalid());
    }
    Ok(BodyId(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_BODIES: &str = "
        Time Body Sx Sy Ax Ux
        0.00 1 0.0 0.0 1.0 0.0
        0.00 2 1.0 0.0 -1.0 0.0
        0.01 1 0.1 0.0 1.0 0.01
        0.01 2 0.9 0.0 -1.0 -0.01
    ";

    #[test]
    fn parse_basic_trace() {
        let store = TraceStore::parse(TWO_BODIES).unwrap();
        assert_eq!(store.len(), 4);
        itertools::assert_equal(store.distinct_body_ids(), [BodyId(1), BodyId(2)]);
        assert!(store.extra_columns().is_empty());

        let rec = &store.records()[3];
        assert_eq!(rec.body, BodyId(2));
        assert_eq!(rec.time, 0.01);
        assert_eq!(rec.position, Vec2::new(0.9, 0.0));
        assert_eq!(rec.velocity_x, -0.01);
        assert_eq!(store.earliest_time(), Some(0.));
    }

    #[test]
    fn simulator_column_order() {
        // header as written by the simulator, with extra channels interleaved
        let text = "
                   Time           Body           Mass             Sx             Sy             Ux             Uy             Ax             Ay
               0.001000              1       1.000000      -0.500000       0.000000       0.000000       1.000000       3.000000       0.000000
               0.001000              2       2.000000       0.500000       0.000000       0.000000      -1.000000      -1.500000       0.000000
        ";
        let store = TraceStore::parse(text).unwrap();
        assert_eq!(store.extra_columns(), ["Mass", "Uy", "Ay"]);

        let ay = store.channel("Ay").unwrap();
        assert_eq!(ay, Channel::Extra(2));
        assert_eq!(store.channel("Ax").unwrap(), Channel::AccelerationX);
        assert!(matches!(
            store.channel("Az"),
            Err(ConfigurationError::UnknownChannel(_))
        ));

        let rec = &store.records()[1];
        assert_eq!(rec.value(store.channel("Mass").unwrap()), 2.);
        assert_eq!(rec.value(store.channel("Uy").unwrap()), -1.);
        assert_eq!(rec.acceleration_x, -1.5);
        assert_eq!(rec.position.x, 0.5);
    }

    #[test]
    fn filter_keeps_file_order() {
        // samples of body 1 deliberately out of time order
        let text = "
            Time Body Sx Sy Ax Ux
            0.02 1 2 0 0 0
            0.00 2 0 0 0 0
            0.00 1 0 0 0 0
            0.01 1 1 0 0 0
        ";
        let store = TraceStore::parse(text).unwrap();
        let xs = |max_time| {
            store
                .filter_by_time_and_body(max_time, BodyId(1))
                .map(|r| r.position.x)
                .collect_vec()
        };
        assert_eq!(xs(0.01), [0., 1.]);
        assert_eq!(xs(1.), [2., 0., 1.]);
        assert_eq!(store.filter_by_time_and_body(1., BodyId(3)).count(), 0);
    }

    #[test]
    fn format_errors() {
        let err = |text: &str| TraceStore::parse(text).unwrap_err();

        assert!(matches!(err("  \n \n"), DataFormatError::MissingHeader));
        assert!(matches!(
            err("Time Body Sx Sy Ax\n0 1 0 0 0"),
            DataFormatError::MissingColumn("Ux")
        ));
        assert!(matches!(
            err("Time Body Sx Sy Ax Ux Sx\n"),
            DataFormatError::DuplicateColumn(c) if c == "Sx"
        ));
        assert!(matches!(
            err("Time Body Sx Sy Ax Ux\n0 1 0 0 0"),
            DataFormatError::FieldCount { line: 2, expected: 6, found: 5 }
        ));
        assert!(matches!(
            err("Time Body Sx Sy Ax Ux\n\n0 1 0 abc 0 0"),
            DataFormatError::NotNumeric { line: 3, column, value } if column == "Sy" && value == "abc"
        ));
        assert!(matches!(
            err("Time Body Sx Sy Ax Ux\n0 1 0 0 inf 0"),
            DataFormatError::NotFinite { .. }
        ));
        assert!(matches!(
            err("Time Body Sx Sy Ax Ux\n-1 1 0 0 0 0"),
            DataFormatError::NegativeTime { line: 2, .. }
        ));
        assert!(matches!(
            err("Time Body Sx Sy Ax Ux\n0 1 0 0 0 0\n0 1 1 1 1 1"),
            DataFormatError::DuplicateSample { line: 3, body: BodyId(1), .. }
        ));
        assert!(matches!(
            err("Time Body Sx Sy Ax Ux Mass\n0 1 0 0 0 0 heavy"),
            DataFormatError::NotNumeric { column, .. } if column == "Mass"
        ));
    }

    #[test]
    fn body_ids() {
        assert_eq!(parse_body_id(1, "3").unwrap(), BodyId(3));
        assert_eq!(parse_body_id(1, "2.0").unwrap(), BodyId(2));
        for bad in ["0", "-1", "1.5", "one", "0.0"] {
            assert!(
                matches!(parse_body_id(1, bad), Err(DataFormatError::InvalidBodyId { .. })),
                "{bad} should be rejected",
            );
        }
    }

    #[test]
    fn negative_zero_time_is_zero() {
        let store = TraceStore::parse("Time Body Sx Sy Ax Ux\n-0.0 1 0 0 0 0").unwrap();
        assert!(store.records()[0].time.is_sign_positive());
        assert!(matches!(
            TraceStore::parse("Time Body Sx Sy Ax Ux\n-0.0 1 0 0 0 0\n0.0 1 0 0 0 0"),
            Err(DataFormatError::DuplicateSample { .. })
        ));
    }

    #[test]
    fn body_count_validation() {
        let store = TraceStore::parse(TWO_BODIES).unwrap();

        let count = store.check_body_count(2).unwrap();
        assert_eq!(count.get(), 2);
        assert_eq!(store.inferred_body_count(), Some(count));

        // more bodies requested than present: fail fast
        assert!(matches!(
            store.check_body_count(3),
            Err(TraceError::Configuration(
                ConfigurationError::BodyCountMismatch { found: 2, .. }
            ))
        ));
        // an id beyond the requested count is a format error
        assert!(matches!(
            store.check_body_count(1),
            Err(TraceError::DataFormat(DataFormatError::BodyOutOfRange {
                body: BodyId(2),
                ..
            }))
        ));
        assert!(matches!(
            store.check_body_count(0),
            Err(TraceError::Configuration(ConfigurationError::NoBodies))
        ));

        // ids must be exactly 1..=N, not just N distinct values
        let gappy = TraceStore::parse("Time Body Sx Sy Ax Ux\n0 1 0 0 0 0\n0 3 0 0 0 0").unwrap();
        assert!(matches!(
            gappy.check_body_count(2),
            Err(TraceError::DataFormat(DataFormatError::BodyOutOfRange { .. }))
        ));
        assert!(matches!(
            gappy.check_body_count(3),
            Err(TraceError::Configuration(_))
        ));
    }

    #[test]
    fn open_from_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TWO_BODIES.as_bytes()).unwrap();
        let store = TraceStore::open(file.path()).unwrap();
        assert_eq!(store.len(), 4);

        let missing = TraceStore::open(file.path().with_extension("nope"));
        assert!(matches!(missing, Err(TraceError::Io(_))));
    }
}
