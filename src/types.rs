use std::fmt;

use chrono::NaiveDateTime;

use crate::utils::excel_to_datetime;

/// One channel of the merged, file-wide channel table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    /// Channel title as exported, e.g. `Flow` or `Pressure`.
    pub name: String,
    /// Unit string for this channel, empty when the export declares none.
    pub unit: String,
}

/// An annotation resolved onto the continuous time axis.
///
/// Comments come from two places in an export: extra cells appended to a
/// sample row, and standalone rows whose first token is a time stamp and
/// whose remainder is text. Both forms end up here.
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    /// Position on the file-wide time axis, in seconds.
    pub global_time: f64,
    /// Index of the block the comment belongs to.
    pub block: usize,
    /// Time stamp as written in the file, relative to the block.
    pub local_time: f64,
    /// Comment text with the `#*` sentinel already removed.
    pub label: String,
    /// 1-based source line the comment came from.
    pub line: usize,
    /// True when the written time stamp fell outside the block's span and
    /// the global time was clamped to the nearest edge.
    pub clamped: bool,
}

/// What exactly was off about a sample row.
#[derive(Debug, Clone, PartialEq)]
pub enum RowIntegrityKind {
    /// The row had fewer data cells than the block declares channels.
    /// The row is dropped.
    ColumnCount { expected: usize, found: usize },
    /// The spacing to the previous row strayed from the sampling interval
    /// by more than [`INTERVAL_DRIFT_TOLERANCE`](crate::INTERVAL_DRIFT_TOLERANCE).
    /// The row is kept.
    IntervalDrift { expected: f64, found: f64 },
}

/// A recoverable oddity noticed while parsing.
///
/// Diagnostics never abort the parse. They record where the file deviated
/// from the expected shape and what the parser did about it. Each one
/// names the source line it refers to.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// A sample row that did not line up with its block.
    RowIntegrity {
        line: usize,
        block: usize,
        kind: RowIntegrityKind,
    },
    /// A comment time stamp outside its block's span.
    CommentBounds {
        line: usize,
        block: usize,
        local_time: f64,
        clamped_to: f64,
    },
    /// A channel re-declared with a different unit in a later block.
    /// The first non-empty unit wins.
    UnitConflict {
        channel: String,
        kept: String,
        seen: String,
        block: usize,
    },
    /// A line that is neither header, sample row nor comment. Skipped.
    UnrecognizedLine { line: usize, text: String },
    /// A block whose interval could not be read from the header and had to
    /// be derived or defaulted.
    MissingInterval { block: usize, fallback: f64 },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::RowIntegrity { line, block, kind } => match kind {
                RowIntegrityKind::ColumnCount { expected, found } => write!(
                    f,
                    "line {}: row in block {} has {} data cells, expected {}; row skipped",
                    line, block, found, expected
                ),
                RowIntegrityKind::IntervalDrift { expected, found } => write!(
                    f,
                    "line {}: row spacing {} in block {} drifts from interval {}; row kept",
                    line, found, block, expected
                ),
            },
            Diagnostic::CommentBounds {
                line,
                block,
                local_time,
                clamped_to,
            } => write!(
                f,
                "line {}: comment time {} lies outside block {}, clamped to global {}",
                line, local_time, block, clamped_to
            ),
            Diagnostic::UnitConflict {
                channel,
                kept,
                seen,
                block,
            } => write!(
                f,
                "block {}: channel '{}' re-declared with unit '{}', keeping '{}'",
                block, channel, seen, kept
            ),
            Diagnostic::UnrecognizedLine { line, text } => {
                write!(f, "line {}: unrecognized content skipped: {}", line, text)
            }
            Diagnostic::MissingInterval { block, fallback } => write!(
                f,
                "block {}: no usable Interval header, using {} s",
                block, fallback
            ),
        }
    }
}

/// One recording block: a header group followed by its sample rows.
///
/// Sample values are stored row-major. Time stamps are kept exactly as
/// written in the file; the file-wide axis is the job of
/// [`ContinuousTimeMap`](crate::ContinuousTimeMap).
#[derive(Debug, Clone)]
pub struct Block {
    pub(crate) index: usize,
    pub(crate) marker_line: usize,
    pub(crate) is_continuation: bool,
    pub(crate) header: Vec<(String, String)>,
    pub(crate) excel_days: Option<f64>,
    pub(crate) interval: f64,
    pub(crate) names: Vec<String>,
    pub(crate) units: Vec<String>,
    pub(crate) local_times: Vec<f64>,
    pub(crate) samples: Vec<f64>,
}

impl Block {
    /// Zero-based position of this block in the file.
    pub fn index(&self) -> usize {
        self.index
    }

    /// 1-based line where this block starts in the source text.
    pub fn line(&self) -> usize {
        self.marker_line
    }

    /// True when the block was split off implicitly because the time
    /// column reset, rather than introduced by its own header group.
    pub fn is_continuation(&self) -> bool {
        self.is_continuation
    }

    /// Sampling interval in seconds.
    pub fn interval(&self) -> f64 {
        self.interval
    }

    pub fn channel_count(&self) -> usize {
        self.names.len()
    }

    pub fn sample_count(&self) -> usize {
        self.local_times.len()
    }

    /// Channel titles in column order.
    pub fn channel_names(&self) -> &[String] {
        &self.names
    }

    /// Unit strings in column order, padded with `""` where undeclared.
    pub fn units(&self) -> &[String] {
        &self.units
    }

    /// Column position of a channel in this block, by exact name.
    pub fn channel_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Header fields of this block's header group, in file order.
    ///
    /// Keys are stored without the trailing `=`. Fields the parser reads
    /// (`Interval`, `ExcelDateTime`, channel rows) appear here too, with
    /// their raw values.
    pub fn header(&self) -> &[(String, String)] {
        &self.header
    }

    /// Raw value of the first header field with the given key.
    pub fn header_value(&self, key: &str) -> Option<&str> {
        self.header
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Excel serial date of the block start, as written in the file.
    pub fn excel_days(&self) -> Option<f64> {
        self.excel_days
    }

    /// Wall-clock start of this block, decoded from `ExcelDateTime=`.
    pub fn start_datetime(&self) -> Option<NaiveDateTime> {
        self.excel_days.and_then(excel_to_datetime)
    }

    /// Time stamp of row `i` as written in the file.
    ///
    /// # Panics
    /// Panics if `i >= sample_count()`.
    pub fn local_time(&self, i: usize) -> f64 {
        self.local_times[i]
    }

    /// Time stamps of all rows, as written in the file.
    pub fn local_times(&self) -> &[f64] {
        &self.local_times
    }

    /// Data cells of row `i`, one per channel.
    ///
    /// # Panics
    /// Panics if `i >= sample_count()`.
    pub fn row(&self, i: usize) -> &[f64] {
        let w = self.names.len();
        &self.samples[i * w..(i + 1) * w]
    }

    /// Value at row `i`, channel column `channel`.
    ///
    /// # Panics
    /// Panics if either index is out of range.
    pub fn value(&self, i: usize, channel: usize) -> f64 {
        self.row(i)[channel]
    }

    /// All values of one channel column, in row order.
    ///
    /// Empty when `channel` is not a valid column of this block.
    pub fn channel_values(&self, channel: usize) -> impl Iterator<Item = f64> + '_ {
        let w = self.names.len();
        let rows = if channel < w { self.local_times.len() } else { 0 };
        self.samples
            .iter()
            .skip(channel)
            .step_by(w.max(1))
            .take(rows)
            .copied()
    }
}
