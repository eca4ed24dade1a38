//! Streaming assembly of classified lines into recording blocks.
//!
//! A block is opened by an `Interval=` field and closed by the next one
//! (or end of input). Within a block the reader tolerates and records
//! deviations instead of failing: short rows are dropped, stray header
//! fields skipped, irregular row spacing flagged. A backwards jump in the
//! time column splits the data into a new block even without a header
//! group, since that is how a pause shows up when the export writer did
//! not repeat the header.

use tracing::{debug, warn};

use crate::classify::{classify, ChannelHeaderKind, LineKind};
use crate::types::{Block, Diagnostic, RowIntegrityKind};
use crate::utils::{leading_float, parse_interval};
use crate::{DEFAULT_INTERVAL, INTERVAL_DRIFT_TOLERANCE};

/// A comment waiting for the continuous time axis to exist.
#[derive(Debug, Clone)]
pub struct PendingComment {
    pub local_time: f64,
    pub label: String,
    pub line: usize,
}

/// Everything the line-level pass produces.
#[derive(Debug)]
pub struct ParseOutput {
    pub blocks: Vec<Block>,
    /// Comments per block, indexed like `blocks`.
    pub pending: Vec<Vec<PendingComment>>,
    /// Header fields seen before the first block marker.
    pub file_header: Vec<(String, String)>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Runs the line pass over the whole input.
pub fn read_blocks(text: &str) -> ParseOutput {
    let mut reader = Reader::default();
    for (i, line) in text.lines().enumerate() {
        reader.push(i + 1, line);
    }
    reader.finish()
}

/// A block whose lines are still coming in.
struct OpenBlock {
    marker_line: usize,
    is_continuation: bool,
    header: Vec<(String, String)>,
    interval_text: Option<String>,
    excel_days: Option<f64>,
    titles: Option<Vec<String>>,
    units: Option<Vec<String>>,
    /// Resolved channel count, 0 until the first sample row.
    columns: usize,
    in_data: bool,
    local_times: Vec<f64>,
    row_lines: Vec<usize>,
    samples: Vec<f64>,
    comments: Vec<PendingComment>,
}

impl OpenBlock {
    fn new(marker_line: usize, is_continuation: bool) -> Self {
        OpenBlock {
            marker_line,
            is_continuation,
            header: Vec::new(),
            interval_text: None,
            excel_days: None,
            titles: None,
            units: None,
            columns: 0,
            in_data: false,
            local_times: Vec::new(),
            row_lines: Vec::new(),
            samples: Vec::new(),
            comments: Vec::new(),
        }
    }
}

#[derive(Default)]
struct Reader {
    blocks: Vec<Block>,
    pending: Vec<Vec<PendingComment>>,
    file_header: Vec<(String, String)>,
    diagnostics: Vec<Diagnostic>,
    current: Option<OpenBlock>,
}

impl Reader {
    /// Channel count to classify data rows against, if known yet.
    fn expected_columns(&self) -> Option<usize> {
        let block = self.current.as_ref()?;
        if block.columns > 0 {
            return Some(block.columns);
        }
        if let Some(titles) = &block.titles {
            return Some(titles.len());
        }
        self.blocks.last().map(|prev| prev.channel_count())
    }

    fn in_data(&self) -> bool {
        self.current.as_ref().map_or(false, |b| b.in_data)
    }

    fn note(&mut self, diagnostic: Diagnostic) {
        warn!("{}", diagnostic);
        self.diagnostics.push(diagnostic);
    }

    fn skip_line(&mut self, line_no: usize, raw: &str) {
        self.note(Diagnostic::UnrecognizedLine {
            line: line_no,
            text: raw.trim().to_string(),
        });
    }

    fn push(&mut self, line_no: usize, raw: &str) {
        match classify(raw, self.expected_columns()) {
            LineKind::Blank => {}
            LineKind::BlockMarker { value } => {
                self.flush();
                debug!(line = line_no, "block header group opened");
                let mut block = OpenBlock::new(line_no, false);
                block.header.push(("Interval".to_string(), value.clone()));
                block.interval_text = Some(value);
                self.current = Some(block);
            }
            LineKind::ChannelHeader { kind, fields } => {
                self.push_channel_header(line_no, raw, kind, fields)
            }
            LineKind::HeaderField { key, value } => {
                self.push_header_field(line_no, raw, key, value)
            }
            LineKind::SampleRow {
                time,
                values,
                comment,
            } => self.push_sample(line_no, time, values, comment),
            LineKind::CommentRow { time, text } => self.push_comment(line_no, raw, time, text),
            LineKind::Unknown => self.skip_line(line_no, raw),
        }
    }

    fn push_channel_header(
        &mut self,
        line_no: usize,
        raw: &str,
        kind: ChannelHeaderKind,
        fields: Vec<String>,
    ) {
        let key = match kind {
            ChannelHeaderKind::Titles => "ChannelTitle",
            ChannelHeaderKind::Units => "UnitName",
        };
        if self.current.is_none() {
            self.file_header.push((key.to_string(), fields.join("\t")));
            return;
        }
        if self.in_data() {
            // Channel rows after data can only come from a mangled export;
            // the next block starts at Interval=, not here.
            self.skip_line(line_no, raw);
            return;
        }
        if let Some(block) = self.current.as_mut() {
            block.header.push((key.to_string(), fields.join("\t")));
            if !fields.is_empty() {
                match kind {
                    ChannelHeaderKind::Titles => block.titles = Some(fields),
                    ChannelHeaderKind::Units => block.units = Some(fields),
                }
            }
        }
    }

    fn push_header_field(&mut self, line_no: usize, raw: &str, key: String, value: String) {
        if self.current.is_none() {
            self.file_header.push((key, value));
            return;
        }
        if self.in_data() {
            self.skip_line(line_no, raw);
            return;
        }
        if let Some(block) = self.current.as_mut() {
            if key == "ExcelDateTime" {
                block.excel_days = leading_float(&value);
            }
            block.header.push((key, value));
        }
    }

    fn push_comment(&mut self, line_no: usize, raw: &str, time: f64, text: String) {
        match self.current.as_mut() {
            Some(block) => block.comments.push(PendingComment {
                local_time: time,
                label: text,
                line: line_no,
            }),
            None => self.skip_line(line_no, raw),
        }
    }

    fn push_sample(&mut self, line_no: usize, time: f64, values: Vec<f64>, comment: Option<String>) {
        if self.current.is_none() {
            self.note(Diagnostic::UnrecognizedLine {
                line: line_no,
                text: format!("data row before any block header ({} cells)", values.len() + 1),
            });
            return;
        }

        // A backwards time stamp means the export writer started a new
        // recording segment without repeating the header group.
        let resets = self
            .current
            .as_ref()
            .map_or(false, |b| b.local_times.last().map_or(false, |last| time < *last));
        if resets {
            self.flush();
            debug!(line = line_no, "time column reset, splitting block");
            self.current = Some(OpenBlock::new(line_no, true));
        }

        let prev_columns = self.blocks.last().map(|b| b.channel_count());
        let block_index = self.blocks.len();

        let expected = match self.current.as_mut() {
            Some(block) => {
                if block.columns == 0 {
                    block.columns = match (&block.titles, prev_columns) {
                        (Some(titles), _) => titles.len(),
                        (None, Some(n)) => n,
                        (None, None) => values.len(),
                    };
                }
                block.columns
            }
            None => return,
        };

        if values.len() < expected {
            self.note(Diagnostic::RowIntegrity {
                line: line_no,
                block: block_index,
                kind: RowIntegrityKind::ColumnCount {
                    expected,
                    found: values.len(),
                },
            });
            return;
        }

        if let Some(block) = self.current.as_mut() {
            block.in_data = true;
            block.local_times.push(time);
            block.row_lines.push(line_no);
            block.samples.extend(values);
            if let Some(label) = comment {
                block.comments.push(PendingComment {
                    local_time: time,
                    label,
                    line: line_no,
                });
            }
        }
    }

    /// Closes the open block, resolving channels and interval.
    fn flush(&mut self) {
        let open = match self.current.take() {
            Some(b) => b,
            None => return,
        };
        let index = self.blocks.len();

        let (names, units) = self.resolve_channels(&open);
        let interval = self.resolve_interval(&open, index);

        // Row spacing is checked against the resolved interval; irregular
        // rows are flagged but stay in the block.
        for i in 1..open.local_times.len() {
            let dt = open.local_times[i] - open.local_times[i - 1];
            if (dt - interval).abs() > INTERVAL_DRIFT_TOLERANCE * interval {
                self.note(Diagnostic::RowIntegrity {
                    line: open.row_lines[i],
                    block: index,
                    kind: RowIntegrityKind::IntervalDrift {
                        expected: interval,
                        found: dt,
                    },
                });
            }
        }

        debug!(
            block = index,
            rows = open.local_times.len(),
            channels = names.len(),
            interval,
            "block complete"
        );

        self.blocks.push(Block {
            index,
            marker_line: open.marker_line,
            is_continuation: open.is_continuation,
            header: open.header,
            excel_days: open.excel_days,
            interval,
            names,
            units,
            local_times: open.local_times,
            samples: open.samples,
        });
        self.pending.push(open.comments);
    }

    /// Channel names and units for a finished block.
    ///
    /// Names come from `ChannelTitle=`, or the previous block, or are
    /// synthesized as `Ch1..ChN` from the first row's width. Units are
    /// padded with `""` to the channel count.
    fn resolve_channels(&self, open: &OpenBlock) -> (Vec<String>, Vec<String>) {
        let prev = self.blocks.last();

        let names: Vec<String> = match (&open.titles, prev) {
            (Some(titles), _) => titles.clone(),
            (None, Some(p)) => p.names.clone(),
            (None, None) => (1..=open.columns).map(|i| format!("Ch{}", i)).collect(),
        };

        let mut units: Vec<String> = match (&open.units, &open.titles, prev) {
            (Some(u), _, _) => u.clone(),
            // A block that inherited its names wholesale inherits units too.
            (None, None, Some(p)) => p.units.clone(),
            _ => Vec::new(),
        };
        units.resize(names.len(), String::new());

        (names, units)
    }

    /// Sampling interval for a finished block.
    ///
    /// Declared value first. Failing that: the spacing of the first two
    /// rows, then the previous block, then one second.
    fn resolve_interval(&mut self, open: &OpenBlock, index: usize) -> f64 {
        if open.is_continuation {
            if let Some(prev) = self.blocks.last() {
                return prev.interval;
            }
        }
        if let Some(text) = &open.interval_text {
            if let Some(v) = parse_interval(text) {
                return v;
            }
        }

        let derived = match open.local_times.as_slice() {
            [a, b, ..] if b - a > 0.0 && (b - a).is_finite() => Some(b - a),
            _ => None,
        };
        let fallback = derived
            .or_else(|| self.blocks.last().map(|p| p.interval))
            .unwrap_or(DEFAULT_INTERVAL);
        self.note(Diagnostic::MissingInterval {
            block: index,
            fallback,
        });
        fallback
    }

    fn finish(mut self) -> ParseOutput {
        self.flush();
        ParseOutput {
            blocks: self.blocks,
            pending: self.pending,
            file_header: self.file_header,
            diagnostics: self.diagnostics,
        }
    }
}
