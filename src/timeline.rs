//! The file-wide time axis.
//!
//! Each block's rows carry time stamps relative to the block itself, and
//! every block restarts its clock. The map built here places each block on
//! one continuous axis starting at zero: blocks follow each other
//! seamlessly unless their `ExcelDateTime=` stamps prove a recording pause,
//! in which case the pause is kept as a gap.

use tracing::warn;

use crate::reader::PendingComment;
use crate::types::{Block, Comment, Diagnostic};

/// Where one block sits on the continuous axis.
///
/// A span covers `[global_start, global_end)`. The end is exclusive:
/// `global_end = global_start + samples * interval`, so in a gapless file
/// the next block's first sample lands exactly one interval after the
/// previous block's last.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockSpan {
    /// Global time of the block's first sample, in seconds.
    pub global_start: f64,
    /// Global time just past the block's last sample, in seconds.
    pub global_end: f64,
    /// The block's first raw time stamp; local times are measured from it.
    pub local_origin: f64,
    /// Sampling interval in seconds.
    pub interval: f64,
    /// Number of sample rows in the block.
    pub samples: usize,
    /// Recording pause between the previous block and this one, in
    /// seconds. Zero when the blocks are seamless.
    pub gap_before: f64,
}

impl BlockSpan {
    /// Global time of row `index`.
    pub fn time_at(&self, index: usize) -> f64 {
        self.global_start + index as f64 * self.interval
    }

    /// Maps a time stamp as written in the file onto the global axis.
    pub fn global_from_local(&self, local: f64) -> f64 {
        self.global_start + (local - self.local_origin)
    }

    /// Whether a global time falls inside this span.
    pub fn contains(&self, global: f64) -> bool {
        global >= self.global_start && global < self.global_end
    }

    /// Length of the span in seconds.
    pub fn duration(&self) -> f64 {
        self.global_end - self.global_start
    }
}

/// Positions of all blocks on the continuous axis, in block order.
///
/// ```
/// use labchart_text::ParsedDocument;
///
/// let text = "Interval=\t0.5 s\n\
///             ChannelTitle=\tFlow\n\
///             0\t1.0\n\
///             0.5\t2.0\n\
///             Interval=\t0.5 s\n\
///             0\t3.0\n";
/// let doc = ParsedDocument::from_text(text).unwrap();
/// let map = doc.time_map();
///
/// assert_eq!(map.len(), 2);
/// assert_eq!(map.span(0).unwrap().global_end, 1.0);
/// assert_eq!(map.span(1).unwrap().global_start, 1.0);
/// assert_eq!(map.block_at(1.0), Some(1));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ContinuousTimeMap {
    spans: Vec<BlockSpan>,
}

impl ContinuousTimeMap {
    /// Lays the blocks out on one axis.
    ///
    /// Block 0 starts at zero. Every later block starts where the previous
    /// one ended, unless its `ExcelDateTime=` stamp places it later than
    /// that, which inserts a gap. A stamp placing it earlier is ignored;
    /// the axis never runs backwards.
    pub(crate) fn build(blocks: &[Block]) -> ContinuousTimeMap {
        let reference = blocks.first().and_then(|b| b.excel_days());
        let mut spans = Vec::with_capacity(blocks.len());
        let mut prev_end = 0.0_f64;

        for (i, block) in blocks.iter().enumerate() {
            let declared = match (reference, block.excel_days()) {
                (Some(r), Some(e)) if i > 0 => Some((e - r) * 86_400.0),
                _ => None,
            };
            let global_start = match declared {
                Some(d) if d > prev_end => d,
                _ => prev_end,
            };
            let global_end = global_start + block.sample_count() as f64 * block.interval();
            spans.push(BlockSpan {
                global_start,
                global_end,
                local_origin: block.local_times().first().copied().unwrap_or(0.0),
                interval: block.interval(),
                samples: block.sample_count(),
                gap_before: global_start - prev_end,
            });
            prev_end = global_end;
        }

        ContinuousTimeMap { spans }
    }

    /// Span of block `i`.
    pub fn span(&self, i: usize) -> Option<&BlockSpan> {
        self.spans.get(i)
    }

    /// All spans, in block order.
    pub fn spans(&self) -> &[BlockSpan] {
        &self.spans
    }

    /// Index of the block whose span contains the global time, if any.
    ///
    /// Spans are half-open, so a time sitting exactly on a seam belongs to
    /// the later block.
    pub fn block_at(&self, global: f64) -> Option<usize> {
        self.spans.iter().position(|s| s.contains(global))
    }

    /// End of the axis: total duration of the file including gaps.
    pub fn total_span(&self) -> f64 {
        self.spans.last().map_or(0.0, |s| s.global_end)
    }

    /// Number of blocks on the axis.
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

/// Places pending comments on the global axis and orders them.
///
/// A comment whose written time falls outside its block's span is clamped
/// to the nearest span edge and flagged, both on the comment and as a
/// diagnostic. Ties in global time keep file order.
pub(crate) fn resolve_comments(
    pending: Vec<Vec<PendingComment>>,
    map: &ContinuousTimeMap,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<Comment> {
    let mut comments = Vec::new();

    for (block, batch) in pending.into_iter().enumerate() {
        let span = match map.span(block) {
            Some(s) => *s,
            None => continue,
        };
        for p in batch {
            let raw = span.global_from_local(p.local_time);
            let global_time = raw.clamp(span.global_start, span.global_end);
            let clamped = global_time != raw;
            if clamped {
                let d = Diagnostic::CommentBounds {
                    line: p.line,
                    block,
                    local_time: p.local_time,
                    clamped_to: global_time,
                };
                warn!("{}", d);
                diagnostics.push(d);
            }
            comments.push(Comment {
                global_time,
                block,
                local_time: p.local_time,
                label: p.label,
                line: p.line,
                clamped,
            });
        }
    }

    comments.sort_by(|a, b| {
        a.global_time
            .total_cmp(&b.global_time)
            .then(a.line.cmp(&b.line))
    });
    comments
}
