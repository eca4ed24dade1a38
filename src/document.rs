//! The parsed document: blocks, merged channel table, continuous time
//! axis, resolved comments and parse diagnostics behind one handle.

use std::fs;
use std::io;
use std::path::Path;

use chrono::NaiveDateTime;
use tracing::{debug, warn};

use crate::error::{LabChartError, Result};
use crate::reader::{read_blocks, ParseOutput};
use crate::timeline::{resolve_comments, ContinuousTimeMap};
use crate::types::{Block, ChannelInfo, Comment, Diagnostic};

/// A fully parsed export.
///
/// Parsing happens once, up front. Everything afterwards is lookups over
/// the already-built structure, so repeated queries are cheap and two
/// parses of the same text yield identical documents.
///
/// # Examples
///
/// ```rust
/// use labchart_text::ParsedDocument;
///
/// let text = "Interval=\t0.25 s\n\
///             ExcelDateTime=\t40000.5 6/7/2009 12:00:00.0000\n\
///             ChannelTitle=\tFlow\tPressure\n\
///             UnitName=\tL/s\tcmH2O\n\
///             0\t1.0\t5.0\n\
///             0.25\t1.1\t5.2\t#* INSPI\n\
///             0.5\t1.2\t5.4\n";
/// let doc = ParsedDocument::from_text(text).unwrap();
///
/// assert_eq!(doc.block_count(), 1);
/// assert_eq!(doc.sample_count(), 3);
/// assert_eq!(doc.interval(), 0.25);
/// assert_eq!(doc.channels().len(), 2);
/// assert_eq!(doc.unit_of("Pressure"), Some("cmH2O"));
///
/// let start = doc.start_datetime().unwrap();
/// assert_eq!(start.to_string(), "2009-07-06 12:00:00");
///
/// assert_eq!(doc.comments().len(), 1);
/// assert_eq!(doc.comments()[0].label, "INSPI");
/// assert_eq!(doc.comments()[0].global_time, 0.25);
/// ```
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    blocks: Vec<Block>,
    time_map: ContinuousTimeMap,
    comments: Vec<Comment>,
    channels: Vec<ChannelInfo>,
    /// Per block: the block-local column of each merged channel, if present.
    layouts: Vec<Vec<Option<usize>>>,
    /// Global row index of each block's first row.
    row_offsets: Vec<usize>,
    total_rows: usize,
    header: Vec<(String, String)>,
    diagnostics: Vec<Diagnostic>,
}

impl ParsedDocument {
    /// Reads and parses an export file.
    ///
    /// The file must be UTF-8; a leading byte order mark is accepted and
    /// skipped. Windows line endings are handled transparently.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use labchart_text::ParsedDocument;
    ///
    /// # labchart_text::doctest_utils::create_demo_export("open_demo.txt").unwrap();
    /// let doc = ParsedDocument::open("open_demo.txt").unwrap();
    /// assert_eq!(doc.block_count(), 2);
    /// assert_eq!(doc.channels().len(), 2);
    /// # std::fs::remove_file("open_demo.txt").ok();
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<ParsedDocument> {
        let path = path.as_ref();
        debug!(path = %path.display(), "opening export");
        let bytes = fs::read(path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                LabChartError::FileNotFound(path.display().to_string())
            } else {
                LabChartError::Io(e)
            }
        })?;

        let data = bytes.strip_prefix(b"\xef\xbb\xbf").unwrap_or(&bytes);
        let bom = bytes.len() - data.len();
        let text = std::str::from_utf8(data).map_err(|e| {
            let valid = e.valid_up_to();
            LabChartError::Encoding {
                offset: bom + valid,
                line: data[..valid].iter().filter(|&&b| b == b'\n').count() + 1,
            }
        })?;

        ParsedDocument::from_text(text)
    }

    /// Parses export text that is already in memory.
    pub fn from_text(text: &str) -> Result<ParsedDocument> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let output = read_blocks(text);
        assemble(output)
    }

    /// Header fields of the file-level header group, in file order.
    ///
    /// This is the group at the top of the file, which also introduces
    /// block 0. Keys keep their raw values, so opaque fields like `Range=`
    /// survive untouched.
    pub fn header(&self) -> &[(String, String)] {
        &self.header
    }

    /// Raw value of the first file-level header field with the given key.
    pub fn header_value(&self, key: &str) -> Option<&str> {
        self.header
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Wall-clock start of the recording, from block 0's `ExcelDateTime=`.
    pub fn start_datetime(&self) -> Option<NaiveDateTime> {
        self.blocks.first().and_then(|b| b.start_datetime())
    }

    /// Sampling interval of block 0, in seconds.
    pub fn interval(&self) -> f64 {
        self.blocks.first().map_or(0.0, |b| b.interval())
    }

    /// The merged channel table, in first-appearance order.
    ///
    /// Every channel that appears in any block is listed once. The unit is
    /// the first non-empty unit any block declared for it.
    pub fn channels(&self) -> &[ChannelInfo] {
        &self.channels
    }

    /// Position of a channel in the merged table, by exact name.
    pub fn channel_index(&self, name: &str) -> Option<usize> {
        self.channels.iter().position(|c| c.name == name)
    }

    /// Unit of a channel, by exact name.
    pub fn unit_of(&self, name: &str) -> Option<&str> {
        self.channels
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.unit.as_str())
    }

    /// All blocks, in file order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// A single block by index.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use labchart_text::{LabChartError, ParsedDocument};
    ///
    /// let text = "Interval=\t1 s\nChannelTitle=\tFlow\n0\t1.0\n";
    /// let doc = ParsedDocument::from_text(text).unwrap();
    ///
    /// assert_eq!(doc.block(0).unwrap().sample_count(), 1);
    /// assert!(matches!(doc.block(5), Err(LabChartError::InvalidBlockIndex(5))));
    /// ```
    pub fn block(&self, i: usize) -> Result<&Block> {
        self.blocks
            .get(i)
            .ok_or(LabChartError::InvalidBlockIndex(i))
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// The continuous time axis the blocks were laid out on.
    pub fn time_map(&self) -> &ContinuousTimeMap {
        &self.time_map
    }

    /// Global start time of every block, in block order.
    pub fn block_boundaries(&self) -> Vec<f64> {
        self.time_map
            .spans()
            .iter()
            .map(|s| s.global_start)
            .collect()
    }

    /// All comments, ordered by global time.
    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    /// Comments whose label matches, ignoring ASCII case.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use labchart_text::ParsedDocument;
    ///
    /// let text = "Interval=\t0.5 s\n\
    ///             ChannelTitle=\tFlow\n\
    ///             0\t1.0\n\
    ///             0.5\t1.2\t#* INSPI\n\
    ///             1\t1.4\n\
    ///             1.5\t1.1\t#* inspi\n\
    ///             2\t0.9\n";
    /// let doc = ParsedDocument::from_text(text).unwrap();
    ///
    /// let marks = doc.comments_labeled("INSPI");
    /// assert_eq!(marks.len(), 2);
    /// assert_eq!(marks[0].global_time, 0.5);
    /// assert_eq!(marks[1].global_time, 1.5);
    /// ```
    pub fn comments_labeled(&self, label: &str) -> Vec<&Comment> {
        self.comments
            .iter()
            .filter(|c| c.label.eq_ignore_ascii_case(label))
            .collect()
    }

    /// Everything the parser tolerated instead of failing on.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Total number of sample rows across all blocks.
    pub fn sample_count(&self) -> usize {
        self.total_rows
    }

    /// Iterates over every row of the file in global time order.
    pub fn rows(&self) -> Rows<'_> {
        Rows {
            doc: self,
            next: 0,
            end: self.total_rows,
        }
    }

    /// A single row by global row index.
    pub fn row(&self, i: usize) -> Option<Row<'_>> {
        let (block, local) = self.locate(i)?;
        Some(Row {
            doc: self,
            block,
            local,
        })
    }

    /// The row whose global time is closest to `t`.
    ///
    /// `t` may fall in a gap or outside the recording entirely; the
    /// nearest existing sample is returned. `None` only when the file has
    /// no sample rows at all.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use labchart_text::ParsedDocument;
    ///
    /// let text = "Interval=\t0.5 s\nChannelTitle=\tFlow\n\
    ///             0\t1.0\n0.5\t1.2\n1\t1.4\n";
    /// let doc = ParsedDocument::from_text(text).unwrap();
    ///
    /// let row = doc.nearest_row(0.6).unwrap();
    /// assert_eq!(row.global_time(), 0.5);
    /// assert_eq!(row.value(0), 1.2);
    ///
    /// let last = doc.nearest_row(99.0).unwrap();
    /// assert_eq!(last.global_time(), 1.0);
    /// ```
    pub fn nearest_row(&self, t: f64) -> Option<Row<'_>> {
        let mut best: Option<(f64, usize, usize)> = None;
        for (b, span) in self.time_map.spans().iter().enumerate() {
            if span.samples == 0 {
                continue;
            }
            let steps = ((t - span.global_start) / span.interval).round();
            let idx = if steps <= 0.0 {
                0
            } else {
                (steps as usize).min(span.samples - 1)
            };
            let dist = (span.time_at(idx) - t).abs();
            if best.map_or(true, |(d, _, _)| dist < d) {
                best = Some((dist, b, idx));
            }
        }
        best.map(|(_, block, local)| Row {
            doc: self,
            block,
            local,
        })
    }

    /// Rows whose global time lies in `[tmin, tmax]`, both ends inclusive.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use labchart_text::ParsedDocument;
    ///
    /// let text = "Interval=\t0.5 s\nChannelTitle=\tFlow\n\
    ///             0\t1.0\n0.5\t1.2\n1\t1.4\n1.5\t1.6\n";
    /// let doc = ParsedDocument::from_text(text).unwrap();
    ///
    /// let times: Vec<f64> = doc.rows_between(0.5, 1.0).map(|r| r.global_time()).collect();
    /// assert_eq!(times, vec![0.5, 1.0]);
    /// ```
    pub fn rows_between(&self, tmin: f64, tmax: f64) -> Rows<'_> {
        let start = self.partition_rows(|t| t < tmin);
        let end = self.partition_rows(|t| t <= tmax);
        Rows {
            doc: self,
            next: start,
            end: end.max(start),
        }
    }

    /// One channel across the whole file, in global row order.
    ///
    /// Blocks that do not carry the channel contribute NaN for each of
    /// their rows, so the result always has [`sample_count`] values.
    ///
    /// [`sample_count`]: ParsedDocument::sample_count
    ///
    /// # Examples
    ///
    /// ```rust
    /// use labchart_text::ParsedDocument;
    ///
    /// let text = "Interval=\t1 s\nChannelTitle=\tFlow\n\
    ///             0\t1.0\n1\t2.0\n\
    ///             Interval=\t1 s\nChannelTitle=\tFlow\tPressure\n\
    ///             0\t3.0\t9.0\n";
    /// let doc = ParsedDocument::from_text(text).unwrap();
    ///
    /// assert_eq!(doc.channel_column("Flow").unwrap(), vec![1.0, 2.0, 3.0]);
    ///
    /// let pressure = doc.channel_column("Pressure").unwrap();
    /// assert!(pressure[0].is_nan());
    /// assert!(pressure[1].is_nan());
    /// assert_eq!(pressure[2], 9.0);
    ///
    /// assert!(doc.channel_column("Volume").is_err());
    /// ```
    pub fn channel_column(&self, name: &str) -> Result<Vec<f64>> {
        let chan = self
            .channel_index(name)
            .ok_or_else(|| LabChartError::UnknownChannel(name.to_string()))?;

        let mut out = Vec::with_capacity(self.total_rows);
        for (b, block) in self.blocks.iter().enumerate() {
            match self.layouts[b][chan] {
                Some(col) => out.extend(block.channel_values(col)),
                None => out.resize(out.len() + block.sample_count(), f64::NAN),
            }
        }
        Ok(out)
    }

    /// One channel of one block, by the block's own column layout.
    pub fn block_channel(&self, block: usize, name: &str) -> Result<Vec<f64>> {
        let b = self.block(block)?;
        let col = b
            .channel_index(name)
            .ok_or_else(|| LabChartError::UnknownChannel(name.to_string()))?;
        Ok(b.channel_values(col).collect())
    }

    /// Block and block-local row index of a global row index.
    fn locate(&self, i: usize) -> Option<(usize, usize)> {
        if i >= self.total_rows {
            return None;
        }
        let b = self.row_offsets.partition_point(|&off| off <= i) - 1;
        Some((b, i - self.row_offsets[b]))
    }

    fn global_time_of(&self, i: usize) -> Option<f64> {
        let (b, local) = self.locate(i)?;
        self.time_map.span(b).map(|s| s.time_at(local))
    }

    /// First global row index whose time fails the predicate. Rows are
    /// sorted by global time, which makes this a binary search.
    fn partition_rows(&self, pred: impl Fn(f64) -> bool) -> usize {
        let mut lo = 0usize;
        let mut hi = self.total_rows;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            match self.global_time_of(mid) {
                Some(t) if pred(t) => lo = mid + 1,
                _ => hi = mid,
            }
        }
        lo
    }
}

/// One sample row viewed against the whole document.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    doc: &'a ParsedDocument,
    block: usize,
    local: usize,
}

impl<'a> Row<'a> {
    /// Position of this row on the continuous axis, in seconds.
    pub fn global_time(&self) -> f64 {
        self.doc
            .time_map
            .span(self.block)
            .map_or(f64::NAN, |s| s.time_at(self.local))
    }

    /// Index of the block this row belongs to.
    pub fn block_index(&self) -> usize {
        self.block
    }

    /// Row index within its block.
    pub fn local_index(&self) -> usize {
        self.local
    }

    /// Time stamp as written in the file.
    pub fn local_time(&self) -> f64 {
        self.doc.blocks[self.block].local_time(self.local)
    }

    /// Value of a channel by its position in the merged channel table.
    ///
    /// NaN when the channel does not exist in this row's block.
    pub fn value(&self, channel: usize) -> f64 {
        match self.doc.layouts[self.block].get(channel) {
            Some(Some(col)) => self.doc.blocks[self.block].value(self.local, *col),
            _ => f64::NAN,
        }
    }

    /// Value of a channel by name. `None` for names not in the channel
    /// table, NaN for channels absent from this row's block.
    pub fn get(&self, name: &str) -> Option<f64> {
        let chan = self.doc.channel_index(name)?;
        Some(self.value(chan))
    }

    /// The raw data cells of the row, in the block's own column order.
    pub fn cells(&self) -> &'a [f64] {
        self.doc.blocks[self.block].row(self.local)
    }
}

/// Iterator over a contiguous range of global rows.
pub struct Rows<'a> {
    doc: &'a ParsedDocument,
    next: usize,
    end: usize,
}

impl<'a> Iterator for Rows<'a> {
    type Item = Row<'a>;

    fn next(&mut self) -> Option<Row<'a>> {
        if self.next >= self.end {
            return None;
        }
        let row = self.doc.row(self.next);
        self.next += 1;
        row
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.end - self.next;
        (left, Some(left))
    }
}

impl ExactSizeIterator for Rows<'_> {}

/// Structural checks and cross-block bookkeeping over the reader output.
fn assemble(output: ParseOutput) -> Result<ParsedDocument> {
    let ParseOutput {
        blocks,
        pending,
        file_header,
        mut diagnostics,
    } = output;

    if blocks.is_empty() {
        return Err(LabChartError::NoBlocks);
    }
    for block in &blocks {
        if block.channel_count() == 0 {
            return Err(LabChartError::NoChannels {
                block: block.index(),
                line: block.line(),
            });
        }
    }

    let channels = merge_channels(&blocks, &mut diagnostics);
    let layouts: Vec<Vec<Option<usize>>> = blocks
        .iter()
        .map(|b| channels.iter().map(|c| b.channel_index(&c.name)).collect())
        .collect();

    let mut row_offsets = Vec::with_capacity(blocks.len());
    let mut total_rows = 0;
    for block in &blocks {
        row_offsets.push(total_rows);
        total_rows += block.sample_count();
    }

    let time_map = ContinuousTimeMap::build(&blocks);
    let comments = resolve_comments(pending, &time_map, &mut diagnostics);

    let mut header = file_header;
    if let Some(first) = blocks.first() {
        header.extend(first.header.iter().cloned());
    }

    debug!(
        blocks = blocks.len(),
        channels = channels.len(),
        rows = total_rows,
        comments = comments.len(),
        "document assembled"
    );

    Ok(ParsedDocument {
        blocks,
        time_map,
        comments,
        channels,
        layouts,
        row_offsets,
        total_rows,
        header,
        diagnostics,
    })
}

/// The file-wide channel table: every channel once, in first-appearance
/// order, first non-empty unit kept.
fn merge_channels(blocks: &[Block], diagnostics: &mut Vec<Diagnostic>) -> Vec<ChannelInfo> {
    let mut channels: Vec<ChannelInfo> = Vec::new();
    for block in blocks {
        for (name, unit) in block.names.iter().zip(block.units.iter()) {
            match channels.iter_mut().find(|c| &c.name == name) {
                None => channels.push(ChannelInfo {
                    name: name.clone(),
                    unit: unit.clone(),
                }),
                Some(c) => {
                    if c.unit.is_empty() && !unit.is_empty() {
                        c.unit = unit.clone();
                    } else if !unit.is_empty() && c.unit != *unit {
                        let d = Diagnostic::UnitConflict {
                            channel: name.clone(),
                            kept: c.unit.clone(),
                            seen: unit.clone(),
                            block: block.index(),
                        };
                        warn!("{}", d);
                        diagnostics.push(d);
                    }
                }
            }
        }
    }
    channels
}
