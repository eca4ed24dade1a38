//! Line classification for the tab-delimited export format.
//!
//! Every line of an export is exactly one of: a header field, a sample
//! row, a standalone comment row, or noise. Classification is total; it
//! never fails, it only decides. What to do with each line is the
//! reader's business.

use crate::utils::{is_float_token, parse_cell, strip_sentinel};

/// Which of the two per-channel header rows a line is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelHeaderKind {
    /// `ChannelTitle=`
    Titles,
    /// `UnitName=`
    Units,
}

/// What a single line of an export turned out to be.
#[derive(Debug, Clone, PartialEq)]
pub enum LineKind {
    /// An `Interval=` field. Every block's header group opens with one,
    /// so this doubles as the block marker.
    BlockMarker { value: String },
    /// A `ChannelTitle=` or `UnitName=` field, split into per-channel cells.
    ChannelHeader {
        kind: ChannelHeaderKind,
        fields: Vec<String>,
    },
    /// Any other `Key=` field, kept verbatim.
    HeaderField { key: String, value: String },
    /// A data row: time stamp, one value per channel, and possibly an
    /// inline comment from cells beyond the declared channel count.
    SampleRow {
        time: f64,
        values: Vec<f64>,
        comment: Option<String>,
    },
    /// A row whose first token is a time stamp but whose remainder is text.
    CommentRow { time: f64, text: String },
    /// Whitespace only.
    Blank,
    /// None of the above.
    Unknown,
}

/// Classifies one line.
///
/// `expected_columns` is the channel count of the block currently being
/// read, if any. It decides where a sample row's data cells end and an
/// inline comment begins. Without it, every cell after the time stamp is
/// treated as data.
pub fn classify(line: &str, expected_columns: Option<usize>) -> LineKind {
    if line.trim().is_empty() {
        return LineKind::Blank;
    }

    let cells: Vec<&str> = line.split('\t').collect();
    let first = cells[0].trim();

    if let Some(key) = first.strip_suffix('=') {
        return classify_header(key, &cells[1..]);
    }

    if is_float_token(first) {
        return classify_data(first, &cells[1..], expected_columns);
    }

    LineKind::Unknown
}

fn classify_header(key: &str, rest: &[&str]) -> LineKind {
    match key {
        "Interval" => LineKind::BlockMarker {
            value: rest.join("\t").trim().to_string(),
        },
        "ChannelTitle" | "UnitName" => {
            let kind = if key == "ChannelTitle" {
                ChannelHeaderKind::Titles
            } else {
                ChannelHeaderKind::Units
            };
            let mut fields: Vec<String> = rest.iter().map(|c| c.trim().to_string()).collect();
            while fields.last().map_or(false, |f| f.is_empty()) {
                fields.pop();
            }
            LineKind::ChannelHeader { kind, fields }
        }
        _ => LineKind::HeaderField {
            key: key.to_string(),
            value: rest.join("\t").trim().to_string(),
        },
    }
}

fn classify_data(first: &str, rest: &[&str], expected_columns: Option<usize>) -> LineKind {
    // is_float_token guarantees this parses.
    let time: f64 = match first.parse() {
        Ok(t) => t,
        Err(_) => return LineKind::Unknown,
    };

    let data_end = match expected_columns {
        Some(n) => n.min(rest.len()),
        None => rest.len(),
    };

    let mut values = Vec::with_capacity(data_end);
    for cell in &rest[..data_end] {
        match parse_cell(cell) {
            Some(v) => values.push(v),
            // One non-numeric cell inside the data window turns the whole
            // row into a comment, text taken from everything after the time.
            None => {
                return LineKind::CommentRow {
                    time,
                    text: strip_sentinel(rest.join("\t").trim()).to_string(),
                };
            }
        }
    }

    let surplus = rest[data_end..].join("\t");
    let surplus = surplus.trim();
    let comment = if surplus.is_empty() {
        None
    } else {
        Some(strip_sentinel(surplus).to_string())
    };

    LineKind::SampleRow {
        time,
        values,
        comment,
    }
}
