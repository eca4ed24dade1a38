//! # LabChart Text Export Parser
//!
//! A pure Rust parser for text exports from ADInstruments LabChart.
//! An export is a tab-delimited file: `Key=` header fields, per-block
//! header groups, sample rows, and comments mixed into the data. This
//! library turns one into a [`ParsedDocument`]: recording blocks, a merged
//! channel table, all comments resolved onto one continuous time axis, and
//! a list of everything odd the parser tolerated along the way.
//!
//! ## Quick Start
//!
//! ### Reading an export file
//!
//! ```rust
//! use labchart_text::{ParsedDocument, Result};
//!
//! fn main() -> Result<()> {
//!     # labchart_text::doctest_utils::create_demo_export("quick_start.txt")?;
//!     let doc = ParsedDocument::open("quick_start.txt")?;
//!
//!     println!("Channels: {}", doc.channels().len());
//!     println!("Blocks:   {}", doc.block_count());
//!     println!("Duration: {:.1} s", doc.time_map().total_span());
//!
//!     for comment in doc.comments() {
//!         println!("[{:8.3} s] {}", comment.global_time, comment.label);
//!     }
//!
//!     # assert_eq!(doc.block_count(), 2);
//!     # assert_eq!(doc.sample_count(), 7);
//!     # assert_eq!(doc.comments().len(), 2);
//!     # std::fs::remove_file("quick_start.txt").ok();
//!     Ok(())
//! }
//! ```
//!
//! ### Parsing from memory
//!
//! ```rust
//! use labchart_text::ParsedDocument;
//!
//! let text = "Interval=\t0.5 s\n\
//!             ChannelTitle=\tFlow\tPressure\n\
//!             UnitName=\tL/min\tcmH2O\n\
//!             0\t0.8\t4.5\n\
//!             0.5\t0.9\t4.6\t#* INSPI\n\
//!             1\t0.7\t4.4\n";
//! let doc = ParsedDocument::from_text(text).unwrap();
//!
//! let flow = doc.channel_column("Flow").unwrap();
//! assert_eq!(flow, vec![0.8, 0.9, 0.7]);
//!
//! // Comments land on the continuous time axis
//! assert_eq!(doc.comments()[0].label, "INSPI");
//! assert_eq!(doc.comments()[0].global_time, 0.5);
//! ```
//!
//! ## The continuous time axis
//!
//! Every block's time column restarts near zero, so block-local times are
//! useless for file-wide work. The [`ContinuousTimeMap`] lays all blocks
//! out on one axis starting at zero: consecutive blocks join seamlessly,
//! one sampling interval apart, unless their `ExcelDateTime=` stamps show
//! the recording was paused, in which case the pause stays as a gap.
//!
//! ```rust
//! use labchart_text::ParsedDocument;
//!
//! let text = "Interval=\t0.5 s\n\
//!             ChannelTitle=\tFlow\n\
//!             0\t1.0\n\
//!             0.5\t2.0\n\
//!             Interval=\t0.5 s\n\
//!             0\t3.0\n";
//! let doc = ParsedDocument::from_text(text).unwrap();
//!
//! // The second block starts exactly where the first ended.
//! assert_eq!(doc.block_boundaries(), vec![0.0, 1.0]);
//! let times: Vec<f64> = doc.rows().map(|r| r.global_time()).collect();
//! assert_eq!(times, vec![0.0, 0.5, 1.0]);
//! ```
//!
//! ## Malformed input
//!
//! Structural problems (no blocks at all, a block without channels, a file
//! that is not UTF-8) fail the parse with a [`LabChartError`]. Everything
//! smaller (short rows, irregular row spacing, out-of-range comment
//! stamps, unrecognized lines) is tolerated, repaired where possible and
//! recorded as a [`Diagnostic`] on the document.

pub mod classify;
pub mod document;
pub mod error;
pub mod reader;
pub mod timeline;
pub mod types;
pub mod utils;

#[doc(hidden)]
pub mod doctest_utils; // For internal doctest support

// Re-export main types for convenience
pub use document::{ParsedDocument, Row, Rows};
pub use error::{LabChartError, Result};
pub use timeline::{BlockSpan, ContinuousTimeMap};
pub use types::{Block, ChannelInfo, Comment, Diagnostic, RowIntegrityKind};

// Format constants
pub const COMMENT_SENTINEL: &str = "#*"; // prefix LabChart puts on comment text
pub const INTERVAL_DRIFT_TOLERANCE: f64 = 0.01; // relative row-spacing tolerance
pub const DEFAULT_INTERVAL: f64 = 1.0; // seconds, when nothing better is known

/// Library version
///
/// Returns the current version of the labchart-text library.
///
/// # Examples
///
/// ```rust
/// use labchart_text;
///
/// let version = labchart_text::version();
/// assert!(!version.is_empty());
/// assert!(version.contains('.'));
/// println!("labchart-text version: {}", version);
/// ```
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
