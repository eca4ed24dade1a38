// Internal utilities for documentation tests
// This file contains helper functions that write export files for doctests

use crate::Result;
use std::path::Path;

/// Writes a small two-block export for documentation examples
///
/// The file holds two channels sampled at 2 Hz, one inline comment and
/// one standalone comment row, with a recording pause between the two
/// blocks.
pub fn create_demo_export<P: AsRef<Path>>(path: P) -> Result<()> {
    let text = "Interval=\t0.5 s\n\
                ExcelDateTime=\t40728.5000000000 7/4/2011 12:00:00.0000\n\
                TimeFormat=\tStartOfBlock\n\
                ChannelTitle=\tFlow\tPressure\n\
                Range=\t10.000 V\t20.000 V\n\
                UnitName=\tL/min\tcmH2O\n\
                0\t0.82\t4.50\n\
                0.5\t0.91\t4.62\t#* INSPI\n\
                1\t0.87\t4.71\n\
                1.5\t0.79\t4.58\n\
                Interval=\t0.5 s\n\
                ExcelDateTime=\t40728.5001157407 7/4/2011 12:00:10.0000\n\
                ChannelTitle=\tFlow\tPressure\n\
                UnitName=\tL/min\tcmH2O\n\
                0\t0.65\t4.20\n\
                0.5\t0.58\t4.05\n\
                0.6\t#* EXPI\n\
                1\t0.61\t4.12\n";
    std::fs::write(path, text)?;
    Ok(())
}

/// Cleanup function to remove export files after doctests
pub fn cleanup_doctest_files() {
    let test_files = ["quick_start.txt", "open_demo.txt"];

    for file in &test_files {
        let _ = std::fs::remove_file(file);
    }
}
