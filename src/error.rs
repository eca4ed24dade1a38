use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LabChartError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid text encoding at byte {offset} (line {line}): not valid UTF-8")]
    Encoding { offset: usize, line: usize },

    #[error("No recording blocks found in file")]
    NoBlocks,

    #[error("Block {block} (starting at line {line}) declares no channels")]
    NoChannels { block: usize, line: usize },

    #[error("Unknown channel: {0}")]
    UnknownChannel(String),

    #[error("Block index {0} out of range")]
    InvalidBlockIndex(usize),
}

pub type Result<T> = std::result::Result<T, LabChartError>;
