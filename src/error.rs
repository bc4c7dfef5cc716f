use thiserror::Error;

/// Errors that can terminate an analysis run.
///
/// Every variant is fatal to the current file: the grader never fails, and
/// a malformed record or an unreadable file never produces a partial report.
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot read input: {0}")]
    Io(#[from] std::io::Error),

    #[error("gzip decompression failed: {0}")]
    Decompress(String),

    #[error("malformed FASTQ record at line {line}: {message}")]
    Parse { line: u64, message: String },

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
