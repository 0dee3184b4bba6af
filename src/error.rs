use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, QcError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IoContext {
    pub byte_pos: u64,
    pub line_num: u64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("expected header '@' at start of record")]
    MissingHeader,
    #[error("found FASTA header '>' where FASTQ '@' expected")]
    FastaHeaderDetected,
    #[error("missing '+' separator line")]
    MissingPlus,
    #[error("separator repeats identifier '{found}', header is '{header}'")]
    SeparatorMismatch { header: String, found: String },
    #[error("unexpected EOF inside record")]
    UnexpectedEof,
    #[error("quality length ({qual}) does not match sequence length ({seq})")]
    LengthMismatch { seq: usize, qual: usize },
    #[error("empty sequence")]
    EmptySequence,
    #[error("illegal nucleotide {symbol:?} at position {position}")]
    InvalidNucleotide { symbol: char, position: usize },
    #[error("quality character {symbol:?} at position {position} is outside the encoding range")]
    InvalidQuality { symbol: char, position: usize },
}

/// A bounded scan stopped at its bound without reaching an answer.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{scan} exceeded its bound of {bound} (reached {reached})")]
pub struct SearchExceededError {
    pub scan: &'static str,
    pub bound: usize,
    pub reached: usize,
}

#[derive(Debug, Error)]
pub enum QcError {
    #[error("I/O error at {ctx:?}: {source}")]
    Io {
        #[source]
        source: io::Error,
        ctx: IoContext,
    },
    #[error("format error at {ctx:?}: {source}")]
    Format {
        #[source]
        source: FormatError,
        ctx: IoContext,
    },
    #[error(transparent)]
    SearchExceeded(#[from] SearchExceededError),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("read index {index} out of range for {total} reads")]
    IndexOutOfRange { index: usize, total: usize },
    #[error("cannot sample {requested} reads from {total}")]
    SampleTooLarge { requested: usize, total: usize },
    #[error("table export failed: {0}")]
    Table(#[from] csv::Error),
}

impl QcError {
    pub(crate) fn io_err(source: io::Error, ctx: IoContext) -> Self {
        Self::Io { source, ctx }
    }
    pub(crate) fn fmt_err(source: FormatError, ctx: IoContext) -> Self {
        Self::Format { source, ctx }
    }
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}
