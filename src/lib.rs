//! FASTQ quality statistics and trim-parameter search for amplicon reads.
//!
//! - Plain and `.gz` input (auto-detect), restartable streaming passes.
//! - Strict four-line records, validated and Phred-decoded once.
//! - Cached read count, seeded reservoir sampling, per-read and per-position
//!   expected-error aggregation, fixed-schema table exports.
//! - Threshold searches recommending a trim window, a truncation length and
//!   a maxEE cutoff ahead of DADA2 denoising.
//! - Optional `mmap` for plain files; `zlib` feature for system-zlib parity.

pub mod error;
pub mod phred;
pub mod policy;
pub mod reader;
pub mod record;
pub mod sampling;
pub mod search;
pub mod state;
pub mod stats;
pub mod table;
pub mod threshold;
pub mod writer;
mod util;

pub use crate::error::{FormatError, IoContext, QcError, Result, SearchExceededError};
pub use crate::phred::{PhredEncoding, expected_error};
pub use crate::policy::{Alphabet, ErrorPolicy, ReaderOptions, TrimConfig};
pub use crate::reader::{ByDirection, FastqReader, ReadSelection, Reads, Source};
pub use crate::record::{FastqRecord, ReadDirection};
pub use crate::sampling::{Sample, SampleKey, reservoir_step};
pub use crate::search::search_ambiguous_nucleotide;
pub use crate::state::{ReaderState, ScanState};
pub use crate::stats::{EeProfile, EeSummary, PositionStats};
pub use crate::table::{PositionRow, ReadRow, unpack_entries, write_tsv};
pub use crate::threshold::{
    MaxEeTrim, TrimCandidate, TrimRecommendation, TrimWarnings, TrimWindow, get_trim_length_avg_ee,
    read_size_by_avg_ee, read_size_by_max_ee, trim_ends_less_than_threshold,
};
pub use crate::writer::{write_fastq, write_fastq_path};
