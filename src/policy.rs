use crate::phred::PhredEncoding;
use serde::{Deserialize, Serialize};

/// Error handling policy for malformed records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Skip malformed records and continue at the next header.
    Skip,
    /// Return the first error to the caller (strict).
    Return,
}

/// Which nucleotide symbols a sequence line may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alphabet {
    /// `A`, `C`, `G`, `T` and `N`, either case.
    Acgtn,
    /// Full IUPAC code set including `U`, either case.
    Iupac,
}

#[derive(Debug, Clone)]
pub struct ReaderOptions {
    pub error_policy: ErrorPolicy,
    pub fastq_only: bool,
    pub encoding: PhredEncoding,
    pub alphabet: Alphabet,
    /// Upper bound on the ambiguous-nucleotide scan. `None` bounds it by the
    /// sequence length.
    pub max_scan_len: Option<usize>,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            error_policy: ErrorPolicy::Return,
            fastq_only: true,
            encoding: PhredEncoding::Phred33,
            alphabet: Alphabet::Acgtn,
            max_scan_len: None,
        }
    }
}

/// Defaults for the threshold searches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrimConfig {
    /// Phred floor used for obvious end trimming (0..=42).
    pub quality_threshold: u8,
    /// Largest fraction of the read expected to go in obvious trimming.
    pub obvious_max_trim: f64,
    /// Largest fraction of the read trimmed at either end afterwards.
    pub max_trim_percent: f64,
    /// Per-read expected error above which a read needs more trimming.
    pub max_ee: f64,
    /// Mean expected error per position accepted for a trim window.
    pub max_mean_ee: f64,
}

impl Default for TrimConfig {
    fn default() -> Self {
        Self {
            quality_threshold: 30,
            obvious_max_trim: 0.1,
            max_trim_percent: 0.2,
            max_ee: 2.0,
            max_mean_ee: 0.01,
        }
    }
}

impl TrimConfig {
    /// Checks ranges; warns on settings that are legal but unusual.
    pub fn validate(&self) -> crate::Result<()> {
        if self.quality_threshold > crate::phred::MAX_SCORE {
            return Err(crate::QcError::invalid(format!(
                "quality threshold {} outside 0..={}",
                self.quality_threshold,
                crate::phred::MAX_SCORE
            )));
        }
        for (name, value) in [
            ("obvious_max_trim", self.obvious_max_trim),
            ("max_trim_percent", self.max_trim_percent),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(crate::QcError::invalid(format!(
                    "{name} must be within 0..=1, got {value}"
                )));
            }
        }
        if self.max_ee < 0.0 || self.max_mean_ee < 0.0 {
            return Err(crate::QcError::invalid("expected-error limits must be non-negative"));
        }
        if self.obvious_max_trim > self.max_trim_percent {
            log::warn!(
                "obvious max trim ({}) is larger than the additional max trim ({})",
                self.obvious_max_trim,
                self.max_trim_percent
            );
        }
        Ok(())
    }
}
