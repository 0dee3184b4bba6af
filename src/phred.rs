//! Phred quality decoding and expected error.

/// Highest average quality accepted by the threshold searches.
pub const MAX_SCORE: u8 = 42;

/// Last printable ASCII character usable in a quality line.
const MAX_QUAL_BYTE: u8 = b'~';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhredEncoding {
    /// Phred+33 (Sanger / Illumina 1.8+).
    Phred33,
    /// Phred+64 (Illumina 1.3-1.7).
    Phred64,
}

impl PhredEncoding {
    #[inline]
    pub fn offset(self) -> u8 {
        match self {
            PhredEncoding::Phred33 => 33,
            PhredEncoding::Phred64 => 64,
        }
    }

    /// Decode one quality character. `None` when it falls outside
    /// `offset..='~'`.
    #[inline]
    pub fn decode(self, byte: u8) -> Option<u8> {
        let offset = self.offset();
        (offset..=MAX_QUAL_BYTE)
            .contains(&byte)
            .then(|| byte - offset)
    }

    #[inline]
    pub fn encode(self, score: u8) -> u8 {
        score.saturating_add(self.offset()).min(MAX_QUAL_BYTE)
    }
}

/// Error probability of a base call with quality `q`: `10^(-q/10)`.
#[inline]
pub fn expected_error(q: u8) -> f64 {
    10_f64.powf(-f64::from(q) / 10.0)
}

/// Expected number of errors in a read.
pub fn sum_expected_errors(scores: &[u8]) -> f64 {
    scores.iter().map(|&q| expected_error(q)).sum()
}
