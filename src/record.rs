use crate::error::FormatError;
use crate::phred::{self, PhredEncoding};
use crate::policy::{Alphabet, ReaderOptions};

/// Mate orientation of a paired-end read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadDirection {
    Forward,
    Reverse,
}

/// One validated FASTQ read. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastqRecord {
    header: String,
    id_len: usize,
    seq: Vec<u8>,
    rseq: Vec<u8>,
    scores: Vec<u8>,
}

impl FastqRecord {
    /// Build a record from the four lines of one FASTQ unit (line endings
    /// already stripped).
    pub fn from_lines(
        header: &str,
        seq: &str,
        plus: &str,
        qual: &str,
        opts: &ReaderOptions,
    ) -> Result<Self, FormatError> {
        let header = strip_header_marker(header, opts)?;

        let Some(repeated) = plus.strip_prefix('+') else {
            return Err(FormatError::MissingPlus);
        };
        if !repeated.is_empty() && repeated != header {
            return Err(FormatError::SeparatorMismatch {
                header: header.to_string(),
                found: repeated.to_string(),
            });
        }

        if seq.is_empty() {
            return Err(FormatError::EmptySequence);
        }
        let seq = normalize_sequence(seq.as_bytes(), opts.alphabet)?;

        if qual.len() != seq.len() {
            return Err(FormatError::LengthMismatch {
                seq: seq.len(),
                qual: qual.len(),
            });
        }
        let scores = decode_scores(qual.as_bytes(), opts.encoding)?;

        let rseq = seq.iter().rev().map(|&b| complement(b)).collect();
        let id_len = header.find(char::is_whitespace).unwrap_or(header.len());

        Ok(Self {
            header: header.to_string(),
            id_len,
            seq,
            rseq,
            scores,
        })
    }

    /// Identifier line without the leading `@`.
    #[inline]
    pub fn header(&self) -> &str {
        &self.header
    }

    /// First whitespace-delimited token of the header.
    #[inline]
    pub fn id(&self) -> &str {
        &self.header[..self.id_len]
    }

    pub fn desc(&self) -> Option<&str> {
        let rest = self.header[self.id_len..].trim();
        (!rest.is_empty()).then_some(rest)
    }

    /// Upper-cased nucleotide sequence.
    #[inline]
    pub fn seq(&self) -> &[u8] {
        &self.seq
    }

    /// Reverse complement of [`Self::seq`].
    #[inline]
    pub fn rseq(&self) -> &[u8] {
        &self.rseq
    }

    /// Decoded Phred scores, one per base.
    #[inline]
    pub fn scores(&self) -> &[u8] {
        &self.scores
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.seq.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }

    /// Forward or reverse mate, read from the header. Casava descriptions
    /// (`1:N:0:...`) win over `/1` `/2` suffixes, which win over `.1` `.2`
    /// suffixes. Reads carrying no mate marker count as forward.
    pub fn check_seq_dir(&self) -> ReadDirection {
        match self.mate_number() {
            Some(2) => ReadDirection::Reverse,
            _ => ReadDirection::Forward,
        }
    }

    fn mate_number(&self) -> Option<u8> {
        if let Some(desc) = self.desc() {
            match desc.as_bytes() {
                [b'1', b':', ..] => return Some(1),
                [b'2', b':', ..] => return Some(2),
                _ => {}
            }
        }
        let id = self.id().as_bytes();
        let tail = id.len().checked_sub(2).map(|i| &id[i..])?;
        match tail {
            b"/1" | b".1" => Some(1),
            b"/2" | b".2" => Some(2),
            _ => None,
        }
    }

    pub fn average_score(&self) -> f64 {
        if self.scores.is_empty() {
            return 0.0;
        }
        let sum: u64 = self.scores.iter().map(|&q| u64::from(q)).sum();
        sum as f64 / self.scores.len() as f64
    }

    /// Expected number of base-call errors in the read.
    pub fn expected_errors(&self) -> f64 {
        phred::sum_expected_errors(&self.scores)
    }

    /// Re-encode the scores as a quality line.
    pub fn quality_string(&self, encoding: PhredEncoding) -> Vec<u8> {
        self.scores.iter().map(|&q| encoding.encode(q)).collect()
    }
}

/// Identifier text after the `@` marker of a header line.
pub(crate) fn strip_header_marker<'a>(
    line: &'a str,
    opts: &ReaderOptions,
) -> Result<&'a str, FormatError> {
    match line.strip_prefix('@') {
        Some(rest) => Ok(rest),
        None if opts.fastq_only && line.starts_with('>') => Err(FormatError::FastaHeaderDetected),
        None => Err(FormatError::MissingHeader),
    }
}

/// Whether `line` would be accepted as the sequence line of a record.
pub(crate) fn is_sequence_line(line: &str, alphabet: Alphabet) -> bool {
    !line.is_empty() && normalize_sequence(line.as_bytes(), alphabet).is_ok()
}

fn normalize_sequence(raw: &[u8], alphabet: Alphabet) -> Result<Vec<u8>, FormatError> {
    let allowed: &[u8] = match alphabet {
        Alphabet::Acgtn => b"ACGTN",
        Alphabet::Iupac => b"ACGTURYSWKMBDHVN",
    };
    raw.iter()
        .enumerate()
        .map(|(position, &b)| {
            let up = b.to_ascii_uppercase();
            if allowed.contains(&up) {
                Ok(up)
            } else {
                Err(FormatError::InvalidNucleotide {
                    symbol: char::from(b),
                    position,
                })
            }
        })
        .collect()
}

fn decode_scores(raw: &[u8], encoding: PhredEncoding) -> Result<Vec<u8>, FormatError> {
    raw.iter()
        .enumerate()
        .map(|(position, &b)| {
            encoding.decode(b).ok_or(FormatError::InvalidQuality {
                symbol: char::from(b),
                position,
            })
        })
        .collect()
}

#[inline]
fn complement(b: u8) -> u8 {
    match b {
        b'A' => b'T',
        b'T' | b'U' => b'A',
        b'C' => b'G',
        b'G' => b'C',
        b'R' => b'Y',
        b'Y' => b'R',
        b'K' => b'M',
        b'M' => b'K',
        b'B' => b'V',
        b'V' => b'B',
        b'D' => b'H',
        b'H' => b'D',
        // N, S and W are their own complements
        other => other,
    }
}
