use crate::error::SearchExceededError;

/// Positions of non-ACGT symbols in `seq`.
///
/// The scan stops at `bound` positions when one is given; a sequence longer
/// than the bound is reported as [`SearchExceededError`] rather than being
/// truncated.
pub fn search_ambiguous_nucleotide(
    seq: &[u8],
    bound: Option<usize>,
) -> Result<Vec<usize>, SearchExceededError> {
    let limit = bound.unwrap_or(seq.len());
    let mut found = Vec::new();
    let mut pos = 0usize;
    while pos < seq.len() {
        if pos == limit {
            return Err(SearchExceededError {
                scan: "ambiguous nucleotide scan",
                bound: limit,
                reached: seq.len(),
            });
        }
        if !matches!(seq[pos].to_ascii_uppercase(), b'A' | b'C' | b'G' | b'T') {
            found.push(pos);
        }
        pos += 1;
    }
    Ok(found)
}

/// Number of non-ACGT symbols in `seq`.
pub fn count_ambiguous(seq: &[u8], bound: Option<usize>) -> Result<usize, SearchExceededError> {
    search_ambiguous_nucleotide(seq, bound).map(|hits| hits.len())
}
