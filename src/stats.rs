//! Streaming accumulators for per-read and per-position quality.

use crate::phred::expected_error;
use crate::record::FastqRecord;
use serde::Serialize;

/// Mean and maximum of per-read expected errors.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EeSummary {
    pub count: usize,
    sum: f64,
    pub max: f64,
}

impl EeSummary {
    pub fn push(&mut self, ee: f64) {
        self.count += 1;
        self.sum += ee;
        if self.count == 1 || ee > self.max {
            self.max = ee;
        }
    }

    /// Mean expected error; 0 for no reads.
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }

    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a FastqRecord>,
    {
        let mut summary = Self::default();
        for rec in records {
            summary.push(rec.expected_errors());
        }
        summary
    }
}

/// Aggregates at one read position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionStats {
    pub position: usize,
    /// Reads long enough to cover this position.
    pub reads: usize,
    pub mean_quality: f64,
    pub mean_expected_error: f64,
}

/// Per-position sums, grown to the longest read seen.
#[derive(Debug, Clone, Default)]
pub struct PositionAccumulator {
    quality_sum: Vec<u64>,
    ee_sum: Vec<f64>,
    coverage: Vec<usize>,
}

impl PositionAccumulator {
    pub fn push(&mut self, rec: &FastqRecord) {
        let scores = rec.scores();
        if scores.len() > self.coverage.len() {
            self.quality_sum.resize(scores.len(), 0);
            self.ee_sum.resize(scores.len(), 0.0);
            self.coverage.resize(scores.len(), 0);
        }
        for (pos, &q) in scores.iter().enumerate() {
            self.quality_sum[pos] += u64::from(q);
            self.ee_sum[pos] += expected_error(q);
            self.coverage[pos] += 1;
        }
    }

    pub fn finish(self) -> Vec<PositionStats> {
        self.coverage
            .iter()
            .enumerate()
            .map(|(position, &reads)| {
                let n = reads as f64;
                PositionStats {
                    position,
                    reads,
                    mean_quality: self.quality_sum[position] as f64 / n,
                    mean_expected_error: self.ee_sum[position] / n,
                }
            })
            .collect()
    }
}

/// Running expected error of one read, by truncation length.
#[derive(Debug, Clone, PartialEq)]
pub struct EeProfile {
    cumulative: Vec<f64>,
}

impl EeProfile {
    pub fn from_scores(scores: &[u8]) -> Self {
        let cumulative = scores
            .iter()
            .scan(0.0_f64, |acc, &q| {
                *acc += expected_error(q);
                Some(*acc)
            })
            .collect();
        Self { cumulative }
    }

    pub fn from_record(rec: &FastqRecord) -> Self {
        Self::from_scores(rec.scores())
    }

    /// Profile from already computed per-base errors.
    pub fn from_errors(errors: &[f64]) -> Self {
        let cumulative = errors
            .iter()
            .scan(0.0_f64, |acc, &e| {
                *acc += e;
                Some(*acc)
            })
            .collect();
        Self { cumulative }
    }

    pub fn len(&self) -> usize {
        self.cumulative.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cumulative.is_empty()
    }

    /// Expected error of the read truncated to `length` bases. `None` when
    /// the read is shorter than `length`.
    pub fn ee_at(&self, length: usize) -> Option<f64> {
        match length {
            0 => Some(0.0),
            l => self.cumulative.get(l - 1).copied(),
        }
    }

    /// Expected error of the whole read.
    pub fn total(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }
}
