//! Cached state of a [`crate::FastqReader`].
//!
//! The reader moves `Opened -> Scanned` once it has counted its records.
//! Drawn samples are cached per [`SampleKey`] in either state. Reopening the
//! source drops everything and returns to `Opened`.

use crate::record::FastqRecord;
use crate::sampling::{Sample, SampleKey};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// Source is ready; nothing counted yet.
    Opened,
    /// One full pass counted `total` records.
    Scanned { total: usize },
}

#[derive(Debug)]
pub struct ReaderState {
    scan: ScanState,
    samples: HashMap<SampleKey, Sample<FastqRecord>>,
    passes: usize,
}

impl Default for ReaderState {
    fn default() -> Self {
        Self::new()
    }
}

impl ReaderState {
    pub fn new() -> Self {
        Self {
            scan: ScanState::Opened,
            samples: HashMap::new(),
            passes: 0,
        }
    }

    pub fn scan(&self) -> ScanState {
        self.scan
    }

    pub fn total_reads(&self) -> Option<usize> {
        match self.scan {
            ScanState::Scanned { total } => Some(total),
            ScanState::Opened => None,
        }
    }

    /// `Opened -> Scanned`. A second count leaves the first one in place.
    pub fn record_count(&mut self, total: usize) {
        if let ScanState::Opened = self.scan {
            self.scan = ScanState::Scanned { total };
        }
    }

    pub fn sample(&self, key: &SampleKey) -> Option<&Sample<FastqRecord>> {
        self.samples.get(key)
    }

    /// Remove a cached sample, e.g. to hand it back through
    /// [`Self::store_sample`].
    pub fn take_sample(&mut self, key: &SampleKey) -> Option<Sample<FastqRecord>> {
        self.samples.remove(key)
    }

    pub fn store_sample(&mut self, sample: Sample<FastqRecord>) -> &Sample<FastqRecord> {
        self.samples.entry(sample.key()).or_insert(sample)
    }

    /// Number of full passes opened over the source so far.
    pub fn passes(&self) -> usize {
        self.passes
    }

    pub(crate) fn note_pass(&mut self) {
        self.passes += 1;
    }

    /// Drop cached results and go back to `Opened`. The pass counter is kept.
    pub fn invalidate(&mut self) {
        self.scan = ScanState::Opened;
        self.samples.clear();
    }
}
