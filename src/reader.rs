use crate::error::{FormatError, IoContext, QcError, Result};
use crate::policy::{ErrorPolicy, ReaderOptions};
use crate::record::{FastqRecord, ReadDirection, is_sequence_line, strip_header_marker};
use crate::sampling::{Sample, SampleKey, reservoir_step};
use crate::search::count_ambiguous;
use crate::state::ReaderState;
use crate::stats::{EeProfile, EeSummary, PositionAccumulator, PositionStats};
use crate::table::{self, PositionRow, ReadRow};
use crate::util::open_buffered;

use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::BTreeSet;
use std::io::{self, BufRead};
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where records come from. Every pass reopens it from the start.
#[derive(Debug, Clone)]
pub enum Source {
    Path(PathBuf),
    Memory(Arc<[u8]>),
}

impl Source {
    fn open(&self) -> io::Result<Box<dyn BufRead + Send>> {
        match self {
            Source::Path(path) => open_buffered(path),
            Source::Memory(bytes) => Ok(Box::new(io::Cursor::new(Arc::clone(bytes)))),
        }
    }
}

/// Reads picked by [`FastqReader::slice_reads`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadSelection {
    /// Half-open index range.
    Range(Range<usize>),
    /// Explicit indices; returned in stream order without duplicates.
    Indices(Vec<usize>),
}

impl From<Range<usize>> for ReadSelection {
    fn from(r: Range<usize>) -> Self {
        ReadSelection::Range(r)
    }
}

impl From<Vec<usize>> for ReadSelection {
    fn from(v: Vec<usize>) -> Self {
        ReadSelection::Indices(v)
    }
}

impl From<&[usize]> for ReadSelection {
    fn from(v: &[usize]) -> Self {
        ReadSelection::Indices(v.to_vec())
    }
}

/// FASTQ reader with cached count and samples.
///
/// Caching methods take `&mut self`; share across threads only behind a lock.
pub struct FastqReader {
    src: Source,
    opts: ReaderOptions,
    state: ReaderState,
}

impl FastqReader {
    /// Open from a file path. Plain or gzip, detected on every pass.
    pub fn from_path<P: AsRef<Path>>(path: P, opts: ReaderOptions) -> Result<Self> {
        let path = path.as_ref();
        std::fs::File::open(path).map_err(|e| {
            QcError::io_err(
                e,
                IoContext {
                    byte_pos: 0,
                    line_num: 0,
                },
            )
        })?;
        Ok(Self {
            src: Source::Path(path.to_path_buf()),
            opts,
            state: ReaderState::new(),
        })
    }

    /// Read from an in-memory buffer.
    pub fn from_bytes(data: impl Into<Arc<[u8]>>, opts: ReaderOptions) -> Self {
        Self {
            src: Source::Memory(data.into()),
            opts,
            state: ReaderState::new(),
        }
    }

    pub fn source(&self) -> &Source {
        &self.src
    }

    pub fn options(&self) -> &ReaderOptions {
        &self.opts
    }

    pub fn state(&self) -> &ReaderState {
        &self.state
    }

    /// Full passes opened so far.
    pub fn scan_count(&self) -> usize {
        self.state.passes()
    }

    /// Drop cached count and samples; the next query rescans the source.
    pub fn reopen(&mut self) -> Result<()> {
        if let Source::Path(path) = &self.src {
            std::fs::File::open(path).map_err(|e| {
                QcError::io_err(
                    e,
                    IoContext {
                        byte_pos: 0,
                        line_num: 0,
                    },
                )
            })?;
        }
        self.state.invalidate();
        Ok(())
    }

    pub fn close(self) {
        log::debug!("closing reader over {:?}", self.src);
    }

    /// Start a new pass over the source.
    pub fn iter_reads(&mut self) -> Result<Reads> {
        let rdr = self.src.open().map_err(|e| {
            QcError::io_err(
                e,
                IoContext {
                    byte_pos: 0,
                    line_num: 0,
                },
            )
        })?;
        self.state.note_pass();
        Ok(Reads::new(rdr, self.opts.clone()))
    }

    /// Number of records; counted once, then served from the cache.
    pub fn total_reads(&mut self) -> Result<usize> {
        if let Some(total) = self.state.total_reads() {
            return Ok(total);
        }
        let mut total = 0usize;
        for rec in self.iter_reads()? {
            rec?;
            total += 1;
        }
        log::debug!("counted {total} reads in {:?}", self.src);
        self.state.record_count(total);
        Ok(total)
    }

    pub fn slice_reads(&mut self, selection: impl Into<ReadSelection>) -> Result<Vec<FastqRecord>> {
        match selection.into() {
            ReadSelection::Range(range) => self.slice_range(range),
            ReadSelection::Indices(indices) => self.pick_indices(indices),
        }
    }

    fn slice_range(&mut self, range: Range<usize>) -> Result<Vec<FastqRecord>> {
        if range.start > range.end {
            return Err(QcError::invalid(format!(
                "range start {} is past its end {}",
                range.start, range.end
            )));
        }
        let total = self.total_reads()?;
        if range.end > total {
            return Err(QcError::IndexOutOfRange {
                index: range.end,
                total,
            });
        }
        if range.is_empty() {
            return Ok(Vec::new());
        }
        let mut out = Vec::with_capacity(range.len());
        for (i, rec) in self.iter_reads()?.enumerate() {
            if i >= range.end {
                break;
            }
            let rec = rec?;
            if i >= range.start {
                out.push(rec);
            }
        }
        Ok(out)
    }

    fn pick_indices(&mut self, indices: Vec<usize>) -> Result<Vec<FastqRecord>> {
        let total = self.total_reads()?;
        let wanted: BTreeSet<usize> = indices.into_iter().collect();
        if let Some(&index) = wanted.iter().find(|&&i| i >= total) {
            return Err(QcError::IndexOutOfRange { index, total });
        }
        let Some(&last) = wanted.last() else {
            return Ok(Vec::new());
        };
        let mut out = Vec::with_capacity(wanted.len());
        for (i, rec) in self.iter_reads()?.enumerate() {
            if i > last {
                break;
            }
            let rec = rec?;
            if wanted.contains(&i) {
                out.push(rec);
            }
        }
        Ok(out)
    }

    /// Decoded scores of every read. Materializes all scores.
    pub fn quality_scores(&mut self) -> Result<Vec<Vec<u8>>> {
        self.map_reads(|rec| rec.scores().to_vec())
    }

    /// Average score of each read.
    pub fn average_scores(&mut self) -> Result<Vec<f64>> {
        self.map_reads(FastqRecord::average_score)
    }

    /// Expected error of each read.
    pub fn seq_ee_errors(&mut self) -> Result<Vec<f64>> {
        self.map_reads(FastqRecord::expected_errors)
    }

    pub fn ee_summary(&mut self) -> Result<EeSummary> {
        let mut summary = EeSummary::default();
        for rec in self.iter_reads()? {
            summary.push(rec?.expected_errors());
        }
        Ok(summary)
    }

    pub fn avg_seq_ee(&mut self) -> Result<f64> {
        self.ee_summary().map(|s| s.mean())
    }

    pub fn max_seq_ee(&mut self) -> Result<f64> {
        self.ee_summary().map(|s| s.max)
    }

    /// Expected-error summary over a drawn (and cached) sample.
    pub fn sample_ee_summary(&mut self, n_samples: usize, seed: u64) -> Result<EeSummary> {
        let sample = self.reservoir_sampling(n_samples, seed)?;
        Ok(EeSummary::from_records(sample.items()))
    }

    /// Per-position mean quality and mean expected error.
    pub fn position_stats(&mut self) -> Result<Vec<PositionStats>> {
        let mut acc = PositionAccumulator::default();
        for rec in self.iter_reads()? {
            acc.push(&rec?);
        }
        Ok(acc.finish())
    }

    pub fn average_quality_by_position(&mut self) -> Result<Vec<f64>> {
        Ok(self
            .position_stats()?
            .into_iter()
            .map(|p| p.mean_quality)
            .collect())
    }

    pub fn average_ee_by_position(&mut self) -> Result<Vec<f64>> {
        Ok(self
            .position_stats()?
            .into_iter()
            .map(|p| p.mean_expected_error)
            .collect())
    }

    /// Non-ACGT count of each read.
    pub fn ambiguous_nucleotide_counts(&mut self) -> Result<Vec<usize>> {
        let bound = self.opts.max_scan_len;
        let mut out = Vec::new();
        for rec in self.iter_reads()? {
            out.push(count_ambiguous(rec?.seq(), bound)?);
        }
        Ok(out)
    }

    /// Cumulative expected-error profile of every read.
    pub fn ee_profiles(&mut self) -> Result<Vec<EeProfile>> {
        self.map_reads(EeProfile::from_record)
    }

    pub fn forward_reads(&mut self) -> Result<ByDirection> {
        self.reads_in_direction(ReadDirection::Forward)
    }

    pub fn reverse_reads(&mut self) -> Result<ByDirection> {
        self.reads_in_direction(ReadDirection::Reverse)
    }

    pub fn reads_in_direction(&mut self, direction: ReadDirection) -> Result<ByDirection> {
        Ok(ByDirection {
            inner: self.iter_reads()?,
            direction,
        })
    }

    /// Draw `n_samples` reads uniformly with a seeded RNG. Samples are cached
    /// per `(seed, n_samples)`.
    pub fn reservoir_sampling(&mut self, n_samples: usize, seed: u64) -> Result<&Sample<FastqRecord>> {
        let key = SampleKey { seed, n_samples };
        let sample = match self.state.take_sample(&key) {
            Some(sample) => {
                log::debug!("reusing cached sample {key:?}");
                sample
            }
            None => self.draw_sample(key)?,
        };
        Ok(self.state.store_sample(sample))
    }

    fn draw_sample(&mut self, key: SampleKey) -> Result<Sample<FastqRecord>> {
        let total = self.total_reads()?;
        if key.n_samples > total {
            return Err(QcError::SampleTooLarge {
                requested: key.n_samples,
                total,
            });
        }
        let mut rng = StdRng::seed_from_u64(key.seed);
        let mut reservoir = Vec::with_capacity(key.n_samples);
        for (i, rec) in self.iter_reads()?.enumerate() {
            reservoir = reservoir_step(reservoir, (i, rec?), i, key.n_samples, &mut rng);
        }
        log::debug!("drew {} of {total} reads for {key:?}", reservoir.len());
        Ok(Sample::new(key, reservoir))
    }

    /// Every read as a row.
    pub fn sequence_df(&mut self) -> Result<Vec<ReadRow>> {
        self.map_reads(|rec| ReadRow::from(rec))
    }

    /// Rows of a drawn sample, in stream order. Reuses the cached sample.
    pub fn sample_df(&mut self, n_samples: usize, seed: u64) -> Result<Vec<ReadRow>> {
        let sample = self.reservoir_sampling(n_samples, seed)?;
        let mut slots: Vec<&(usize, FastqRecord)> = sample.slots().iter().collect();
        slots.sort_by_key(|(i, _)| *i);
        Ok(slots.into_iter().map(|(_, rec)| ReadRow::from(rec)).collect())
    }

    /// One row per (read, position) over every read.
    pub fn unpack_entries(&mut self) -> Result<Vec<PositionRow>> {
        Ok(table::unpack_entries(&self.sequence_df()?))
    }

    fn map_reads<T>(&mut self, f: impl Fn(&FastqRecord) -> T) -> Result<Vec<T>> {
        let mut out = Vec::new();
        for rec in self.iter_reads()? {
            out.push(f(&rec?));
        }
        Ok(out)
    }
}

/// Reads of one mate direction, from [`FastqReader::reads_in_direction`].
pub struct ByDirection {
    inner: Reads,
    direction: ReadDirection,
}

impl Iterator for ByDirection {
    type Item = Result<FastqRecord>;
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.inner.next()? {
                Ok(rec) if rec.check_seq_dir() != self.direction => continue,
                other => return Some(other),
            }
        }
    }
}

/// One streaming pass over a source.
pub struct Reads {
    rdr: Box<dyn BufRead + Send>,
    opts: ReaderOptions,
    line_num: u64,
    byte_pos: u64,
    // Header (and the sequence line that confirmed it) found by resync.
    pending_header: Option<String>,
    pending_seq: Option<String>,
    skipped: usize,
    done: bool,
}

impl Reads {
    fn new(rdr: Box<dyn BufRead + Send>, opts: ReaderOptions) -> Self {
        Self {
            rdr,
            opts,
            line_num: 0,
            byte_pos: 0,
            pending_header: None,
            pending_seq: None,
            skipped: 0,
            done: false,
        }
    }

    /// Malformed records skipped so far under [`ErrorPolicy::Skip`].
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    fn next_record(&mut self) -> Option<Result<FastqRecord>> {
        if self.done {
            return None;
        }
        loop {
            match self.read_one() {
                Ok(Some(rec)) => return Some(Ok(rec)),
                Ok(None) => {
                    self.done = true;
                    return None;
                }
                Err(err @ QcError::Format { .. }) if self.opts.error_policy == ErrorPolicy::Skip => {
                    log::warn!("skipping malformed record: {err}");
                    self.skipped += 1;
                    match self.resync_to_next_header() {
                        Ok(true) => {}
                        Ok(false) => {
                            self.done = true;
                            return None;
                        }
                        Err(e) => {
                            self.done = true;
                            return Some(Err(QcError::io_err(e, self.ctx())));
                        }
                    }
                }
                Err(err) => {
                    self.done = true;
                    return Some(Err(err));
                }
            }
        }
    }

    fn read_line(&mut self, buf: &mut String) -> io::Result<usize> {
        buf.clear();
        let n = self.rdr.read_line(buf)?;
        if n > 0 {
            self.line_num += 1;
            self.byte_pos += n as u64;
            if buf.ends_with('\n') {
                buf.pop();
            }
            if buf.ends_with('\r') {
                buf.pop();
            }
        }
        Ok(n)
    }

    /// Read the next line of the current record; EOF here is a format error.
    fn read_body_line(&mut self, buf: &mut String) -> Result<()> {
        let n = self
            .read_line(buf)
            .map_err(|e| QcError::io_err(e, self.ctx()))?;
        if n == 0 {
            return Err(QcError::fmt_err(FormatError::UnexpectedEof, self.ctx()));
        }
        Ok(())
    }

    fn read_one(&mut self) -> Result<Option<FastqRecord>> {
        let header = if let Some(h) = self.pending_header.take() {
            h
        } else {
            // seek first non-empty line
            let mut h = String::with_capacity(128);
            loop {
                let n = self
                    .read_line(&mut h)
                    .map_err(|e| QcError::io_err(e, self.ctx()))?;
                if n == 0 {
                    return Ok(None);
                }
                if !h.is_empty() {
                    break;
                }
            }
            h
        };
        // header marker is checked before any body line is read
        strip_header_marker(&header, &self.opts).map_err(|e| QcError::fmt_err(e, self.ctx()))?;

        let mut plus = String::with_capacity(128);
        let mut qual = String::with_capacity(256);
        let seq = match self.pending_seq.take() {
            Some(seq) => seq,
            None => {
                let mut seq = String::with_capacity(256);
                self.read_body_line(&mut seq)?;
                seq
            }
        };
        self.read_body_line(&mut plus)?;
        self.read_body_line(&mut qual)?;

        FastqRecord::from_lines(&header, &seq, &plus, &qual, &self.opts)
            .map(Some)
            .map_err(|e| QcError::fmt_err(e, self.ctx()))
    }

    /// Resynchronize to the next header line starting with '@'.
    ///
    /// A candidate only counts when the line after it is a valid sequence,
    /// since quality lines may start with '@' as well. Returns true if a
    /// header was found and stored in `pending_header`.
    fn resync_to_next_header(&mut self) -> io::Result<bool> {
        let mut buf = String::with_capacity(256);
        let mut candidate: Option<String> = None;
        loop {
            if self.read_line(&mut buf)? == 0 {
                // a lone trailing header still fails as a truncated record
                self.pending_header = candidate;
                return Ok(self.pending_header.is_some());
            }
            match candidate.take() {
                Some(header) if is_sequence_line(&buf, self.opts.alphabet) => {
                    self.pending_header = Some(header);
                    self.pending_seq = Some(buf);
                    return Ok(true);
                }
                _ if buf.starts_with('@') => candidate = Some(buf.clone()),
                _ => {}
            }
        }
    }

    #[inline]
    fn ctx(&self) -> IoContext {
        IoContext {
            byte_pos: self.byte_pos,
            line_num: self.line_num,
        }
    }
}

impl Iterator for Reads {
    type Item = Result<FastqRecord>;
    fn next(&mut self) -> Option<Self::Item> {
        self.next_record()
    }
}
