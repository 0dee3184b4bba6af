//! Trim-window and truncation-length searches over per-position and
//! per-read quality statistics.
//!
//! Every scan walks its candidates from the longest retained length down
//! (right to left) and reports the first one that satisfies its constraint.
//! A scan that runs out of candidates fails with [`SearchExceededError`];
//! nothing here retries with relaxed bounds.

use crate::error::{QcError, Result, SearchExceededError};
use crate::phred::MAX_SCORE;
use crate::policy::TrimConfig;
use crate::stats::EeProfile;
use serde::Serialize;

/// Half-open range of positions kept after trimming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrimWindow {
    pub left: usize,
    pub right: usize,
}

impl TrimWindow {
    pub fn len(&self) -> usize {
        self.right.saturating_sub(self.left)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check this window, cut from a profile of `len` positions, against
    /// the per-end trim limit.
    pub fn warnings(&self, len: usize, max_trim_percent: f64) -> TrimWarnings {
        let margin = end_margin(len, max_trim_percent);
        TrimWarnings {
            untrimmed: self.left == 0 && self.right == len,
            left_too_deep: self.left > margin,
            right_too_deep: self.right < len - margin,
        }
    }
}

/// Questionable outcomes of obvious trimming. None of them is an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TrimWarnings {
    pub untrimmed: bool,
    pub left_too_deep: bool,
    pub right_too_deep: bool,
}

impl TrimWarnings {
    pub fn any(&self) -> bool {
        self.untrimmed || self.left_too_deep || self.right_too_deep
    }
}

/// One trim window and the mean expected error per position inside it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrimCandidate {
    pub left: usize,
    pub right: usize,
    pub length: usize,
    pub mean_ee: f64,
}

impl TrimCandidate {
    /// Evaluate the window `[left, right)` of `avg_ee`.
    pub fn evaluate(avg_ee: &[f64], left: usize, right: usize) -> Result<Self> {
        if left > right || right > avg_ee.len() {
            return Err(QcError::invalid(format!(
                "window {left}..{right} does not fit {} positions",
                avg_ee.len()
            )));
        }
        let window = &avg_ee[left..right];
        let mean_ee = if window.is_empty() {
            0.0
        } else {
            window.iter().sum::<f64>() / window.len() as f64
        };
        Ok(Self {
            left,
            right,
            length: window.len(),
            mean_ee,
        })
    }
}

/// Truncation length picked by [`read_size_by_max_ee`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaxEeTrim {
    pub length: usize,
    /// Fraction of reads that still need trimming at `length`.
    pub failing_fraction: f64,
    /// Indices of those reads.
    pub flagged: Vec<usize>,
}

/// Expected error of one read before and after the obvious trim.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EeSumRow {
    pub no_trimming: f64,
    pub obvious_trimming: f64,
}

/// Everything the searches recommend for one file.
#[derive(Debug, Clone, PartialEq)]
pub struct TrimRecommendation {
    pub window: TrimWindow,
    pub avg_ee: TrimCandidate,
    pub max_ee: MaxEeTrim,
}

fn check_fraction(name: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(QcError::invalid(format!("{name} must be within 0..=1, got {value}")))
    }
}

fn end_margin(len: usize, max_trim_percent: f64) -> usize {
    ((len as f64 * max_trim_percent).round() as usize).min(len)
}

/// Obvious trimming: the widest window whose two end positions both have an
/// average quality of at least `threshold`.
///
/// Returns `0..len` when nothing needs trimming and `0..0` for empty input.
/// Warns when either end cuts deeper than `max_trim_percent` of the read;
/// [`TrimWindow::warnings`] reports the same conditions as flags.
pub fn trim_ends_less_than_threshold(
    avg_quality: &[f64],
    threshold: u8,
    max_trim_percent: f64,
) -> Result<TrimWindow> {
    if threshold > MAX_SCORE {
        return Err(QcError::invalid(format!(
            "threshold {threshold} outside 0..={MAX_SCORE}"
        )));
    }
    check_fraction("max_trim_percent", max_trim_percent)?;
    if let Some((pos, q)) = avg_quality
        .iter()
        .enumerate()
        .find(|(_, q)| !(0.0..=f64::from(MAX_SCORE)).contains(*q))
    {
        return Err(QcError::invalid(format!(
            "average quality {q} at position {pos} outside 0..={MAX_SCORE}"
        )));
    }

    let len = avg_quality.len();
    if len == 0 {
        return Ok(TrimWindow { left: 0, right: 0 });
    }

    let threshold = f64::from(threshold);
    let passes = |q: &f64| *q >= threshold;
    let Some(left) = avg_quality.iter().position(passes) else {
        return Err(SearchExceededError {
            scan: "quality end trim",
            bound: len,
            reached: len,
        }
        .into());
    };
    // a passing position exists, so rposition finds one at or after `left`
    let right = avg_quality.iter().rposition(passes).map_or(len, |p| p + 1);

    let window = TrimWindow { left, right };
    let warnings = window.warnings(len, max_trim_percent);
    let margin = end_margin(len, max_trim_percent);
    if warnings.untrimmed {
        log::warn!("no obvious trimming performed");
    }
    if warnings.left_too_deep {
        log::warn!("trim left value {left} might be too high (limit {margin})");
    }
    if warnings.right_too_deep {
        log::warn!("trim right value {right} might be too low (limit {})", len - margin);
    }

    Ok(window)
}

/// All trim windows reachable from `window` without cutting more than
/// `max_trim_percent` of the positions from either end.
pub fn avg_ee_trim_table(
    avg_ee: &[f64],
    window: TrimWindow,
    max_trim_percent: f64,
) -> Result<Vec<TrimCandidate>> {
    check_fraction("max_trim_percent", max_trim_percent)?;
    let len = avg_ee.len();
    if window.left > window.right || window.right > len {
        return Err(QcError::invalid(format!(
            "window {}..{} does not fit {len} positions",
            window.left, window.right
        )));
    }
    if len == 0 {
        return Ok(Vec::new());
    }

    let margin = end_margin(len, max_trim_percent);
    let left_hi = margin.max(window.left).min(window.right);
    let right_lo = (len - margin).min(window.right).max(window.left);

    let mut table = Vec::new();
    for left in window.left..=left_hi {
        for right in right_lo..=window.right {
            if right > left {
                table.push(TrimCandidate::evaluate(avg_ee, left, right)?);
            }
        }
    }
    Ok(table)
}

/// Longest trim window, within the trim margin, whose mean expected error
/// per position is at most `max_mean_ee`.
///
/// Candidates are taken longest first; equal lengths prefer the window
/// reaching further right.
pub fn read_size_by_avg_ee(
    avg_ee: &[f64],
    window: TrimWindow,
    max_mean_ee: f64,
    max_trim_percent: f64,
) -> Result<TrimCandidate> {
    if avg_ee.is_empty() {
        return Ok(TrimCandidate {
            left: 0,
            right: 0,
            length: 0,
            mean_ee: 0.0,
        });
    }
    let mut table = avg_ee_trim_table(avg_ee, window, max_trim_percent)?;
    table.sort_by(|a, b| {
        b.length
            .cmp(&a.length)
            .then(b.right.cmp(&a.right))
    });
    let shortest = table.last().map_or(0, |c| c.length);
    table
        .into_iter()
        .find(|c| c.mean_ee <= max_mean_ee)
        .ok_or_else(|| {
            SearchExceededError {
                scan: "average expected error trim",
                bound: end_margin(avg_ee.len(), max_trim_percent),
                reached: shortest,
            }
            .into()
        })
}

/// Largest length whose share of positions with an average expected error
/// above `threshold` is at most `max_trim_percent`. Empty input gives 0.
pub fn get_trim_length_avg_ee(avg_ee: &[f64], threshold: f64, max_trim_percent: f64) -> Result<usize> {
    check_fraction("max_trim_percent", max_trim_percent)?;
    let mut above = avg_ee.iter().filter(|&&ee| ee > threshold).count();
    for len in (1..=avg_ee.len()).rev() {
        if above as f64 / len as f64 <= max_trim_percent {
            return Ok(len);
        }
        if avg_ee[len - 1] > threshold {
            above -= 1;
        }
    }
    if avg_ee.is_empty() {
        return Ok(0);
    }
    Err(SearchExceededError {
        scan: "average expected error length",
        bound: avg_ee.len(),
        reached: 1,
    }
    .into())
}

/// Longest truncation length at which at most `max_trim_percent` of the reads
/// still exceed `max_ee`.
///
/// A read fails at length `l` when it is shorter than `l` or its expected
/// error over the first `l` bases is above `max_ee`. Empty input gives
/// length 0.
pub fn read_size_by_max_ee(profiles: &[EeProfile], max_ee: f64, max_trim_percent: f64) -> Result<MaxEeTrim> {
    check_fraction("max_trim_percent", max_trim_percent)?;
    if max_ee.is_nan() || max_ee < 0.0 {
        return Err(QcError::invalid(format!("max_ee must be non-negative, got {max_ee}")));
    }
    let longest = profiles.iter().map(EeProfile::len).max().unwrap_or(0);
    if longest == 0 {
        return Ok(MaxEeTrim {
            length: 0,
            failing_fraction: 0.0,
            flagged: Vec::new(),
        });
    }

    let n = profiles.len() as f64;
    for length in (1..=longest).rev() {
        let flagged: Vec<usize> = profiles
            .iter()
            .enumerate()
            .filter(|(_, p)| p.ee_at(length).is_none_or(|ee| ee > max_ee))
            .map(|(i, _)| i)
            .collect();
        let failing_fraction = flagged.len() as f64 / n;
        if failing_fraction <= max_trim_percent {
            log::debug!(
                "truncation length {length}: {} of {} reads over maxEE {max_ee}",
                flagged.len(),
                profiles.len()
            );
            return Ok(MaxEeTrim {
                length,
                failing_fraction,
                flagged,
            });
        }
    }
    Err(SearchExceededError {
        scan: "maxEE truncation length",
        bound: longest,
        reached: 1,
    }
    .into())
}

/// Expected error of each read untrimmed and inside `window`.
pub fn ee_sums(profiles: &[EeProfile], window: TrimWindow) -> Vec<EeSumRow> {
    profiles
        .iter()
        .map(|p| {
            let upto = |pos: usize| p.ee_at(pos.min(p.len())).unwrap_or(0.0);
            EeSumRow {
                no_trimming: p.total(),
                obvious_trimming: upto(window.right) - upto(window.left),
            }
        })
        .collect()
}

/// Run obvious trimming, the average-EE window search and the maxEE
/// truncation search with the settings in `config`.
pub fn recommend(
    avg_quality: &[f64],
    avg_ee: &[f64],
    profiles: &[EeProfile],
    config: &TrimConfig,
) -> Result<TrimRecommendation> {
    config.validate()?;
    let window = trim_ends_less_than_threshold(avg_quality, config.quality_threshold, config.obvious_max_trim)?;
    let avg_ee = read_size_by_avg_ee(avg_ee, window, config.max_mean_ee, config.max_trim_percent)?;
    let max_ee = read_size_by_max_ee(profiles, config.max_ee, config.max_trim_percent)?;
    Ok(TrimRecommendation {
        window,
        avg_ee,
        max_ee,
    })
}
