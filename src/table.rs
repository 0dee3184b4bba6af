//! Fixed-schema row exports.

use crate::error::Result;
use crate::record::FastqRecord;
use serde::{Serialize, Serializer};
use std::io::Write;

/// One read: identifier, sequence and decoded scores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadRow {
    pub id: String,
    pub sequence: String,
    #[serde(serialize_with = "join_scores")]
    pub scores: Vec<u8>,
}

impl From<&FastqRecord> for ReadRow {
    fn from(rec: &FastqRecord) -> Self {
        Self {
            id: rec.id().to_string(),
            sequence: rec.seq().iter().map(|&b| char::from(b)).collect(),
            scores: rec.scores().to_vec(),
        }
    }
}

/// One base of one read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PositionRow {
    pub id: String,
    pub position: usize,
    pub nucleotide: char,
    pub quality: u8,
}

/// Flatten read rows into one row per (read, position).
pub fn unpack_entries(rows: &[ReadRow]) -> Vec<PositionRow> {
    let total: usize = rows.iter().map(|r| r.scores.len()).sum();
    let mut out = Vec::with_capacity(total);
    for row in rows {
        for (position, (nucleotide, &quality)) in
            row.sequence.chars().zip(row.scores.iter()).enumerate()
        {
            out.push(PositionRow {
                id: row.id.clone(),
                position,
                nucleotide,
                quality,
            });
        }
    }
    out
}

/// Write rows as tab-separated values with a header line.
pub fn write_tsv<T: Serialize, W: Write>(rows: &[T], writer: W) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

fn join_scores<S: Serializer>(scores: &[u8], s: S) -> std::result::Result<S::Ok, S::Error> {
    let joined = scores
        .iter()
        .map(u8::to_string)
        .collect::<Vec<_>>()
        .join(",");
    s.serialize_str(&joined)
}
