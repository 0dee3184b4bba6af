use crate::error::{IoContext, QcError, Result};
use crate::phred::PhredEncoding;
use crate::record::FastqRecord;
use crate::util::is_gzip_path;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Write records as four-line FASTQ.
pub fn write_fastq<'a, I, W>(records: I, mut out: W, encoding: PhredEncoding) -> Result<usize>
where
    I: IntoIterator<Item = &'a FastqRecord>,
    W: Write,
{
    let mut written = 0u64;
    let mut n = 0usize;
    for rec in records {
        let ctx = IoContext {
            byte_pos: written,
            line_num: n as u64 * 4,
        };
        write_record(&mut out, rec, encoding).map_err(|e| QcError::io_err(e, ctx))?;
        written += (rec.header().len() + 2 * rec.len() + 6) as u64;
        n += 1;
    }
    out.flush().map_err(|e| {
        QcError::io_err(
            e,
            IoContext {
                byte_pos: written,
                line_num: n as u64 * 4,
            },
        )
    })?;
    Ok(n)
}

fn write_record<W: Write>(out: &mut W, rec: &FastqRecord, encoding: PhredEncoding) -> io::Result<()> {
    out.write_all(b"@")?;
    out.write_all(rec.header().as_bytes())?;
    out.write_all(b"\n")?;
    out.write_all(rec.seq())?;
    out.write_all(b"\n+\n")?;
    out.write_all(&rec.quality_string(encoding))?;
    out.write_all(b"\n")
}

/// Write records to `path`, gzip-compressed when it ends in `.gz`.
pub fn write_fastq_path<'a, I>(records: I, path: &Path, encoding: PhredEncoding) -> Result<usize>
where
    I: IntoIterator<Item = &'a FastqRecord>,
{
    let start = IoContext {
        byte_pos: 0,
        line_num: 0,
    };
    let f = File::create(path).map_err(|e| QcError::io_err(e, start))?;
    if is_gzip_path(path) {
        let mut enc = flate2::write::GzEncoder::new(BufWriter::new(f), flate2::Compression::default());
        let n = write_fastq(records, &mut enc, encoding)?;
        enc.finish().map_err(|e| QcError::io_err(e, start))?;
        Ok(n)
    } else {
        write_fastq(records, BufWriter::new(f), encoding)
    }
}
