use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

const BUF_CAPACITY: usize = 256 * 1024;

pub fn looks_like_gzip<R: Read + Seek>(mut r: R) -> io::Result<bool> {
    let mut magic = [0u8; 2];
    let pos = r.stream_position()?;
    let n = r.read(&mut magic)?;
    r.seek(SeekFrom::Start(pos))?;
    Ok(n >= 2 && magic == [0x1F, 0x8B])
}

pub fn is_gzip_path(path: &Path) -> bool {
    path.extension().and_then(|s| s.to_str()) == Some("gz")
}

/// Open `path` for one streaming pass. Gzip is detected by extension or
/// magic bytes.
pub fn open_buffered(path: &Path) -> io::Result<Box<dyn BufRead + Send>> {
    let f = File::open(path)?;
    let is_gz = is_gzip_path(path) || looks_like_gzip(&f).unwrap_or(false);

    if is_gz {
        #[cfg(feature = "gzip")]
        {
            let dec = flate2::read::MultiGzDecoder::new(f);
            return Ok(Box::new(BufReader::with_capacity(BUF_CAPACITY, dec)));
        }
        #[cfg(not(feature = "gzip"))]
        {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "gzip input requires the `gzip` feature",
            ));
        }
    }

    #[cfg(feature = "mmap")]
    {
        // SAFETY: the map is read-only and lives as long as the cursor.
        let mmap = unsafe { memmap2::Mmap::map(&f) }?;
        Ok(Box::new(io::Cursor::new(mmap)))
    }
    #[cfg(not(feature = "mmap"))]
    {
        Ok(Box::new(BufReader::with_capacity(BUF_CAPACITY, f)))
    }
}
