//! Transparent, progress-observable input stream.
//!
//! Opens a file path and exposes a [`BufRead`] over either the raw bytes or,
//! for `.gz` inputs, the inflated bytes — plus a monotone counter of bytes
//! consumed from the *compressed* file, used to drive progress reporting.

use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use flate2::read::MultiGzDecoder;

use crate::error::Error;

/// Wraps a reader, counting every byte that passes through `read()`.
///
/// This sits *underneath* the gzip decoder so the counter tracks the
/// compressed file offset rather than the decompressed volume; flate2 does
/// not expose the inner reader's position directly.
struct CountingReader<R> {
    inner: R,
    position: Arc<AtomicU64>,
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.position.fetch_add(n as u64, Ordering::Relaxed);
        Ok(n)
    }
}

/// A read-only handle on the compressed-bytes-consumed counter.
#[derive(Clone)]
pub struct ProgressPosition(Arc<AtomicU64>);

impl ProgressPosition {
    pub fn bytes_consumed(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// An open FASTQ input, transparently decompressed if `.gz`.
pub struct InputStream {
    reader: Box<dyn BufRead>,
    compressed_size: u64,
    position: Arc<AtomicU64>,
    is_gz: bool,
}

impl InputStream {
    pub fn open(path: &Path) -> Result<Self, Error> {
        let file = std::fs::File::open(path)?;
        let compressed_size = file.metadata()?.len();
        let position = Arc::new(AtomicU64::new(0));
        let counting = CountingReader {
            inner: file,
            position: Arc::clone(&position),
        };

        let is_gz = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("gz"))
            .unwrap_or(false);

        let reader: Box<dyn BufRead> = if is_gz {
            Box::new(BufReader::new(MultiGzDecoder::new(counting)))
        } else {
            Box::new(BufReader::new(counting))
        };

        Ok(Self {
            reader,
            compressed_size,
            position,
            is_gz,
        })
    }

    pub fn compressed_size(&self) -> u64 {
        self.compressed_size
    }

    pub fn is_gz(&self) -> bool {
        self.is_gz
    }

    pub fn progress_position(&self) -> ProgressPosition {
        ProgressPosition(Arc::clone(&self.position))
    }

    pub fn into_reader(self) -> Box<dyn BufRead> {
        self.reader
    }
}

/// Maps a read error encountered while consuming a `.gz` stream to
/// [`Error::Decompress`]; flate2 surfaces framing problems as plain
/// `io::Error`s of kind `InvalidData`, which otherwise look identical to an
/// ordinary I/O failure.
pub(crate) fn classify_read_error(err: io::Error, is_gz: bool) -> Error {
    if is_gz && err.kind() == io::ErrorKind::InvalidData {
        Error::Decompress(err.to_string())
    } else {
        Error::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn reads_plain_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("in.fastq");
        std::fs::write(&path, b"@r1\nACGT\n+\nIIII\n").unwrap();

        let mut input = InputStream::open(&path).unwrap();
        assert_eq!(input.compressed_size(), 17);
        let mut buf = Vec::new();
        input.into_reader().read_to_end(&mut buf).unwrap();
        assert_eq!(buf, b"@r1\nACGT\n+\nIIII\n");
    }

    #[test]
    fn reads_gzip_file_and_tracks_compressed_position() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("in.fastq.gz");
        let content = b"@r1\nACGT\n+\nIIII\n".repeat(50);

        let file = std::fs::File::create(&path).unwrap();
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder.write_all(&content).unwrap();
        encoder.finish().unwrap();

        let input = InputStream::open(&path).unwrap();
        let position = input.progress_position();
        assert_eq!(position.bytes_consumed(), 0);

        let mut reader = input.into_reader();
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).unwrap();
        assert_eq!(buf, content);
        // compressed position must have advanced, and stay far below the
        // decompressed volume for this highly repetitive input.
        assert!(position.bytes_consumed() > 0);
        assert!(position.bytes_consumed() < content.len() as u64);
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = InputStream::open(Path::new("/no/such/file.fastq"));
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
