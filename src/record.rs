//! The FASTQ record decoder: a single-pass, one-record-at-a-time reader.

use std::io::BufRead;

use crate::error::Error;
use crate::input::classify_read_error;

/// One FASTQ record. `sequence` and `quality` are guaranteed equal length.
#[derive(Debug, Clone)]
pub struct Record {
    pub header: Vec<u8>,
    pub sequence: Vec<u8>,
    pub separator: Vec<u8>,
    pub quality: Vec<u8>,
}

/// Streams [`Record`]s out of a byte source, holding at most one record in
/// memory at a time.
pub struct FastqReader<R> {
    reader: R,
    line_no: u64,
    is_gz: bool,
}

impl<R: BufRead> FastqReader<R> {
    pub fn new(reader: R, is_gz: bool) -> Self {
        Self {
            reader,
            line_no: 0,
            is_gz,
        }
    }

    fn read_line(&mut self) -> Result<Option<Vec<u8>>, Error> {
        let mut buf = Vec::new();
        let n = self
            .reader
            .read_until(b'\n', &mut buf)
            .map_err(|err| classify_read_error(err, self.is_gz))?;
        if n == 0 {
            return Ok(None);
        }
        self.line_no += 1;
        while matches!(buf.last(), Some(b'\n') | Some(b'\r')) {
            buf.pop();
        }
        Ok(Some(buf))
    }

    fn require_line(&mut self, what: &str) -> Result<Vec<u8>, Error> {
        self.read_line()?.ok_or_else(|| Error::Parse {
            line: self.line_no + 1,
            message: format!("unexpected end of file, expected {what}"),
        })
    }

    /// Reads the next record, or `None` at a clean end of stream.
    pub fn next_record(&mut self) -> Result<Option<Record>, Error> {
        let header = match self.read_line()? {
            Some(line) => line,
            None => return Ok(None),
        };
        if !header.starts_with(b"@") {
            return Err(Error::Parse {
                line: self.line_no,
                message: "header line must start with '@'".to_string(),
            });
        }

        let sequence = self.require_line("sequence line")?;
        let separator = self.require_line("separator line")?;
        if !separator.starts_with(b"+") {
            return Err(Error::Parse {
                line: self.line_no,
                message: "separator line must start with '+'".to_string(),
            });
        }
        let quality = self.require_line("quality line")?;

        if sequence.len() != quality.len() {
            return Err(Error::Parse {
                line: self.line_no,
                message: format!(
                    "sequence and quality lengths differ ({} vs {})",
                    sequence.len(),
                    quality.len()
                ),
            });
        }

        if let Some(&byte) = quality.iter().find(|&&b| !(33..=126).contains(&b)) {
            return Err(Error::Parse {
                line: self.line_no,
                message: format!("quality byte {byte} outside Phred+33 range 33..=126"),
            });
        }

        Ok(Some(Record {
            header,
            sequence,
            separator,
            quality,
        }))
    }
}

impl<R: BufRead> Iterator for FastqReader<R> {
    type Item = Result<Record, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}
