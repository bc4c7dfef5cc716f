//! The analyzer entry point: wires the input stream, decoder, accumulator
//! bank, finalizer, and grader into the single-pass pipeline described by
//! the system overview.

use std::path::Path;

use log::info;

use crate::accumulators::AccumulatorBank;
use crate::error::Error;
use crate::grader;
use crate::input::InputStream;
use crate::progress::ProgressSink;
use crate::record::FastqReader;
use crate::report::Report;

const PROGRESS_CADENCE: u64 = 1000;

/// Runs a complete analysis of the FASTQ file at `path`, reporting progress
/// through `progress` at a fixed record cadence. Fails fast on any I/O or
/// parse error — a partial run never produces a report.
pub fn analyze(path: &Path, progress: &mut dyn ProgressSink) -> Result<Report, Error> {
    info!("Opening {}", path.display());
    let input = InputStream::open(path)?;
    let compressed_size = input.compressed_size();
    let is_gz = input.is_gz();
    let position = input.progress_position();

    let mut reader = FastqReader::new(input.into_reader(), is_gz);
    let mut bank = AccumulatorBank::new();

    info!("Reading records...");
    while let Some(record) = reader.next_record()? {
        bank.update(&record);

        if bank.total_reads % PROGRESS_CADENCE == 0 {
            let percent = if compressed_size > 0 {
                let ratio = position.bytes_consumed() as f64 / compressed_size as f64;
                (ratio * 100.0).floor().clamp(0.0, 99.0) as u8
            } else {
                0
            };
            progress.on_progress(percent);
        }
    }

    info!("Processed {} records, finalizing report", bank.total_reads);

    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let finalized = crate::finalize::finalize(&bank, filename);
    let quality_status = grader::grade(&finalized);

    Ok(Report {
        filename: finalized.filename,
        platform: finalized.platform,
        total_reads: finalized.total_reads,
        total_bases: finalized.total_bases,
        avg_read_length: finalized.avg_read_length,
        gc_content: finalized.gc_content,
        avg_q_score: finalized.avg_q_score,
        min_len: finalized.min_len,
        max_len: finalized.max_len,
        n50: finalized.n50,
        length_distribution: finalized.length_distribution,
        quality_distribution: finalized.quality_distribution,
        per_sequence_quality_distribution: finalized.per_sequence_quality_distribution,
        per_sequence_gc_distribution: finalized.per_sequence_gc_distribution,
        theoretical_gc_distribution: finalized.theoretical_gc_distribution,
        per_base_sequence_content: finalized.per_base_sequence_content,
        duplication_levels: finalized.duplication_levels,
        overrepresented_sequences: finalized.overrepresented_sequences,
        adapter_content: finalized.adapter_content,
        quality_status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NullProgressSink;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_fastq(dir: &tempfile::TempDir, name: &str, content: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn analyzes_a_plain_file_end_to_end() {
        let dir = tempdir().unwrap();
        let path = write_fastq(&dir, "r.fastq", b"@r1\nACGTACGT\n+\nIIIIIIII\n");

        let mut sink = NullProgressSink;
        let report = analyze(&path, &mut sink).unwrap();

        assert_eq!(report.total_reads, 1);
        assert_eq!(report.total_bases, 8);
        assert_eq!(report.gc_content, 50.0);
        assert_eq!(report.avg_q_score, 40.0);
        assert_eq!(report.n50, 8);
        assert_eq!(report.platform, "Short Read");
    }

    #[test]
    fn plain_and_gzip_compressed_inputs_produce_identical_reports() {
        let dir = tempdir().unwrap();
        let mut content = Vec::new();
        for i in 0..50 {
            content.extend_from_slice(format!("@r{i}\nACGTACGTAC\n+\nIIIIIIIIII\n").as_bytes());
        }

        let plain_path = write_fastq(&dir, "r.fastq", &content);
        let gz_path = dir.path().join("r.fastq.gz");
        let file = std::fs::File::create(&gz_path).unwrap();
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder.write_all(&content).unwrap();
        encoder.finish().unwrap();

        let mut sink = NullProgressSink;
        let plain_report = analyze(&plain_path, &mut sink).unwrap();
        let gz_report = analyze(&gz_path, &mut sink).unwrap();

        assert_eq!(
            serde_json::to_string(&plain_report).unwrap(),
            serde_json::to_string(&gz_report).unwrap()
        );
    }

    #[test]
    fn running_twice_yields_byte_identical_reports() {
        let dir = tempdir().unwrap();
        let path = write_fastq(&dir, "r.fastq", b"@r1\nACGTACGT\n+\nIIIIIIII\n@r2\nTTTTGGGG\n+\n!!!!####\n");

        let mut sink = NullProgressSink;
        let first = analyze(&path, &mut sink).unwrap();
        let second = analyze(&path, &mut sink).unwrap();

        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn length_mismatch_is_a_parse_error_and_yields_no_report() {
        let dir = tempdir().unwrap();
        let path = write_fastq(&dir, "bad.fastq", b"@r1\nACGT\n+\nIII\n");

        let mut sink = NullProgressSink;
        let result = analyze(&path, &mut sink);
        assert!(matches!(result, Err(Error::Parse { .. })));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let mut sink = NullProgressSink;
        let result = analyze(Path::new("/no/such/file.fastq"), &mut sink);
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn emits_progress_at_fixed_record_cadence() {
        let dir = tempdir().unwrap();
        let mut content = Vec::new();
        for i in 0..2500 {
            content.extend_from_slice(format!("@r{i}\nAC\n+\nII\n").as_bytes());
        }
        let path = write_fastq(&dir, "r.fastq", &content);

        struct CountingSink(u32);
        impl ProgressSink for CountingSink {
            fn on_progress(&mut self, percent: u8) {
                assert!(percent <= 99);
                self.0 += 1;
            }
        }

        let mut sink = CountingSink(0);
        analyze(&path, &mut sink).unwrap();
        assert_eq!(sink.0, 2);
    }
}
