//! The finalizer: turns a frozen [`AccumulatorBank`] into report
//! distributions, N50, the theoretical GC fit, and a platform guess.

use std::f64::consts::PI;

use crate::accumulators::{AccumulatorBank, ADAPTERS, SAMPLE_CAP};
use crate::report::{
    AdapterContentEntry, DuplicationLevel, LengthBin, OverrepresentedSequence,
    PerBaseContentBin, PerSequenceGcPoint, PerSequenceQualityPoint, QualityPoint,
    TheoreticalGcPoint,
};

const DUPLICATION_BUCKETS: [&str; 9] = [
    "1", "2", "3", "4", "5", "6-10", "11-50", "51-100", "100+",
];

fn duplication_bucket(count: u64) -> &'static str {
    match count {
        1 => "1",
        2 => "2",
        3 => "3",
        4 => "4",
        5 => "5",
        6..=10 => "6-10",
        11..=50 => "11-50",
        51..=100 => "51-100",
        _ => "100+",
    }
}

/// Everything the finalizer derives from the accumulator bank, short of the
/// quality verdicts (those are the grader's job — see [`crate::grader`]).
pub struct Finalized {
    pub filename: String,
    pub platform: String,
    pub total_reads: u64,
    pub total_bases: u64,
    pub avg_read_length: f64,
    pub gc_content: f64,
    pub avg_q_score: f64,
    pub min_len: u32,
    pub max_len: u32,
    pub n50: u32,
    pub length_distribution: Vec<LengthBin>,
    pub quality_distribution: Vec<QualityPoint>,
    pub per_sequence_quality_distribution: Vec<PerSequenceQualityPoint>,
    pub per_sequence_gc_distribution: Vec<PerSequenceGcPoint>,
    pub theoretical_gc_distribution: Vec<TheoreticalGcPoint>,
    pub per_base_sequence_content: Vec<PerBaseContentBin>,
    pub duplication_levels: Vec<DuplicationLevel>,
    pub overrepresented_sequences: Vec<OverrepresentedSequence>,
    pub adapter_content: Vec<AdapterContentEntry>,
}

pub fn finalize(bank: &AccumulatorBank, filename: String) -> Finalized {
    let total_reads = bank.total_reads;
    let total_bases = bank.total_bases;

    let avg_read_length = if total_reads > 0 {
        total_bases as f64 / total_reads as f64
    } else {
        0.0
    };
    let gc_content = if total_bases > 0 {
        100.0 * bank.gc_count as f64 / total_bases as f64
    } else {
        0.0
    };
    let avg_q_score = if total_bases > 0 {
        bank.q_score_sum as f64 / total_bases as f64
    } else {
        0.0
    };
    let min_len = if total_reads > 0 { bank.min_len } else { 0 };

    let length_distribution = length_distribution(bank);
    let quality_distribution = quality_distribution(bank);
    let per_sequence_quality_distribution = per_sequence_quality_distribution(bank);
    let per_sequence_gc_distribution = per_sequence_gc_distribution(bank);
    let theoretical_gc_distribution = theoretical_gc_distribution(bank);
    let per_base_sequence_content = per_base_sequence_content(bank);
    let n50 = n50(bank);
    let duplication_levels = duplication_levels(bank);
    let overrepresented_sequences = overrepresented_sequences(bank);
    let adapter_content = adapter_content(bank);
    let platform = platform(bank, avg_read_length);

    Finalized {
        filename,
        platform,
        total_reads,
        total_bases,
        avg_read_length,
        gc_content,
        avg_q_score,
        min_len,
        max_len: bank.max_len,
        n50,
        length_distribution,
        quality_distribution,
        per_sequence_quality_distribution,
        per_sequence_gc_distribution,
        theoretical_gc_distribution,
        per_base_sequence_content,
        duplication_levels,
        overrepresented_sequences,
        adapter_content,
    }
}

fn length_distribution(bank: &AccumulatorBank) -> Vec<LengthBin> {
    let mut bins: Vec<_> = bank.length_hist.iter().collect();
    bins.sort_unstable_by_key(|(bin, _)| **bin);
    bins.into_iter()
        .map(|(bin, count)| LengthBin {
            range: format!("{bin}-{}", bin + 9),
            count: *count,
        })
        .collect()
}

fn quality_distribution(bank: &AccumulatorBank) -> Vec<QualityPoint> {
    (0..bank.pos_quality_n.len())
        .filter(|&i| bank.pos_quality_n[i] > 0)
        .map(|i| QualityPoint {
            pos: (i + 1) as u32,
            quality: bank.pos_quality_sum[i] as f64 / bank.pos_quality_n[i] as f64,
        })
        .collect()
}

fn per_sequence_quality_distribution(bank: &AccumulatorBank) -> Vec<PerSequenceQualityPoint> {
    let mut entries: Vec<_> = bank.per_seq_quality_hist.iter().collect();
    entries.sort_unstable_by_key(|(quality, _)| **quality);
    entries
        .into_iter()
        .map(|(quality, count)| PerSequenceQualityPoint {
            quality: *quality,
            count: *count,
        })
        .collect()
}

fn per_sequence_gc_distribution(bank: &AccumulatorBank) -> Vec<PerSequenceGcPoint> {
    let mut entries: Vec<_> = bank.per_seq_gc_hist.iter().collect();
    entries.sort_unstable_by_key(|(gc, _)| **gc);
    entries
        .into_iter()
        .map(|(gc, count)| PerSequenceGcPoint {
            gc: *gc,
            count: *count,
        })
        .collect()
}

fn theoretical_gc_distribution(bank: &AccumulatorBank) -> Vec<TheoreticalGcPoint> {
    let total: u64 = bank.per_seq_gc_hist.values().sum();
    if total == 0 {
        return Vec::new();
    }

    let n = total as f64;
    let weighted_sum: f64 = bank
        .per_seq_gc_hist
        .iter()
        .map(|(gc, count)| *gc as f64 * *count as f64)
        .sum();
    let mean = weighted_sum / n;

    let variance_sum: f64 = bank
        .per_seq_gc_hist
        .iter()
        .map(|(gc, count)| *count as f64 * (*gc as f64 - mean).powi(2))
        .sum();
    let std_dev = (variance_sum / n).sqrt();

    if std_dev > 0.0 {
        (0..=100)
            .map(|x| {
                let exponent = -0.5 * ((x as f64 - mean) / std_dev).powi(2);
                let pdf = (1.0 / (std_dev * (2.0 * PI).sqrt())) * exponent.exp();
                TheoreticalGcPoint {
                    gc: x,
                    count: pdf * n,
                }
            })
            .collect()
    } else {
        vec![TheoreticalGcPoint {
            gc: mean.floor() as i64,
            count: n,
        }]
    }
}

fn per_base_sequence_content(bank: &AccumulatorBank) -> Vec<PerBaseContentBin> {
    let max_pos = bank
        .per_base_content
        .iter()
        .enumerate()
        .filter(|(_, counts)| counts.total() > 0)
        .map(|(i, _)| i)
        .max();

    let Some(max_pos) = max_pos else {
        return Vec::new();
    };

    let mut bins = Vec::new();
    let mut current = 0usize;
    while current <= max_pos {
        let (end, label) = if current < 9 {
            (current + 1, (current + 1).to_string())
        } else {
            let end = (current + 5).min(max_pos + 1);
            (end, format!("{}-{}", current + 1, end))
        };

        let mut total = 0u64;
        let mut a = 0u64;
        let mut t = 0u64;
        let mut g = 0u64;
        let mut c = 0u64;
        let mut n = 0u64;
        for counts in &bank.per_base_content[current..end] {
            a += counts.a;
            t += counts.t;
            g += counts.g;
            c += counts.c;
            n += counts.n;
            total += counts.total();
        }

        if total > 0 {
            let pct = |x: u64| 100.0 * x as f64 / total as f64;
            bins.push(PerBaseContentBin {
                pos: label,
                a: pct(a),
                t: pct(t),
                g: pct(g),
                c: pct(c),
                n: pct(n),
            });
        }

        current = end;
    }

    bins
}

fn n50(bank: &AccumulatorBank) -> u32 {
    if bank.read_lengths_sample.is_empty() {
        return 0;
    }

    let mut lengths = bank.read_lengths_sample.clone();
    lengths.sort_unstable_by(|a, b| b.cmp(a));
    let total: u64 = lengths.iter().map(|&l| l as u64).sum();
    let half = total as f64 / 2.0;

    let mut running = 0u64;
    for len in lengths {
        running += len as u64;
        if running as f64 >= half {
            return len;
        }
    }
    unreachable!("running sum must reach half of total before the sample is exhausted")
}

fn duplication_levels(bank: &AccumulatorBank) -> Vec<DuplicationLevel> {
    let total_distinct = bank.seq_count.len() as u64;
    let mut bucket_counts: std::collections::HashMap<&str, u64> = std::collections::HashMap::new();
    for &count in bank.seq_count.values() {
        *bucket_counts.entry(duplication_bucket(count)).or_insert(0) += 1;
    }

    DUPLICATION_BUCKETS
        .iter()
        .map(|&level| {
            let bucket_count = bucket_counts.get(level).copied().unwrap_or(0);
            let percentage = if total_distinct > 0 {
                100.0 * bucket_count as f64 / total_distinct as f64
            } else {
                0.0
            };
            DuplicationLevel {
                level: level.to_string(),
                percentage,
            }
        })
        .collect()
}

fn overrepresented_sequences(bank: &AccumulatorBank) -> Vec<OverrepresentedSequence> {
    if bank.total_reads == 0 {
        return Vec::new();
    }

    let mut duplicated: Vec<_> = bank
        .seq_count
        .iter()
        .filter(|(_, &count)| count > 1)
        .collect();
    duplicated.sort_unstable_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

    duplicated
        .into_iter()
        .take(5)
        .filter_map(|(seq, &count)| {
            let percentage = 100.0 * count as f64 / bank.total_reads as f64;
            if percentage > 0.1 {
                Some(OverrepresentedSequence {
                    sequence: String::from_utf8_lossy(seq).into_owned(),
                    count,
                    percentage,
                    possible_source: "Unknown".to_string(),
                })
            } else {
                None
            }
        })
        .collect()
}

fn adapter_content(bank: &AccumulatorBank) -> Vec<AdapterContentEntry> {
    if bank.total_reads == 0 {
        return Vec::new();
    }

    ADAPTERS
        .iter()
        .enumerate()
        .filter(|(i, _)| bank.adapter_hits[*i] > 0)
        .map(|(i, (name, _))| AdapterContentEntry {
            name: name.to_string(),
            percentage: 100.0 * bank.adapter_hits[i] as f64 / bank.total_reads as f64,
        })
        .collect()
}

fn platform(bank: &AccumulatorBank, avg_read_length: f64) -> String {
    let Some(header) = &bank.first_header else {
        return "Unknown".to_string();
    };
    let header = String::from_utf8_lossy(header);
    let after_at = header.strip_prefix('@').unwrap_or(&header);

    if header.contains("runid=") || header.contains("ch=") {
        "Nanopore".to_string()
    } else if header.ends_with("/ccs") || after_at.starts_with('m') {
        "PacBio".to_string()
    } else if after_at.starts_with('V') || after_at.starts_with('E') || after_at.starts_with("CL")
    {
        if avg_read_length < 1000.0 {
            "MGI".to_string()
        } else {
            "Long Read (Unknown)".to_string()
        }
    } else if header.matches(':').count() >= 4 {
        "Illumina".to_string()
    } else if avg_read_length > 1000.0 {
        "Long Read".to_string()
    } else {
        "Short Read".to_string()
    }
}
