//! The quality grader: fixed FastQC-style thresholds applied to finalized
//! metrics, producing a pass/warn/fail verdict per category plus an overall
//! worst-of verdict. The grader never fails; an absent distribution simply
//! degrades to `warn` (or `pass` for `n_content`/`adapter_content`).

use crate::finalize::Finalized;
use crate::report::{MetricStatus, MetricsMap, QualityStatus, Status};

pub fn grade(report: &Finalized) -> QualityStatus {
    let mut metrics = MetricsMap::default();

    metrics.push("per_base_quality", per_base_quality(report));
    metrics.push("per_sequence_quality", per_sequence_quality(report));
    metrics.push("per_base_content", per_base_content(report));
    metrics.push("gc_content", gc_content(report));
    metrics.push("n_content", n_content(report));
    metrics.push("sequence_duplication", sequence_duplication(report));
    metrics.push("adapter_content", adapter_content(report));

    let overall = metrics
        .statuses()
        .max()
        .unwrap_or(Status::Pass);
    let pass_count = metrics.statuses().filter(|s| *s == Status::Pass).count() as u32;
    let warn_count = metrics.statuses().filter(|s| *s == Status::Warn).count() as u32;
    let fail_count = metrics.statuses().filter(|s| *s == Status::Fail).count() as u32;

    QualityStatus {
        overall,
        metrics,
        pass_count,
        warn_count,
        fail_count,
    }
}

fn per_base_quality(report: &Finalized) -> MetricStatus {
    let min_quality = report
        .quality_distribution
        .iter()
        .map(|p| p.quality)
        .fold(None, |acc: Option<f64>, q| match acc {
            Some(min) => Some(min.min(q)),
            None => Some(q),
        });

    match min_quality {
        Some(min) if min >= 25.0 => MetricStatus {
            status: Status::Pass,
            message: "All positions have good quality".to_string(),
        },
        Some(min) if min >= 20.0 => MetricStatus {
            status: Status::Warn,
            message: format!("Some positions have quality below 25 (min: {min:.1})"),
        },
        Some(min) => MetricStatus {
            status: Status::Fail,
            message: format!("Some positions have poor quality (min: {min:.1})"),
        },
        None => MetricStatus {
            status: Status::Warn,
            message: "No quality data available".to_string(),
        },
    }
}

fn per_sequence_quality(report: &Finalized) -> MetricStatus {
    let mode = report
        .per_sequence_quality_distribution
        .iter()
        .fold(None, |best: Option<&crate::report::PerSequenceQualityPoint>, point| {
            match best {
                Some(b) if point.count <= b.count => best,
                _ => Some(point),
            }
        });

    match mode {
        Some(m) if m.quality >= 27 => MetricStatus {
            status: Status::Pass,
            message: format!("Most sequences have good quality (mode: {})", m.quality),
        },
        Some(m) if m.quality >= 20 => MetricStatus {
            status: Status::Warn,
            message: format!("Average quality is moderate (mode: {})", m.quality),
        },
        Some(m) => MetricStatus {
            status: Status::Fail,
            message: format!("Most sequences have poor quality (mode: {})", m.quality),
        },
        None => MetricStatus {
            status: Status::Warn,
            message: "No per-sequence quality data".to_string(),
        },
    }
}

fn per_base_content(report: &Finalized) -> MetricStatus {
    if report.per_base_sequence_content.is_empty() {
        return MetricStatus {
            status: Status::Warn,
            message: "No base content data".to_string(),
        };
    }

    let max_diff = report
        .per_base_sequence_content
        .iter()
        .map(|bin| (bin.a - bin.t).abs().max((bin.g - bin.c).abs()))
        .fold(0.0_f64, f64::max);

    if max_diff <= 10.0 {
        MetricStatus {
            status: Status::Pass,
            message: "Base content is balanced".to_string(),
        }
    } else if max_diff <= 20.0 {
        MetricStatus {
            status: Status::Warn,
            message: format!("Some positions show base imbalance ({max_diff:.1}% difference)"),
        }
    } else {
        MetricStatus {
            status: Status::Fail,
            message: format!("Significant base imbalance detected ({max_diff:.1}% difference)"),
        }
    }
}

fn gc_content(report: &Finalized) -> MetricStatus {
    let gc = report.gc_content;
    if (35.0..=65.0).contains(&gc) {
        MetricStatus {
            status: Status::Pass,
            message: format!("GC content is normal ({gc:.1}%)"),
        }
    } else if (20.0..=80.0).contains(&gc) {
        MetricStatus {
            status: Status::Warn,
            message: format!("GC content is unusual ({gc:.1}%)"),
        }
    } else {
        MetricStatus {
            status: Status::Fail,
            message: format!("GC content is extreme ({gc:.1}%)"),
        }
    }
}

fn n_content(report: &Finalized) -> MetricStatus {
    if report.per_base_sequence_content.is_empty() {
        return MetricStatus {
            status: Status::Pass,
            message: "No N content issues detected".to_string(),
        };
    }

    let max_n = report
        .per_base_sequence_content
        .iter()
        .map(|bin| bin.n)
        .fold(0.0_f64, f64::max);

    if max_n < 5.0 {
        MetricStatus {
            status: Status::Pass,
            message: format!("Low N content (max: {max_n:.1}%)"),
        }
    } else if max_n < 20.0 {
        MetricStatus {
            status: Status::Warn,
            message: format!("Moderate N content (max: {max_n:.1}%)"),
        }
    } else {
        MetricStatus {
            status: Status::Fail,
            message: format!("High N content (max: {max_n:.1}%)"),
        }
    }
}

fn sequence_duplication(report: &Finalized) -> MetricStatus {
    let total_dup: f64 = report
        .duplication_levels
        .iter()
        .filter(|d| d.level != "1")
        .map(|d| d.percentage)
        .sum();

    if total_dup < 20.0 {
        MetricStatus {
            status: Status::Pass,
            message: format!("Low duplication ({total_dup:.1}%)"),
        }
    } else if total_dup < 50.0 {
        MetricStatus {
            status: Status::Warn,
            message: format!("Moderate duplication ({total_dup:.1}%)"),
        }
    } else {
        MetricStatus {
            status: Status::Fail,
            message: format!("High duplication ({total_dup:.1}%)"),
        }
    }
}

fn adapter_content(report: &Finalized) -> MetricStatus {
    if report.adapter_content.is_empty() {
        return MetricStatus {
            status: Status::Pass,
            message: "No adapters detected".to_string(),
        };
    }

    let max_adapter = report
        .adapter_content
        .iter()
        .map(|a| a.percentage)
        .fold(0.0_f64, f64::max);

    if max_adapter < 5.0 {
        MetricStatus {
            status: Status::Pass,
            message: "Low adapter content".to_string(),
        }
    } else if max_adapter < 10.0 {
        MetricStatus {
            status: Status::Warn,
            message: format!("Some adapter contamination ({max_adapter:.1}%)"),
        }
    } else {
        MetricStatus {
            status: Status::Fail,
            message: format!("High adapter contamination ({max_adapter:.1}%)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulators::AccumulatorBank;
    use crate::finalize::finalize;
    use crate::record::Record;

    fn record(seq: &[u8], qual: &[u8]) -> Record {
        Record {
            header: b"@r".to_vec(),
            sequence: seq.to_vec(),
            separator: b"+".to_vec(),
            quality: qual.to_vec(),
        }
    }

    #[test]
    fn empty_file_fails_on_gc_content_and_overall() {
        let bank = AccumulatorBank::new();
        let report = finalize(&bank, "empty.fastq".to_string());
        let status = grade(&report);
        assert_eq!(status.overall, Status::Fail);
        let gc = status.metrics.0.iter().find(|(k, _)| k == "gc_content").unwrap();
        assert_eq!(gc.1.status, Status::Fail);
    }

    #[test]
    fn all_n_sequence_fails_n_content() {
        let mut bank = AccumulatorBank::new();
        bank.update(&record(b"NNNNNNNN", b"IIIIIIII"));
        let report = finalize(&bank, "n.fastq".to_string());
        let status = grade(&report);
        assert_eq!(report.gc_content, 0.0);
        let n = status.metrics.0.iter().find(|(k, _)| k == "n_content").unwrap();
        assert_eq!(n.1.status, Status::Fail);
    }

    #[test]
    fn scenario_two_low_quality_duplicated_adapter_reads() {
        let mut bank = AccumulatorBank::new();
        for _ in 0..10 {
            bank.update(&record(b"AGATCGGAAGAG", &vec![b'!'; 12]));
        }
        let report = finalize(&bank, "adapters.fastq".to_string());
        let status = grade(&report);

        let adapter = report
            .adapter_content
            .iter()
            .find(|a| a.name == "Illumina Universal")
            .unwrap();
        assert_eq!(adapter.percentage, 100.0);

        let pbq = status
            .metrics
            .0
            .iter()
            .find(|(k, _)| k == "per_base_quality")
            .unwrap();
        assert_eq!(pbq.1.status, Status::Fail);

        let dup = status
            .metrics
            .0
            .iter()
            .find(|(k, _)| k == "sequence_duplication")
            .unwrap();
        assert_eq!(dup.1.status, Status::Fail);
    }

    #[test]
    fn single_read_passes_everything_except_base_content_balance() {
        // A lone read is, by construction, 100%/0% at every position for
        // whichever base it carries there, so per_base_content's balance
        // check fails even though every other category passes.
        let mut bank = AccumulatorBank::new();
        bank.update(&record(b"ACGTACGT", b"IIIIIIII"));
        let report = finalize(&bank, "good.fastq".to_string());
        let status = grade(&report);

        assert_eq!(status.overall, Status::Fail);
        assert_eq!(status.fail_count, 1);
        let pbc = status
            .metrics
            .0
            .iter()
            .find(|(k, _)| k == "per_base_content")
            .unwrap();
        assert_eq!(pbc.1.status, Status::Fail);

        for category in [
            "per_base_quality",
            "per_sequence_quality",
            "gc_content",
            "n_content",
            "sequence_duplication",
            "adapter_content",
        ] {
            let entry = status.metrics.0.iter().find(|(k, _)| k == category).unwrap();
            assert_eq!(entry.1.status, Status::Pass, "{category} should pass");
        }
    }
}
