//! The report document shape: the JSON structure produced by a completed
//! analysis, plus the quality-status envelope the grader fills in.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

#[derive(Debug, Clone, Serialize)]
pub struct LengthBin {
    pub range: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct QualityPoint {
    pub pos: u32,
    pub quality: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PerSequenceQualityPoint {
    pub quality: i64,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PerSequenceGcPoint {
    pub gc: i64,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TheoreticalGcPoint {
    pub gc: i64,
    pub count: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PerBaseContentBin {
    pub pos: String,
    #[serde(rename = "A")]
    pub a: f64,
    #[serde(rename = "T")]
    pub t: f64,
    #[serde(rename = "G")]
    pub g: f64,
    #[serde(rename = "C")]
    pub c: f64,
    #[serde(rename = "N")]
    pub n: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DuplicationLevel {
    pub level: String,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OverrepresentedSequence {
    pub sequence: String,
    pub count: u64,
    pub percentage: f64,
    pub possible_source: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdapterContentEntry {
    pub name: String,
    pub percentage: f64,
}

/// Pass/warn/fail verdict for a single quality category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pass,
    Warn,
    Fail,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pass => "pass",
            Status::Warn => "warn",
            Status::Fail => "fail",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricStatus {
    pub status: Status,
    pub message: String,
}

/// An insertion-ordered `category -> status` map. A plain `HashMap` would
/// serialize its keys in an unspecified order; this preserves the category
/// order the grader produces them in.
#[derive(Debug, Clone, Default)]
pub struct MetricsMap(pub Vec<(String, MetricStatus)>);

impl MetricsMap {
    pub fn push(&mut self, category: &str, status: MetricStatus) {
        self.0.push((category.to_string(), status));
    }

    pub fn statuses(&self) -> impl Iterator<Item = Status> + '_ {
        self.0.iter().map(|(_, m)| m.status)
    }
}

impl Serialize for MetricsMap {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (category, status) in &self.0 {
            map.serialize_entry(category, status)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QualityStatus {
    pub overall: Status,
    pub metrics: MetricsMap,
    pub pass_count: u32,
    pub warn_count: u32,
    pub fail_count: u32,
}

/// The complete, immutable analysis report. Field order matches the JSON
/// key order named in the external interface.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
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
    pub quality_status: QualityStatus,
}
