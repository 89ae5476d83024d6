use serde::Serialize;
use std::cmp::Ordering;

use super::aggregate::{subject_statistics, SubjectStatistics};
use super::grading::BucketCount;
use super::normalize::to_percentage;
use super::results::{attempted_pairs, StudentReport};
use super::stats;
use crate::config::EngineConfig;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectHighlight {
    pub name: String,
    #[serde(serialize_with = "super::serialize_whole")]
    pub mean: f64,
    pub pass_rate: u32,
}

impl From<&SubjectStatistics> for SubjectHighlight {
    fn from(s: &SubjectStatistics) -> Self {
        SubjectHighlight {
            name: s.subject.clone(),
            mean: s.population.stats.mean,
            pass_rate: s.population.pass_rate,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSummary {
    pub class_name: String,
    pub student_count: usize,
    pub subjects: Vec<SubjectStatistics>,
    pub top: Vec<SubjectHighlight>,
    /// Worst first.
    pub bottom: Vec<SubjectHighlight>,
    #[serde(serialize_with = "super::serialize_whole")]
    pub average_mean: f64,
    pub average_pass_rate: u32,
    pub grade_distribution: Vec<BucketCount>,
    pub band_distribution: Vec<BucketCount>,
}

fn by_mean_desc(a: &SubjectHighlight, b: &SubjectHighlight) -> Ordering {
    b.mean
        .partial_cmp(&a.mean)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.name.cmp(&b.name))
}

/// Summarise one class. `reports` should already be restricted to that class.
pub fn class_summary(
    class_name: &str,
    reports: &[StudentReport],
    config: &EngineConfig,
) -> ClassSummary {
    let subjects = subject_statistics(reports, config, false);

    let mut ranked: Vec<SubjectHighlight> = subjects.iter().map(SubjectHighlight::from).collect();
    ranked.sort_by(by_mean_desc);
    let n = config.summary_top_count.min(ranked.len());
    let top = ranked[..n].to_vec();
    let bottom = ranked.iter().rev().take(n).cloned().collect();

    let means: Vec<f64> = subjects.iter().map(|s| s.population.stats.mean).collect();
    let rates: Vec<f64> = subjects
        .iter()
        .map(|s| f64::from(s.population.pass_rate))
        .collect();

    let marks: Vec<u32> = attempted_pairs(reports).map(|(_, s)| s.final_mark).collect();

    ClassSummary {
        class_name: class_name.to_string(),
        student_count: reports.len(),
        top,
        bottom,
        average_mean: stats::mean(&means),
        average_pass_rate: super::round_whole(stats::mean(&rates)) as u32,
        grade_distribution: config
            .exam_grades
            .tally(marks.iter().map(|m| to_percentage(f64::from(*m)))),
        band_distribution: config
            .bands
            .tally(marks.iter().map(|m| f64::from(*m))),
        subjects,
    }
}
