use serde::Serialize;
use std::collections::BTreeMap;

use super::grading::BucketCount;
use super::normalize::{to_percentage, ComponentId, NormalizedComponent};
use super::results::{attempted_pairs, StudentReport};
use super::round_whole;
use super::snapshot::ClassKey;
use super::stats::{self, Statistics};
use crate::config::EngineConfig;

/// Pass/total counter. Rate is a rounded percentage, 0 for an empty population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PassTally {
    pub count: usize,
    pub pass_count: usize,
}

impl PassTally {
    /// Count one result by its reported 0-50 mark against a percentage pass mark.
    pub fn add(&mut self, final_mark: u32, pass_mark: f64) {
        self.count += 1;
        if to_percentage(f64::from(final_mark)) >= pass_mark {
            self.pass_count += 1;
        }
    }

    pub fn rate(&self) -> u32 {
        if self.count == 0 {
            return 0;
        }
        round_whole(self.pass_count as f64 / self.count as f64 * 100.0) as u32
    }
}

/// Statistics shared by every grouping: distribution, pass rate, buckets.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulationSummary {
    #[serde(flatten)]
    pub stats: Statistics,
    pub pass_count: usize,
    pub pass_rate: u32,
    pub grade_counts: Vec<BucketCount>,
    pub band_counts: Vec<BucketCount>,
}

impl PopulationSummary {
    /// `marks` are (percentage, 0-50 mark) pairs of attempted results. The
    /// distribution uses the percentage; pass and grade counts use the
    /// reported mark.
    pub fn from_marks(marks: &[(f64, u32)], config: &EngineConfig) -> Self {
        let percents: Vec<f64> = marks.iter().map(|(p, _)| *p).collect();
        let mut tally = PassTally::default();
        for (_, mark) in marks {
            tally.add(*mark, config.pass_mark);
        }
        PopulationSummary {
            stats: stats::describe(&percents),
            pass_count: tally.pass_count,
            pass_rate: tally.rate(),
            grade_counts: config
                .exam_grades
                .tally(marks.iter().map(|(_, m)| to_percentage(f64::from(*m)))),
            band_counts: config.bands.tally(marks.iter().map(|(_, f)| f64::from(*f))),
        }
    }
}

/// Keeps papers distinct across classes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentKey {
    pub class: ClassKey,
    pub component: ComponentId,
}

impl ComponentKey {
    pub fn of(class: &ClassKey, component: &NormalizedComponent) -> Self {
        Self {
            class: class.clone(),
            component: component.component.clone(),
        }
    }

    pub fn label(&self) -> String {
        format!("{} - Paper:{}", self.class, self.component)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentStatistics {
    pub key: ComponentKey,
    pub label: String,
    pub count: usize,
    #[serde(serialize_with = "super::serialize_whole")]
    pub mean: f64,
    #[serde(rename = "sd", serialize_with = "super::serialize_whole")]
    pub std: f64,
    #[serde(serialize_with = "super::serialize_whole")]
    pub median: f64,
    pub zero_count: usize,
    pub zero_rate: u32,
}

impl ComponentStatistics {
    fn from_pool(key: ComponentKey, values: &[f64]) -> Self {
        let described = stats::describe(values);
        let zero_count = values.iter().filter(|v| **v == 0.0).count();
        ComponentStatistics {
            label: key.label(),
            key,
            count: values.len(),
            mean: described.mean,
            std: described.std,
            median: described.median,
            zero_count,
            zero_rate: round_whole(zero_count as f64 / values.len().max(1) as f64 * 100.0) as u32,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRow {
    pub class_name: String,
    pub student_name: String,
    pub final_mark: u32,
    pub components: Vec<NormalizedComponent>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectStatistics {
    #[serde(rename = "name")]
    pub subject: String,
    #[serde(flatten)]
    pub population: PopulationSummary,
    pub components: Vec<ComponentStatistics>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub student_rows: Vec<StudentRow>,
}

impl SubjectStatistics {
    pub fn component(&self, key: &ComponentKey) -> Option<&ComponentStatistics> {
        self.components.iter().find(|c| c.key == *key)
    }
}

#[derive(Default)]
struct SubjectPool {
    marks: Vec<(f64, u32)>,
    components: BTreeMap<ComponentKey, Vec<f64>>,
    rows: Vec<StudentRow>,
}

/// Per-subject statistics over every attempted result in `reports`.
/// Pass a single class's reports for class scope, all of them for global.
pub fn subject_statistics(
    reports: &[StudentReport],
    config: &EngineConfig,
    with_rows: bool,
) -> Vec<SubjectStatistics> {
    let mut pools: BTreeMap<&str, SubjectPool> = BTreeMap::new();
    for (r, s) in attempted_pairs(reports) {
        let pool = pools.entry(s.name.as_str()).or_default();
        pool.marks.push((s.final_percent, s.final_mark));
        for c in &s.components {
            pool.components
                .entry(ComponentKey::of(&r.class, c))
                .or_default()
                .push(c.percentage);
        }
        if with_rows {
            pool.rows.push(StudentRow {
                class_name: r.class.name(),
                student_name: r.name.clone(),
                final_mark: s.final_mark,
                components: s.components.clone(),
            });
        }
    }

    pools
        .into_iter()
        .map(|(subject, pool)| {
            let mut components: Vec<ComponentStatistics> = pool
                .components
                .into_iter()
                .map(|(key, values)| ComponentStatistics::from_pool(key, &values))
                .collect();
            components.sort_by(|a, b| a.label.cmp(&b.label));
            SubjectStatistics {
                subject: subject.to_string(),
                population: PopulationSummary::from_marks(&pool.marks, config),
                components,
                student_rows: pool.rows,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupStatistics {
    #[serde(rename = "className")]
    pub class: ClassKey,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(flatten)]
    pub population: PopulationSummary,
}

/// Statistics per class across all of its subjects.
pub fn class_statistics(reports: &[StudentReport], config: &EngineConfig) -> Vec<GroupStatistics> {
    let mut pools: BTreeMap<&ClassKey, Vec<(f64, u32)>> = BTreeMap::new();
    for (r, s) in attempted_pairs(reports) {
        pools
            .entry(&r.class)
            .or_default()
            .push((s.final_percent, s.final_mark));
    }
    pools
        .into_iter()
        .map(|(class, marks)| GroupStatistics {
            class: class.clone(),
            subject: None,
            population: PopulationSummary::from_marks(&marks, config),
        })
        .collect()
}

/// Statistics per (class, subject) pair.
pub fn class_subject_statistics(
    reports: &[StudentReport],
    config: &EngineConfig,
) -> Vec<GroupStatistics> {
    let mut pools: BTreeMap<(&ClassKey, &str), Vec<(f64, u32)>> = BTreeMap::new();
    for (r, s) in attempted_pairs(reports) {
        pools
            .entry((&r.class, s.name.as_str()))
            .or_default()
            .push((s.final_percent, s.final_mark));
    }
    pools
        .into_iter()
        .map(|((class, subject), marks)| GroupStatistics {
            class: class.clone(),
            subject: Some(subject.to_string()),
            population: PopulationSummary::from_marks(&marks, config),
        })
        .collect()
}
