use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use super::normalize::{to_percentage, NormalizedComponent};
use super::round_whole;
use super::snapshot::{ClassKey, Snapshot};
use super::weights::{final_mark, FinalMarkMethod, WeightTable};
use crate::config::EngineConfig;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectResult {
    pub name: String,
    pub components: Vec<NormalizedComponent>,
    #[serde(serialize_with = "super::serialize_hundredths")]
    pub final_percent: f64,
    /// 0-50. Zero means the subject was not attempted.
    pub final_mark: u32,
    pub class_average: u32,
    pub attempted: bool,
    pub grade: String,
    pub band: String,
    pub method: FinalMarkMethod,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentReport {
    #[serde(rename = "className")]
    pub class: ClassKey,
    pub student_id: String,
    pub name: String,
    pub exam_period: String,
    pub term_ending: Option<String>,
    pub attendance_days: f64,
    pub attendance_percentage: u32,
    pub subjects: Vec<SubjectResult>,
    pub total_points: u32,
}

impl SubjectResult {
    /// Percentage equivalent of the reported 0-50 mark. Pass, grade and floor
    /// checks read this so they agree with what the report shows.
    pub fn reported_percent(&self) -> f64 {
        to_percentage(f64::from(self.final_mark))
    }
}

impl StudentReport {
    pub fn attempted(&self) -> impl Iterator<Item = &SubjectResult> {
        self.subjects.iter().filter(|s| s.attempted)
    }
}

/// Every attempted (student, subject) pair across `reports`. Results with a
/// zero final mark never reach statistics.
pub fn attempted_pairs(
    reports: &[StudentReport],
) -> impl Iterator<Item = (&StudentReport, &SubjectResult)> {
    reports
        .iter()
        .flat_map(|r| r.attempted().map(move |s| (r, s)))
}

/// Keep only reports whose class name matches `class_name`.
pub fn for_class(reports: &[StudentReport], class_name: &str) -> Vec<StudentReport> {
    reports
        .iter()
        .filter(|r| r.class.name() == class_name)
        .cloned()
        .collect()
}

/// Turn the raw snapshot into one report per student, in snapshot order.
pub fn build_reports(
    snapshot: &Snapshot,
    weights: &WeightTable,
    config: &EngineConfig,
) -> Vec<StudentReport> {
    let index: HashMap<&str, usize> = snapshot
        .students
        .iter()
        .enumerate()
        .map(|(i, s)| (s.id.as_str(), i))
        .collect();

    // student index -> subject -> components, in record order
    let mut grouped: Vec<BTreeMap<String, Vec<NormalizedComponent>>> =
        vec![BTreeMap::new(); snapshot.students.len()];
    let mut skipped = 0_usize;
    for (ordinal, record) in snapshot.records.iter().enumerate() {
        let Some(&idx) = index.get(record.student_id.as_str()) else {
            tracing::debug!(student = %record.student_id, "record for unknown student skipped");
            skipped += 1;
            continue;
        };
        let subject = record.subject.trim();
        if subject.is_empty() {
            skipped += 1;
            continue;
        }
        let components = grouped[idx].entry(subject.to_string()).or_default();
        match NormalizedComponent::from_record(record, ordinal, config.fifty_scale) {
            Some(c) => components.push(c),
            None => {
                tracing::debug!(
                    student = %record.student_id,
                    subject,
                    "record has no usable mark, skipped"
                );
                skipped += 1;
            }
        }
    }
    if skipped > 0 {
        tracing::debug!(skipped, total = snapshot.records.len(), "records skipped");
    }

    let mut reports: Vec<StudentReport> = snapshot
        .students
        .iter()
        .zip(grouped)
        .map(|(student, subjects)| {
            let subjects: Vec<SubjectResult> = subjects
                .into_iter()
                .map(|(name, components)| {
                    let lookup =
                        weights.lookup(&student.class.grade, &student.class.section, &name);
                    let fm = final_mark(&components, lookup, config.fifty_scale);
                    SubjectResult {
                        grade: config
                            .exam_grades
                            .classify(to_percentage(f64::from(fm.on_fifty)))
                            .to_string(),
                        band: config.bands.classify(f64::from(fm.on_fifty)).to_string(),
                        name,
                        components,
                        final_percent: fm.percent,
                        final_mark: fm.on_fifty,
                        class_average: 0,
                        attempted: fm.on_fifty > 0,
                        method: fm.method,
                    }
                })
                .collect();
            let total_points = subjects.iter().map(|s| s.final_mark).sum();
            StudentReport {
                class: student.class.clone(),
                student_id: student.id.clone(),
                name: student.name.clone(),
                exam_period: snapshot.exam_period.name.clone(),
                term_ending: snapshot.exam_period.term_ending(),
                attendance_days: student.days_present.unwrap_or(0.0),
                attendance_percentage: snapshot
                    .exam_period
                    .attendance_percentage(student.days_present),
                subjects,
                total_points,
            }
        })
        .collect();

    fill_class_averages(&mut reports);
    reports
}

fn fill_class_averages(reports: &mut [StudentReport]) {
    let mut pools: HashMap<(ClassKey, String), (u32, u32)> = HashMap::new();
    for (r, s) in attempted_pairs(reports) {
        let e = pools
            .entry((r.class.clone(), s.name.clone()))
            .or_insert((0, 0));
        e.0 += s.final_mark;
        e.1 += 1;
    }
    for r in reports.iter_mut() {
        for s in r.subjects.iter_mut() {
            s.class_average = pools
                .get(&(r.class.clone(), s.name.clone()))
                .filter(|(_, n)| *n > 0)
                .map(|(sum, n)| round_whole(f64::from(*sum) / f64::from(*n)) as u32)
                .unwrap_or(0);
        }
    }
}
