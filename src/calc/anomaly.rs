use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use super::aggregate::{ComponentKey, SubjectStatistics};
use super::results::{attempted_pairs, StudentReport, SubjectResult};
use super::snapshot::ClassKey;
use super::stats::Statistics;
use crate::config::EngineConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    Low,
    High,
}

/// The population figures a result was measured against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Baseline {
    pub count: usize,
    #[serde(serialize_with = "super::serialize_hundredths")]
    pub mean: f64,
    #[serde(rename = "sd", serialize_with = "super::serialize_hundredths")]
    pub std: f64,
}

impl From<&Statistics> for Baseline {
    fn from(s: &Statistics) -> Self {
        Baseline {
            count: s.count,
            mean: s.mean,
            std: s.std,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyRecord {
    pub student_id: String,
    pub student_name: String,
    #[serde(rename = "className")]
    pub class: ClassKey,
    pub subject: String,
    pub final_mark: u32,
    #[serde(serialize_with = "super::serialize_hundredths")]
    pub final_percent: f64,
    #[serde(serialize_with = "super::serialize_hundredths")]
    pub z: f64,
    pub direction: Direction,
    pub baseline: Baseline,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImprovementReason {
    BelowMeanMinusSd,
    BelowPassMark { pass_mark: f64 },
    BelowFloor { below: f64, label: String },
}

impl fmt::Display for ImprovementReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImprovementReason::BelowMeanMinusSd => f.write_str("Below class mean by >1 SD"),
            ImprovementReason::BelowPassMark { pass_mark } => write!(f, "Below pass ({pass_mark}%)"),
            ImprovementReason::BelowFloor { below, label } => write!(f, "Below {below} ({label})"),
        }
    }
}

impl Serialize for ImprovementReason {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentAlert {
    pub component: String,
    #[serde(serialize_with = "super::serialize_hundredths")]
    pub value: f64,
    #[serde(serialize_with = "super::serialize_hundredths")]
    pub mean: f64,
    #[serde(rename = "sd", serialize_with = "super::serialize_hundredths")]
    pub std: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImprovementRecord {
    pub student_id: String,
    pub student_name: String,
    #[serde(rename = "className")]
    pub class: ClassKey,
    pub subject: String,
    pub final_mark: u32,
    #[serde(serialize_with = "super::serialize_hundredths")]
    pub final_percent: f64,
    pub failing: bool,
    pub reasons: Vec<ImprovementReason>,
    pub component_alerts: Vec<ComponentAlert>,
}

/// One class's paper whose marks look wrong as a whole: too many zeros or too
/// wide a spread.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentAnomaly {
    #[serde(rename = "className")]
    pub class: ClassKey,
    pub subject: String,
    pub component: String,
    pub count: usize,
    #[serde(serialize_with = "super::serialize_whole")]
    pub mean: f64,
    #[serde(rename = "sd", serialize_with = "super::serialize_whole")]
    pub std: f64,
    pub zero_count: usize,
    pub zero_rate: u32,
    pub high_zero_rate: bool,
    pub high_spread: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyAnalysis {
    pub anomalies: Vec<AnomalyRecord>,
    pub needs_improvement: Vec<ImprovementRecord>,
    pub component_anomalies: Vec<ComponentAnomaly>,
}

/// Standardised deviation of `percent`, or `None` when the population has no
/// spread (a zero-SD population cannot produce anomalies).
pub fn z_score(percent: f64, baseline: &Statistics) -> Option<f64> {
    if baseline.std > 0.0 {
        Some((percent - baseline.mean) / baseline.std)
    } else {
        None
    }
}

/// Anomaly direction when `|z|` reaches the configured threshold.
pub fn anomaly_direction(z: f64, config: &EngineConfig) -> Option<Direction> {
    if z.abs() < config.anomaly_z_threshold {
        return None;
    }
    Some(if z < 0.0 { Direction::Low } else { Direction::High })
}

/// The SD rule reads the unrounded percentage like the baseline does; the pass
/// and floor rules read the reported mark.
pub fn improvement_reasons(
    result: &SubjectResult,
    baseline: Option<&Statistics>,
    config: &EngineConfig,
) -> Vec<ImprovementReason> {
    let mut reasons = Vec::new();
    if let Some(b) = baseline {
        if b.std > 0.0 && result.final_percent < b.mean - b.std {
            reasons.push(ImprovementReason::BelowMeanMinusSd);
        }
    }
    let percent = result.reported_percent();
    if percent < config.pass_mark {
        reasons.push(ImprovementReason::BelowPassMark {
            pass_mark: config.pass_mark,
        });
    }
    for floor in &config.improvement_floors {
        if percent < floor.below {
            reasons.push(ImprovementReason::BelowFloor {
                below: floor.below,
                label: floor.label.clone(),
            });
        }
    }
    reasons
}

/// Per-(class, paper) components whose zero rate or standard deviation reaches
/// the configured threshold. Both tests use unrounded figures.
pub fn component_anomalies(
    stats: &[SubjectStatistics],
    config: &EngineConfig,
) -> Vec<ComponentAnomaly> {
    let mut out = Vec::new();
    for subject in stats {
        for c in &subject.components {
            let zero_share = c.zero_count as f64 / c.count.max(1) as f64 * 100.0;
            let high_zero_rate = zero_share >= config.component_zero_rate_threshold;
            let high_spread = c.std >= config.component_sd_threshold;
            if high_zero_rate || high_spread {
                out.push(ComponentAnomaly {
                    class: c.key.class.clone(),
                    subject: subject.subject.clone(),
                    component: c.label.clone(),
                    count: c.count,
                    mean: c.mean,
                    std: c.std,
                    zero_count: c.zero_count,
                    zero_rate: c.zero_rate,
                    high_zero_rate,
                    high_spread,
                });
            }
        }
    }
    out
}

/// Flag z-score anomalies and improvement needs for every attempted result in
/// `reports`, measured against `stats` computed over the same population.
pub fn detect(
    reports: &[StudentReport],
    stats: &[SubjectStatistics],
    config: &EngineConfig,
) -> AnomalyAnalysis {
    let by_subject: HashMap<&str, &SubjectStatistics> =
        stats.iter().map(|s| (s.subject.as_str(), s)).collect();

    let mut out = AnomalyAnalysis::default();
    for (student, result) in attempted_pairs(reports) {
        let subject_stats = by_subject.get(result.name.as_str()).copied();
        let baseline = subject_stats.map(|s| &s.population.stats);

        if let Some(b) = baseline {
            if let Some(z) = z_score(result.final_percent, b) {
                if let Some(direction) = anomaly_direction(z, config) {
                    out.anomalies.push(AnomalyRecord {
                        student_id: student.student_id.clone(),
                        student_name: student.name.clone(),
                        class: student.class.clone(),
                        subject: result.name.clone(),
                        final_mark: result.final_mark,
                        final_percent: result.final_percent,
                        z,
                        direction,
                        baseline: Baseline::from(b),
                    });
                }
            }
        }

        let reasons = improvement_reasons(result, baseline, config);

        let mut component_alerts = Vec::new();
        if let Some(s) = subject_stats {
            for c in &result.components {
                let key = ComponentKey::of(&student.class, c);
                let Some(cs) = s.component(&key) else {
                    continue;
                };
                if c.percentage < cs.mean - cs.std || c.percentage < config.component_floor {
                    component_alerts.push(ComponentAlert {
                        component: cs.label.clone(),
                        value: c.percentage,
                        mean: cs.mean,
                        std: cs.std,
                    });
                }
            }
        }

        if !reasons.is_empty() || !component_alerts.is_empty() {
            out.needs_improvement.push(ImprovementRecord {
                student_id: student.student_id.clone(),
                student_name: student.name.clone(),
                class: student.class.clone(),
                subject: result.name.clone(),
                final_mark: result.final_mark,
                final_percent: result.final_percent,
                failing: result.reported_percent() < config.pass_mark,
                reasons,
                component_alerts,
            });
        }
    }

    out.anomalies.sort_by(|a, b| {
        b.z.abs()
            .partial_cmp(&a.z.abs())
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.student_name.cmp(&b.student_name))
            .then_with(|| a.subject.cmp(&b.subject))
    });
    // worst first: failing, then most reasons, then lowest mark
    out.needs_improvement.sort_by(|a, b| {
        b.failing
            .cmp(&a.failing)
            .then_with(|| b.reasons.len().cmp(&a.reasons.len()))
            .then_with(|| {
                a.final_percent
                    .partial_cmp(&b.final_percent)
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| a.student_name.cmp(&b.student_name))
            .then_with(|| a.subject.cmp(&b.subject))
    });

    out.component_anomalies = component_anomalies(stats, config);

    tracing::debug!(
        anomalies = out.anomalies.len(),
        needs_improvement = out.needs_improvement.len(),
        component_anomalies = out.component_anomalies.len(),
        "anomaly scan complete"
    );
    out
}
