use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use super::error::EngineError;
use super::normalize::{lenient_number, ComponentRecord};
use super::round_whole;
use super::weights::WeightTable;

/// Population key for a class: grade plus section/stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassKey {
    pub grade: String,
    pub section: String,
}

impl ClassKey {
    pub fn new(grade: &str, section: &str) -> Self {
        Self {
            grade: grade.trim().to_string(),
            section: section.trim().to_string(),
        }
    }

    pub fn name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ClassKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.grade, self.section)
    }
}

impl Serialize for ClassKey {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Student {
    pub id: String,
    pub name: String,
    pub class: ClassKey,
    pub days_present: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StudentRow {
    id: String,
    name: String,
    grade: String,
    section: String,
    #[serde(default, deserialize_with = "lenient_number")]
    days_present: Option<f64>,
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp.
fn lenient_date<'de, D>(d: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(d)? else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(Some(date));
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| Some(dt.date_naive()))
        .map_err(|_| serde::de::Error::custom(format!("unrecognised date {raw:?}")))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamPeriod {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub term: Option<String>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub total_days: Option<f64>,
    #[serde(default)]
    pub pass_mark: Option<f64>,
}

impl ExamPeriod {
    /// Term-ending date as printed on reports, e.g. `07 August 2025`.
    pub fn term_ending(&self) -> Option<String> {
        self.end_date.map(|d| d.format("%d %B %Y").to_string())
    }

    pub fn attendance_percentage(&self, days_present: Option<f64>) -> u32 {
        match (self.total_days, days_present) {
            (Some(total), Some(days)) if total > 0.0 => {
                round_whole(days / total * 100.0).max(0.0) as u32
            }
            _ => 0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSnapshot {
    #[serde(default)]
    exam_period: Option<ExamPeriod>,
    students: Vec<StudentRow>,
    records: Vec<ComponentRecord>,
    #[serde(default)]
    weights: Option<serde_json::Value>,
    #[serde(default)]
    class_name: Option<String>,
}

/// Everything one invocation computes from. Built fresh per request.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub exam_period: ExamPeriod,
    pub students: Vec<Student>,
    pub records: Vec<ComponentRecord>,
    /// Per-request weights; `None` means use the caller's default table.
    pub weights: Option<WeightTable>,
    pub class_name: Option<String>,
}

impl Snapshot {
    /// Parse request params. Shape errors fail fast and name the JSON path;
    /// unusable values inside well-formed records are left for the engine to skip.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, EngineError> {
        if !value.is_object() {
            return Err(EngineError::malformed(".", "snapshot must be an object"));
        }
        let raw: RawSnapshot = serde_path_to_error::deserialize(value)
            .map_err(|e| EngineError::malformed(e.path().to_string(), e.inner().to_string()))?;

        let exam_period = raw.exam_period.unwrap_or_default();
        if let Some(p) = exam_period.pass_mark {
            if !(p.is_finite() && (0.0..=100.0).contains(&p)) {
                return Err(EngineError::malformed(
                    "examPeriod.passMark",
                    format!("must be within 0..=100, got {p}"),
                ));
            }
        }

        let weights = match raw.weights {
            None | Some(serde_json::Value::Null) => None,
            Some(w) => Some(WeightTable::from_json(&w)?),
        };

        let students = raw
            .students
            .into_iter()
            .map(|s| Student {
                id: s.id,
                name: s.name,
                class: ClassKey::new(&s.grade, &s.section),
                days_present: s.days_present,
            })
            .collect();

        let class_name = raw
            .class_name
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        Ok(Snapshot {
            exam_period,
            students,
            records: raw.records,
            weights,
            class_name,
        })
    }
}
