use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use super::round_whole;

/// Canonical paper/component identity. Built once at ingestion from either a
/// JSON string or number; compared by equality only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ComponentId(String);

impl ComponentId {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ComponentId {
    fn from(s: &str) -> Self {
        ComponentId::new(s)
    }
}

struct ComponentIdVisitor;

impl<'de> Visitor<'de> for ComponentIdVisitor {
    type Value = ComponentId;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a component id string or number")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<ComponentId, E> {
        Ok(ComponentId::new(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<ComponentId, E> {
        Ok(ComponentId(v.to_string()))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<ComponentId, E> {
        Ok(ComponentId(v.to_string()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<ComponentId, E> {
        if v.fract() == 0.0 && v.abs() < 1e15 {
            Ok(ComponentId(format!("{}", v as i64)))
        } else {
            Ok(ComponentId(v.to_string()))
        }
    }
}

impl<'de> Deserialize<'de> for ComponentId {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        d.deserialize_any(ComponentIdVisitor)
    }
}

/// Accepts a JSON number or a numeric string; anything else is treated as
/// absent rather than rejected.
pub(crate) fn lenient_number<'de, D>(d: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(d)?;
    let n = match raw {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(n.filter(|v| v.is_finite()))
}

/// One raw score for one student, subject and paper.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentRecord {
    pub student_id: String,
    pub subject: String,
    #[serde(default)]
    pub component: Option<ComponentId>,
    #[serde(default)]
    pub paper: Option<ComponentId>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub mark: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub total: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub percentage: Option<f64>,
}

/// Derive a 0-100 percentage from whatever the record carries.
///
/// Precedence: explicit percentage, then `mark/total`, then a bare mark
/// (<= 50 read as a 0-50 value, larger read as already a percentage).
/// `None` means the record is unusable and must be skipped.
pub fn normalize(record: &ComponentRecord) -> Option<f64> {
    if let Some(p) = record.percentage {
        return Some(p);
    }
    let mark = record.mark?;
    match record.total {
        Some(total) if total > 0.0 => Some(mark / total * 100.0),
        _ if mark <= 50.0 => Some(to_percentage(mark)),
        _ => Some(mark),
    }
}

/// 0-50 value to percentage.
pub fn to_percentage(value_on_50: f64) -> f64 {
    value_on_50 / 50.0 * 100.0
}

/// Percentage to the 0-50 reporting scale, clamped.
pub fn to_fifty(percentage: f64) -> u32 {
    round_whole(percentage / 100.0 * 50.0).clamp(0.0, 50.0) as u32
}

/// How a value is brought onto the 0-50 reporting scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FiftyScale {
    /// Always halve the percentage.
    #[default]
    Proportional,
    /// Values <= 50 are assumed to already be on the 0-50 scale and pass
    /// through rounded; larger values are halved.
    LegacyPassthrough,
}

impl FiftyScale {
    pub fn to_fifty(self, value: f64) -> u32 {
        match self {
            FiftyScale::Proportional => to_fifty(value),
            FiftyScale::LegacyPassthrough if value <= 50.0 => {
                round_whole(value).clamp(0.0, 50.0) as u32
            }
            FiftyScale::LegacyPassthrough => to_fifty(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedComponent {
    pub component: ComponentId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paper: Option<ComponentId>,
    #[serde(serialize_with = "super::serialize_hundredths")]
    pub percentage: f64,
    pub value_on_50: u32,
}

impl NormalizedComponent {
    /// `ordinal` names the component when the record carries neither a
    /// component nor a paper label.
    pub fn from_record(record: &ComponentRecord, ordinal: usize, scale: FiftyScale) -> Option<Self> {
        let percentage = normalize(record)?;
        let component = record
            .component
            .clone()
            .or_else(|| record.paper.clone())
            .unwrap_or_else(|| ComponentId(format!("record-{}", ordinal)));
        Some(NormalizedComponent {
            component,
            paper: record.paper.clone(),
            percentage,
            value_on_50: scale.to_fifty(percentage),
        })
    }

    pub fn matches(&self, id: &ComponentId) -> bool {
        self.component == *id || self.paper.as_ref() == Some(id)
    }
}
