use serde::Serialize;
use serde_json::json;
use std::collections::{BTreeMap, HashMap};

use super::error::EngineError;
use super::normalize::{ComponentId, FiftyScale, NormalizedComponent};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubjectWeightKey {
    pub grade: String,
    pub stream: String,
    pub subject: String,
}

impl SubjectWeightKey {
    pub fn new(grade: &str, stream: &str, subject: &str) -> Self {
        Self {
            grade: grade.trim().to_string(),
            stream: stream.trim().to_string(),
            subject: subject.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentWeight {
    pub component: ComponentId,
    pub weight: f64,
}

/// Result of looking a subject up in the table. `NoEntry` selects the
/// unweighted-mean path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WeightLookup<'a> {
    Weighted(&'a [ComponentWeight]),
    NoEntry,
}

/// Per-paper weights keyed by (grade, stream, subject, component).
/// Weights are applied as-is; they need not sum to 1.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightTable {
    entries: HashMap<SubjectWeightKey, Vec<ComponentWeight>>,
}

impl WeightTable {
    pub fn insert(&mut self, key: SubjectWeightKey, component: ComponentId, weight: f64) {
        let list = self.entries.entry(key).or_default();
        match list.iter_mut().find(|w| w.component == component) {
            Some(existing) => existing.weight = weight,
            None => list.push(ComponentWeight { component, weight }),
        }
    }

    pub fn lookup(&self, grade: &str, stream: &str, subject: &str) -> WeightLookup<'_> {
        let key = SubjectWeightKey::new(grade, stream, subject);
        match self.entries.get(&key) {
            Some(list) if !list.is_empty() => WeightLookup::Weighted(list.as_slice()),
            _ => WeightLookup::NoEntry,
        }
    }

    pub fn subject_count(&self) -> usize {
        self.entries.len()
    }

    /// Parse the nested `grade -> stream -> subject -> component -> weight`
    /// object. Shape errors name the offending path.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, EngineError> {
        let mut table = WeightTable::default();
        let grades = as_object(value, "weights")?;
        for (grade, streams) in grades {
            let grade_path = format!("weights[{:?}]", grade);
            for (stream, subjects) in as_object(streams, &grade_path)? {
                let stream_path = format!("{}[{:?}]", grade_path, stream);
                for (subject, components) in as_object(subjects, &stream_path)? {
                    let subject_path = format!("{}[{:?}]", stream_path, subject);
                    let key = SubjectWeightKey::new(grade, stream, subject);
                    let components = as_object(components, &subject_path)?;
                    if components.is_empty() {
                        // keep the empty entry so it still reads back, but lookup treats it as absent
                        table.entries.entry(key.clone()).or_default();
                    }
                    for (component, weight) in components {
                        let Some(w) = weight.as_f64() else {
                            return Err(EngineError::malformed(
                                format!("{}[{:?}]", subject_path, component),
                                "weight must be a number",
                            ));
                        };
                        table.insert(key.clone(), ComponentId::new(component), w);
                    }
                }
            }
        }
        Ok(table)
    }

    pub fn to_json(&self) -> serde_json::Value {
        let mut nested: BTreeMap<&str, BTreeMap<&str, BTreeMap<&str, BTreeMap<&str, f64>>>> =
            BTreeMap::new();
        for (key, list) in &self.entries {
            let subject = nested
                .entry(key.grade.as_str())
                .or_default()
                .entry(key.stream.as_str())
                .or_default()
                .entry(key.subject.as_str())
                .or_default();
            for w in list {
                subject.insert(w.component.as_str(), w.weight);
            }
        }
        json!(nested)
    }
}

fn as_object<'a>(
    value: &'a serde_json::Value,
    path: &str,
) -> Result<&'a serde_json::Map<String, serde_json::Value>, EngineError> {
    value
        .as_object()
        .ok_or_else(|| EngineError::malformed(path, "expected an object"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FinalMarkMethod {
    Weighted,
    Unweighted,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinalMark {
    /// Canonical percentage, unrounded.
    pub percent: f64,
    /// Reported 0-50 mark. Zero means "not attempted".
    pub on_fifty: u32,
    pub method: FinalMarkMethod,
}

impl FinalMark {
    fn none() -> Self {
        FinalMark {
            percent: 0.0,
            on_fifty: 0,
            method: FinalMarkMethod::None,
        }
    }
}

/// One authoritative mark for a student's subject.
///
/// With a weight entry, each weighted paper contributes `percentage * weight`;
/// a paper the student lacks borrows the first available component's value.
/// Without an entry the components are averaged. Never fails: empty input
/// yields a zero, not-attempted mark.
///
/// Weighting happens on unrounded percentages and the result is brought onto
/// the 0-50 scale once. Summing per-paper 0-50 values instead can land one
/// mark higher at half-way points (41% and 43% at 0.5 each: 21 here, 22 that way).
pub fn final_mark(
    components: &[NormalizedComponent],
    lookup: WeightLookup<'_>,
    scale: FiftyScale,
) -> FinalMark {
    let Some(first) = components.first() else {
        return FinalMark::none();
    };

    match lookup {
        WeightLookup::Weighted(weights) => {
            let percent = weights.iter().fold(0.0_f64, |sum, w| {
                let value = match components.iter().find(|c| c.matches(&w.component)) {
                    Some(c) => c.percentage,
                    None => {
                        tracing::debug!(
                            component = %w.component,
                            fallback = %first.component,
                            "weighted component missing, using first available"
                        );
                        first.percentage
                    }
                };
                sum + value * w.weight
            });
            FinalMark {
                percent,
                on_fifty: scale.to_fifty(percent),
                method: FinalMarkMethod::Weighted,
            }
        }
        WeightLookup::NoEntry => {
            let percent =
                components.iter().map(|c| c.percentage).sum::<f64>() / (components.len() as f64);
            FinalMark {
                percent,
                on_fifty: scale.to_fifty(percent),
                method: FinalMarkMethod::Unweighted,
            }
        }
    }
}
