use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;

use super::error::EngineError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeThreshold {
    pub min: f64,
    pub label: String,
}

/// Ordered cut-offs: the first threshold whose `min` the mark reaches wins,
/// otherwise `fallback`. Total over every input, NaN included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeTable {
    pub thresholds: Vec<GradeThreshold>,
    pub fallback: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketCount {
    pub label: String,
    pub count: usize,
}

/// Which scale a mark is expressed on when it is classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MarkScale {
    Percent,
    Fifty,
}

fn table(cutoffs: &[(f64, &str)], fallback: &str) -> GradeTable {
    GradeTable {
        thresholds: cutoffs
            .iter()
            .map(|(min, label)| GradeThreshold {
                min: *min,
                label: label.to_string(),
            })
            .collect(),
        fallback: fallback.to_string(),
    }
}

impl GradeTable {
    /// Examination grades on the percentage scale.
    pub fn examination() -> Self {
        table(
            &[
                (90.0, "A*"),
                (80.0, "A"),
                (70.0, "B"),
                (60.0, "C"),
                (50.0, "D"),
                (40.0, "E"),
            ],
            "F",
        )
    }

    /// Descriptive bands on the 0-50 scale.
    pub fn bands() -> Self {
        table(
            &[
                (45.0, "Outstanding"),
                (35.0, "High"),
                (30.0, "Good"),
                (20.0, "Aspiring"),
            ],
            "Basic",
        )
    }

    pub fn classify(&self, mark: f64) -> &str {
        if mark.is_nan() {
            return &self.fallback;
        }
        self.thresholds
            .iter()
            .find(|t| mark >= t.min)
            .map(|t| t.label.as_str())
            .unwrap_or(self.fallback.as_str())
    }

    /// Labels best to worst, fallback last.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.thresholds
            .iter()
            .map(|t| t.label.as_str())
            .chain(std::iter::once(self.fallback.as_str()))
    }

    /// Count marks per label, every label present even when zero.
    pub fn tally<I>(&self, marks: I) -> Vec<BucketCount>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut out: Vec<BucketCount> = self
            .labels()
            .map(|label| BucketCount {
                label: label.to_string(),
                count: 0,
            })
            .collect();
        for m in marks {
            let label = self.classify(m);
            if let Some(bucket) = out.iter_mut().find(|b| b.label == label) {
                bucket.count += 1;
            }
        }
        out
    }

    /// Checks the table and puts thresholds in descending order.
    pub fn validate(&mut self, name: &str) -> Result<(), EngineError> {
        if self.fallback.trim().is_empty() {
            return Err(EngineError::InvalidConfig(format!("{name}: fallback label is empty")));
        }
        {
            let mut seen = HashSet::new();
            for t in &self.thresholds {
                if !t.min.is_finite() {
                    return Err(EngineError::InvalidConfig(format!(
                        "{name}: threshold for {:?} is not a finite number",
                        t.label
                    )));
                }
                if t.label.trim().is_empty() {
                    return Err(EngineError::InvalidConfig(format!("{name}: empty label")));
                }
                if !seen.insert(t.label.as_str()) || t.label == self.fallback {
                    return Err(EngineError::InvalidConfig(format!(
                        "{name}: duplicate label {:?}",
                        t.label
                    )));
                }
            }
        }
        self.thresholds
            .sort_by(|a, b| b.min.partial_cmp(&a.min).unwrap_or(Ordering::Equal));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn examination_grade_boundaries() {
        let g = GradeTable::examination();
        assert_eq!(g.classify(90.0), "A*");
        assert_eq!(g.classify(89.99), "A");
        assert_eq!(g.classify(80.0), "A");
        assert_eq!(g.classify(70.0), "B");
        assert_eq!(g.classify(60.0), "C");
        assert_eq!(g.classify(50.0), "D");
        assert_eq!(g.classify(40.0), "E");
        assert_eq!(g.classify(39.9), "F");
    }

    #[test]
    fn bands_on_fifty() {
        let b = GradeTable::bands();
        assert_eq!(b.classify(50.0), "Outstanding");
        assert_eq!(b.classify(45.0), "Outstanding");
        assert_eq!(b.classify(44.0), "High");
        assert_eq!(b.classify(35.0), "High");
        assert_eq!(b.classify(34.0), "Good");
        assert_eq!(b.classify(30.0), "Good");
        assert_eq!(b.classify(29.0), "Aspiring");
        assert_eq!(b.classify(20.0), "Aspiring");
        assert_eq!(b.classify(19.0), "Basic");
    }

    #[test]
    fn out_of_range_inputs_still_classify() {
        let g = GradeTable::examination();
        assert_eq!(g.classify(-12.0), "F");
        assert_eq!(g.classify(140.0), "A*");
        assert_eq!(g.classify(f64::NAN), "F");
        assert_eq!(GradeTable::bands().classify(75.0), "Outstanding");
    }

    #[test]
    fn tally_keeps_label_order() {
        let counts = GradeTable::examination().tally([95.0, 55.0, 52.0, 10.0]);
        let labels: Vec<&str> = counts.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["A*", "A", "B", "C", "D", "E", "F"]);
        assert_eq!(counts[0].count, 1);
        assert_eq!(counts[4].count, 2);
        assert_eq!(counts[6].count, 1);
    }

    #[test]
    fn validate_sorts_and_rejects_bad_tables() {
        let mut t = table(&[(20.0, "Low"), (80.0, "Top")], "None");
        t.validate("custom").expect("valid");
        assert_eq!(t.thresholds[0].label, "Top");
        assert_eq!(t.classify(50.0), "Low");

        let mut dup = table(&[(20.0, "X"), (30.0, "X")], "Y");
        assert!(dup.validate("dup").is_err());
        let mut inf = table(&[(f64::INFINITY, "X")], "Y");
        assert!(inf.validate("inf").is_err());
    }
}
