use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::calc::grading::GradeTable;
use crate::calc::normalize::FiftyScale;
use crate::calc::EngineError;

/// Environment variable naming a config file to load at startup.
pub const CONFIG_ENV: &str = "MARKSTATS_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImprovementFloor {
    pub below: f64,
    pub label: String,
}

/// Policy knobs threaded explicitly through every aggregation and detection
/// call. Any missing field takes its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Pass threshold on the percentage scale.
    pub pass_mark: f64,
    pub anomaly_z_threshold: f64,
    pub improvement_floors: Vec<ImprovementFloor>,
    /// Absolute percentage below which a single paper raises an alert.
    pub component_floor: f64,
    /// Share of zero marks on one class's paper, in percent, that flags it.
    pub component_zero_rate_threshold: f64,
    /// Paper standard deviation, in percentage points, that flags it.
    pub component_sd_threshold: f64,
    pub fifty_scale: FiftyScale,
    pub exam_grades: GradeTable,
    pub bands: GradeTable,
    pub summary_top_count: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pass_mark: 50.0,
            anomaly_z_threshold: 2.0,
            improvement_floors: vec![
                ImprovementFloor {
                    below: 50.0,
                    label: "D or lower".to_string(),
                },
                ImprovementFloor {
                    below: 40.0,
                    label: "Fail".to_string(),
                },
            ],
            component_floor: 40.0,
            component_zero_rate_threshold: 30.0,
            component_sd_threshold: 20.0,
            fifty_scale: FiftyScale::Proportional,
            exam_grades: GradeTable::examination(),
            bands: GradeTable::bands(),
            summary_top_count: 3,
        }
    }
}

fn check_percent(name: &str, v: f64) -> Result<(), EngineError> {
    if v.is_finite() && (0.0..=100.0).contains(&v) {
        Ok(())
    } else {
        Err(EngineError::InvalidConfig(format!(
            "{name} must be within 0..=100, got {v}"
        )))
    }
}

impl EngineConfig {
    pub fn validated(mut self) -> Result<Self, EngineError> {
        check_percent("passMark", self.pass_mark)?;
        check_percent("componentFloor", self.component_floor)?;
        if !(self.anomaly_z_threshold.is_finite() && self.anomaly_z_threshold > 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "anomalyZThreshold must be a positive number, got {}",
                self.anomaly_z_threshold
            )));
        }
        check_percent("componentZeroRateThreshold", self.component_zero_rate_threshold)?;
        if !(self.component_sd_threshold.is_finite() && self.component_sd_threshold >= 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "componentSdThreshold must be a non-negative number, got {}",
                self.component_sd_threshold
            )));
        }
        for f in &self.improvement_floors {
            check_percent("improvementFloors[].below", f.below)?;
            if f.label.trim().is_empty() {
                return Err(EngineError::InvalidConfig(
                    "improvementFloors[].label must not be empty".to_string(),
                ));
            }
        }
        self.exam_grades.validate("examGrades")?;
        self.bands.validate("bands")?;
        Ok(self)
    }

    pub fn from_json(value: &serde_json::Value) -> Result<Self, EngineError> {
        let cfg: EngineConfig = serde_path_to_error::deserialize(value).map_err(|e| {
            EngineError::InvalidConfig(format!("{}: {}", e.path(), e.inner()))
        })?;
        cfg.validated()
    }

    pub fn from_path(path: &Path) -> Result<Self, EngineError> {
        let text = std::fs::read_to_string(path).map_err(|source| EngineError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        let value: serde_json::Value = serde_json::from_str(&text)
            .map_err(|e| EngineError::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&value)
    }

    /// Copy with the exam period's pass mark applied, when it has one.
    pub fn for_pass_mark(&self, pass_mark: Option<f64>) -> Self {
        let mut cfg = self.clone();
        if let Some(p) = pass_mark {
            cfg.pass_mark = p;
        }
        cfg
    }
}
