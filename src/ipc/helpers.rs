use crate::calc::results::{build_reports, for_class, StudentReport};
use crate::calc::snapshot::Snapshot;
use crate::config::EngineConfig;
use crate::ipc::error::{engine_err, err};
use crate::ipc::types::{AppState, Request};

pub fn required_str(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

/// Everything a computing method needs, resolved once per request.
pub struct Computed {
    pub snapshot: Snapshot,
    pub config: EngineConfig,
    pub reports: Vec<StudentReport>,
}

impl Computed {
    /// Reports restricted to `className` when the request names one.
    pub fn scoped(&self) -> Vec<StudentReport> {
        match &self.snapshot.class_name {
            Some(c) => for_class(&self.reports, c),
            None => self.reports.clone(),
        }
    }
}

/// Parse the snapshot in `params` and build every student report. The
/// request's own weights win over the process default, and the exam period's
/// pass mark over the configured one.
pub fn compute(state: &AppState, req: &Request) -> Result<Computed, serde_json::Value> {
    let snapshot = Snapshot::from_json(&req.params).map_err(|e| engine_err(&req.id, &e))?;
    let config = state.config.for_pass_mark(snapshot.exam_period.pass_mark);
    let weights = snapshot.weights.as_ref().unwrap_or(&state.weights);
    let reports = build_reports(&snapshot, weights, &config);
    tracing::debug!(
        method = %req.method,
        students = snapshot.students.len(),
        records = snapshot.records.len(),
        "snapshot computed"
    );
    Ok(Computed {
        snapshot,
        config,
        reports,
    })
}
