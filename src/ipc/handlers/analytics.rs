use crate::calc::aggregate::{class_statistics, class_subject_statistics, subject_statistics};
use crate::calc::anomaly::detect;
use crate::calc::results::for_class;
use crate::calc::summary::class_summary;
use crate::ipc::error::{ok, ok_serialized};
use crate::ipc::helpers::{compute, required_str};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_analytics_subjects(state: &mut AppState, req: &Request) -> serde_json::Value {
    let computed = match compute(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let reports = computed.scoped();
    // exporters read per-student rows off the global view only
    let global = computed.snapshot.class_name.is_none();
    let subjects = subject_statistics(&reports, &computed.config, global);
    let scope = if global { "global" } else { "class" };
    ok(
        &req.id,
        json!({
            "scope": scope,
            "className": computed.snapshot.class_name,
            "subjects": subjects,
            "classes": class_statistics(&reports, &computed.config),
            "classSubjects": class_subject_statistics(&reports, &computed.config),
        }),
    )
}

fn handle_analytics_class_summary(state: &mut AppState, req: &Request) -> serde_json::Value {
    let class_name = match required_str(req, "className") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let computed = match compute(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let reports = for_class(&computed.reports, &class_name);
    ok_serialized(
        &req.id,
        &class_summary(&class_name, &reports, &computed.config),
    )
}

fn handle_analytics_anomalies(state: &mut AppState, req: &Request) -> serde_json::Value {
    let computed = match compute(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let reports = computed.scoped();
    let stats = subject_statistics(&reports, &computed.config, false);
    let analysis = detect(&reports, &stats, &computed.config);
    ok(
        &req.id,
        json!({
            "className": computed.snapshot.class_name,
            "zThreshold": computed.config.anomaly_z_threshold,
            "passMark": computed.config.pass_mark,
            "anomalies": analysis.anomalies,
            "needsImprovement": analysis.needs_improvement,
            "componentAnomalies": analysis.component_anomalies,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "analytics.subjects" => Some(handle_analytics_subjects(state, req)),
        "analytics.classSummary" => Some(handle_analytics_class_summary(state, req)),
        "analytics.anomalies" => Some(handle_analytics_anomalies(state, req)),
        _ => None,
    }
}
