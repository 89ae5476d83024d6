use crate::ipc::error::ok;
use crate::ipc::helpers::compute;
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_reports_students(state: &mut AppState, req: &Request) -> serde_json::Value {
    let computed = match compute(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let reports = computed.scoped();
    ok(
        &req.id,
        json!({
            "examPeriod": computed.snapshot.exam_period,
            "className": computed.snapshot.class_name,
            "passMark": computed.config.pass_mark,
            "students": reports,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "reports.students" => Some(handle_reports_students(state, req)),
        _ => None,
    }
}
