use crate::calc::ranking::build_rankings;
use crate::ipc::error::ok_serialized;
use crate::ipc::helpers::compute;
use crate::ipc::types::{AppState, Request};

fn handle_rankings_build(state: &mut AppState, req: &Request) -> serde_json::Value {
    let computed = match compute(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let rankings = build_rankings(&computed.reports, computed.config.pass_mark);
    ok_serialized(&req.id, &rankings)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "rankings.build" => Some(handle_rankings_build(state, req)),
        _ => None,
    }
}
