use crate::calc::grading::MarkScale;
use crate::calc::weights::WeightTable;
use crate::config::EngineConfig;
use crate::ipc::error::{engine_err, err, ok, ok_serialized};
use crate::ipc::helpers::required_str;
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::PathBuf;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "passMark": state.config.pass_mark,
            "anomalyZThreshold": state.config.anomaly_z_threshold,
            "fiftyScale": state.config.fifty_scale,
            "weightedSubjects": state.weights.subject_count(),
        }),
    )
}

fn handle_config_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok_serialized(&req.id, &state.config)
}

fn handle_config_set(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(raw) = req.params.get("config") else {
        return err(&req.id, "bad_params", "missing config", None);
    };
    match EngineConfig::from_json(raw) {
        Ok(cfg) => {
            tracing::info!(pass_mark = cfg.pass_mark, "config replaced");
            state.config = cfg;
            ok_serialized(&req.id, &state.config)
        }
        Err(e) => engine_err(&req.id, &e),
    }
}

fn handle_config_load(state: &mut AppState, req: &Request) -> serde_json::Value {
    let path = match required_str(req, "path") {
        Ok(v) => PathBuf::from(v),
        Err(e) => return e,
    };
    match EngineConfig::from_path(&path) {
        Ok(cfg) => {
            tracing::info!(path = %path.display(), "config loaded");
            state.config = cfg;
            ok_serialized(&req.id, &state.config)
        }
        Err(e) => engine_err(&req.id, &e),
    }
}

fn handle_weights_set(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(raw) = req.params.get("weights") else {
        return err(&req.id, "bad_params", "missing weights", None);
    };
    match WeightTable::from_json(raw) {
        Ok(table) => {
            tracing::info!(subjects = table.subject_count(), "default weights replaced");
            state.weights = table;
            ok(
                &req.id,
                json!({ "subjects": state.weights.subject_count() }),
            )
        }
        Err(e) => engine_err(&req.id, &e),
    }
}

fn handle_weights_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, json!({ "weights": state.weights.to_json() }))
}

fn handle_grading_classify(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(mark) = req.params.get("mark").and_then(|v| v.as_f64()) else {
        return err(&req.id, "bad_params", "missing mark", None);
    };
    let scale = match req.params.get("scale") {
        None | Some(serde_json::Value::Null) => MarkScale::Percent,
        Some(v) => match serde_json::from_value::<MarkScale>(v.clone()) {
            Ok(s) => s,
            Err(_) => {
                return err(
                    &req.id,
                    "bad_params",
                    "scale must be \"percent\" or \"fifty\"",
                    None,
                )
            }
        },
    };
    let label = match scale {
        MarkScale::Percent => state.config.exam_grades.classify(mark),
        MarkScale::Fifty => state.config.bands.classify(mark),
    };
    ok(&req.id, json!({ "label": label, "scale": scale }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "config.get" => Some(handle_config_get(state, req)),
        "config.set" => Some(handle_config_set(state, req)),
        "config.load" => Some(handle_config_load(state, req)),
        "weights.set" => Some(handle_weights_set(state, req)),
        "weights.get" => Some(handle_weights_get(state, req)),
        "grading.classify" => Some(handle_grading_classify(state, req)),
        _ => None,
    }
}
