use serde_json::json;

use crate::calc::EngineError;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

pub fn engine_err(id: &str, e: &EngineError) -> serde_json::Value {
    tracing::debug!(code = e.code(), error = %e, "request failed");
    err(id, e.code(), e.to_string(), e.details())
}

/// Serialize a result body; serde_json only fails here on non-string map keys.
pub fn ok_serialized<T: serde::Serialize>(id: &str, result: &T) -> serde_json::Value {
    match serde_json::to_value(result) {
        Ok(v) => ok(id, v),
        Err(e) => err(id, "internal", format!("failed to serialize result: {e}"), None),
    }
}
