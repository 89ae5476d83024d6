mod test_support;

use serde_json::json;
use std::io::Write;
use test_support::{read_response, request, request_err, request_ok, sample_snapshot, spawn_sidecar};

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let health = request_ok(&mut stdin, &mut reader, "1", "health", json!({}));
    assert!(health.get("version").and_then(|v| v.as_str()).is_some());
    assert_eq!(health["passMark"].as_f64(), Some(50.0));
    assert_eq!(health["fiftyScale"], "proportional");

    let methods = [
        "reports.students",
        "analytics.subjects",
        "analytics.anomalies",
        "rankings.build",
    ];
    for (i, method) in methods.iter().enumerate() {
        let id = format!("m{i}");
        let _ = request_ok(&mut stdin, &mut reader, &id, method, sample_snapshot());
    }
    let mut with_class = sample_snapshot();
    with_class["className"] = json!("Form 4-Blue");
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "analytics.classSummary",
        with_class,
    );
    let _ = request_ok(&mut stdin, &mut reader, "3", "config.get", json!({}));
    let _ = request_ok(&mut stdin, &mut reader, "4", "weights.get", json!({}));

    let unknown = request(&mut stdin, &mut reader, "5", "marks.teleport", json!({}));
    assert_eq!(unknown["ok"], false);
    assert_eq!(unknown["error"]["code"], "not_implemented");

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn bad_json_and_blank_lines_keep_the_loop_alive() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    writeln!(stdin).expect("write blank");
    writeln!(stdin, "{{ this is not json").expect("write garbage");
    stdin.flush().expect("flush");
    let resp = read_response(&mut reader);
    assert_eq!(resp["ok"], false);
    assert_eq!(resp["error"]["code"], "bad_json");
    assert!(resp.get("id").is_none());

    // still serving after the bad line
    let health = request_ok(&mut stdin, &mut reader, "after", "health", json!({}));
    assert!(health.get("version").is_some());

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn grading_classify_uses_both_scales() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let pct = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "grading.classify",
        json!({ "mark": 85 }),
    );
    assert_eq!(pct["label"], "A");
    assert_eq!(pct["scale"], "percent");

    let fifty = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "grading.classify",
        json!({ "mark": 46, "scale": "fifty" }),
    );
    assert_eq!(fifty["label"], "Outstanding");

    let low = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "grading.classify",
        json!({ "mark": 12, "scale": "fifty" }),
    );
    assert_eq!(low["label"], "Basic");

    let e = request_err(
        &mut stdin,
        &mut reader,
        "4",
        "grading.classify",
        json!({ "mark": 50, "scale": "tenths" }),
    );
    assert_eq!(e["code"], "bad_params");

    let e = request_err(&mut stdin, &mut reader, "5", "grading.classify", json!({}));
    assert_eq!(e["code"], "bad_params");

    drop(stdin);
    let _ = child.wait();
}
