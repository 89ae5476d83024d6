mod test_support;

use serde_json::json;
use std::io::Write;
use test_support::{request_err, request_ok, spawn_sidecar, spawn_sidecar_with_env};

fn config_file(body: &str) -> tempfile::NamedTempFile {
    let mut f = tempfile::NamedTempFile::new().expect("temp config");
    f.write_all(body.as_bytes()).expect("write config");
    f.flush().expect("flush config");
    f
}

#[test]
fn config_set_replaces_and_validates() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let defaults = request_ok(&mut stdin, &mut reader, "1", "config.get", json!({}));
    assert_eq!(defaults["summaryTopCount"], 3);
    assert_eq!(defaults["componentZeroRateThreshold"].as_f64(), Some(30.0));
    assert_eq!(defaults["componentSdThreshold"].as_f64(), Some(20.0));
    assert_eq!(defaults["bands"]["fallback"], "Basic");

    let updated = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "config.set",
        json!({ "config": { "passMark": 40, "fiftyScale": "legacyPassthrough" } }),
    );
    assert_eq!(updated["passMark"].as_f64(), Some(40.0));
    assert_eq!(updated["fiftyScale"], "legacyPassthrough");
    // missing fields fall back to defaults
    assert_eq!(updated["anomalyZThreshold"].as_f64(), Some(2.0));

    let e = request_err(
        &mut stdin,
        &mut reader,
        "3",
        "config.set",
        json!({ "config": { "passMark": 150 } }),
    );
    assert_eq!(e["code"], "config_invalid");

    let e = request_err(
        &mut stdin,
        &mut reader,
        "4",
        "config.set",
        json!({ "config": { "anomalyZThreshold": "high" } }),
    );
    assert_eq!(e["code"], "config_invalid");
    assert!(
        e["message"].as_str().unwrap_or_default().contains("anomalyZThreshold"),
        "{e}"
    );

    let e = request_err(&mut stdin, &mut reader, "5", "config.set", json!({}));
    assert_eq!(e["code"], "bad_params");

    // rejected updates leave the previous config in place
    let health = request_ok(&mut stdin, &mut reader, "6", "health", json!({}));
    assert_eq!(health["passMark"].as_f64(), Some(40.0));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn config_load_reads_file_and_reports_failures() {
    let good = config_file(r#"{ "passMark": 60, "summaryTopCount": 5 }"#);
    let broken = config_file("{ passMark: ");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let loaded = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "config.load",
        json!({ "path": good.path().to_string_lossy() }),
    );
    assert_eq!(loaded["passMark"].as_f64(), Some(60.0));
    assert_eq!(loaded["summaryTopCount"], 5);

    let missing = good.path().with_extension("nope");
    let e = request_err(
        &mut stdin,
        &mut reader,
        "2",
        "config.load",
        json!({ "path": missing.to_string_lossy() }),
    );
    assert_eq!(e["code"], "config_io");
    assert!(e["details"]["path"].is_string());

    let e = request_err(
        &mut stdin,
        &mut reader,
        "3",
        "config.load",
        json!({ "path": broken.path().to_string_lossy() }),
    );
    assert_eq!(e["code"], "config_invalid");

    let e = request_err(&mut stdin, &mut reader, "4", "config.load", json!({}));
    assert_eq!(e["code"], "bad_params");

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn startup_config_comes_from_environment() {
    let file = config_file(r#"{ "passMark": 65 }"#);
    let path = file.path().to_string_lossy().to_string();
    let (mut child, mut stdin, mut reader) =
        spawn_sidecar_with_env(&[("MARKSTATS_CONFIG", path.as_str())]);

    let health = request_ok(&mut stdin, &mut reader, "1", "health", json!({}));
    assert_eq!(health["passMark"].as_f64(), Some(65.0));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn bad_startup_config_keeps_defaults() {
    let file = config_file(r#"{ "passMark": -3 }"#);
    let path = file.path().to_string_lossy().to_string();
    let (mut child, mut stdin, mut reader) =
        spawn_sidecar_with_env(&[("MARKSTATS_CONFIG", path.as_str())]);

    let health = request_ok(&mut stdin, &mut reader, "1", "health", json!({}));
    assert_eq!(health["passMark"].as_f64(), Some(50.0));

    drop(stdin);
    let _ = child.wait();
}
