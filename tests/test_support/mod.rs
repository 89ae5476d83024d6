#![allow(dead_code)]

use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

pub fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    spawn_sidecar_with_env(&[])
}

pub fn spawn_sidecar_with_env(env: &[(&str, &str)]) -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_markstatsd");
    let mut cmd = Command::new(exe);
    cmd.stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .env_remove("MARKSTATS_CONFIG");
    for (k, v) in env {
        cmd.env(k, v);
    }
    let mut child = cmd.spawn().expect("spawn markstatsd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

pub fn read_response(reader: &mut BufReader<ChildStdout>) -> serde_json::Value {
    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response");
    serde_json::from_str(line.trim()).expect("parse response json")
}

pub fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");
    let value = read_response(reader);
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

pub fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert_eq!(
        value.get("ok").and_then(|v| v.as_bool()),
        Some(true),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

/// Returns the error code of a request expected to fail.
pub fn request_err(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert_eq!(
        value.get("ok").and_then(|v| v.as_bool()),
        Some(false),
        "{} unexpectedly succeeded: {}",
        method,
        value
    );
    value.get("error").cloned().expect("error body")
}

/// Two-class snapshot used across the IPC tests.
///
/// Form 4-Blue Accounting is weighted 50/50 over papers 1 and 2:
/// Rudo 80% + 70% -> 75% -> 38/50.
pub fn sample_snapshot() -> serde_json::Value {
    json!({
        "examPeriod": {
            "name": "End of Term 2",
            "term": "2",
            "startDate": "2025-05-05",
            "endDate": "2025-08-07",
            "totalDays": 60
        },
        "students": [
            { "id": "s1", "name": "Rudo", "grade": "Form 4", "section": "Blue", "daysPresent": 54 },
            { "id": "s2", "name": "Kuda", "grade": "Form 4", "section": "Blue", "daysPresent": 60 },
            { "id": "s3", "name": "Tendai", "grade": "Form 4", "section": "Blue", "daysPresent": 30 },
            { "id": "s4", "name": "Nyasha", "grade": "Form 3", "section": "Green", "daysPresent": 58 },
            { "id": "s5", "name": "Farai", "grade": "Form 3", "section": "Green" }
        ],
        "records": [
            { "studentId": "s1", "subject": "Accounting", "component": "1", "percentage": 80 },
            { "studentId": "s1", "subject": "Accounting", "component": "2", "percentage": 70 },
            { "studentId": "s1", "subject": "Biology", "percentage": 71 },
            { "studentId": "s2", "subject": "Accounting", "component": "1", "mark": 30, "total": 50 },
            { "studentId": "s2", "subject": "Accounting", "component": "2", "mark": 20, "total": 50 },
            { "studentId": "s2", "subject": "Biology", "percentage": 64 },
            { "studentId": "s3", "subject": "Accounting", "component": "1", "percentage": 30 },
            { "studentId": "s3", "subject": "Accounting", "component": "2", "percentage": "20" },
            { "studentId": "s3", "subject": "Biology", "percentage": 35 },
            { "studentId": "s4", "subject": "Biology", "percentage": 90 },
            { "studentId": "s4", "subject": "History", "paper": "Paper 1", "mark": 45, "total": 50 },
            { "studentId": "s5", "subject": "Biology", "percentage": 40 },
            { "studentId": "s5", "subject": "History", "paper": "Paper 1", "total": 50 }
        ],
        "weights": {
            "Form 4": { "Blue": { "Accounting": { "1": 0.5, "2": 0.5 } } }
        }
    })
}

pub fn with(mut base: serde_json::Value, key: &str, value: serde_json::Value) -> serde_json::Value {
    base[key] = value;
    base
}
