mod test_support;

use serde_json::json;
use test_support::{request_err, request_ok, sample_snapshot, spawn_sidecar, with};

#[test]
fn malformed_snapshots_fail_fast_with_path() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let e = request_err(
        &mut stdin,
        &mut reader,
        "1",
        "reports.students",
        with(sample_snapshot(), "records", json!("not a list")),
    );
    assert_eq!(e["code"], "bad_input");
    assert_eq!(e["details"]["path"], "records");

    let mut no_students = sample_snapshot();
    no_students.as_object_mut().expect("object").remove("students");
    let e = request_err(&mut stdin, &mut reader, "2", "analytics.subjects", no_students);
    assert_eq!(e["code"], "bad_input");
    assert!(e["message"].as_str().unwrap_or_default().contains("students"), "{e}");

    let e = request_err(
        &mut stdin,
        &mut reader,
        "3",
        "rankings.build",
        with(
            sample_snapshot(),
            "weights",
            json!({ "Form 4": { "Blue": { "Accounting": { "1": "half" } } } }),
        ),
    );
    assert_eq!(e["code"], "bad_input");
    assert!(
        e["details"]["path"].as_str().unwrap_or_default().contains("Accounting"),
        "{e}"
    );

    let e = request_err(
        &mut stdin,
        &mut reader,
        "4",
        "weights.set",
        json!({ "weights": [1, 2, 3] }),
    );
    assert_eq!(e["code"], "bad_input");

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn unusable_values_degrade_instead_of_failing() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let snapshot = json!({
        "students": [
            { "id": "x", "name": "Chipo", "grade": "Form 1", "section": "Red" }
        ],
        "records": [
            { "studentId": "x", "subject": "Music", "mark": "absent" },
            { "studentId": "ghost", "subject": "Music", "percentage": 80 }
        ]
    });
    let r = request_ok(&mut stdin, &mut reader, "1", "reports.students", snapshot.clone());
    let chipo = &r["students"][0];
    assert_eq!(chipo["subjects"][0]["attempted"], false);
    assert_eq!(chipo["totalPoints"], 0);
    assert!(chipo["termEnding"].is_null());

    let stats = request_ok(&mut stdin, &mut reader, "2", "analytics.subjects", snapshot);
    assert_eq!(stats["subjects"].as_array().map(|s| s.len()), Some(0));

    drop(stdin);
    let _ = child.wait();
}
