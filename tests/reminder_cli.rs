mod support;

use predicates::prelude::*;
use predicates::str::contains;

use support::{TestData, NEXT_DAY};

const REMINDER: &str = "A day has passed since your last visit";

#[test]
fn first_visit_has_no_reminder() {
    let data = TestData::new();

    data.cmd()
        .arg("list")
        .assert()
        .success()
        .stdout(contains(REMINDER).not());

    assert_eq!(data.last_access().as_deref(), Some("2025-03-01T09:00:00.000Z"));
}

#[test]
fn same_day_visit_has_no_reminder() {
    let data = TestData::seeded();

    data.cmd_at(support::AFTERNOON)
        .arg("status")
        .assert()
        .success()
        .stdout(contains(REMINDER).not());

    assert_eq!(data.last_access().as_deref(), Some("2025-03-01T15:30:00.000Z"));
}

#[test]
fn next_day_visit_shows_reminder_once() {
    let data = TestData::seeded();

    data.cmd_at(NEXT_DAY)
        .arg("list")
        .assert()
        .success()
        .stdout(contains("Warnings:"))
        .stdout(contains(REMINDER));

    data.cmd_at(NEXT_DAY)
        .arg("list")
        .assert()
        .success()
        .stdout(contains(REMINDER).not());
}

#[test]
fn reminder_state_in_json() {
    let data = TestData::seeded();

    let output = data
        .cmd_at(NEXT_DAY)
        .args(["--json", "status"])
        .output()
        .expect("run todo");
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(value["data"]["prompt"], "shown");
    assert_eq!(value["data"]["hydration"], "stored");

    let value = data.json(&["status"]);
    assert_eq!(value["data"]["prompt"], "hidden");
}

#[test]
fn unreadable_marker_counts_as_first_visit() {
    let data = TestData::seeded();
    data.write_raw("LastAccess", "not a timestamp");

    data.cmd_at(NEXT_DAY)
        .arg("list")
        .assert()
        .success()
        .stdout(contains(REMINDER).not());

    assert_eq!(data.last_access().as_deref(), Some("2025-03-02T08:00:00.000Z"));
}

#[test]
fn reminder_can_be_disabled() {
    let data = TestData::seeded();
    data.write_config("[reminder]\nenabled = false\n");

    data.cmd_at(NEXT_DAY)
        .arg("list")
        .assert()
        .success()
        .stdout(contains(REMINDER).not());

    // The marker is still kept current.
    assert_eq!(data.last_access().as_deref(), Some("2025-03-02T08:00:00.000Z"));
}

#[test]
fn reminder_survives_a_failed_command() {
    let data = TestData::seeded();

    data.cmd_at(NEXT_DAY)
        .args(["add", "A"])
        .assert()
        .code(2)
        .stderr(contains(format!("warning: {REMINDER}")))
        .stderr(contains("error:"));

    // The marker was consumed by the failed run.
    data.cmd_at(NEXT_DAY)
        .arg("list")
        .assert()
        .success()
        .stdout(contains(REMINDER).not());
}

#[test]
fn reminder_in_json_error_envelope() {
    let data = TestData::seeded();

    let output = data
        .cmd_at(NEXT_DAY)
        .args(["--json", "add", "A"])
        .output()
        .expect("run todo");
    assert!(!output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(value["status"], "error");
    assert!(value["warnings"][0]
        .as_str()
        .is_some_and(|warning| warning.contains(REMINDER)));
}

#[test]
fn quiet_mode_still_reports_reminder() {
    let data = TestData::seeded();

    data.cmd_at(NEXT_DAY)
        .args(["--quiet", "list"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(contains(REMINDER));
}
