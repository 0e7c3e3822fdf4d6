mod support;

use predicates::str::contains;
use serde_json::json;

use support::{write_tasks, TestData};

#[test]
fn add_appends_and_persists() {
    let data = TestData::seeded();

    data.cmd()
        .args(["add", "Buy milk", "-p", "2", "-d", "2025-03-05 18:00"])
        .assert()
        .success()
        .stdout(contains("Task added"))
        .stdout(contains("Uncompleted: 3"));

    let tasks = data.stored_tasks();
    assert_eq!(tasks.len(), 4);
    let added = &tasks[3];
    assert_eq!(added["name"], "Buy milk");
    assert_eq!(added["priority"], 2);
    assert_eq!(added["isDone"], false);
    assert_eq!(added["deadline"], "2025-03-05T18:00:00.000Z");
}

#[test]
fn add_uses_low_priority_by_default() {
    let data = TestData::seeded();
    let value = data.json(&["add", "Stretch"]);

    assert_eq!(value["data"]["task"]["priority"], 3);
    assert_eq!(value["data"]["task"]["deadline"], serde_json::Value::Null);
}

#[test]
fn add_rejects_bad_names() {
    let data = TestData::seeded();

    data.cmd()
        .args(["add", "A"])
        .assert()
        .failure()
        .code(2)
        .stderr(contains("enter between 2 and 32 characters"));

    data.cmd()
        .args(["add", &"x".repeat(33)])
        .assert()
        .failure()
        .code(2);

    assert_eq!(data.stored_tasks().len(), 3);
}

#[test]
fn add_rejection_in_json_mode() {
    let data = TestData::seeded();
    let value = data.json(&["add", "A"]);

    assert_eq!(value["status"], "error");
    assert_eq!(value["command"], "add");
    assert_eq!(value["error"]["code"], 2);
    assert_eq!(value["error"]["kind"], "user_error");
}

#[test]
fn add_rejects_bad_priority_and_deadline() {
    let data = TestData::seeded();

    data.cmd()
        .args(["add", "Valid name", "-p", "4"])
        .assert()
        .failure()
        .code(2);

    data.cmd()
        .args(["add", "Valid name", "-d", "someday"])
        .assert()
        .failure()
        .code(2)
        .stderr(contains("invalid deadline"));
}

#[test]
fn done_and_undone_toggle_completion() {
    let data = TestData::seeded();
    let id = data.task_id("Task 1");

    data.cmd()
        .args(["done", &id])
        .assert()
        .success()
        .stdout(contains("Task marked done"))
        .stdout(contains("Uncompleted: 1"));
    assert_eq!(data.stored_tasks()[0]["isDone"], true);

    data.cmd()
        .args(["done", &id])
        .assert()
        .success()
        .stdout(contains("No change"));

    data.cmd()
        .args(["undone", &id[..8]])
        .assert()
        .success()
        .stdout(contains("Task marked not done"));
    assert_eq!(data.stored_tasks()[0]["isDone"], false);
}

#[test]
fn unknown_id_is_a_silent_noop() {
    let data = TestData::seeded();
    let before = data.read_raw("TodoApp");

    data.cmd()
        .args(["rm", "zzzz"])
        .assert()
        .success()
        .stdout(contains("No change: no task matches that id"));

    let value = data.json(&["done", "zzzz"]);
    assert_eq!(value["data"]["found"], false);
    assert_eq!(value["data"]["changed"], false);
    assert_eq!(data.read_raw("TodoApp"), before);
}

#[test]
fn pin_toggles_marker() {
    let data = TestData::seeded();
    let id = data.task_id("Task 1");

    data.cmd()
        .args(["pin", &id])
        .assert()
        .success()
        .stdout(contains("Task pinned"));
    assert_eq!(data.stored_tasks()[0]["isPinned"], true);

    data.cmd()
        .args(["pin", &id])
        .assert()
        .success()
        .stdout(contains("Task unpinned"));
    assert_eq!(data.stored_tasks()[0]["isPinned"], false);
}

#[test]
fn edit_replaces_fields_in_place() {
    let data = TestData::seeded();
    let id = data.task_id("Task 2");

    data.cmd()
        .args(["edit", &id, "--name", "Renamed", "-p", "1", "--clear-deadline"])
        .assert()
        .success()
        .stdout(contains("Task updated"));

    let tasks = data.stored_tasks();
    assert_eq!(tasks.len(), 3);
    assert_eq!(tasks[1]["id"], id.as_str());
    assert_eq!(tasks[1]["name"], "Renamed");
    assert_eq!(tasks[1]["priority"], 1);
    assert_eq!(tasks[1]["deadline"], serde_json::Value::Null);
    assert_eq!(tasks[1]["isDone"], true);
}

#[test]
fn edit_needs_a_field() {
    let data = TestData::seeded();
    let id = data.task_id("Task 2");

    data.cmd()
        .args(["edit", &id])
        .assert()
        .failure()
        .code(2)
        .stderr(contains("edit requires"));
}

#[test]
fn edit_skips_name_rule_unless_configured() {
    let data = TestData::seeded();
    let id = data.task_id("Task 3");

    data.cmd()
        .args(["edit", &id, "--name", "Z"])
        .assert()
        .success();
    assert_eq!(data.stored_tasks()[2]["name"], "Z");

    data.write_config("[validation]\non_edit = true\n");
    data.cmd()
        .args(["edit", &id, "--name", "Y"])
        .assert()
        .failure()
        .code(2);
    assert_eq!(data.stored_tasks()[2]["name"], "Z");
}

#[test]
fn rm_deletes_one_task() {
    let data = TestData::seeded();
    let id = data.task_id("Task 2");

    data.cmd()
        .args(["remove", &id])
        .assert()
        .success()
        .stdout(contains("Task deleted"));

    assert_eq!(data.stored_names(), ["Task 1", "Task 3"]);
}

#[test]
fn clear_removes_completed_tasks() {
    let data = TestData::seeded();

    data.cmd()
        .arg("clear")
        .assert()
        .success()
        .stdout(contains("Removed: 1"))
        .stdout(contains("Remaining: 2"));
    assert_eq!(data.stored_names(), ["Task 1", "Task 3"]);

    data.cmd()
        .arg("clear")
        .assert()
        .success()
        .stdout(contains("Removed: 0"));
}

#[test]
fn ambiguous_prefix_is_reported() {
    let data = TestData::new();
    write_tasks(
        &data,
        &json!([
            {"id": "ab1", "name": "One", "isDone": false, "priority": 3, "deadline": null, "isPinned": false},
            {"id": "ab2", "name": "Two", "isDone": false, "priority": 3, "deadline": null, "isPinned": false}
        ]),
    );

    data.cmd()
        .args(["done", "ab"])
        .assert()
        .failure()
        .code(2)
        .stderr(contains("ambiguous"));
}
