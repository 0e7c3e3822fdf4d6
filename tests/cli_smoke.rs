mod support;

use assert_cmd::Command;
use predicates::str::contains;

use support::TestData;

#[test]
fn todo_help_works() {
    Command::cargo_bin("todo")
        .expect("binary")
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("to-do list"));
}

#[test]
fn subcommand_help_works() {
    let subcommands = [
        "add", "list", "done", "undone", "pin", "edit", "rm", "clear", "status", "ui",
    ];

    for cmd in subcommands {
        Command::cargo_bin("todo")
            .expect("binary")
            .arg(cmd)
            .arg("--help")
            .assert()
            .success();
    }
}

#[test]
fn first_list_shows_example_tasks() {
    let data = TestData::new();

    data.cmd()
        .arg("list")
        .assert()
        .success()
        .stdout(contains("Task 1"))
        .stdout(contains("Task 2"))
        .stdout(contains("Task 3"))
        .stdout(contains("Uncompleted: 2"));

    assert_eq!(data.stored_names(), ["Task 1", "Task 2", "Task 3"]);
    assert!(data.last_access().is_some());
}

#[test]
fn ls_alias_and_json_envelope() {
    let data = TestData::new();
    let value = data.json(&["ls"]);

    assert_eq!(value["schema_version"], "todo.v1");
    assert_eq!(value["command"], "list");
    assert_eq!(value["status"], "success");
    assert_eq!(value["data"]["total"], 3);
    assert_eq!(value["data"]["uncompleted_count"], 2);
    let first = &value["data"]["tasks"][0];
    assert_eq!(first["name"], "Task 1");
    assert_eq!(first["isDone"], false);
    assert_eq!(first["priority"], 1);
    assert_eq!(first["isPinned"], false);
}

#[test]
fn quiet_suppresses_human_output() {
    let data = TestData::new();
    data.cmd()
        .args(["--quiet", "list"])
        .assert()
        .success()
        .stdout("");
}

#[test]
fn status_greets_by_time_of_day() {
    let data = TestData::new();

    data.cmd()
        .arg("status")
        .assert()
        .success()
        .stdout(contains("Good morning, you. You have 2 uncompleted tasks."))
        .stdout(contains("Started from the example tasks"));

    data.cmd_at(support::AFTERNOON)
        .arg("status")
        .assert()
        .success()
        .stdout(contains("Hello, you. You have 2 uncompleted tasks."));
}

#[test]
fn missing_subcommand_is_a_usage_error() {
    Command::cargo_bin("todo")
        .expect("binary")
        .assert()
        .failure()
        .code(2);
}
