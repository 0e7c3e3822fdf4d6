#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

/// Morning of 2025-03-01 in UTC.
pub const MORNING: &str = "2025-03-01T09:00:00+00:00";
/// Afternoon of the same day.
pub const AFTERNOON: &str = "2025-03-01T15:30:00+00:00";
/// The next morning.
pub const NEXT_DAY: &str = "2025-03-02T08:00:00+00:00";

pub struct TestData {
    dir: TempDir,
}

impl TestData {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("failed to create tempdir"),
        }
    }

    /// A data dir whose first session already persisted the example tasks.
    pub fn seeded() -> Self {
        let data = Self::new();
        data.cmd().arg("list").assert().success();
        data
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// A `todo` command pointed at this data dir with the clock pinned to `now`.
    pub fn cmd_at(&self, now: &str) -> Command {
        let mut cmd = Command::cargo_bin("todo").expect("binary");
        cmd.env("TODO_DATA_DIR", self.path())
            .env("TODO_NOW", now)
            .env_remove("RUST_LOG");
        cmd
    }

    pub fn cmd(&self) -> Command {
        self.cmd_at(MORNING)
    }

    /// Run a command with `--json` and return the parsed envelope.
    pub fn json(&self, args: &[&str]) -> Value {
        let output = self
            .cmd()
            .arg("--json")
            .args(args)
            .output()
            .expect("run todo");
        serde_json::from_slice(&output.stdout).expect("json envelope")
    }

    pub fn write_raw(&self, name: &str, contents: &str) {
        fs::write(self.file(name), contents).expect("write file");
    }

    pub fn read_raw(&self, name: &str) -> Option<String> {
        fs::read_to_string(self.file(name)).ok()
    }

    pub fn write_config(&self, contents: &str) {
        self.write_raw("config.toml", contents);
    }

    /// The stored task array, as written under the `TodoApp` key.
    pub fn stored_tasks(&self) -> Vec<Value> {
        let raw = self.read_raw("TodoApp").expect("tasks file");
        let value: Value = serde_json::from_str(&raw).expect("tasks json");
        value.as_array().cloned().expect("tasks array")
    }

    pub fn stored_names(&self) -> Vec<String> {
        self.stored_tasks()
            .iter()
            .filter_map(|task| task["name"].as_str().map(str::to_string))
            .collect()
    }

    pub fn task_id(&self, name: &str) -> String {
        self.stored_tasks()
            .iter()
            .find(|task| task["name"] == name)
            .and_then(|task| task["id"].as_str().map(str::to_string))
            .expect("task id")
    }

    pub fn last_access(&self) -> Option<String> {
        self.read_raw("LastAccess")
    }
}

pub fn write_tasks(data: &TestData, tasks: &Value) {
    data.write_raw("TodoApp", &tasks.to_string());
}
