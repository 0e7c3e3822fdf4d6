//! Task model and the in-memory task store.
//!
//! `TaskStore` is an ordered collection in insertion order. Every operation
//! takes `&self` and returns a new store value, so callers replace their
//! store wholesale instead of mutating records in place.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::Zone;
use crate::error::{Error, Result};
use crate::validate::validate_name;

pub type TaskId = String;

const DEADLINE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];
const DEADLINE_DATE_FORMAT: &str = "%Y-%m-%d";
const DEADLINE_DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Task priority: 1 (highest) to 3 (lowest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Priority(u8);

impl Priority {
    pub const HIGH: Priority = Priority(1);
    pub const MEDIUM: Priority = Priority(2);
    pub const LOW: Priority = Priority(3);
    pub const ALL: [Priority; 3] = [Priority::HIGH, Priority::MEDIUM, Priority::LOW];

    pub fn new(value: u8) -> Result<Self> {
        Priority::try_from(value).map_err(Error::InvalidArgument)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::LOW
    }
}

impl TryFrom<u8> for Priority {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            1..=3 => Ok(Priority(value)),
            _ => Err(format!("priority must be 1, 2 or 3 (got {value})")),
        }
    }
}

impl From<Priority> for u8 {
    fn from(priority: Priority) -> Self {
        priority.0
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let value: u8 = s
            .trim()
            .parse()
            .map_err(|_| format!("priority must be 1, 2 or 3 (got '{s}')"))?;
        Priority::try_from(value)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single to-do item.
///
/// Serialized with camelCase keys; `deadline` is an ISO-8601 string with
/// millisecond precision or `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    pub is_done: bool,
    pub priority: Priority,
    #[serde(default, with = "iso_millis")]
    pub deadline: Option<DateTime<Utc>>,
    /// Records written before pinning existed have no `isPinned` key.
    #[serde(default)]
    pub is_pinned: bool,
}

impl Task {
    /// Build a fresh, not-done, unpinned task with a new id.
    pub fn new(
        name: impl Into<String>,
        priority: Priority,
        deadline: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            is_done: false,
            priority,
            deadline: deadline.map(truncate_to_millis),
            is_pinned: false,
        }
    }

    pub fn with_done(&self, value: bool) -> Task {
        Task {
            is_done: value,
            ..self.clone()
        }
    }

    pub fn with_pin_toggled(&self) -> Task {
        Task {
            is_pinned: !self.is_pinned,
            ..self.clone()
        }
    }

    /// Rebuild this task with the patched fields replaced. The id and the
    /// done/pinned flags carry over.
    pub fn revised(&self, patch: &TaskPatch) -> Task {
        Task {
            id: self.id.clone(),
            name: patch.name.clone().unwrap_or_else(|| self.name.clone()),
            is_done: self.is_done,
            priority: patch.priority.unwrap_or(self.priority),
            deadline: match patch.deadline {
                Some(deadline) => deadline.map(truncate_to_millis),
                None => self.deadline,
            },
            is_pinned: self.is_pinned,
        }
    }
}

/// Field changes for an edit. `deadline: Some(None)` clears the deadline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub name: Option<String>,
    pub priority: Option<Priority>,
    pub deadline: Option<Option<DateTime<Utc>>>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.priority.is_none() && self.deadline.is_none()
    }
}

/// Ordered collection of tasks, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskStore {
    tasks: Vec<Task>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Task> {
        self.tasks.iter()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Append a new task. Rejects names that fail validation, leaving the
    /// store untouched.
    pub fn add(
        &self,
        name: &str,
        priority: Priority,
        deadline: Option<DateTime<Utc>>,
    ) -> Result<(TaskStore, TaskId)> {
        validate_name(name).into_result()?;

        let mut task = Task::new(name, priority, deadline);
        while self.contains(&task.id) {
            task.id = Uuid::new_v4().to_string();
        }
        let id = task.id.clone();

        let mut tasks = self.tasks.clone();
        tasks.push(task);
        Ok((TaskStore { tasks }, id))
    }

    pub fn set_done(&self, id: &str, value: bool) -> TaskStore {
        self.map_task(id, |task| task.with_done(value))
    }

    pub fn toggle_pin(&self, id: &str) -> TaskStore {
        self.map_task(id, Task::with_pin_toggled)
    }

    /// Replace the task whose id matches `revised.id` with `revised`.
    pub fn edit(&self, revised: Task) -> TaskStore {
        let id = revised.id.clone();
        self.map_task(&id, |_| revised.clone())
    }

    pub fn remove(&self, id: &str) -> TaskStore {
        TaskStore {
            tasks: self
                .tasks
                .iter()
                .filter(|task| task.id != id)
                .cloned()
                .collect(),
        }
    }

    pub fn remove_all_completed(&self) -> TaskStore {
        TaskStore {
            tasks: self
                .tasks
                .iter()
                .filter(|task| !task.is_done)
                .cloned()
                .collect(),
        }
    }

    pub fn uncompleted_count(&self) -> usize {
        self.tasks.iter().filter(|task| !task.is_done).count()
    }

    pub fn completed_count(&self) -> usize {
        self.tasks.len() - self.uncompleted_count()
    }

    /// Resolve user input to a task id: an exact id, or a prefix shared by
    /// exactly one task. Returns `Ok(None)` when nothing matches.
    pub fn resolve(&self, input: &str) -> Result<Option<TaskId>> {
        let needle = input.trim();
        if needle.is_empty() {
            return Err(Error::InvalidArgument("task id cannot be empty".to_string()));
        }
        if let Some(task) = self.get(needle) {
            return Ok(Some(task.id.clone()));
        }

        let needle = needle.to_ascii_lowercase();
        let matches: Vec<&Task> = self
            .tasks
            .iter()
            .filter(|task| task.id.to_ascii_lowercase().starts_with(&needle))
            .collect();
        match matches.as_slice() {
            [] => Ok(None),
            [task] => Ok(Some(task.id.clone())),
            _ => Err(Error::InvalidArgument(format!(
                "task id prefix '{input}' is ambiguous ({} matches)",
                matches.len()
            ))),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(raw: &str) -> Result<TaskStore> {
        Ok(serde_json::from_str(raw)?)
    }

    fn map_task(&self, id: &str, apply: impl Fn(&Task) -> Task) -> TaskStore {
        TaskStore {
            tasks: self
                .tasks
                .iter()
                .map(|task| if task.id == id { apply(task) } else { task.clone() })
                .collect(),
        }
    }
}

impl<'a> IntoIterator for &'a TaskStore {
    type Item = &'a Task;
    type IntoIter = std::slice::Iter<'a, Task>;

    fn into_iter(self) -> Self::IntoIter {
        self.tasks.iter()
    }
}

/// The example tasks a brand-new store starts with. Deadlines are read as
/// wall-clock times in `zone`.
pub fn seed_tasks(zone: &Zone) -> TaskStore {
    let first = Task::new("Task 1", Priority::HIGH, seed_deadline(zone, 2024, 12, 31));
    let second =
        Task::new("Task 2", Priority::MEDIUM, seed_deadline(zone, 2024, 11, 30)).with_done(true);
    let third = Task::new("Task 3", Priority::LOW, None).with_pin_toggled();
    TaskStore::from_tasks(vec![first, second, third])
}

fn seed_deadline(zone: &Zone, year: i32, month: u32, day: u32) -> Option<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(23, 59, 0))
        .and_then(|naive| zone.to_utc(naive))
}

/// Parse a deadline typed by a user.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM[:SS]`, `YYYY-MM-DDTHH:MM[:SS]` (wall
/// clock in `zone`), or a bare `YYYY-MM-DD`, which means 23:59 that day.
pub fn parse_deadline(input: &str, zone: &Zone) -> Result<DateTime<Utc>> {
    let trimmed = input.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(truncate_to_millis(ts.with_timezone(&Utc)));
    }

    for format in DEADLINE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            if let Some(ts) = zone.to_utc(naive) {
                return Ok(truncate_to_millis(ts));
            }
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, DEADLINE_DATE_FORMAT) {
        if let Some(ts) = date
            .and_hms_opt(23, 59, 0)
            .and_then(|naive| zone.to_utc(naive))
        {
            return Ok(ts);
        }
    }

    Err(Error::InvalidArgument(format!(
        "invalid deadline '{input}' (expected YYYY-MM-DD, YYYY-MM-DD HH:MM, or RFC 3339)"
    )))
}

/// Render a deadline as wall-clock time in `zone`.
pub fn format_deadline(deadline: DateTime<Utc>, zone: &Zone) -> String {
    zone.wall_clock(deadline)
        .format(DEADLINE_DISPLAY_FORMAT)
        .to_string()
}

/// ISO-8601 with millisecond precision and a `Z` suffix.
pub fn to_iso_millis(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn truncate_to_millis(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.trunc_subsecs(3)
}

mod iso_millis {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(ts) => serializer.serialize_some(&super::to_iso_millis(*ts)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|value| {
            DateTime::parse_from_rfc3339(&value)
                .map(|ts| ts.with_timezone(&Utc))
                .map_err(serde::de::Error::custom)
        })
        .transpose()
    }
}
