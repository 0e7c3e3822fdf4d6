//! Application controller.
//!
//! `TodoApp` owns the task store for one session. It hydrates the store at
//! startup, applies user intents, and writes the whole store through to the
//! blob store after every mutating operation. Write failures are logged and
//! otherwise invisible to callers.

use chrono::{DateTime, FixedOffset, Timelike, Utc};
use serde::Serialize;

use crate::clock::{Clock, Zone};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::reminder::{PromptState, Reminder};
use crate::storage::{BlobStore, LoadedTasks, Persistence, StorageKeys};
use crate::task::{seed_tasks, Priority, Task, TaskId, TaskStore};
use crate::validate::validate_name;

/// Where the session's initial tasks came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Hydration {
    Stored,
    /// Seeded because nothing was stored yet
    SeededMissing,
    /// Seeded because the stored list was empty
    SeededEmpty,
    /// Seeded because the stored list could not be read; the seed stays in
    /// memory until the first change
    SeededMalformed,
}

impl Hydration {
    pub fn is_seeded(self) -> bool {
        self != Hydration::Stored
    }

    fn persists_seed(self) -> bool {
        matches!(self, Hydration::SeededMissing | Hydration::SeededEmpty)
    }
}

/// Presentation intents accepted by [`TodoApp::dispatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Add {
        name: String,
        priority: Priority,
        deadline: Option<DateTime<Utc>>,
    },
    EditOpen(TaskId),
    EditSave(Task),
    EditCancel,
    Delete(TaskId),
    ToggleDone { id: TaskId, value: bool },
    TogglePin(TaskId),
    RemoveAllCompleted,
    DismissPrompt,
}

/// Result of a dispatched intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Added(TaskId),
    Rejected(String),
    Updated,
    Unchanged,
}

impl Outcome {
    fn from_changed(changed: bool) -> Self {
        if changed {
            Outcome::Updated
        } else {
            Outcome::Unchanged
        }
    }
}

/// Snapshot handed to the presentation layer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState<'a> {
    pub tasks: &'a [Task],
    pub uncompleted_count: usize,
    pub validation_error: Option<&'a str>,
    pub prompt: PromptState,
    pub editing: Option<&'a Task>,
}

#[derive(Debug, Clone)]
struct Settings {
    user_name: String,
    default_priority: Priority,
    validate_on_edit: bool,
    reminder_enabled: bool,
}

impl From<&Config> for Settings {
    fn from(config: &Config) -> Self {
        Self {
            user_name: config.user.name.clone(),
            default_priority: config.default_priority(),
            validate_on_edit: config.validation.on_edit,
            reminder_enabled: config.reminder.enabled,
        }
    }
}

pub struct TodoApp<S: BlobStore, C: Clock> {
    persistence: Persistence<S>,
    clock: C,
    settings: Settings,
    store: TaskStore,
    hydration: Hydration,
    backup: Option<String>,
    reminder: Reminder,
    validation_error: Option<String>,
    editing: Option<Task>,
}

impl<S: BlobStore, C: Clock> TodoApp<S, C> {
    /// Start a session: evaluate the reminder, overwrite the last-access
    /// marker, then hydrate the store (seeding when nothing usable is stored).
    ///
    /// An unreadable task list is copied to a backup key and left in place;
    /// only a missing or empty list has the seed written back immediately.
    pub fn startup(blobs: S, clock: C, config: &Config) -> Self {
        let settings = Settings::from(config);
        let mut persistence = Persistence::new(blobs, StorageKeys::from(&config.storage));
        let now = clock.now();
        let zone = clock.zone();

        let reminder =
            Reminder::on_startup(&mut persistence, &now, &zone, settings.reminder_enabled);

        let mut backup = None;
        let (store, hydration) = match persistence.load_tasks() {
            LoadedTasks::Stored(store) => (store, Hydration::Stored),
            LoadedTasks::Missing => (seed_tasks(&zone), Hydration::SeededMissing),
            LoadedTasks::Empty => (seed_tasks(&zone), Hydration::SeededEmpty),
            LoadedTasks::Malformed { reason, raw } => {
                tracing::warn!(%reason, "stored tasks unreadable; starting from seed data");
                if let Some(raw) = raw {
                    match persistence.back_up_tasks(&raw) {
                        Ok(key) => {
                            tracing::warn!(%key, "unreadable tasks copied aside");
                            backup = Some(key);
                        }
                        Err(err) => tracing::warn!(error = %err, "failed to back up tasks"),
                    }
                }
                (seed_tasks(&zone), Hydration::SeededMalformed)
            }
        };
        tracing::debug!(?hydration, tasks = store.len(), "store hydrated");

        let mut app = Self {
            persistence,
            clock,
            settings,
            store,
            hydration,
            backup,
            reminder,
            validation_error: None,
            editing: None,
        };
        if hydration.persists_seed() {
            app.persist();
        }
        app
    }

    pub fn tasks(&self) -> &[Task] {
        self.store.tasks()
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn hydration(&self) -> Hydration {
        self.hydration
    }

    /// Key the unreadable task list was copied to this session, if any.
    pub fn backup(&self) -> Option<&str> {
        self.backup.as_deref()
    }

    pub fn now(&self) -> DateTime<FixedOffset> {
        self.clock.now()
    }

    pub fn zone(&self) -> Zone {
        self.clock.zone()
    }

    pub fn user_name(&self) -> &str {
        &self.settings.user_name
    }

    /// Priority for new tasks when the caller gives none.
    pub fn default_priority(&self) -> Priority {
        self.settings.default_priority
    }

    pub fn validates_on_edit(&self) -> bool {
        self.settings.validate_on_edit
    }

    pub fn uncompleted_count(&self) -> usize {
        self.store.uncompleted_count()
    }

    pub fn validation_error(&self) -> Option<&str> {
        self.validation_error.as_deref()
    }

    pub fn prompt(&self) -> PromptState {
        self.reminder.state()
    }

    pub fn editing(&self) -> Option<&Task> {
        self.editing.as_ref()
    }

    pub fn into_blobs(self) -> S {
        self.persistence.into_inner()
    }

    /// Resolve a full id or unique id prefix.
    pub fn resolve(&self, input: &str) -> Result<Option<TaskId>> {
        self.store.resolve(input)
    }

    pub fn view(&self) -> ViewState<'_> {
        ViewState {
            tasks: self.store.tasks(),
            uncompleted_count: self.uncompleted_count(),
            validation_error: self.validation_error(),
            prompt: self.prompt(),
            editing: self.editing(),
        }
    }

    /// Greeting for the current time of day.
    pub fn welcome(&self) -> String {
        welcome_message(
            &self.settings.user_name,
            self.uncompleted_count(),
            self.clock.now().hour(),
        )
    }

    pub fn add(
        &mut self,
        name: &str,
        priority: Priority,
        deadline: Option<DateTime<Utc>>,
    ) -> Result<TaskId> {
        match self.store.add(name, priority, deadline) {
            Ok((store, id)) => {
                self.validation_error = None;
                self.replace(store);
                Ok(id)
            }
            Err(err) => {
                if let Error::InvalidName(reason) = &err {
                    self.validation_error = Some(reason.clone());
                }
                Err(err)
            }
        }
    }

    pub fn set_done(&mut self, id: &str, value: bool) -> bool {
        let store = self.store.set_done(id, value);
        self.replace(store)
    }

    pub fn toggle_pin(&mut self, id: &str) -> bool {
        let store = self.store.toggle_pin(id);
        self.replace(store)
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let store = self.store.remove(id);
        self.replace(store)
    }

    /// Returns how many tasks were removed.
    pub fn remove_all_completed(&mut self) -> usize {
        let before = self.store.len();
        let store = self.store.remove_all_completed();
        let removed = before - store.len();
        self.replace(store);
        removed
    }

    /// Open the edit slot with a copy of the task. Unknown ids leave the slot
    /// closed.
    pub fn edit_open(&mut self, id: &str) -> bool {
        self.editing = self.store.get(id).cloned();
        self.editing.is_some()
    }

    /// Replace the draft in the open edit slot. Drafts for another id are
    /// ignored.
    pub fn edit_update(&mut self, revised: Task) -> bool {
        match &mut self.editing {
            Some(draft) if draft.id == revised.id => {
                *draft = revised;
                true
            }
            _ => false,
        }
    }

    /// Apply the draft and close the slot. With edit validation enabled, an
    /// invalid name keeps the slot open and is reported like a rejected add.
    pub fn edit_save(&mut self) -> Result<bool> {
        let Some(draft) = self.editing.clone() else {
            return Ok(false);
        };
        let changed = self.edit_task(draft)?;
        self.editing = None;
        Ok(changed)
    }

    pub fn edit_cancel(&mut self) {
        self.editing = None;
    }

    /// Replace a task wholesale, bypassing the edit slot.
    ///
    /// The shared validation message is only touched when edit validation is
    /// enabled, so a plain edit leaves a pending add error alone.
    pub fn edit_task(&mut self, revised: Task) -> Result<bool> {
        if self.settings.validate_on_edit {
            if let Err(err) = validate_name(&revised.name).into_result() {
                if let Error::InvalidName(reason) = &err {
                    self.validation_error = Some(reason.clone());
                }
                return Err(err);
            }
            self.validation_error = None;
        }
        let store = self.store.edit(revised);
        Ok(self.replace(store))
    }

    pub fn dismiss_prompt(&mut self) {
        self.reminder.dismiss();
    }

    pub fn dispatch(&mut self, intent: Intent) -> Outcome {
        match intent {
            Intent::Add {
                name,
                priority,
                deadline,
            } => match self.add(&name, priority, deadline) {
                Ok(id) => Outcome::Added(id),
                Err(err) => Outcome::Rejected(rejection_reason(err)),
            },
            Intent::EditOpen(id) => Outcome::from_changed(self.edit_open(&id)),
            Intent::EditSave(revised) => {
                if self.editing.is_none() {
                    self.editing = Some(revised);
                } else if !self.edit_update(revised) {
                    return Outcome::Unchanged;
                }
                match self.edit_save() {
                    Ok(changed) => Outcome::from_changed(changed),
                    Err(err) => Outcome::Rejected(rejection_reason(err)),
                }
            }
            Intent::EditCancel => {
                self.edit_cancel();
                Outcome::Unchanged
            }
            Intent::Delete(id) => Outcome::from_changed(self.remove(&id)),
            Intent::ToggleDone { id, value } => Outcome::from_changed(self.set_done(&id, value)),
            Intent::TogglePin(id) => Outcome::from_changed(self.toggle_pin(&id)),
            Intent::RemoveAllCompleted => {
                Outcome::from_changed(self.remove_all_completed() > 0)
            }
            Intent::DismissPrompt => {
                let shown = self.reminder.is_shown();
                self.dismiss_prompt();
                Outcome::from_changed(shown)
            }
        }
    }

    /// Swap in a new store and write it through. Returns whether it differs.
    fn replace(&mut self, store: TaskStore) -> bool {
        let changed = store != self.store;
        self.store = store;
        self.persist();
        changed
    }

    fn persist(&mut self) {
        if let Err(err) = self.persistence.save_tasks(&self.store) {
            tracing::warn!(error = %err, "failed to persist tasks");
        }
    }
}

fn rejection_reason(err: Error) -> String {
    match err {
        Error::InvalidName(reason) => reason,
        other => other.to_string(),
    }
}

/// "Good morning" before noon, "Hello" after.
pub fn welcome_message(user: &str, uncompleted: usize, hour: u32) -> String {
    let greeting = if hour < 12 { "Good morning" } else { "Hello" };
    let noun = if uncompleted == 1 { "task" } else { "tasks" };
    format!("{greeting}, {user}. You have {uncompleted} uncompleted {noun}.")
}
