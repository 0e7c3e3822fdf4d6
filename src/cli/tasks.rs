//! todo task command implementations.

use serde::Serialize;

use crate::cli::{SessionApp, SessionArgs};
use crate::clock::Zone;
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::reminder::{PromptState, REMINDER_MESSAGE};
use crate::task::{format_deadline, parse_deadline, Priority, Task, TaskPatch};

const SHORT_ID_LEN: usize = 8;

pub struct AddOptions {
    pub name: String,
    pub priority: Option<Priority>,
    pub deadline: Option<String>,
    pub session: SessionArgs,
}

pub struct SetDoneOptions {
    pub id: String,
    pub value: bool,
    pub session: SessionArgs,
}

pub struct IdOptions {
    pub id: String,
    pub session: SessionArgs,
}

pub struct EditOptions {
    pub id: String,
    pub name: Option<String>,
    pub priority: Option<Priority>,
    pub deadline: Option<String>,
    pub clear_deadline: bool,
    pub session: SessionArgs,
}

#[derive(Serialize)]
struct TaskAddedOutput {
    task: Task,
    uncompleted_count: usize,
}

#[derive(Serialize)]
struct TaskListOutput<'a> {
    total: usize,
    uncompleted_count: usize,
    tasks: &'a [Task],
}

#[derive(Serialize)]
struct TaskChangeOutput {
    /// The id as typed, or the resolved full id
    id: String,
    found: bool,
    changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    task: Option<Task>,
    uncompleted_count: usize,
}

#[derive(Serialize)]
struct ClearOutput {
    removed: usize,
    remaining: usize,
}

pub fn run_add(app: &mut SessionApp, options: AddOptions) -> Result<()> {
    let zone = app.zone();
    let deadline = options
        .deadline
        .as_deref()
        .map(|value| parse_deadline(value, &zone))
        .transpose()?;
    let priority = options.priority.unwrap_or_else(|| app.default_priority());

    let id = app.add(&options.name, priority, deadline)?;
    let task = app
        .store()
        .get(&id)
        .cloned()
        .ok_or_else(|| Error::OperationFailed(format!("task {id} missing after add")))?;

    let mut human = HumanOutput::new("Task added");
    push_reminder(&mut human, app.prompt());
    human.push_summary("ID", task.id.clone());
    human.push_summary("Name", task.name.clone());
    human.push_summary("Priority", task.priority.to_string());
    if let Some(deadline) = task.deadline {
        human.push_summary("Deadline", format_deadline(deadline, &zone));
    }
    human.push_summary("Uncompleted", app.uncompleted_count().to_string());

    let output = TaskAddedOutput {
        task,
        uncompleted_count: app.uncompleted_count(),
    };
    emit_success(output_options(&options.session), "add", &output, &human)
}

pub fn run_list(app: &SessionApp, session: &SessionArgs) -> Result<()> {
    let zone = app.zone();
    let tasks = app.tasks();

    let mut human = HumanOutput::new("Tasks");
    push_reminder(&mut human, app.prompt());
    human.push_summary("Total", tasks.len().to_string());
    human.push_summary("Uncompleted", app.uncompleted_count().to_string());
    if tasks.is_empty() {
        human.push_detail("No tasks registered.");
        human.push_next_step("todo add <name>");
    }
    for task in tasks {
        human.push_detail(format_task_line(task, &zone));
    }

    let output = TaskListOutput {
        total: tasks.len(),
        uncompleted_count: app.uncompleted_count(),
        tasks,
    };
    emit_success(output_options(session), "list", &output, &human)
}

pub fn run_set_done(app: &mut SessionApp, options: SetDoneOptions) -> Result<()> {
    let resolved = app.resolve(&options.id)?;
    let changed = match resolved.as_deref() {
        Some(id) => app.set_done(id, options.value),
        None => false,
    };

    let command = if options.value { "done" } else { "undone" };
    let header = if options.value {
        "Task marked done"
    } else {
        "Task marked not done"
    };
    let task = resolved.as_deref().and_then(|id| app.store().get(id)).cloned();
    emit_change(
        &options.session,
        command,
        header,
        ChangeReport {
            input: options.id,
            task,
            changed,
            uncompleted_count: app.uncompleted_count(),
            prompt: app.prompt(),
            zone: app.zone(),
        },
    )
}

pub fn run_pin(app: &mut SessionApp, options: IdOptions) -> Result<()> {
    let resolved = app.resolve(&options.id)?;
    let changed = match resolved.as_deref() {
        Some(id) => app.toggle_pin(id),
        None => false,
    };

    let task = resolved.as_deref().and_then(|id| app.store().get(id)).cloned();
    let header = match &task {
        Some(task) if task.is_pinned => "Task pinned",
        Some(_) => "Task unpinned",
        None => "Pin toggled",
    };
    emit_change(
        &options.session,
        "pin",
        header,
        ChangeReport {
            input: options.id,
            task,
            changed,
            uncompleted_count: app.uncompleted_count(),
            prompt: app.prompt(),
            zone: app.zone(),
        },
    )
}

pub fn run_edit(app: &mut SessionApp, options: EditOptions) -> Result<()> {
    if options.name.is_none()
        && options.priority.is_none()
        && options.deadline.is_none()
        && !options.clear_deadline
    {
        return Err(Error::InvalidArgument(
            "edit requires --name, --priority, --deadline or --clear-deadline".to_string(),
        ));
    }

    let zone = app.zone();
    let deadline = if options.clear_deadline {
        Some(None)
    } else {
        options
            .deadline
            .as_deref()
            .map(|value| parse_deadline(value, &zone).map(Some))
            .transpose()?
    };
    let patch = TaskPatch {
        name: options.name,
        priority: options.priority,
        deadline,
    };

    let resolved = app.resolve(&options.id)?;
    let current = resolved.as_deref().and_then(|id| app.store().get(id)).cloned();
    let changed = match current {
        Some(task) => app.edit_task(task.revised(&patch))?,
        None => false,
    };

    let task = resolved.as_deref().and_then(|id| app.store().get(id)).cloned();
    emit_change(
        &options.session,
        "edit",
        "Task updated",
        ChangeReport {
            input: options.id,
            task,
            changed,
            uncompleted_count: app.uncompleted_count(),
            prompt: app.prompt(),
            zone,
        },
    )
}

pub fn run_remove(app: &mut SessionApp, options: IdOptions) -> Result<()> {
    let resolved = app.resolve(&options.id)?;
    let task = resolved.as_deref().and_then(|id| app.store().get(id)).cloned();
    let changed = match resolved.as_deref() {
        Some(id) => app.remove(id),
        None => false,
    };

    emit_change(
        &options.session,
        "rm",
        "Task deleted",
        ChangeReport {
            input: options.id,
            task,
            changed,
            uncompleted_count: app.uncompleted_count(),
            prompt: app.prompt(),
            zone: app.zone(),
        },
    )
}

pub fn run_clear(app: &mut SessionApp, session: &SessionArgs) -> Result<()> {
    let removed = app.remove_all_completed();

    let mut human = HumanOutput::new("Completed tasks removed");
    push_reminder(&mut human, app.prompt());
    human.push_summary("Removed", removed.to_string());
    human.push_summary("Remaining", app.tasks().len().to_string());

    let output = ClearOutput {
        removed,
        remaining: app.tasks().len(),
    };
    emit_success(output_options(session), "clear", &output, &human)
}

/// One-line human rendering of a task: done box, short id, pin, priority
/// marks, name and deadline.
pub(crate) fn format_task_line(task: &Task, zone: &Zone) -> String {
    let done = if task.is_done { "[x]" } else { "[ ]" };
    let pin = if task.is_pinned { " (pinned)" } else { "" };
    let mut line = format!(
        "{done} {} {:<3} {}{pin}",
        short_id(&task.id),
        priority_marks(task.priority),
        task.name
    );
    if let Some(deadline) = task.deadline {
        line.push_str(&format!(" (due {})", format_deadline(deadline, zone)));
    }
    line
}

pub(crate) fn short_id(id: &str) -> &str {
    match id.char_indices().nth(SHORT_ID_LEN) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}

pub(crate) fn priority_marks(priority: Priority) -> String {
    "+".repeat(usize::from(priority.value()))
}

pub(crate) fn push_reminder(human: &mut HumanOutput, prompt: PromptState) {
    if prompt == PromptState::Shown {
        human.push_warning(REMINDER_MESSAGE);
    }
}

pub(crate) fn output_options(session: &SessionArgs) -> OutputOptions {
    OutputOptions {
        json: session.json,
        quiet: session.quiet,
    }
}

struct ChangeReport {
    input: String,
    task: Option<Task>,
    changed: bool,
    uncompleted_count: usize,
    prompt: PromptState,
    zone: Zone,
}

fn emit_change(
    session: &SessionArgs,
    command: &str,
    header: &str,
    report: ChangeReport,
) -> Result<()> {
    let found = report.task.is_some();
    let header = if !found {
        "No change: no task matches that id"
    } else if !report.changed {
        "No change"
    } else {
        header
    };

    let mut human = HumanOutput::new(header);
    push_reminder(&mut human, report.prompt);
    match &report.task {
        Some(task) => {
            human.push_summary("ID", task.id.clone());
            human.push_detail(format_task_line(task, &report.zone));
        }
        None => {
            human.push_summary("ID", report.input.clone());
            human.push_next_step("todo list");
        }
    }
    human.push_summary("Uncompleted", report.uncompleted_count.to_string());

    let output = TaskChangeOutput {
        id: report
            .task
            .as_ref()
            .map(|task| task.id.clone())
            .unwrap_or(report.input),
        found,
        changed: report.changed,
        task: report.task,
        uncompleted_count: report.uncompleted_count,
    };
    emit_success(output_options(session), command, &output, &human)
}
