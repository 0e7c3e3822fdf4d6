//! todo status command.

use std::path::PathBuf;

use serde::Serialize;

use crate::app::Hydration;
use crate::cli::tasks::{output_options, push_reminder};
use crate::cli::{SessionArgs, SessionContext};
use crate::error::Result;
use crate::output::{emit_success, HumanOutput};
use crate::reminder::PromptState;

#[derive(Serialize)]
struct StatusOutput {
    welcome: String,
    total: usize,
    uncompleted_count: usize,
    completed_count: usize,
    pinned_count: usize,
    prompt: PromptState,
    hydration: Hydration,
    #[serde(skip_serializing_if = "Option::is_none")]
    backup: Option<String>,
    data_dir: PathBuf,
}

pub fn run(ctx: &SessionContext, session: &SessionArgs) -> Result<()> {
    let app = &ctx.app;
    let store = app.store();

    let output = StatusOutput {
        welcome: app.welcome(),
        total: store.len(),
        uncompleted_count: store.uncompleted_count(),
        completed_count: store.completed_count(),
        pinned_count: store.iter().filter(|task| task.is_pinned).count(),
        prompt: app.prompt(),
        hydration: app.hydration(),
        backup: app.backup().map(str::to_string),
        data_dir: ctx.data_dir.clone(),
    };

    let mut human = HumanOutput::new(output.welcome.clone());
    push_reminder(&mut human, output.prompt);
    human.push_summary("Total", output.total.to_string());
    human.push_summary("Uncompleted", output.uncompleted_count.to_string());
    human.push_summary("Completed", output.completed_count.to_string());
    human.push_summary("Pinned", output.pinned_count.to_string());
    human.push_summary("Data dir", output.data_dir.display().to_string());
    if output.hydration.is_seeded() {
        human.push_detail("Started from the example tasks");
    }
    if let Some(key) = &output.backup {
        human.push_warning(format!("Unreadable task list kept as {key}"));
    }
    if output.completed_count > 0 {
        human.push_next_step("todo clear");
    }

    emit_success(output_options(session), "status", &output, &human)
}
