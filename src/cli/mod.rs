//! Command-line interface for todo
//!
//! This module defines the CLI structure using clap derive macros.
//! Command handlers live in submodules.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::app::TodoApp;
use crate::clock::{Clock, FixedClock, SystemClock};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::reminder::{PromptState, REMINDER_MESSAGE};
use crate::storage::FileBlobStore;
use crate::task::Priority;

mod status;
pub(crate) mod tasks;

/// todo - a small personal to-do list
///
/// Tasks have a name, a priority (1 = highest, 3 = lowest) and an optional
/// deadline. State lives in a data directory and persists between runs.
#[derive(Parser, Debug)]
#[command(name = "todo")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Directory holding tasks and config (defaults to the platform data dir)
    #[arg(long, global = true, env = "TODO_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Pretend the current time is this RFC 3339 timestamp
    #[arg(long, global = true, env = "TODO_NOW", hide = true)]
    pub now: Option<String>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add a task
    Add {
        /// Task name (2-32 characters)
        name: String,

        /// Priority: 1 (highest) to 3 (lowest)
        #[arg(short, long)]
        priority: Option<Priority>,

        /// Deadline: YYYY-MM-DD, "YYYY-MM-DD HH:MM", or RFC 3339
        #[arg(short, long)]
        deadline: Option<String>,
    },

    /// List tasks in insertion order
    #[command(visible_alias = "ls")]
    List,

    /// Mark a task as done
    Done {
        /// Task id or unique id prefix
        id: String,
    },

    /// Mark a task as not done
    Undone {
        /// Task id or unique id prefix
        id: String,
    },

    /// Toggle the pin marker on a task
    Pin {
        /// Task id or unique id prefix
        id: String,
    },

    /// Edit a task's name, priority or deadline
    Edit {
        /// Task id or unique id prefix
        id: String,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New priority (1-3)
        #[arg(short, long)]
        priority: Option<Priority>,

        /// New deadline
        #[arg(short, long, conflicts_with = "clear_deadline")]
        deadline: Option<String>,

        /// Remove the deadline
        #[arg(long)]
        clear_deadline: bool,
    },

    /// Delete a task
    #[command(visible_alias = "remove")]
    Rm {
        /// Task id or unique id prefix
        id: String,
    },

    /// Delete every completed task
    Clear,

    /// Show the welcome message, counts and reminder
    Status,

    /// Open the interactive terminal UI
    Ui,
}

impl Cli {
    /// Execute the CLI command
    ///
    /// A failure after the session opened still carries the daily reminder,
    /// since opening the session already consumed the last-access marker.
    pub fn run(self) -> std::result::Result<(), Failure> {
        let session = SessionArgs {
            data_dir: self.data_dir,
            now: self.now,
            json: self.json,
            quiet: self.quiet,
        };
        let mut ctx = open_session(&session)?;
        let prompt = ctx.app.prompt();
        let app = &mut ctx.app;

        let result = match self.command {
            Commands::Add {
                name,
                priority,
                deadline,
            } => tasks::run_add(
                app,
                tasks::AddOptions {
                    name,
                    priority,
                    deadline,
                    session,
                },
            ),
            Commands::List => tasks::run_list(app, &session),
            Commands::Done { id } => tasks::run_set_done(
                app,
                tasks::SetDoneOptions {
                    id,
                    value: true,
                    session,
                },
            ),
            Commands::Undone { id } => tasks::run_set_done(
                app,
                tasks::SetDoneOptions {
                    id,
                    value: false,
                    session,
                },
            ),
            Commands::Pin { id } => tasks::run_pin(app, tasks::IdOptions { id, session }),
            Commands::Edit {
                id,
                name,
                priority,
                deadline,
                clear_deadline,
            } => tasks::run_edit(
                app,
                tasks::EditOptions {
                    id,
                    name,
                    priority,
                    deadline,
                    clear_deadline,
                    session,
                },
            ),
            Commands::Rm { id } => tasks::run_remove(app, tasks::IdOptions { id, session }),
            Commands::Clear => tasks::run_clear(app, &session),
            Commands::Status => status::run(&ctx, &session),
            // The terminal UI shows the reminder itself.
            Commands::Ui => return crate::ui::run(ctx.app).map_err(Failure::from),
        };

        result.map_err(|error| {
            let mut failure = Failure::from(error);
            if prompt == PromptState::Shown {
                failure.warnings.push(REMINDER_MESSAGE.to_string());
            }
            failure
        })
    }
}

/// A failed command, plus warnings that should still reach the user.
#[derive(Debug)]
pub struct Failure {
    pub error: Error,
    pub warnings: Vec<String>,
}

impl Failure {
    pub fn exit_code(&self) -> i32 {
        self.error.exit_code()
    }
}

impl From<Error> for Failure {
    fn from(error: Error) -> Self {
        Self {
            error,
            warnings: Vec::new(),
        }
    }
}

/// Global options shared by every command.
#[derive(Debug, Clone)]
pub struct SessionArgs {
    pub data_dir: Option<PathBuf>,
    pub now: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

pub type SessionApp = TodoApp<FileBlobStore, Box<dyn Clock>>;

pub struct SessionContext {
    pub app: SessionApp,
    pub data_dir: PathBuf,
}

/// Resolve the data directory, load config and start a controller session.
pub fn open_session(args: &SessionArgs) -> Result<SessionContext> {
    let data_dir = resolve_data_dir(args.data_dir.as_deref())?;
    let config = Config::load_from_dir(&data_dir)?;
    let blobs = FileBlobStore::with_timeout(&data_dir, config.storage.lock_timeout_ms)?;
    let clock: Box<dyn Clock> = match args.now.as_deref() {
        Some(value) => Box::new(FixedClock::parse(value)?),
        None => Box::new(SystemClock),
    };
    tracing::debug!(data_dir = %data_dir.display(), "opening session");

    let app = TodoApp::startup(blobs, clock, &config);
    Ok(SessionContext { app, data_dir })
}

fn resolve_data_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir.to_path_buf());
    }
    directories::ProjectDirs::from("", "", "todo")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| {
            Error::OperationFailed(
                "could not determine a data directory; pass --data-dir".to_string(),
            )
        })
}
