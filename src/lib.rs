//! todo - single-user to-do list
//!
//! Tasks carry a name, a priority (1 = high, 3 = low), an optional deadline,
//! a done flag and a pin flag. The list is kept in a small key-value blob
//! store on disk and shown through a CLI or an interactive terminal UI.
//!
//! # Module Organization
//!
//! - `task`: Task records, priorities and the ordered task store
//! - `validate`: Task name rules
//! - `storage`: Blob store and persistence of tasks and the last-access marker
//! - `reminder`: New-day reminder evaluated at startup
//! - `clock`: Injectable time source
//! - `app`: Session controller tying store, persistence and reminder together
//! - `config`: Configuration loading from `config.toml`
//! - `cli`: Command-line interface using clap
//! - `output`: Human and JSON output envelopes
//! - `ui`: Terminal UI built on ratatui
//! - `error`: Error types and result aliases
//! - `lock`: File locking and atomic writes

pub mod app;
pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod lock;
pub mod output;
pub mod reminder;
pub mod storage;
pub mod task;
pub mod ui;
pub mod validate;

pub use error::{Error, Result};
