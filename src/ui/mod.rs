//! Interactive terminal UI over the task list.

pub mod app;
pub mod editor;
mod view;

pub use app::run;
