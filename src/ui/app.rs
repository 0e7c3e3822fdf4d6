use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use crate::app::{Intent, Outcome, TodoApp};
use crate::clock::Clock;
use crate::error::Result;
use crate::reminder::PromptState;
use crate::storage::BlobStore;
use crate::task::Task;

use super::editor::{EditorAction, EditorKind, EditorState};
use super::view;

const EVENT_POLL_MS: u64 = 120;

#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum StatusKind {
    Error,
    Info,
}

pub(crate) struct DeleteConfirmState {
    pub(crate) task_id: String,
    pub(crate) name: String,
}

pub struct AppState<S: BlobStore, C: Clock> {
    pub(crate) app: TodoApp<S, C>,
    pub(crate) selected: usize,
    pub(crate) editor: Option<EditorState>,
    pub(crate) delete_confirm: Option<DeleteConfirmState>,
    pub(crate) show_help: bool,
    status_message: Option<(String, StatusKind)>,
}

impl<S: BlobStore, C: Clock> AppState<S, C> {
    pub fn new(app: TodoApp<S, C>) -> Self {
        Self {
            app,
            selected: 0,
            editor: None,
            delete_confirm: None,
            show_help: false,
            status_message: None,
        }
    }

    pub(crate) fn selected_task(&self) -> Option<&Task> {
        self.app.tasks().get(self.selected)
    }

    pub(crate) fn prompt_visible(&self) -> bool {
        self.app.prompt() == PromptState::Shown
    }

    pub(crate) fn status_line(&self) -> Option<(&str, StatusKind)> {
        self.status_message
            .as_ref()
            .map(|(message, kind)| (message.as_str(), *kind))
    }

    pub(crate) fn footer_hint(&self) -> &'static str {
        if self.prompt_visible() {
            "enter/esc close"
        } else if self.editor.is_some() {
            "tab next field  enter next/save  ctrl+u clear  esc cancel"
        } else if self.delete_confirm.is_some() {
            "enter/y delete  esc/n cancel"
        } else {
            "a add  e edit  space done  p pin  d delete  C clear done  ? help  q quit"
        }
    }

    pub(crate) fn count_summary(&self) -> String {
        let view = self.app.view();
        format!(
            "{} tasks  {} uncompleted",
            view.tasks.len(),
            view.uncompleted_count
        )
    }

    fn set_info(&mut self, message: impl Into<String>) {
        self.status_message = Some((message.into(), StatusKind::Info));
    }

    fn set_error(&mut self, message: impl Into<String>) {
        self.status_message = Some((message.into(), StatusKind::Error));
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self.app.tasks().len();
        if len == 0 {
            self.selected = 0;
            return;
        }
        let next = (self.selected as isize + delta).clamp(0, len as isize - 1);
        self.selected = next as usize;
    }

    fn clamp_selection(&mut self) {
        let len = self.app.tasks().len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }

    fn select_id(&mut self, id: &str) {
        if let Some(pos) = self.app.tasks().iter().position(|task| task.id == id) {
            self.selected = pos;
        }
    }

    fn open_new_task(&mut self) {
        let zone = self.app.zone();
        self.editor = Some(EditorState::new_task(self.app.default_priority(), zone));
    }

    fn open_edit_task(&mut self) {
        let Some(id) = self.selected_task().map(|task| task.id.clone()) else {
            self.set_error("no task selected");
            return;
        };
        if self.app.dispatch(Intent::EditOpen(id)) == Outcome::Unchanged {
            self.set_error("task no longer exists");
            return;
        }
        let zone = self.app.zone();
        let check_name = self.app.validates_on_edit();
        self.editor = self
            .app
            .editing()
            .map(|task| EditorState::edit_task(task, zone, check_name));
    }

    fn submit_editor(&mut self, mut editor: EditorState) {
        let submit = match editor.build_submit() {
            Ok(submit) => submit,
            Err(err) => {
                editor.set_error(err);
                self.editor = Some(editor);
                return;
            }
        };

        match editor.kind() {
            EditorKind::NewTask => {
                let outcome = self.app.dispatch(Intent::Add {
                    name: submit.name.clone(),
                    priority: submit.priority,
                    deadline: submit.deadline,
                });
                match outcome {
                    Outcome::Added(id) => {
                        self.select_id(&id);
                        self.set_info(format!("added {}", submit.name));
                    }
                    Outcome::Rejected(reason) => {
                        editor.set_error(reason);
                        self.editor = Some(editor);
                    }
                    Outcome::Updated | Outcome::Unchanged => {}
                }
            }
            EditorKind::EditTask => {
                let Some(draft) = self.app.editing().cloned() else {
                    self.set_error("task no longer exists");
                    return;
                };
                let revised = draft.revised(&submit.patch());
                match self.app.dispatch(Intent::EditSave(revised)) {
                    Outcome::Rejected(reason) => {
                        editor.set_error(reason);
                        self.editor = Some(editor);
                    }
                    Outcome::Updated => self.set_info("task updated"),
                    Outcome::Unchanged | Outcome::Added(_) => self.set_info("no change"),
                }
            }
        }
    }

    fn cancel_editor(&mut self, editor: &EditorState) {
        if editor.kind() == EditorKind::EditTask {
            self.app.dispatch(Intent::EditCancel);
        }
        self.set_info("cancelled");
    }
}

/// Run the interactive UI until the user quits.
pub fn run<S: BlobStore, C: Clock>(app: TodoApp<S, C>) -> Result<()> {
    let mut state = AppState::new(app);
    run_terminal(&mut state)
}

fn run_terminal<S: BlobStore, C: Clock>(state: &mut AppState<S, C>) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_loop(&mut terminal, state);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_loop<S: BlobStore, C: Clock>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    state: &mut AppState<S, C>,
) -> Result<()> {
    let mut dirty = true;
    loop {
        if dirty {
            terminal.draw(|frame| view::render(frame, state))?;
            dirty = false;
        }

        if event::poll(Duration::from_millis(EVENT_POLL_MS))? {
            match event::read()? {
                Event::Key(key) => {
                    if handle_key(state, key) {
                        break;
                    }
                    dirty = true;
                }
                Event::Resize(_, _) => dirty = true,
                _ => {}
            }
        }
    }
    Ok(())
}

/// Apply one key press. Returns true when the UI should exit.
pub(crate) fn handle_key<S: BlobStore, C: Clock>(
    state: &mut AppState<S, C>,
    key: KeyEvent,
) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return true;
    }

    // The reminder blocks everything else until it is closed.
    if state.prompt_visible() {
        if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
            state.app.dispatch(Intent::DismissPrompt);
        }
        return false;
    }

    if let Some(confirm) = state.delete_confirm.take() {
        match key.code {
            KeyCode::Char('y') | KeyCode::Enter => {
                state.app.dispatch(Intent::Delete(confirm.task_id));
                state.clamp_selection();
                state.set_info(format!("deleted {}", confirm.name));
            }
            KeyCode::Char('n') | KeyCode::Char('q') | KeyCode::Esc => {
                state.set_info("cancelled");
            }
            _ => state.delete_confirm = Some(confirm),
        }
        return false;
    }

    if let Some(mut editor) = state.editor.take() {
        match editor.handle_key(key) {
            EditorAction::None => state.editor = Some(editor),
            EditorAction::Cancel => state.cancel_editor(&editor),
            EditorAction::Submit => state.submit_editor(editor),
        }
        return false;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return true,
        KeyCode::Char('j') | KeyCode::Down => state.move_selection(1),
        KeyCode::Char('k') | KeyCode::Up => state.move_selection(-1),
        KeyCode::Char('g') | KeyCode::Home => state.selected = 0,
        KeyCode::Char('G') | KeyCode::End => state.move_selection(isize::MAX / 2),
        KeyCode::Char('?') => state.show_help = !state.show_help,
        KeyCode::Char('a') | KeyCode::Char('n') => state.open_new_task(),
        KeyCode::Char('e') | KeyCode::Enter => state.open_edit_task(),
        KeyCode::Char(' ') | KeyCode::Char('x') => {
            if let Some(task) = state.selected_task() {
                let intent = Intent::ToggleDone {
                    id: task.id.clone(),
                    value: !task.is_done,
                };
                state.app.dispatch(intent);
            }
        }
        KeyCode::Char('p') => {
            if let Some(id) = state.selected_task().map(|task| task.id.clone()) {
                state.app.dispatch(Intent::TogglePin(id));
            }
        }
        KeyCode::Char('d') | KeyCode::Delete => {
            if let Some(task) = state.selected_task() {
                state.delete_confirm = Some(DeleteConfirmState {
                    task_id: task.id.clone(),
                    name: task.name.clone(),
                });
            }
        }
        KeyCode::Char('C') => {
            let removed = state.app.remove_all_completed();
            state.clamp_selection();
            state.set_info(format!("removed {removed} completed"));
        }
        _ => {}
    }
    false
}
