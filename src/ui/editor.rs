use chrono::{DateTime, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::clock::Zone;
use crate::task::{format_deadline, parse_deadline, Priority, Task, TaskPatch};
use crate::validate::validate_name;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorKind {
    NewTask,
    EditTask,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorFieldId {
    Name,
    Priority,
    Deadline,
}

#[derive(Debug, Clone)]
pub struct EditorField {
    pub id: EditorFieldId,
    pub label: &'static str,
    pub value: String,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorSubmit {
    pub name: String,
    pub priority: Priority,
    pub deadline: Option<DateTime<Utc>>,
    /// False when the deadline text was left as pre-filled.
    pub deadline_changed: bool,
}

impl EditorSubmit {
    /// Field changes to apply to an existing task. An emptied deadline field
    /// clears the deadline; an untouched one leaves it alone.
    pub fn patch(&self) -> TaskPatch {
        TaskPatch {
            name: Some(self.name.clone()),
            priority: Some(self.priority),
            deadline: self.deadline_changed.then_some(self.deadline),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorAction {
    None,
    Cancel,
    Submit,
}

#[derive(Debug, Clone)]
pub struct EditorState {
    kind: EditorKind,
    fields: Vec<EditorField>,
    active: usize,
    error: Option<String>,
    /// Live name-length message, refreshed on every keystroke in the name field
    name_error: Option<String>,
    check_name: bool,
    default_priority: Priority,
    task_id: Option<String>,
    /// Stored deadline and the text it was shown as, so an untouched field
    /// keeps sub-minute precision.
    original_deadline: Option<DateTime<Utc>>,
    initial_deadline: String,
    zone: Zone,
}

impl EditorState {
    pub fn new_task(default_priority: Priority, zone: Zone) -> Self {
        Self {
            kind: EditorKind::NewTask,
            fields: vec![
                EditorField {
                    id: EditorFieldId::Name,
                    label: "Name",
                    value: String::new(),
                    required: true,
                },
                EditorField {
                    id: EditorFieldId::Priority,
                    label: "Priority",
                    value: String::new(),
                    required: false,
                },
                EditorField {
                    id: EditorFieldId::Deadline,
                    label: "Deadline",
                    value: String::new(),
                    required: false,
                },
            ],
            active: 0,
            error: None,
            name_error: None,
            check_name: true,
            default_priority,
            task_id: None,
            original_deadline: None,
            initial_deadline: String::new(),
            zone,
        }
    }

    /// Form pre-filled from `task`. `check_name` turns on the name-length
    /// rule for this form.
    pub fn edit_task(task: &Task, zone: Zone, check_name: bool) -> Self {
        let deadline = task
            .deadline
            .map(|deadline| format_deadline(deadline, &zone))
            .unwrap_or_default();
        Self {
            kind: EditorKind::EditTask,
            fields: vec![
                EditorField {
                    id: EditorFieldId::Name,
                    label: "Name",
                    value: task.name.clone(),
                    required: true,
                },
                EditorField {
                    id: EditorFieldId::Priority,
                    label: "Priority",
                    value: task.priority.to_string(),
                    required: false,
                },
                EditorField {
                    id: EditorFieldId::Deadline,
                    label: "Deadline",
                    value: deadline.clone(),
                    required: false,
                },
            ],
            active: 0,
            error: None,
            name_error: None,
            check_name,
            default_priority: task.priority,
            task_id: Some(task.id.clone()),
            original_deadline: task.deadline,
            initial_deadline: deadline,
            zone,
        }
    }

    pub fn kind(&self) -> EditorKind {
        self.kind
    }

    pub fn task_id(&self) -> Option<&str> {
        self.task_id.as_deref()
    }

    pub fn fields(&self) -> &[EditorField] {
        &self.fields
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn default_priority(&self) -> Priority {
        self.default_priority
    }

    /// The message to show under the form, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref().or(self.name_error.as_deref())
    }

    pub fn set_error(&mut self, message: String) {
        self.error = Some(message);
    }

    /// True when the submit key would currently be refused for the name.
    pub fn is_blocked(&self) -> bool {
        self.name_error.is_some()
            || (self.check_name && self.field_value(EditorFieldId::Name).is_empty())
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> EditorAction {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('u') {
            if let Some(field) = self.current_field_mut() {
                field.value.clear();
            }
            self.after_edit();
            return EditorAction::None;
        }

        match key.code {
            KeyCode::Esc => return EditorAction::Cancel,
            KeyCode::Tab | KeyCode::Down => self.move_active(1),
            KeyCode::BackTab | KeyCode::Up => self.move_active(-1),
            KeyCode::Enter => {
                if self.active + 1 >= self.fields.len() {
                    return self.attempt_submit();
                }
                self.move_active(1);
            }
            KeyCode::Backspace => {
                if let Some(field) = self.current_field_mut() {
                    field.value.pop();
                }
                self.after_edit();
            }
            KeyCode::Char(ch) => {
                if key.modifiers.contains(KeyModifiers::CONTROL) {
                    return EditorAction::None;
                }
                if !ch.is_control() {
                    if let Some(field) = self.current_field_mut() {
                        field.value.push(ch);
                    }
                }
                self.after_edit();
            }
            _ => {}
        }

        EditorAction::None
    }

    pub fn build_submit(&self) -> Result<EditorSubmit, String> {
        let name = self.field_value(EditorFieldId::Name).to_string();
        if self.check_name {
            if let Some(reason) = validate_name(&name).reason() {
                return Err(reason.to_string());
            }
        }

        let priority = match non_empty(self.field_value(EditorFieldId::Priority)) {
            Some(value) => value.parse::<Priority>()?,
            None => self.default_priority,
        };

        let text = self.field_value(EditorFieldId::Deadline).trim();
        let deadline_changed = text != self.initial_deadline;
        let deadline = if !deadline_changed {
            self.original_deadline
        } else {
            match non_empty(text) {
                Some(value) => {
                    Some(parse_deadline(&value, &self.zone).map_err(|err| err.to_string())?)
                }
                None => None,
            }
        };

        Ok(EditorSubmit {
            name,
            priority,
            deadline,
            deadline_changed,
        })
    }

    fn attempt_submit(&mut self) -> EditorAction {
        match self.build_submit() {
            Ok(_) => EditorAction::Submit,
            Err(err) => {
                self.error = Some(err);
                EditorAction::None
            }
        }
    }

    fn after_edit(&mut self) {
        self.error = None;
        let on_name = self
            .fields
            .get(self.active)
            .is_some_and(|field| field.id == EditorFieldId::Name);
        if self.check_name && on_name {
            self.name_error = validate_name(self.field_value(EditorFieldId::Name))
                .reason()
                .map(str::to_string);
        }
    }

    fn move_active(&mut self, delta: isize) {
        let len = self.fields.len() as isize;
        if len == 0 {
            self.active = 0;
            return;
        }
        let next = (self.active as isize + delta).rem_euclid(len);
        self.active = next as usize;
    }

    fn current_field_mut(&mut self) -> Option<&mut EditorField> {
        self.fields.get_mut(self.active)
    }

    fn field_value(&self, id: EditorFieldId) -> &str {
        self.fields
            .iter()
            .find(|field| field.id == id)
            .map(|field| field.value.as_str())
            .unwrap_or("")
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::name_length_message;

    fn utc() -> Zone {
        Zone::utc()
    }

    fn press(editor: &mut EditorState, code: KeyCode) -> EditorAction {
        editor.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_text(editor: &mut EditorState, text: &str) {
        for ch in text.chars() {
            press(editor, KeyCode::Char(ch));
        }
    }

    #[test]
    fn name_is_validated_while_typing() {
        let mut editor = EditorState::new_task(Priority::LOW, utc());
        assert!(editor.is_blocked());
        type_text(&mut editor, "A");
        assert_eq!(editor.error(), Some(name_length_message().as_str()));
        type_text(&mut editor, "B");
        assert_eq!(editor.error(), None);
        assert!(!editor.is_blocked());
        press(&mut editor, KeyCode::Backspace);
        assert!(editor.error().is_some());
    }

    #[test]
    fn submit_is_refused_for_short_name() {
        let mut editor = EditorState::new_task(Priority::LOW, utc());
        type_text(&mut editor, "A");
        for _ in 0..editor.fields().len() {
            assert_eq!(press(&mut editor, KeyCode::Enter), EditorAction::None);
        }
        assert_eq!(editor.error(), Some(name_length_message().as_str()));
    }

    #[test]
    fn complete_form_submits_with_defaults() {
        let mut editor = EditorState::new_task(Priority::MEDIUM, utc());
        type_text(&mut editor, "Buy milk");
        press(&mut editor, KeyCode::Enter);
        press(&mut editor, KeyCode::Enter);
        type_text(&mut editor, "2025-03-01 09:30");
        assert_eq!(press(&mut editor, KeyCode::Enter), EditorAction::Submit);

        let submit = editor.build_submit().expect("submit");
        assert_eq!(submit.name, "Buy milk");
        assert_eq!(submit.priority, Priority::MEDIUM);
        assert_eq!(
            submit.deadline.map(|ts| ts.to_rfc3339()),
            Some("2025-03-01T09:30:00+00:00".to_string())
        );
    }

    #[test]
    fn bad_priority_or_deadline_is_reported() {
        let mut editor = EditorState::new_task(Priority::LOW, utc());
        type_text(&mut editor, "Task");
        press(&mut editor, KeyCode::Tab);
        type_text(&mut editor, "9");
        press(&mut editor, KeyCode::Enter);
        assert_eq!(press(&mut editor, KeyCode::Enter), EditorAction::None);
        assert!(editor.error().is_some_and(|err| err.contains("priority")));

        press(&mut editor, KeyCode::Up);
        press(&mut editor, KeyCode::Backspace);
        press(&mut editor, KeyCode::Tab);
        type_text(&mut editor, "someday");
        assert_eq!(press(&mut editor, KeyCode::Enter), EditorAction::None);
        assert!(editor.error().is_some_and(|err| err.contains("deadline")));
    }

    #[test]
    fn edit_form_prefills_and_skips_length_rule_by_default() {
        let task = Task::new("Pay rent", Priority::HIGH, None);
        let mut editor = EditorState::edit_task(&task, utc(), false);
        assert_eq!(editor.task_id(), Some(task.id.as_str()));
        assert_eq!(editor.fields()[1].value, "1");

        press(&mut editor, KeyCode::Char('u'));
        editor.handle_key(KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL));
        type_text(&mut editor, "Z");
        assert_eq!(editor.error(), None);
        let submit = editor.build_submit().expect("submit");
        assert_eq!(submit.name, "Z");
        assert_eq!(submit.patch().deadline, None);
    }

    #[test]
    fn untouched_deadline_keeps_seconds() {
        let deadline = DateTime::parse_from_rfc3339("2025-03-01T09:30:45.123Z")
            .expect("ts")
            .with_timezone(&Utc);
        let task = Task::new("Pay rent", Priority::HIGH, Some(deadline));
        let editor = EditorState::edit_task(&task, utc(), false);
        assert_eq!(editor.fields()[2].value, "2025-03-01 09:30");

        let submit = editor.build_submit().expect("submit");
        assert_eq!(submit.deadline, Some(deadline));
        assert_eq!(submit.patch().deadline, None);
    }

    #[test]
    fn cleared_deadline_is_sent_as_removal() {
        let deadline = DateTime::parse_from_rfc3339("2025-03-01T09:30:00Z")
            .expect("ts")
            .with_timezone(&Utc);
        let task = Task::new("Pay rent", Priority::HIGH, Some(deadline));
        let mut editor = EditorState::edit_task(&task, utc(), false);
        press(&mut editor, KeyCode::Tab);
        press(&mut editor, KeyCode::Tab);
        editor.handle_key(KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL));

        let submit = editor.build_submit().expect("submit");
        assert_eq!(submit.patch().deadline, Some(None));
    }

    #[test]
    fn edit_form_accepts_empty_name_without_length_rule() {
        let task = Task::new("Pay rent", Priority::HIGH, None);
        let mut editor = EditorState::edit_task(&task, utc(), false);
        editor.handle_key(KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL));
        assert!(!editor.is_blocked());
        let submit = editor.build_submit().expect("submit");
        assert_eq!(submit.name, "");
    }

    #[test]
    fn escape_cancels() {
        let mut editor = EditorState::new_task(Priority::LOW, utc());
        assert_eq!(press(&mut editor, KeyCode::Esc), EditorAction::Cancel);
    }
}
