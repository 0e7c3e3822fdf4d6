use chrono::{DateTime, Utc};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

use crate::cli::tasks::{priority_marks, short_id};
use crate::clock::{Clock, Zone};
use crate::reminder::REMINDER_MESSAGE;
use crate::storage::BlobStore;
use crate::task::{format_deadline, Priority, Task};

use super::app::{AppState, DeleteConfirmState, StatusKind};
use super::editor::{EditorFieldId, EditorKind, EditorState};

const DONE_WIDTH: usize = 3;
const ID_WIDTH: usize = 8;
const PRIORITY_WIDTH: usize = 3;
const DEADLINE_WIDTH: usize = 16;
const HELP_KEY_WIDTH: usize = 14;
const LABEL_WIDTH: usize = 10;
const NARROW_WIDTH: u16 = 90;
const COLOR_TEXT: Color = Color::Rgb(234, 236, 239);
const COLOR_MUTED: Color = Color::Rgb(160, 165, 172);
const COLOR_MUTED_DARK: Color = Color::Rgb(118, 124, 130);
const COLOR_INFO: Color = Color::Rgb(116, 198, 219);
const COLOR_WARNING: Color = Color::Rgb(244, 200, 98);
const COLOR_ERROR: Color = Color::Rgb(255, 107, 107);
const COLOR_SUCCESS: Color = Color::Rgb(126, 210, 146);
const COLOR_ACCENT: Color = Color::Rgb(122, 170, 255);
const COLOR_BORDER_LIST: Color = Color::Rgb(92, 126, 166);
const COLOR_BORDER_DETAIL: Color = Color::Rgb(180, 156, 92);

pub fn render<S: BlobStore, C: Clock>(frame: &mut Frame, state: &AppState<S, C>) {
    let area = frame.size();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(area);
    let header = chunks[0];
    let main = chunks[1];
    let footer = chunks[2];

    render_header(frame, state, header);

    if main.width < NARROW_WIDTH {
        render_list(frame, state, main);
    } else {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(62), Constraint::Percentage(38)].as_ref())
            .split(main);
        render_list(frame, state, chunks[0]);
        render_detail(frame, state, chunks[1]);
    }

    render_footer(frame, state, footer);

    if let Some(editor) = state.editor.as_ref() {
        render_editor_modal(frame, area, editor);
    }
    if let Some(confirm) = state.delete_confirm.as_ref() {
        render_delete_confirm_modal(frame, area, confirm);
    }
    if state.prompt_visible() {
        render_reminder_modal(frame, area);
    }
}

fn render_header<S: BlobStore, C: Clock>(frame: &mut Frame, state: &AppState<S, C>, area: Rect) {
    let line = Line::from(vec![
        Span::styled(
            " todo ",
            Style::default()
                .fg(COLOR_ACCENT)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(state.app.welcome(), Style::default().fg(COLOR_TEXT)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_list<S: BlobStore, C: Clock>(frame: &mut Frame, state: &AppState<S, C>, area: Rect) {
    let mut lines = Vec::new();
    let content_width = area.width.saturating_sub(2) as usize;
    let help_lines = if state.show_help {
        build_list_help_lines(content_width)
    } else {
        Vec::new()
    };
    let help_reserved = if help_lines.is_empty() {
        0
    } else {
        help_lines.len() + 1
    };

    let view = state.app.view();
    let tasks = view.tasks;
    if tasks.is_empty() {
        lines.push(Line::from(Span::styled(
            "No tasks registered.",
            Style::default().fg(COLOR_MUTED),
        )));
    } else {
        let now = state.app.now().with_timezone(&Utc);
        let zone = state.app.zone();
        let list_height = area
            .height
            .saturating_sub(2)
            .saturating_sub(help_reserved as u16) as usize;
        let (start, end) = list_window(tasks.len(), Some(state.selected), list_height);
        for (idx, task) in tasks.iter().enumerate().take(end).skip(start) {
            lines.push(render_list_row(
                task,
                idx == state.selected,
                &zone,
                &now,
                content_width,
            ));
        }
    }

    if !help_lines.is_empty() {
        lines.push(Line::from(""));
        lines.extend(help_lines);
    }

    let widget = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Tasks")
                .border_style(Style::default().fg(COLOR_BORDER_LIST)),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(widget, area);
}

fn render_detail<S: BlobStore, C: Clock>(frame: &mut Frame, state: &AppState<S, C>, area: Rect) {
    let content_width = area.width.saturating_sub(2) as usize;
    let lines = match state.selected_task() {
        Some(task) => build_detail_lines(task, &state.app.zone(), content_width),
        None => vec![Line::from(Span::styled(
            "Nothing selected",
            Style::default().fg(COLOR_MUTED),
        ))],
    };
    let widget = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Details")
                .border_style(Style::default().fg(COLOR_BORDER_DETAIL)),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(widget, area);
}

fn render_footer<S: BlobStore, C: Clock>(frame: &mut Frame, state: &AppState<S, C>, area: Rect) {
    let hint_span = Span::styled(state.footer_hint(), Style::default().fg(COLOR_INFO));
    let line = if let Some((status, kind)) = state.status_line() {
        let status_style = match kind {
            StatusKind::Error => Style::default()
                .fg(COLOR_ERROR)
                .add_modifier(Modifier::BOLD),
            StatusKind::Info => Style::default().fg(COLOR_WARNING),
        };
        Line::from(vec![
            hint_span,
            Span::raw("  |  "),
            Span::styled(status.to_string(), status_style),
        ])
    } else {
        Line::from(hint_span)
    };
    let counts_line = Line::from(Span::styled(
        state.count_summary(),
        Style::default().fg(COLOR_ACCENT),
    ));
    let widget = Paragraph::new(vec![line, counts_line])
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::TOP)
                .border_style(Style::default().fg(COLOR_BORDER_LIST)),
        );
    frame.render_widget(widget, area);
}

fn render_editor_modal(frame: &mut Frame, area: Rect, editor: &EditorState) {
    let content_width = area.width.saturating_sub(8).min(72);
    let modal = centered_rect(content_width, 11, area);
    frame.render_widget(Clear, modal);

    let title = match (editor.kind(), editor.task_id()) {
        (EditorKind::EditTask, Some(id)) => format!("Edit Task {}", short_id(id)),
        (EditorKind::EditTask, None) => "Edit Task".to_string(),
        (EditorKind::NewTask, _) => "New Task".to_string(),
    };
    let lines = build_editor_lines(editor, content_width.saturating_sub(2) as usize);
    let widget = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(Style::default().fg(COLOR_BORDER_DETAIL)),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(widget, modal);
}

fn render_delete_confirm_modal(frame: &mut Frame, area: Rect, state: &DeleteConfirmState) {
    let content_width = area.width.saturating_sub(8).min(64);
    let height = 8u16.min(area.height.saturating_sub(6).max(7));
    let modal = centered_rect(content_width, height, area);
    frame.render_widget(Clear, modal);

    let name_width = (content_width as usize).saturating_sub(8);
    let lines = vec![
        Line::from(Span::styled(
            "Delete task?",
            Style::default()
                .fg(COLOR_ERROR)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            label_span("ID: "),
            Span::styled(short_id(&state.task_id).to_string(), id_style()),
        ]),
        Line::from(vec![
            label_span("Name: "),
            Span::styled(
                truncate_text(&state.name, name_width),
                Style::default().fg(COLOR_TEXT),
            ),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "enter/y confirm  esc/n cancel",
            Style::default().fg(COLOR_MUTED_DARK),
        )),
    ];

    let widget = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Delete Task"))
        .wrap(Wrap { trim: true });
    frame.render_widget(widget, modal);
}

fn render_reminder_modal(frame: &mut Frame, area: Rect) {
    let content_width = area.width.saturating_sub(8).min(56);
    let modal = centered_rect(content_width, 7, area);
    frame.render_widget(Clear, modal);

    let lines = vec![
        Line::from(Span::styled(
            REMINDER_MESSAGE,
            Style::default()
                .fg(COLOR_WARNING)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "enter/esc close",
            Style::default().fg(COLOR_MUTED_DARK),
        )),
    ];
    let widget = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Reminder")
                .border_style(Style::default().fg(COLOR_WARNING)),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(widget, modal);
}

fn build_editor_lines(editor: &EditorState, width: usize) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();
    let value_width = width.saturating_sub(LABEL_WIDTH + 2);
    for (idx, field) in editor.fields().iter().enumerate() {
        let is_active = idx == editor.active_index();
        let label = pad_text(field.label, LABEL_WIDTH);
        let placeholder = if field.value.is_empty() && !is_active {
            Some(match field.id {
                _ if field.required => "<required>".to_string(),
                EditorFieldId::Priority => format!("(default {})", editor.default_priority()),
                EditorFieldId::Deadline => "(optional, YYYY-MM-DD HH:MM)".to_string(),
                EditorFieldId::Name => "(optional)".to_string(),
            })
        } else {
            None
        };

        let mut spans = vec![
            Span::styled(label, Style::default().fg(COLOR_TEXT)),
            Span::raw(" "),
        ];
        match placeholder {
            Some(text) => spans.push(Span::styled(
                truncate_text(&text, value_width),
                Style::default().fg(COLOR_MUTED),
            )),
            None => {
                // Keep the tail of long input visible next to the caret.
                let visible = tail_text(&field.value, value_width.saturating_sub(1));
                spans.push(Span::styled(visible, Style::default().fg(COLOR_TEXT)));
                if is_active {
                    spans.push(Span::styled(
                        " ",
                        Style::default().add_modifier(Modifier::REVERSED),
                    ));
                }
            }
        }
        if is_active {
            spans[0].style = spans[0].style.add_modifier(Modifier::BOLD).fg(COLOR_ACCENT);
        }
        lines.push(Line::from(spans));
    }

    lines.push(Line::from(""));
    match editor.error() {
        Some(error) => lines.push(Line::from(Span::styled(
            error.to_string(),
            Style::default()
                .fg(COLOR_ERROR)
                .add_modifier(Modifier::BOLD),
        ))),
        None => lines.push(Line::from("")),
    }

    lines.push(Line::from(""));
    lines.push(help_line("tab/shift+tab", "next or previous field", width));
    if editor.is_blocked() {
        lines.push(disabled_help_line("enter", "save unavailable until the name is valid", width));
    } else {
        lines.push(help_line("enter", "next field, save on the last", width));
    }
    lines.push(help_line("esc", "cancel", width));
    lines
}

fn build_list_help_lines(width: usize) -> Vec<Line<'static>> {
    vec![
        help_header("More commands"),
        help_line("j/k or up/down", "move selection", width),
        help_line("g/G", "first or last task", width),
        help_line("a/n", "new task", width),
        help_line("e/enter", "edit task", width),
        help_line("space/x", "toggle done", width),
        help_line("p", "toggle pin", width),
        help_line("d", "delete task", width),
        help_line("C", "remove completed tasks", width),
        help_line("q/esc", "quit", width),
        help_line("?", "hide help", width),
    ]
}

fn build_detail_lines(task: &Task, zone: &Zone, width: usize) -> Vec<Line<'static>> {
    let value_width = width.saturating_sub(LABEL_WIDTH);
    let deadline = task
        .deadline
        .map(|deadline| format_deadline(deadline, zone))
        .unwrap_or_else(|| "none".to_string());
    vec![
        Line::from(vec![
            label_span(&pad_text("ID", LABEL_WIDTH)),
            Span::styled(truncate_text(&task.id, value_width), id_style()),
        ]),
        Line::from(vec![
            label_span(&pad_text("Name", LABEL_WIDTH)),
            Span::styled(task.name.clone(), Style::default().fg(COLOR_TEXT)),
        ]),
        Line::from(vec![
            label_span(&pad_text("Priority", LABEL_WIDTH)),
            Span::styled(
                format!("{} ({})", task.priority, priority_marks(task.priority)),
                Style::default().fg(priority_color(task.priority)),
            ),
        ]),
        Line::from(vec![
            label_span(&pad_text("Deadline", LABEL_WIDTH)),
            Span::styled(deadline, Style::default().fg(COLOR_TEXT)),
        ]),
        Line::from(vec![
            label_span(&pad_text("Done", LABEL_WIDTH)),
            yes_no_span(task.is_done),
        ]),
        Line::from(vec![
            label_span(&pad_text("Pinned", LABEL_WIDTH)),
            yes_no_span(task.is_pinned),
        ]),
    ]
}

fn render_list_row(
    task: &Task,
    selected: bool,
    zone: &Zone,
    now: &DateTime<Utc>,
    width: usize,
) -> Line<'static> {
    let done_text = if task.is_done { "[x]" } else { "[ ]" };
    let pin_text = if task.is_pinned { "*" } else { " " };
    let deadline_text = task
        .deadline
        .map(|deadline| format_deadline(deadline, zone))
        .unwrap_or_default();
    let used = 1 + DONE_WIDTH + 1 + ID_WIDTH + 1 + 1 + 1 + PRIORITY_WIDTH + 1 + DEADLINE_WIDTH + 1;
    let name = truncate_text(&task.name, width.saturating_sub(used));

    let done_style = if task.is_done {
        Style::default().fg(COLOR_SUCCESS)
    } else {
        Style::default().fg(COLOR_MUTED)
    };
    let name_style = if task.is_done {
        Style::default()
            .fg(COLOR_MUTED_DARK)
            .add_modifier(Modifier::CROSSED_OUT)
    } else {
        Style::default().fg(COLOR_TEXT)
    };

    let mut spans = vec![
        Span::raw(" "),
        Span::styled(done_text, done_style),
        Span::raw(" "),
        Span::styled(pad_text(short_id(&task.id), ID_WIDTH), id_style()),
        Span::raw(" "),
        Span::styled(pin_text, Style::default().fg(COLOR_WARNING)),
        Span::raw(" "),
        Span::styled(
            pad_text(&priority_marks(task.priority), PRIORITY_WIDTH),
            Style::default()
                .fg(priority_color(task.priority))
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(
            pad_text(&deadline_text, DEADLINE_WIDTH),
            deadline_style(task, now),
        ),
        Span::raw(" "),
        Span::styled(name, name_style),
    ];

    if selected {
        for span in &mut spans {
            span.style = span.style.add_modifier(Modifier::REVERSED);
        }
    }

    Line::from(spans)
}

fn deadline_style(task: &Task, now: &DateTime<Utc>) -> Style {
    match task.deadline {
        Some(deadline) if !task.is_done && deadline < *now => Style::default().fg(COLOR_ERROR),
        Some(_) => Style::default().fg(COLOR_INFO),
        None => Style::default().fg(COLOR_MUTED_DARK),
    }
}

fn priority_color(priority: Priority) -> Color {
    match priority.value() {
        1 => Color::Rgb(255, 147, 112),
        2 => COLOR_WARNING,
        _ => COLOR_ACCENT,
    }
}

fn yes_no_span(value: bool) -> Span<'static> {
    if value {
        Span::styled("yes", Style::default().fg(COLOR_SUCCESS))
    } else {
        Span::styled("no", Style::default().fg(COLOR_MUTED))
    }
}

fn help_header(title: &str) -> Line<'static> {
    Line::from(Span::styled(
        title.to_string(),
        Style::default().fg(COLOR_INFO).add_modifier(Modifier::BOLD),
    ))
}

fn help_line(keys: &str, desc: &str, width: usize) -> Line<'static> {
    let key_text = pad_text(keys, HELP_KEY_WIDTH.min(width));
    let desc_width = width.saturating_sub(HELP_KEY_WIDTH + 1);
    let desc_text = truncate_text(desc, desc_width);
    Line::from(vec![
        Span::styled(
            key_text,
            Style::default()
                .fg(COLOR_ACCENT)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(desc_text, Style::default().fg(COLOR_MUTED)),
    ])
}

fn disabled_help_line(keys: &str, desc: &str, width: usize) -> Line<'static> {
    let dim = Style::default()
        .fg(COLOR_MUTED_DARK)
        .add_modifier(Modifier::DIM);
    Line::from(vec![
        Span::styled(pad_text(keys, HELP_KEY_WIDTH.min(width)), dim),
        Span::raw(" "),
        Span::styled(truncate_text(desc, width.saturating_sub(HELP_KEY_WIDTH + 1)), dim),
    ])
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width.saturating_sub(2));
    let height = height.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

fn list_window(total: usize, selected: Option<usize>, height: usize) -> (usize, usize) {
    if total == 0 || height == 0 {
        return (0, 0);
    }
    if total <= height {
        return (0, total);
    }
    let selected = selected.unwrap_or(0);
    let mut start = selected.saturating_sub(height / 2);
    if start + height > total {
        start = total - height;
    }
    (start, start + height)
}

fn pad_text(value: &str, width: usize) -> String {
    let text = truncate_text(value, width);
    format!("{text:width$}")
}

fn truncate_text(value: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= max {
        return value.to_string();
    }
    if max <= 3 {
        return chars[..max].iter().collect();
    }
    let mut out: String = chars[..(max - 3)].iter().collect();
    out.push_str("...");
    out
}

fn tail_text(value: &str, max: usize) -> String {
    let chars: Vec<char> = value.chars().collect();
    let start = chars.len().saturating_sub(max);
    chars[start..].iter().collect()
}

fn label_span(label: &str) -> Span<'static> {
    Span::styled(label.to_string(), Style::default().fg(COLOR_MUTED_DARK))
}

fn id_style() -> Style {
    Style::default()
        .fg(COLOR_MUTED)
        .add_modifier(Modifier::BOLD)
}
