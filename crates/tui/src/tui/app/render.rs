use std::cmp::min;

use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, Borders, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table, Wrap,
};
use ratatui::Frame;

use crate::core::DropTarget;
use crate::model::DateKey;
use crate::tui::constants::APP_VERSION;
use crate::tui::helpers::{
    accent_color, accent_title, avatar_color, background_color, build_help_lines, centered_rect,
    day_label, format_task_detail_entries, inset_rect, short_id, BG_ACCENT, BG_PANEL,
};
use crate::tui::layout::RowKind;

use super::settings::SettingsItem;
use super::{App, ConfirmAction, ConfirmChoice, InputMode};

impl App {
    pub(crate) fn draw(&mut self, f: &mut Frame<'_>) {
        let size = f.size();
        let background = background_color(self.session.settings().background);
        f.render_widget(Clear, size);
        f.render_widget(Block::default().style(Style::default().bg(background)), size);
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(5),
                Constraint::Length(2),
            ])
            .split(size);

        self.draw_header(f, chunks[0]);
        self.draw_body(f, chunks[1]);
        self.draw_footer(f, chunks[2]);

        match self.input_mode {
            InputMode::Add
            | InputMode::Edit
            | InputMode::GoTo
            | InputMode::Search
            | InputMode::Title
            | InputMode::JoinCode => self.draw_input_overlay(f, size),
            InputMode::Settings => self.draw_settings_overlay(f, size),
            InputMode::Inspect => self.draw_detail_overlay(f, size),
            InputMode::Help => self.draw_help_overlay(f, size),
            InputMode::Confirm => self.draw_confirm_overlay(f, size),
            InputMode::Permission => self.draw_permission_overlay(f, size),
            InputMode::Normal => {}
        }
    }

    fn accent(&self) -> Color {
        accent_color(self.session.settings().accent)
    }

    fn draw_header(&self, f: &mut Frame<'_>, area: Rect) {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(area);
        let accent = self.accent();
        let settings = self.session.settings();

        let mut left_spans = vec![
            Span::styled(
                format!(" {} ", self.session.header_title()),
                Style::default().fg(accent).add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!("· {}", day_label(self.session.active_date()))),
            Span::raw("  "),
            Span::styled(
                format!("v{}", APP_VERSION),
                Style::default().fg(Color::DarkGray),
            ),
        ];
        if self.session.drag().is_dragging() {
            left_spans.push(Span::raw("  "));
            left_spans.push(Span::styled(
                "⇅ moving",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ));
        }
        f.render_widget(Paragraph::new(Line::from(left_spans)), cols[0]);

        let profile = self.session.profile();
        let mut right_spans = Vec::new();
        if settings.is_shared {
            right_spans.push(Span::styled(
                format!("👥 {} ", settings.connected_users.len()),
                Style::default().fg(Color::Cyan),
            ));
        }
        right_spans.push(Span::styled(
            format!("[{}]", profile.initials()),
            Style::default()
                .fg(avatar_color(profile.avatar_color))
                .add_modifier(Modifier::BOLD),
        ));
        right_spans.push(Span::raw(format!(" {} ", profile.name)));
        f.render_widget(
            Paragraph::new(Line::from(right_spans)).alignment(Alignment::Right),
            cols[1],
        );
    }

    fn draw_body(&mut self, f: &mut Frame<'_>, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .style(Style::default().bg(BG_PANEL));
        let inner = block.inner(area);
        f.render_widget(block, area);
        if inner.width == 0 || inner.height == 0 {
            return;
        }
        self.set_viewport_rows(inner.height as usize);

        let accent = self.accent();
        let active = self.session.active_date();
        let today = self.session.today();
        let dragged = self.session.drag().dragged_id().map(str::to_string);
        let hover = self.session.drag().target().cloned();

        let lines: Vec<Line> = self
            .layout
            .rows()
            .iter()
            .enumerate()
            .skip(self.scroll)
            .take(inner.height as usize)
            .map(|(index, row)| {
                let mut line = self.row_line(row, accent, active == row.date(), today);
                let hovered = match (&hover, row) {
                    (Some(DropTarget::Row { task_id, .. }), RowKind::Task { id, .. }) => {
                        task_id == id
                    }
                    (Some(DropTarget::Day(date)), RowKind::Day { date: d, .. }) => date == d,
                    _ => false,
                };
                if row.task_id().is_some() && row.task_id() == dragged.as_deref() {
                    line.spans.insert(0, Span::styled("⇅ ", Style::default().fg(Color::Yellow)));
                }
                if index == self.cursor {
                    line.style = Style::default().bg(BG_ACCENT).add_modifier(Modifier::BOLD);
                } else if hovered {
                    line.style = Style::default().bg(Color::Rgb(45, 45, 20));
                }
                line
            })
            .collect();

        f.render_widget(Paragraph::new(lines), inner);
    }

    fn row_line(
        &self,
        row: &RowKind,
        accent: Color,
        is_active: bool,
        today: DateKey,
    ) -> Line<'static> {
        match row {
            RowKind::Week { start } => Line::from(Span::styled(
                format!("── week of {} ──", day_label(*start)),
                Style::default().fg(Color::DarkGray),
            )),
            RowKind::Day { date, count } => {
                let marker = if is_active { "▸ " } else { "  " };
                let mut style = Style::default().add_modifier(Modifier::BOLD);
                if *date == today {
                    style = style.fg(accent);
                } else if date.is_weekend() {
                    style = style.fg(Color::Gray);
                }
                let mut spans = vec![
                    Span::styled(marker, Style::default().fg(accent)),
                    Span::styled(day_label(*date), style),
                ];
                if *date == today {
                    spans.push(Span::styled(" · today", Style::default().fg(accent)));
                }
                if *count > 0 {
                    spans.push(Span::styled(
                        format!("  ({})", count),
                        Style::default().fg(Color::DarkGray),
                    ));
                }
                Line::from(spans)
            }
            RowKind::Empty { .. } => Line::from(Span::styled(
                "      ·",
                Style::default().fg(Color::DarkGray),
            )),
            RowKind::Task { id, .. } => {
                let Some(task) = self.session.store().get(id) else {
                    return Line::default();
                };
                let mut spans = vec![Span::raw("    ")];
                if let Some(time) = task.time {
                    spans.push(Span::styled(
                        format!("{} ", time),
                        Style::default().fg(Color::Cyan),
                    ));
                }
                spans.push(Span::raw(task.text.clone()));
                if task.is_private {
                    spans.push(Span::raw(" 🔒"));
                }
                if task.has_reminder() {
                    spans.push(Span::raw(" 🔔"));
                }
                if task.voice_note.is_some() {
                    spans.push(Span::raw(" 🎙"));
                }
                Line::from(spans)
            }
        }
    }

    fn draw_footer(&self, f: &mut Frame<'_>, area: Rect) {
        let lines = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Length(1)])
            .split(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.style())])
        } else {
            Line::from(vec![Span::raw("Ready")])
        };
        f.render_widget(Paragraph::new(status_line), lines[0]);

        let dragging = self.session.drag().is_dragging();
        let mut help = match self.input_mode {
            InputMode::Normal if dragging => String::from(
                "j/k or J/K pick a spot • Enter/m drop ⇅ • Esc cancel",
            ),
            InputMode::Normal => String::from(
                "nav: j/k move | J/K day | [/] week | t today | g go to | actions: a add ✚ | e edit ✏️ | m move ⇅ | >/< shift day | p private 🔒 | r remind 🔔 | x delete 🗑️ | overlays: enter details | / search 🔍 | s settings ⚙️ | h help ❔ | q quit",
            ),
            InputMode::Add => String::from("Enter to add ✍️ • Esc to cancel"),
            InputMode::Edit => String::from("Enter to save ✏️ • Esc to cancel"),
            InputMode::GoTo => String::from("Enter to jump • Esc to cancel"),
            InputMode::Search => String::from("↑/↓ pick • Enter open • Esc close"),
            InputMode::Settings => {
                String::from("↑/↓ choose • ←/→ change • Enter toggle/edit • Esc close")
            }
            InputMode::Title | InputMode::JoinCode => {
                String::from("Enter to save • Esc back to settings")
            }
            InputMode::Inspect => String::from("Enter/Esc to close ℹ️"),
            InputMode::Help => String::from("Enter/Esc to close ❔"),
            InputMode::Confirm => {
                String::from("←/→ choose • y/n answer • Enter confirm • Esc cancel")
            }
            InputMode::Permission => String::from("y allow • n block • Esc later"),
        };

        if self.input_mode == InputMode::Normal && self.first_run {
            help.push_str(&format!(
                " • New here? Press `a` to add a task (data in {})",
                self.config.data_dir().display()
            ));
        }

        let help_line = Line::from(vec![Span::styled(
            help,
            Style::default().fg(Color::DarkGray),
        )]);
        f.render_widget(Paragraph::new(help_line), lines[1]);
    }

    fn draw_input_overlay(&self, f: &mut Frame<'_>, area: Rect) {
        let width = min(area.width.saturating_sub(10), 80);
        let base_height: u16 = 5;
        let extra_height = match self.input_mode {
            InputMode::Add | InputMode::Edit => 7,
            InputMode::Search => self.search_results.len().max(1) as u16 + 1,
            _ => 0,
        };
        let popup_area = centered_rect(width, base_height + extra_height, area);
        f.render_widget(Clear, popup_area);
        let accent = self.accent();
        let title = match self.input_mode {
            InputMode::Add => format!("➕ Add Task · {}", day_label(self.current_date())),
            InputMode::Edit => String::from("✏️ Edit Task"),
            InputMode::GoTo => String::from("📅 Go To Date"),
            InputMode::Search => String::from("🔍 Search"),
            InputMode::Title => String::from("🏷 Agenda Title"),
            InputMode::JoinCode => String::from("👥 Join Agenda"),
            _ => String::from("Input"),
        };
        let inner = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(1)])
            .split(popup_area);

        let input_block = Block::default()
            .borders(Borders::ALL)
            .title(accent_title(&title, accent))
            .border_style(Style::default().fg(Color::DarkGray))
            .style(Style::default().bg(BG_PANEL));
        let input_area = input_block.inner(inner[0]);
        f.render_widget(input_block, inner[0]);
        f.render_widget(
            Paragraph::new(self.input.as_str()).style(Style::default().bg(BG_PANEL)),
            input_area,
        );
        let col = (self.input.cursor_col() as u16).min(input_area.width.saturating_sub(1));
        f.set_cursor(input_area.x + col, input_area.y);

        let extra = inner[1];
        f.render_widget(Clear, extra);
        let extra_block = Block::default().style(Style::default().bg(BG_PANEL));
        let extra_inner = extra_block.inner(extra);
        f.render_widget(extra_block, extra);

        match self.input_mode {
            InputMode::Add | InputMode::Edit => {
                let header = Row::new(vec![Cell::from("Token"), Cell::from("Example / Description")])
                    .style(
                        Style::default()
                            .fg(Color::DarkGray)
                            .add_modifier(Modifier::BOLD),
                    );
                let hints: [(&str, &str); 5] = [
                    ("on:DATE", "Day (today, tomorrow, fri, 2025-01-20, +3d)"),
                    ("at:HH:MM", "Time of day (09:30)"),
                    ("remind:N", "Reminder N minutes before (needs a time)"),
                    ("!private", "Hide from people you share with"),
                    ("(none)", "Lands on the selected day"),
                ];
                let mut rows = vec![header];
                rows.extend(hints.iter().map(|(tok, desc)| {
                    Row::new(vec![
                        Cell::from(*tok).style(Style::default().fg(Color::Cyan)),
                        Cell::from(*desc).style(Style::default().fg(Color::DarkGray)),
                    ])
                }));
                let table = Table::new(rows, [Constraint::Length(12), Constraint::Min(10)])
                    .column_spacing(2);
                f.render_widget(table, extra_inner);
            }
            InputMode::Search => {
                let lines: Vec<Line> = if self.search_results.is_empty() {
                    vec![Line::from(Span::styled(
                        "No matches",
                        Style::default().fg(Color::DarkGray),
                    ))]
                } else {
                    self.search_results
                        .iter()
                        .enumerate()
                        .filter_map(|(i, id)| {
                            let task = self.session.store().get(id)?;
                            let style = if i == self.search_index {
                                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
                            } else {
                                Style::default()
                            };
                            Some(Line::from(vec![
                                Span::styled(day_label(task.date), Style::default().fg(Color::Cyan)),
                                Span::raw("  "),
                                Span::styled(task.text.clone(), style),
                                Span::styled(
                                    format!("  {}", short_id(&task.id)),
                                    Style::default().fg(Color::DarkGray),
                                ),
                            ]))
                        })
                        .collect()
                };
                f.render_widget(Paragraph::new(lines), extra_inner);
            }
            _ => {}
        }
    }

    fn draw_settings_overlay(&self, f: &mut Frame<'_>, area: Rect) {
        let width = min(area.width.saturating_sub(10), 70);
        let height = min(SettingsItem::ALL.len() as u16 + 4, area.height.saturating_sub(2));
        let popup_area = centered_rect(width, height, area);
        f.render_widget(Clear, popup_area);

        let items: Vec<ListItem> = SettingsItem::ALL
            .iter()
            .map(|item| {
                ListItem::new(Line::from(vec![
                    Span::styled(
                        format!("{:<12}", item.label()),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(self.setting_value(*item), Style::default().fg(Color::Gray)),
                ]))
            })
            .collect();

        let mut state = ListState::default();
        state.select(Some(self.settings_index));
        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(accent_title("⚙️ Settings", self.accent()))
                    .border_style(Style::default().fg(Color::DarkGray))
                    .style(Style::default().bg(BG_PANEL)),
            )
            .highlight_style(
                Style::default()
                    .fg(Color::Cyan)
                    .bg(BG_ACCENT)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("▶ ");
        f.render_stateful_widget(list, popup_area, &mut state);
    }

    fn draw_detail_overlay(&self, f: &mut Frame<'_>, area: Rect) {
        let Some(task) = self.inspect_task.as_ref() else {
            return;
        };

        let detail_entries = format_task_detail_entries(task);
        let width = min(area.width.saturating_sub(20), 90).max(40);
        let content_height = detail_entries.len() as u16 + 2;
        let popup_height = content_height
            .saturating_add(4)
            .min(area.height.saturating_sub(2))
            .max(6);
        let popup_area = centered_rect(width, popup_height, area);
        f.render_widget(Clear, popup_area);

        let accent = self.accent();
        let block = Block::default()
            .borders(Borders::ALL)
            .title(accent_title("🗒 Task Details", accent))
            .border_style(Style::default().fg(Color::DarkGray))
            .style(Style::default().bg(BG_PANEL));
        let inner = block.inner(popup_area);
        f.render_widget(block, popup_area);

        let rows: Vec<Row> = detail_entries
            .into_iter()
            .map(|(key, value)| {
                Row::new(vec![
                    Cell::from(key).style(Style::default().fg(accent).add_modifier(Modifier::BOLD)),
                    Cell::from(value),
                ])
            })
            .collect();

        let table = Table::new(rows, [Constraint::Length(14), Constraint::Min(20)])
            .block(Block::default().style(Style::default().bg(BG_PANEL)))
            .column_spacing(2);
        f.render_widget(table, inset_rect(inner, 1));
    }

    fn draw_help_overlay(&self, f: &mut Frame<'_>, area: Rect) {
        let lines = build_help_lines();
        let width = min(area.width.saturating_sub(10), 100);
        let height = min(lines.len() as u16 + 4, area.height.saturating_sub(2)).max(10);
        let popup_area = centered_rect(width, height, area);
        f.render_widget(Clear, popup_area);

        let block = Block::default()
            .borders(Borders::ALL)
            .title(accent_title("⌨️ Keyboard Reference", self.accent()))
            .border_style(Style::default().fg(Color::DarkGray))
            .style(Style::default().bg(BG_PANEL));
        let inner = block.inner(popup_area);
        f.render_widget(block, popup_area);
        if inner.width < 3 || inner.height < 3 {
            return;
        }

        let help_lines: Vec<Line> = lines
            .into_iter()
            .map(|(combo, desc)| {
                Line::from(vec![
                    Span::styled(format!("{:<16}", combo), Style::default().fg(Color::Cyan)),
                    Span::raw(desc),
                ])
            })
            .collect();
        f.render_widget(
            Paragraph::new(help_lines)
                .wrap(Wrap { trim: true })
                .style(Style::default().bg(BG_PANEL)),
            inset_rect(inner, 1),
        );
    }

    fn draw_confirm_overlay(&self, f: &mut Frame<'_>, area: Rect) {
        let (title, question) = match &self.confirm {
            Some(ConfirmAction::DeleteTask { text, .. }) => {
                ("🗑 Confirm Deletion", format!("Delete '{}'?", text))
            }
            Some(ConfirmAction::ResetProfile) => (
                "🚪 Sign Out",
                String::from("Clear every task and start a fresh profile?"),
            ),
            None => return,
        };
        let width = min(area.width.saturating_sub(20), 60).max(40);
        let popup_area = centered_rect(width, 8, area);
        f.render_widget(Clear, popup_area);

        let block = Block::default()
            .borders(Borders::ALL)
            .title(accent_title(title, self.accent()))
            .border_style(Style::default().fg(Color::Red))
            .style(Style::default().bg(BG_PANEL));
        let inner = block.inner(popup_area);
        f.render_widget(block, popup_area);

        let yes_style = if self.confirm_choice == ConfirmChoice::Yes {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Red)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Red)
        };
        let no_style = if self.confirm_choice == ConfirmChoice::No {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Gray)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };

        let lines = vec![
            Line::from(Span::styled(
                "This action cannot be undone.",
                Style::default().fg(Color::Red),
            )),
            Line::from(Span::styled(question, Style::default().fg(Color::White))),
            Line::default(),
            Line::from(vec![
                Span::styled("  Yes  ", yes_style),
                Span::raw("    "),
                Span::styled("  No  ", no_style),
            ]),
        ];
        f.render_widget(
            Paragraph::new(lines)
                .wrap(Wrap { trim: true })
                .alignment(Alignment::Center)
                .style(Style::default().bg(BG_PANEL)),
            inset_rect(inner, 1),
        );
    }

    fn draw_permission_overlay(&self, f: &mut Frame<'_>, area: Rect) {
        let width = min(area.width.saturating_sub(20), 60).max(40);
        let popup_area = centered_rect(width, 7, area);
        f.render_widget(Clear, popup_area);

        let block = Block::default()
            .borders(Borders::ALL)
            .title(accent_title("🔔 Allow Reminders", self.accent()))
            .border_style(Style::default().fg(Color::DarkGray))
            .style(Style::default().bg(BG_PANEL));
        let inner = block.inner(popup_area);
        f.render_widget(block, popup_area);

        let lines = vec![
            Line::from("Reminders need permission to notify you."),
            Line::default(),
            Line::from(vec![
                Span::styled("y", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
                Span::raw(" allow    "),
                Span::styled("n", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
                Span::raw(" block"),
            ]),
        ];
        f.render_widget(
            Paragraph::new(lines)
                .alignment(Alignment::Center)
                .style(Style::default().bg(BG_PANEL)),
            inset_rect(inner, 1),
        );
    }
}
