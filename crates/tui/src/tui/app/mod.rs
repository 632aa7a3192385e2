use std::time::Instant;

use anyhow::Result;
use chrono::Local;
use ratatui::style::{Color, Style};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use super::buffer::LineInput;
use super::constants::*;
use super::helpers::compose_task_capture;
use super::layout::{AgendaLayout, RowKind};
use crate::capture::TaskInput;
use crate::config::AppConfig;
use crate::core::notify::{poll_permission, PermissionPoll};
use crate::core::{AgendaSession, DragPayload, ExtendOutcome, ScrollMetrics, Viewport};
use crate::model::{DateKey, Mutation, NotificationRequest, Task};
use crate::parser;

mod input;
mod render;
mod settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputMode {
    Normal,
    Add,
    Edit,
    GoTo,
    Search,
    Settings,
    Title,
    JoinCode,
    Inspect,
    Help,
    Confirm,
    Permission,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfirmChoice {
    Yes,
    No,
}

impl ConfirmChoice {
    fn toggle(self) -> Self {
        match self {
            ConfirmChoice::Yes => ConfirmChoice::No,
            ConfirmChoice::No => ConfirmChoice::Yes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ConfirmAction {
    DeleteTask { id: String, text: String },
    ResetProfile,
}

#[derive(Debug, Clone)]
struct StatusMessage {
    text: String,
    kind: StatusKind,
    created_at: Instant,
}

impl StatusMessage {
    fn new<T: Into<String>>(text: T, kind: StatusKind) -> Self {
        Self {
            text: text.into(),
            kind,
            created_at: Instant::now(),
        }
    }

    fn style(&self) -> Style {
        match self.kind {
            StatusKind::Info => Style::default().fg(Color::Cyan),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum StatusKind {
    Info,
    Error,
}

/// A reminder toggle waiting on the permission answer.
#[derive(Debug)]
struct PendingReminder {
    task_id: String,
    rx: oneshot::Receiver<bool>,
}

pub(crate) struct App {
    config: AppConfig,
    session: AgendaSession,
    first_run: bool,
    layout: AgendaLayout,
    cursor: usize,
    scroll: usize,
    viewport_rows: usize,
    input_mode: InputMode,
    input: LineInput,
    editing_task_id: Option<String>,
    search_results: Vec<String>,
    search_index: usize,
    settings_index: usize,
    inspect_task: Option<Task>,
    confirm: Option<ConfirmAction>,
    confirm_choice: ConfirmChoice,
    pending_reminder: Option<PendingReminder>,
    status: Option<StatusMessage>,
    should_quit: bool,
}

impl App {
    pub(crate) fn new(config: AppConfig, mut session: AgendaSession, first_run: bool) -> Self {
        session.set_scroll_threshold(EDGE_THRESHOLD_ROWS);
        let today = session.today();
        let mut app = Self {
            config,
            session,
            first_run,
            layout: AgendaLayout::default(),
            cursor: 0,
            scroll: 0,
            viewport_rows: 20,
            input_mode: InputMode::Normal,
            input: LineInput::new(),
            editing_task_id: None,
            search_results: Vec::new(),
            search_index: 0,
            settings_index: 0,
            inspect_task: None,
            confirm: None,
            confirm_choice: ConfirmChoice::No,
            pending_reminder: None,
            status: None,
            should_quit: false,
        };
        app.center_on(today);
        app
    }

    pub(crate) fn on_tick(&mut self) -> Result<()> {
        if let Some(status) = &self.status {
            if status.created_at.elapsed() > STATUS_TTL {
                self.status = None;
            }
        }
        self.poll_pending_reminder()?;
        self.fire_reminders();
        self.sync_viewport();
        Ok(())
    }

    pub(crate) fn should_quit(&self) -> bool {
        self.should_quit
    }

    fn current_row(&self) -> Option<&RowKind> {
        self.layout.row(self.cursor)
    }

    fn current_date(&self) -> DateKey {
        self.current_row()
            .map(RowKind::date)
            .unwrap_or_else(|| self.session.active_date())
    }

    fn current_task(&self) -> Option<Task> {
        let id = self.current_row()?.task_id()?;
        self.session.store().get(id).cloned()
    }

    fn move_cursor(&mut self, steps: isize) {
        self.cursor = self.layout.step(self.cursor, steps);
        self.after_cursor_moved();
    }

    fn move_to_neighbour_day(&mut self, forward: bool) {
        if let Some(index) = self.layout.neighbour_day(self.cursor, forward) {
            self.cursor = index;
            self.after_cursor_moved();
        }
    }

    fn after_cursor_moved(&mut self) {
        self.hover_cursor();
        self.sync_viewport();
    }

    fn ensure_cursor_visible(&mut self) {
        let height = self.viewport_rows.max(1);
        if self.cursor < self.scroll {
            self.scroll = self.cursor;
        } else if self.cursor >= self.scroll + height {
            self.scroll = self.cursor + 1 - height;
        }
        self.scroll = self.scroll.min(self.layout.len().saturating_sub(height));
    }

    /// Keep the cursor on screen, grow the window near its edges, and tell
    /// the tracker what is visible.
    fn sync_viewport(&mut self) {
        self.ensure_cursor_visible();
        let metrics = ScrollMetrics {
            offset_top: self.scroll as f64,
            viewport_height: self.viewport_rows as f64,
            content_height: self.layout.len() as f64,
        };
        if let Some(ExtendOutcome::Extended { direction, added }) =
            self.session.on_scroll(metrics, Instant::now())
        {
            debug!(%direction, days = added.len(), "loaded more days");
            self.rebuild_layout();
        }
        let viewport = Viewport {
            top: self.scroll as f64,
            height: self.viewport_rows as f64,
        };
        let rendered = self
            .layout
            .visible_day_rects(self.scroll, self.viewport_rows);
        self.session.update_visible(rendered, viewport);
    }

    fn set_viewport_rows(&mut self, rows: usize) {
        if rows != self.viewport_rows && rows > 0 {
            self.viewport_rows = rows;
            self.ensure_cursor_visible();
        }
    }

    /// Rebuild rows from the session, keeping the cursor on the same row and
    /// at the same screen position.
    fn rebuild_layout(&mut self) {
        let anchor = self.current_row().cloned();
        let layout = AgendaLayout::build(&self.session);
        let relocated = anchor.as_ref().and_then(|row| layout.relocate(row));
        self.layout = layout;
        match relocated {
            Some(index) => {
                let shifted = self.scroll as isize + index as isize - self.cursor as isize;
                self.scroll = shifted.max(0) as usize;
                self.cursor = index;
            }
            None => self.cursor = self.layout.step(self.cursor, 0),
        }
        self.ensure_cursor_visible();
    }

    /// Put `date` under the cursor with its rows centred in the viewport.
    fn center_on(&mut self, date: DateKey) {
        self.rebuild_layout();
        if let Some(rect) = self.layout.day_rect(date).copied() {
            self.cursor = rect.top as usize;
            let center = rect.center() - self.viewport_rows as f64 / 2.0;
            self.scroll = center.max(0.0) as usize;
        }
        self.sync_viewport();
    }

    /// Load `date` and centre it. Returns false when the date is out of reach,
    /// with the reason left in the status line.
    fn jump_to(&mut self, date: DateKey) -> bool {
        match self.session.jump_to(date) {
            Ok(_) => {
                self.center_on(date);
                true
            }
            Err(err) => {
                warn!(%date, "jump rejected");
                self.set_status_error(err.to_string());
                false
            }
        }
    }

    fn go_to_today(&mut self) {
        match self.session.go_to_today() {
            Ok(added) => {
                debug!(added, "back to today");
                self.center_on(self.session.today());
            }
            Err(err) => self.set_status_error(err.to_string()),
        }
    }

    fn shift_weeks(&mut self, weeks: i64) {
        match self.session.shift_weeks(weeks) {
            Ok(_) => self.center_on(self.session.active_date()),
            Err(err) => self.set_status_error(err.to_string()),
        }
    }

    /// Put the cursor on task `id`, loading its day first when needed.
    fn focus_task(&mut self, id: &str, date: DateKey) {
        if !self.session.window().contains(date) && !self.jump_to(date) {
            return;
        }
        self.rebuild_layout();
        if let Some(index) = self.layout.find_task(id) {
            self.cursor = index;
        }
        self.sync_viewport();
    }

    fn begin_add(&mut self) {
        self.input_mode = InputMode::Add;
        self.input.clear();
        self.set_status_info(STATUS_ENTER_ADD);
    }

    fn add_task(&mut self) -> Result<()> {
        if self.input.is_blank() {
            self.set_status_error("Enter some details before adding a task");
            return Ok(());
        }
        let input = TaskInput::from_text(self.input.as_str());
        let draft =
            match parser::parse_capture_on(&input, self.session.today(), self.current_date()) {
                Ok(draft) => draft,
                Err(err) => {
                    self.set_status_error(err.to_string());
                    return Ok(());
                }
            };

        let outcome = self.session.add_task(draft)?;
        self.input.clear();
        self.input_mode = InputMode::Normal;
        self.first_run = false;
        self.focus_task(&outcome.id, outcome.date);
        self.set_status_info(format!("Added [{}] {}", outcome.date, outcome.text));
        Ok(())
    }

    fn start_edit_current(&mut self) {
        let Some(task) = self.current_task() else {
            self.set_status_info(STATUS_NO_TASK);
            return;
        };
        self.input.set(compose_task_capture(&task));
        self.input_mode = InputMode::Edit;
        self.editing_task_id = Some(task.id);
        self.set_status_info(STATUS_ENTER_EDIT);
    }

    fn apply_edit(&mut self) -> Result<()> {
        let Some(existing) = self
            .editing_task_id
            .as_deref()
            .and_then(|id| self.session.store().get(id))
            .cloned()
        else {
            self.set_status_error("Task not found");
            self.cancel_edit();
            return Ok(());
        };

        let input = TaskInput::from_text(self.input.as_str());
        let draft = match parser::parse_capture_on(&input, self.session.today(), existing.date) {
            Ok(draft) => draft,
            Err(err) => {
                self.set_status_error(format!("Edit failed: {}", err));
                return Ok(());
            }
        };

        let updated = Task {
            id: existing.id.clone(),
            text: draft.text,
            date: draft.date,
            time: draft.time,
            is_private: draft.is_private,
            voice_note: existing.voice_note.clone(),
            notification: draft.notification,
        };
        let Some(updated) = self.session.update_task(updated)? else {
            self.set_status_error("Task not found");
            return Ok(());
        };

        self.editing_task_id = None;
        self.input.clear();
        self.input_mode = InputMode::Normal;
        self.focus_task(&updated.id, updated.date);
        if updated.has_reminder() && !self.reminders_allowed() {
            self.set_status_info(
                "Saved. Reminders stay silent until notifications are allowed (s → Reminders)",
            );
        } else {
            self.set_status_info(format!("Updated [{}] {}", updated.date, updated.text));
        }
        Ok(())
    }

    fn cancel_edit(&mut self) {
        self.editing_task_id = None;
        self.input.clear();
        self.input_mode = InputMode::Normal;
        self.status = None;
    }

    fn begin_goto(&mut self) {
        self.input_mode = InputMode::GoTo;
        self.input.clear();
        self.set_status_info(STATUS_GOTO);
    }

    fn apply_goto(&mut self) {
        match parser::parse_date_spec(self.input.as_str(), self.session.today()) {
            Ok(date) => {
                if self.jump_to(date) {
                    self.input.clear();
                    self.input_mode = InputMode::Normal;
                    self.set_status_info(format!("Showing {}", date));
                }
            }
            Err(err) => self.set_status_error(err.to_string()),
        }
    }

    fn begin_search(&mut self) {
        self.input_mode = InputMode::Search;
        self.input.clear();
        self.refresh_search();
        self.set_status_info(STATUS_SEARCH);
    }

    fn refresh_search(&mut self) {
        self.search_results = self
            .session
            .store()
            .search(self.input.as_str(), SEARCH_RESULT_LIMIT)
            .into_iter()
            .map(|task| task.id.clone())
            .collect();
        self.search_index = 0;
    }

    fn open_search_result(&mut self) {
        let Some(task) = self
            .search_results
            .get(self.search_index)
            .and_then(|id| self.session.store().get(id))
            .cloned()
        else {
            self.set_status_info("No matching task");
            return;
        };
        self.input.clear();
        self.input_mode = InputMode::Normal;
        if !self.jump_to(task.date) {
            return;
        }
        self.focus_task(&task.id, task.date);
        self.set_status_info(format!("Found '{}' on {}", task.text, task.date));
    }

    /// Pick up the task under the cursor, or drop the one being carried.
    fn grab_or_drop(&mut self) -> Result<()> {
        if self.session.drag().is_dragging() {
            return self.drop_dragged();
        }
        let Some(RowKind::Task { id, date }) = self.current_row().cloned() else {
            self.set_status_info(STATUS_NO_TASK);
            return Ok(());
        };
        if self.session.begin_drag(DragPayload::task(id, date)) {
            self.hover_cursor();
            self.set_status_info(STATUS_DRAGGING);
        }
        Ok(())
    }

    fn hover_cursor(&mut self) {
        if !self.session.drag().is_dragging() {
            return;
        }
        match self.current_row().and_then(RowKind::drop_target) {
            Some(target) => {
                self.session.hover_drag(target);
            }
            None => self.session.leave_drag(),
        }
    }

    fn drop_dragged(&mut self) -> Result<()> {
        let dragged = self.session.drag().dragged_id().map(str::to_string);
        let outcome = self.session.drop_drag()?;
        self.rebuild_layout();
        if let Some(id) = dragged {
            if let Some(index) = self.layout.find_task(&id) {
                self.cursor = index;
            }
        }
        self.sync_viewport();
        self.report_mutation(&outcome);
        Ok(())
    }

    fn cancel_drag(&mut self) {
        self.session.cancel_drag();
        self.set_status_info("Move cancelled");
    }

    /// Move the task under the cursor by `days`, keeping it selected.
    fn nudge_task(&mut self, days: i64) -> Result<()> {
        let Some(task) = self.current_task() else {
            self.set_status_info(STATUS_NO_TASK);
            return Ok(());
        };
        let target = task.date.offset(days);
        let outcome = self.session.on_move_task(&task.id, target)?;
        self.focus_task(&task.id, target);
        self.report_mutation(&outcome);
        Ok(())
    }

    fn report_mutation(&mut self, outcome: &Mutation) {
        match outcome {
            Mutation::Moved { to, .. } => self.set_status_info(format!("Moved to {}", to)),
            Mutation::Reordered { to, index, .. } => {
                self.set_status_info(format!("Placed at position {} on {}", index + 1, to))
            }
            Mutation::Unchanged => self.set_status_info("Nothing changed"),
        }
    }

    fn toggle_private(&mut self) -> Result<()> {
        let Some(mut task) = self.current_task() else {
            self.set_status_info(STATUS_NO_TASK);
            return Ok(());
        };
        task.is_private = !task.is_private;
        let private = task.is_private;
        self.session.update_task(task)?;
        self.set_status_info(if private {
            "Marked private 🔒"
        } else {
            "Marked public"
        });
        Ok(())
    }

    fn toggle_reminder(&mut self) -> Result<()> {
        let Some(mut task) = self.current_task() else {
            self.set_status_info(STATUS_NO_TASK);
            return Ok(());
        };
        if task.has_reminder() {
            task.notification = None;
            self.session.update_task(task)?;
            self.set_status_info("Reminder off");
            return Ok(());
        }
        if task.time.is_none() {
            self.set_status_error("Give the task a time (e, then at:HH:MM) before adding a reminder");
            return Ok(());
        }

        let mut rx = self.session.request_permission();
        match poll_permission(&mut rx) {
            PermissionPoll::Resolved(true) => self.enable_reminder(&task.id)?,
            PermissionPoll::Resolved(false) => {
                self.set_status_error("Notifications are blocked; reminder not set")
            }
            PermissionPoll::Pending => {
                self.pending_reminder = Some(PendingReminder {
                    task_id: task.id,
                    rx,
                });
                self.input_mode = InputMode::Permission;
                self.set_status_info(STATUS_PERMISSION);
            }
        }
        Ok(())
    }

    fn resolve_permission(&mut self, granted: bool) -> Result<()> {
        self.session.resolve_permission(granted)?;
        self.poll_pending_reminder()
    }

    fn poll_pending_reminder(&mut self) -> Result<()> {
        let Some(mut pending) = self.pending_reminder.take() else {
            return Ok(());
        };
        match poll_permission(&mut pending.rx) {
            PermissionPoll::Pending => self.pending_reminder = Some(pending),
            PermissionPoll::Resolved(true) => self.enable_reminder(&pending.task_id)?,
            PermissionPoll::Resolved(false) => {
                self.set_status_error("Reminder not set: notifications are blocked")
            }
        }
        Ok(())
    }

    fn enable_reminder(&mut self, id: &str) -> Result<()> {
        let Some(mut task) = self.session.store().get(id).cloned() else {
            return Ok(());
        };
        task.notification = Some(NotificationRequest::minutes_before(
            DEFAULT_REMINDER_MINUTES,
        ));
        self.session.update_task(task)?;
        self.set_status_info(format!(
            "Reminder set {} min before 🔔",
            DEFAULT_REMINDER_MINUTES
        ));
        Ok(())
    }

    fn reminders_allowed(&self) -> bool {
        self.session.permission() == crate::core::PermissionState::Granted
    }

    fn fire_reminders(&mut self) {
        let now = Local::now().naive_local();
        for reminder in self.session.fire_due_reminders(now) {
            info!(task = reminder.task_id.as_str(), "reminder fired");
            self.set_status_info(format!("🔔 {} · {}", reminder.title, reminder.body));
        }
    }

    fn show_details(&mut self) {
        let Some(task) = self.current_task() else {
            self.set_status_info(STATUS_NO_TASK);
            return;
        };
        self.inspect_task = Some(task);
        self.input_mode = InputMode::Inspect;
        self.set_status_info(STATUS_VIEW_DETAILS);
    }

    fn show_help_overlay(&mut self) {
        self.inspect_task = None;
        self.input_mode = InputMode::Help;
        self.set_status_info(STATUS_HELP);
    }

    fn prompt_delete(&mut self) {
        let Some(task) = self.current_task() else {
            self.set_status_info(STATUS_NO_TASK);
            return;
        };
        self.prompt_confirm(ConfirmAction::DeleteTask {
            id: task.id,
            text: task.text,
        });
    }

    fn prompt_confirm(&mut self, action: ConfirmAction) {
        self.confirm = Some(action);
        self.confirm_choice = ConfirmChoice::No;
        self.input_mode = InputMode::Confirm;
        self.set_status_info(STATUS_CONFIRM);
    }

    fn perform_confirm(&mut self) -> Result<()> {
        match self.confirm.take() {
            Some(ConfirmAction::DeleteTask { id, .. }) => {
                let result = self.session.delete_task(&id)?;
                self.rebuild_layout();
                if result.deleted {
                    self.set_status_info("Deleted task 🗑️");
                } else {
                    self.set_status_info("Task not found");
                }
            }
            Some(ConfirmAction::ResetProfile) => {
                self.pending_reminder = None;
                let name = self.session.reset_profile()?.name.clone();
                self.go_to_today();
                self.set_status_info(format!("Signed out. Welcome, {}", name));
            }
            None => {}
        }
        Ok(())
    }

    pub(crate) fn set_status_info<T: Into<String>>(&mut self, message: T) {
        let mut text = String::from("ℹ️  ");
        text.push_str(&message.into());
        self.status = Some(StatusMessage::new(text, StatusKind::Info));
    }

    pub(crate) fn set_status_error<T: Into<String>>(&mut self, message: T) {
        let mut text = String::from("⚠️  ");
        text.push_str(&message.into());
        self.status = Some(StatusMessage::new(text, StatusKind::Error));
    }
}
