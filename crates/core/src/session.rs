use std::time::Instant;

use anyhow::Result;
use chrono::NaiveDateTime;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::database::{Database, PERMISSION_KEY};
use crate::dnd::{DragCommand, DragController, DragPayload, DropTarget};
use crate::model::{AddOutcome, DateKey, DeleteResult, Mutation, NewTask, Task};
use crate::notify::{NotificationQueue, PermissionGate, PermissionState, Reminder};
use crate::services::TaskStore;
use crate::settings::{UserProfile, UserSettings};
use crate::tracker::{DayRect, Viewport, VisibleDateTracker};
use crate::window::{DateWindow, ExtendOutcome, JumpError, ScrollMetrics};

/// Everything one agenda screen needs, owned in one place.
///
/// Presentations read from the session and call its entry points; they never
/// mutate the store or the window behind its back.
pub struct AgendaSession {
    today: DateKey,
    store: TaskStore,
    window: DateWindow,
    tracker: VisibleDateTracker,
    drag: DragController,
    settings: UserSettings,
    profile: UserProfile,
    permission: PermissionGate,
    prefs: Database,
}

impl AgendaSession {
    pub fn open(config: &AppConfig) -> Result<Self> {
        let today = DateKey::today();
        let storage = Database::initialize(config)?;
        let prefs = Database::initialize(config)?;
        let store = TaskStore::open(
            Box::new(storage),
            Box::new(NotificationQueue::new()),
            today,
        );
        Ok(Self::from_parts(
            store,
            prefs,
            today,
            config.default_permission(),
        ))
    }

    /// Assemble a session from an opened store. A permission decision saved
    /// in `prefs` wins over `default_permission`.
    pub fn from_parts(
        store: TaskStore,
        prefs: Database,
        today: DateKey,
        default_permission: PermissionState,
    ) -> Self {
        let remembered = match prefs.get_json::<PermissionState>(PERMISSION_KEY) {
            Ok(value) => value,
            Err(err) => {
                warn!(error = %err, "stored permission unreadable");
                None
            }
        };
        Self {
            today,
            store,
            window: DateWindow::around(today),
            tracker: VisibleDateTracker::new(today),
            drag: DragController::new(),
            settings: UserSettings::load(&prefs),
            profile: UserProfile::load(&prefs),
            permission: PermissionGate::new(remembered.unwrap_or(default_permission)),
            prefs,
        }
    }

    pub fn today(&self) -> DateKey {
        self.today
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn window(&self) -> &DateWindow {
        &self.window
    }

    pub fn settings(&self) -> &UserSettings {
        &self.settings
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn drag(&self) -> &DragController {
        &self.drag
    }

    pub fn weeks(&self) -> impl Iterator<Item = &[DateKey]> {
        self.window.weeks()
    }

    pub fn tasks_on(&self, date: DateKey) -> Vec<&Task> {
        self.store.tasks_on(date)
    }

    pub fn active_date(&self) -> DateKey {
        self.tracker.active().unwrap_or(self.today)
    }

    pub fn header_title(&self) -> String {
        self.settings.header_title(self.active_date())
    }

    /// Feed the latest rendered layout. Returns the active date when it changed.
    pub fn update_visible(&mut self, rects: &[DayRect], viewport: Viewport) -> Option<DateKey> {
        self.tracker.update(rects, viewport)
    }

    pub fn on_scroll(&mut self, metrics: ScrollMetrics, now: Instant) -> Option<ExtendOutcome> {
        self.window.settle(now);
        self.window.on_scroll(metrics, now)
    }

    /// Use a presentation-specific edge threshold for scroll-driven growth.
    pub fn set_scroll_threshold(&mut self, threshold: f64) {
        self.window = self.window.clone().with_threshold(threshold);
    }

    /// Make `date` part of the window and the active date. Returns how many
    /// days were prepended so the caller can keep its scroll offset aligned.
    pub fn jump_to(&mut self, date: DateKey) -> Result<usize, JumpError> {
        let prepended = self.window.ensure_contains(date)?;
        self.tracker.set(date);
        debug!(%date, prepended, "jumped to date");
        Ok(prepended)
    }

    pub fn go_to_today(&mut self) -> Result<usize, JumpError> {
        self.jump_to(self.today)
    }

    /// Jump `weeks` weeks from the active date. Negative goes back.
    pub fn shift_weeks(&mut self, weeks: i64) -> Result<usize, JumpError> {
        let target = self.active_date().offset(weeks * 7);
        self.jump_to(target)
    }

    pub fn add_task(&mut self, draft: NewTask) -> Result<AddOutcome> {
        self.store.add(draft)
    }

    pub fn update_task(&mut self, task: Task) -> Result<Option<Task>> {
        self.store.update(task)
    }

    pub fn delete_task(&mut self, id: &str) -> Result<DeleteResult> {
        self.store.delete(id)
    }

    pub fn delete_tasks(&mut self, ids: &[String]) -> Result<Vec<DeleteResult>> {
        self.store.delete_many(ids)
    }

    pub fn on_move_task(&mut self, id: &str, date: DateKey) -> Result<Mutation> {
        self.store.move_task(id, date)
    }

    pub fn on_reorder_task(
        &mut self,
        drag_id: &str,
        hover_id: &str,
        target_date: DateKey,
    ) -> Result<Mutation> {
        self.store.reorder(drag_id, hover_id, target_date)
    }

    pub fn begin_drag(&mut self, payload: DragPayload) -> bool {
        self.drag.begin(payload)
    }

    pub fn hover_drag(&mut self, target: DropTarget) -> bool {
        self.drag.hover(target)
    }

    pub fn leave_drag(&mut self) {
        self.drag.leave();
    }

    pub fn cancel_drag(&mut self) {
        self.drag.cancel();
    }

    /// Commit the current gesture against the store.
    pub fn drop_drag(&mut self) -> Result<Mutation> {
        match self.drag.drop() {
            Some(DragCommand::Move { id, to }) => self.store.move_task(&id, to),
            Some(DragCommand::Reorder {
                drag_id,
                hover_id,
                target_date,
            }) => self.store.reorder(&drag_id, &hover_id, target_date),
            None => Ok(Mutation::Unchanged),
        }
    }

    pub fn permission(&self) -> PermissionState {
        self.permission.state()
    }

    pub fn awaiting_permission(&self) -> bool {
        self.permission.awaiting_decision()
    }

    /// Ask whether reminders may be shown. The answer arrives on the receiver,
    /// immediately when a decision is known.
    pub fn request_permission(&mut self) -> oneshot::Receiver<bool> {
        self.permission.request()
    }

    pub fn resolve_permission(&mut self, granted: bool) -> Result<()> {
        self.permission.resolve(granted);
        self.prefs.put_json(PERMISSION_KEY, &self.permission.state())
    }

    /// Reminders due at `now`. They are consumed even when permission is
    /// missing, in which case none are returned.
    pub fn fire_due_reminders(&mut self, now: NaiveDateTime) -> Vec<Reminder> {
        let due = self.store.reminders_mut().due(now);
        if due.is_empty() || self.permission.state() == PermissionState::Granted {
            return due;
        }
        debug!(count = due.len(), "dropping reminders without permission");
        Vec::new()
    }

    pub fn update_settings(&mut self, settings: UserSettings) -> Result<()> {
        settings.save(&self.prefs)?;
        self.settings = settings;
        Ok(())
    }

    pub fn update_profile(&mut self, profile: UserProfile) -> Result<()> {
        profile.save(&self.prefs)?;
        self.profile = profile;
        Ok(())
    }

    /// Sign out into a fresh profile: tasks cleared, sharing and title reset,
    /// visual preferences kept.
    pub fn reset_profile(&mut self) -> Result<&UserProfile> {
        let profile = UserProfile::fresh();
        let mut settings = self.settings.clone();
        settings.reset_account();

        self.store.clear()?;
        self.update_settings(settings)?;
        self.update_profile(profile)?;
        info!(profile = self.profile.id.as_str(), "reset profile");
        Ok(&self.profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use crate::model::NotificationRequest;
    use crate::notify::{poll_permission, PermissionPoll};
    use crate::settings::{Accent, HeaderMode, DEFAULT_TITLE};

    fn day(raw: &str) -> DateKey {
        raw.parse().unwrap()
    }

    fn session(permission: PermissionState) -> AgendaSession {
        let today = day("2024-03-04");
        let now = NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(7, 0, 0)
            .unwrap();
        let store = TaskStore::open(
            Box::new(Database::open_in_memory().unwrap()),
            Box::new(NotificationQueue::with_clock(Arc::new(move || now))),
            today,
        );
        AgendaSession::from_parts(store, Database::open_in_memory().unwrap(), today, permission)
    }

    #[test]
    fn starts_with_seeds_and_six_weeks() {
        let session = session(PermissionState::Prompt);
        assert_eq!(session.tasks_on(day("2024-03-04")).len(), 2);
        assert_eq!(session.weeks().count(), 6);
        assert_eq!(session.active_date(), day("2024-03-04"));
        assert_eq!(session.header_title(), "2024");
    }

    #[test]
    fn drag_to_other_day_moves_task() {
        let mut session = session(PermissionState::Prompt);
        let id = session.store().tasks()[0].id.clone();
        assert!(session.begin_drag(DragPayload::task(id.clone(), day("2024-03-04"))));
        session.hover_drag(DropTarget::Day(day("2024-03-06")));
        let outcome = session.drop_drag().unwrap();
        assert!(outcome.changed_date());
        assert_eq!(session.tasks_on(day("2024-03-06"))[0].id, id);
        assert!(!session.drag().is_dragging());
    }

    #[test]
    fn jump_outside_window_extends_it() {
        let mut session = session(PermissionState::Prompt);
        let prepended = session.jump_to(day("2024-01-01")).unwrap();
        assert!(prepended > 0);
        assert!(session.window().contains(day("2024-01-01")));
        assert_eq!(session.active_date(), day("2024-01-01"));
        assert_eq!(session.header_title(), "2024");

        session.go_to_today().unwrap();
        session.shift_weeks(-1).unwrap();
        assert_eq!(session.active_date(), day("2024-02-26"));
    }

    #[test]
    fn far_jump_keeps_window_and_active_date() {
        let mut session = session(PermissionState::Prompt);
        let len = session.window().len();
        let target = day("1500-06-01");
        assert_eq!(session.jump_to(target), Err(JumpError::TooFar(target)));
        assert_eq!(session.window().len(), len);
        assert_eq!(session.active_date(), day("2024-03-04"));
    }

    #[test]
    fn reminders_need_permission() {
        let mut session = session(PermissionState::Prompt);
        let mut draft = NewTask::new("Call", day("2024-03-04"));
        draft.time = Some("09:00".parse().unwrap());
        draft.notification = Some(NotificationRequest::minutes_before(10));
        session.add_task(draft.clone()).unwrap();

        let at_nine = day("2024-03-04").at("09:00".parse().unwrap());
        assert!(session.fire_due_reminders(at_nine).is_empty());

        let mut rx = session.request_permission();
        assert_eq!(poll_permission(&mut rx), PermissionPoll::Pending);
        session.resolve_permission(true).unwrap();
        assert_eq!(poll_permission(&mut rx), PermissionPoll::Resolved(true));

        draft.text = "Call again".into();
        session.add_task(draft).unwrap();
        let fired = session.fire_due_reminders(at_nine);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].title, "Reminder: Call again");
    }

    #[test]
    fn permission_decision_is_remembered() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::from_data_dir(dir.path().to_path_buf()).unwrap();
        {
            let mut session = AgendaSession::open(&config).unwrap();
            session.resolve_permission(false).unwrap();
        }
        let config = config.with_default_permission(PermissionState::Granted);
        let session = AgendaSession::open(&config).unwrap();
        assert_eq!(session.permission(), PermissionState::Denied);
    }

    #[test]
    fn reset_profile_clears_tasks_and_sharing() {
        let mut session = session(PermissionState::Prompt);
        let mut settings = session.settings().clone();
        settings.header_mode = HeaderMode::Custom;
        settings.accent = Accent::Purple;
        settings.set_title("Team");
        settings.start_sharing();
        session.update_settings(settings).unwrap();

        let profile = session.reset_profile().unwrap().clone();
        assert_eq!(profile.name, "New User");
        assert!(profile.id.starts_with("user-"));
        assert!(session.store().is_empty());
        assert_eq!(session.settings().title, DEFAULT_TITLE);
        assert_eq!(session.settings().accent, Accent::Purple);
        assert!(!session.settings().is_shared);
        assert_eq!(session.header_title(), DEFAULT_TITLE);
    }
}
