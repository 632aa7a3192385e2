//! Local task reminders: a cancellable timer queue keyed by task id plus the
//! permission gate that decides whether reminders may be shown at all.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::anyhow;
use chrono::{Duration, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;
use tracing::{debug, info};

use crate::model::{DateKey, NotificationRequest, Task, TimeOfDay};

/// Source of "now" in local wall-clock time.
pub type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

pub fn system_clock() -> Clock {
    Arc::new(|| Local::now().naive_local())
}

/// Interface the task store uses to keep reminders in step with task edits.
pub trait ReminderScheduler {
    /// Replace any reminder for `task_id`. Nothing is scheduled unless the
    /// request is enabled with a positive lead and the fire time is still ahead.
    fn schedule(
        &mut self,
        task_id: &str,
        text: &str,
        date: DateKey,
        time: TimeOfDay,
        request: NotificationRequest,
    );

    /// Drop the reminder for `task_id`. Unknown or already fired ids are ignored.
    fn cancel(&mut self, task_id: &str);

    /// Remove and return every reminder whose fire time is at or before `now`.
    fn due(&mut self, now: NaiveDateTime) -> Vec<Reminder>;

    fn scheduled_at(&self, task_id: &str) -> Option<NaiveDateTime>;

    fn pending_count(&self) -> usize;
}

/// Cancel then re-schedule the reminder for `task` from its current fields.
pub fn sync_reminder(scheduler: &mut dyn ReminderScheduler, task: &Task) {
    scheduler.cancel(&task.id);
    if let (Some(time), Some(request)) = (task.time, task.notification) {
        scheduler.schedule(&task.id, &task.text, task.date, time, request);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub task_id: String,
    pub title: String,
    pub body: String,
    pub fire_at: NaiveDateTime,
}

pub struct NotificationQueue {
    pending: HashMap<String, Reminder>,
    clock: Clock,
}

impl NotificationQueue {
    pub fn new() -> Self {
        Self::with_clock(system_clock())
    }

    pub fn with_clock(clock: Clock) -> Self {
        Self {
            pending: HashMap::new(),
            clock,
        }
    }

    pub fn now(&self) -> NaiveDateTime {
        (self.clock)()
    }
}

impl Default for NotificationQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for NotificationQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationQueue")
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl ReminderScheduler for NotificationQueue {
    fn schedule(
        &mut self,
        task_id: &str,
        text: &str,
        date: DateKey,
        time: TimeOfDay,
        request: NotificationRequest,
    ) {
        self.pending.remove(task_id);

        let Some(lead) = request.lead_minutes() else {
            return;
        };

        let fire_at = date.at(time) - Duration::minutes(i64::from(lead));
        let now = self.now();
        if fire_at <= now {
            debug!(task_id, %fire_at, "reminder time already passed, not scheduling");
            return;
        }

        let body = format!(
            "Scheduled for {} at {}",
            date.as_naive().format("%A, %-d %B"),
            time
        );
        self.pending.insert(
            task_id.to_string(),
            Reminder {
                task_id: task_id.to_string(),
                title: format!("Reminder: {}", text),
                body,
                fire_at,
            },
        );
        debug!(task_id, %fire_at, "scheduled reminder");
    }

    fn cancel(&mut self, task_id: &str) {
        if self.pending.remove(task_id).is_some() {
            debug!(task_id, "cancelled reminder");
        }
    }

    fn due(&mut self, now: NaiveDateTime) -> Vec<Reminder> {
        let due_ids: Vec<String> = self
            .pending
            .values()
            .filter(|reminder| reminder.fire_at <= now)
            .map(|reminder| reminder.task_id.clone())
            .collect();

        let mut fired: Vec<Reminder> = due_ids
            .iter()
            .filter_map(|id| self.pending.remove(id))
            .collect();
        fired.sort_by_key(|reminder| reminder.fire_at);
        for reminder in &fired {
            info!(task_id = reminder.task_id.as_str(), "reminder fired");
        }
        fired
    }

    fn scheduled_at(&self, task_id: &str) -> Option<NaiveDateTime> {
        self.pending.get(task_id).map(|reminder| reminder.fire_at)
    }

    fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    Granted,
    Denied,
    Prompt,
}

impl PermissionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionState::Granted => "granted",
            PermissionState::Denied => "denied",
            PermissionState::Prompt => "prompt",
        }
    }
}

impl fmt::Display for PermissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PermissionState {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "granted" | "allow" | "yes" => Ok(PermissionState::Granted),
            "denied" | "deny" | "no" => Ok(PermissionState::Denied),
            "prompt" | "ask" => Ok(PermissionState::Prompt),
            other => Err(anyhow!(
                "Unknown permission '{}': expected granted|denied|prompt",
                other
            )),
        }
    }
}

/// Answers reminder permission requests. Requests made while the state is
/// `Prompt` stay open until [`PermissionGate::resolve`] is called.
#[derive(Debug)]
pub struct PermissionGate {
    state: PermissionState,
    waiting: Vec<oneshot::Sender<bool>>,
}

impl PermissionGate {
    pub fn new(state: PermissionState) -> Self {
        Self {
            state,
            waiting: Vec::new(),
        }
    }

    pub fn state(&self) -> PermissionState {
        self.state
    }

    pub fn request(&mut self) -> oneshot::Receiver<bool> {
        let (tx, rx) = oneshot::channel();
        match self.state {
            PermissionState::Granted => {
                let _ = tx.send(true);
            }
            PermissionState::Denied => {
                let _ = tx.send(false);
            }
            PermissionState::Prompt => self.waiting.push(tx),
        }
        rx
    }

    pub fn awaiting_decision(&self) -> bool {
        !self.waiting.is_empty()
    }

    pub fn resolve(&mut self, granted: bool) {
        self.state = if granted {
            PermissionState::Granted
        } else {
            PermissionState::Denied
        };
        info!(permission = self.state.as_str(), "reminder permission decided");
        for tx in self.waiting.drain(..) {
            let _ = tx.send(granted);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionPoll {
    Pending,
    Resolved(bool),
}

/// Check a permission receiver without blocking. A dropped sender counts as denial.
pub fn poll_permission(rx: &mut oneshot::Receiver<bool>) -> PermissionPoll {
    match rx.try_recv() {
        Ok(granted) => PermissionPoll::Resolved(granted),
        Err(TryRecvError::Empty) => PermissionPoll::Pending,
        Err(TryRecvError::Closed) => PermissionPoll::Resolved(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn fixed_clock(y: i32, m: u32, d: u32, h: u32, min: u32) -> Clock {
        let now = NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap();
        Arc::new(move || now)
    }

    fn date(raw: &str) -> DateKey {
        raw.parse().unwrap()
    }

    fn time(raw: &str) -> TimeOfDay {
        raw.parse().unwrap()
    }

    #[test]
    fn schedules_lead_time_before_task() {
        let mut queue = NotificationQueue::with_clock(fixed_clock(2024, 3, 4, 8, 0));
        queue.schedule(
            "1",
            "Standup",
            date("2024-03-04"),
            time("09:00"),
            NotificationRequest::minutes_before(15),
        );
        let expected = date("2024-03-04").at(time("08:45"));
        assert_eq!(queue.scheduled_at("1"), Some(expected));
    }

    #[test]
    fn skips_reminders_in_the_past_or_disabled() {
        let mut queue = NotificationQueue::with_clock(fixed_clock(2024, 3, 4, 8, 50));
        queue.schedule(
            "1",
            "Standup",
            date("2024-03-04"),
            time("09:00"),
            NotificationRequest::minutes_before(15),
        );
        queue.schedule(
            "2",
            "Lunch",
            date("2024-03-04"),
            time("12:00"),
            NotificationRequest {
                enabled: false,
                minutes_before: Some(15),
            },
        );
        assert_eq!(queue.pending_count(), 0);
    }

    #[test]
    fn rescheduling_replaces_existing_entry() {
        let mut queue = NotificationQueue::with_clock(fixed_clock(2024, 3, 4, 8, 0));
        let request = NotificationRequest::minutes_before(10);
        queue.schedule("1", "Standup", date("2024-03-04"), time("09:00"), request);
        queue.schedule("1", "Standup", date("2024-03-06"), time("09:00"), request);
        assert_eq!(queue.pending_count(), 1);
        assert_eq!(
            queue.scheduled_at("1"),
            Some(date("2024-03-06").at(time("08:50")))
        );
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut queue = NotificationQueue::with_clock(fixed_clock(2024, 3, 4, 8, 0));
        queue.cancel("missing");
        queue.schedule(
            "1",
            "Standup",
            date("2024-03-04"),
            time("09:00"),
            NotificationRequest::minutes_before(5),
        );
        queue.cancel("1");
        queue.cancel("1");
        assert_eq!(queue.pending_count(), 0);
    }

    #[test]
    fn due_drains_fired_reminders_in_order() {
        let mut queue = NotificationQueue::with_clock(fixed_clock(2024, 3, 4, 7, 0));
        let request = NotificationRequest::minutes_before(30);
        queue.schedule("late", "Review", date("2024-03-04"), time("10:00"), request);
        queue.schedule("early", "Standup", date("2024-03-04"), time("09:00"), request);
        queue.schedule("next", "Retro", date("2024-03-05"), time("09:00"), request);

        let fired = queue.due(date("2024-03-04").at(time("09:45")));
        let ids: Vec<&str> = fired.iter().map(|r| r.task_id.as_str()).collect();
        assert_eq!(ids, vec!["early", "late"]);
        assert_eq!(fired[0].title, "Reminder: Standup");
        assert_eq!(fired[0].body, "Scheduled for Monday, 4 March at 09:00");
        assert_eq!(queue.pending_count(), 1);
    }

    #[test]
    fn permission_gate_answers_known_states_immediately() {
        let mut granted = PermissionGate::new(PermissionState::Granted);
        let mut rx = granted.request();
        assert_eq!(poll_permission(&mut rx), PermissionPoll::Resolved(true));

        let mut denied = PermissionGate::new(PermissionState::Denied);
        let mut rx = denied.request();
        assert_eq!(poll_permission(&mut rx), PermissionPoll::Resolved(false));
    }

    #[test]
    fn permission_prompt_resolves_later() {
        let mut gate = PermissionGate::new(PermissionState::Prompt);
        let mut rx = gate.request();
        assert_eq!(poll_permission(&mut rx), PermissionPoll::Pending);
        assert!(gate.awaiting_decision());

        gate.resolve(false);
        assert_eq!(poll_permission(&mut rx), PermissionPoll::Resolved(false));
        assert_eq!(gate.state(), PermissionState::Denied);
        assert!(!gate.awaiting_decision());
    }

    #[test]
    fn sync_reminder_cancels_when_request_removed() {
        let mut queue = NotificationQueue::with_clock(fixed_clock(2024, 3, 4, 7, 0));
        let mut task = Task {
            id: "1".into(),
            text: "Standup".into(),
            date: date("2024-03-04"),
            time: Some(time("09:00")),
            is_private: false,
            voice_note: None,
            notification: Some(NotificationRequest::minutes_before(15)),
        };
        sync_reminder(&mut queue, &task);
        assert_eq!(queue.pending_count(), 1);

        task.notification = None;
        sync_reminder(&mut queue, &task);
        assert_eq!(queue.pending_count(), 0);
    }
}
