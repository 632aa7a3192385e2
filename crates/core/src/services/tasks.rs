use std::collections::HashSet;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::capture::CaptureError;
use crate::database::TaskStorage;
use crate::model::{AddOutcome, DateKey, DeleteResult, Mutation, NewTask, Task, TimeOfDay};
use crate::notify::{sync_reminder, ReminderScheduler};

pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// The two tasks a fresh agenda starts with.
pub fn seed_tasks(today: DateKey) -> Vec<Task> {
    let mut meeting = NewTask::new("Team meeting", today);
    meeting.time = TimeOfDay::from_hm(9, 0);

    let mut doctor = NewTask::new("Doctor appointment", today);
    doctor.time = TimeOfDay::from_hm(14, 30);
    doctor.is_private = true;

    vec![meeting.into_task(), doctor.into_task()]
}

/// Ordered, persisted collection of tasks.
///
/// Order within a date is the insertion order and every mutation keeps it.
/// A mutation is written to storage before it becomes visible in memory, so
/// a failed save leaves the store as it was.
pub struct TaskStore {
    tasks: Vec<Task>,
    storage: Box<dyn TaskStorage>,
    reminders: Box<dyn ReminderScheduler>,
}

impl TaskStore {
    /// Load tasks from `storage`, falling back to the seed set when nothing
    /// usable is stored, and schedule reminders for what was loaded.
    pub fn open(
        storage: Box<dyn TaskStorage>,
        reminders: Box<dyn ReminderScheduler>,
        today: DateKey,
    ) -> Self {
        let mut store = Self {
            tasks: Vec::new(),
            storage,
            reminders,
        };

        match store.storage.load() {
            Ok(Some(tasks)) => {
                store.tasks = dedupe_ids(tasks);
                debug!(count = store.tasks.len(), "loaded tasks");
            }
            Ok(None) => {
                let seeds = seed_tasks(today);
                if let Err(err) = store.storage.save(&seeds) {
                    warn!(error = %err, "failed to persist seed tasks");
                }
                store.tasks = seeds;
            }
            // Stored value stays on disk until the first mutation replaces it.
            Err(err) => {
                warn!(error = %err, "stored tasks unreadable, starting from seed tasks");
                store.tasks = seed_tasks(today);
            }
        }

        for task in &store.tasks {
            sync_reminder(store.reminders.as_mut(), task);
        }
        store
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    /// Tasks dated `date`, in insertion order.
    pub fn tasks_on(&self, date: DateKey) -> Vec<&Task> {
        self.tasks.iter().filter(|task| task.date == date).collect()
    }

    pub fn count_on(&self, date: DateKey) -> usize {
        self.tasks.iter().filter(|task| task.date == date).count()
    }

    /// Case-insensitive match on the text, or a literal substring of the
    /// time or date. A blank query matches nothing.
    pub fn search(&self, query: &str, limit: usize) -> Vec<&Task> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }
        let needle = query.to_lowercase();
        self.tasks
            .iter()
            .filter(|task| {
                task.text.to_lowercase().contains(&needle)
                    || task
                        .time
                        .map(|time| time.to_string().contains(query))
                        .unwrap_or(false)
                    || task.date.to_string().contains(query)
            })
            .take(limit)
            .collect()
    }

    pub fn reminders(&self) -> &dyn ReminderScheduler {
        self.reminders.as_ref()
    }

    pub fn reminders_mut(&mut self) -> &mut dyn ReminderScheduler {
        self.reminders.as_mut()
    }

    pub fn add(&mut self, draft: NewTask) -> Result<AddOutcome> {
        let text = draft.text.trim().to_string();
        if text.is_empty() {
            return Err(CaptureError::EmptyText.into());
        }

        let task = NewTask { text, ..draft }.into_task();
        let mut next = self.tasks.clone();
        next.push(task.clone());
        self.commit(next)?;

        sync_reminder(self.reminders.as_mut(), &task);
        info!(id = task.id.as_str(), date = %task.date, "added task");
        Ok(AddOutcome {
            id: task.id,
            date: task.date,
            text: task.text,
        })
    }

    /// Replace the task with the same id, keeping its position.
    pub fn update(&mut self, task: Task) -> Result<Option<Task>> {
        let text = task.text.trim().to_string();
        if text.is_empty() {
            return Err(CaptureError::EmptyText.into());
        }
        let Some(position) = self.position(&task.id) else {
            return Ok(None);
        };

        let updated = Task { text, ..task };
        if self.tasks[position] == updated {
            return Ok(Some(updated));
        }

        let mut next = self.tasks.clone();
        next[position] = updated.clone();
        self.commit(next)?;

        sync_reminder(self.reminders.as_mut(), &updated);
        info!(id = updated.id.as_str(), "updated task");
        Ok(Some(updated))
    }

    pub fn delete(&mut self, id: &str) -> Result<DeleteResult> {
        let mut results = self.delete_many(&[id.to_string()])?;
        Ok(results.remove(0))
    }

    pub fn delete_many(&mut self, ids: &[String]) -> Result<Vec<DeleteResult>> {
        let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let results: Vec<DeleteResult> = ids
            .iter()
            .map(|id| DeleteResult {
                id: id.clone(),
                deleted: self.position(id).is_some(),
            })
            .collect();

        if results.iter().any(|result| result.deleted) {
            let next: Vec<Task> = self
                .tasks
                .iter()
                .filter(|task| !wanted.contains(task.id.as_str()))
                .cloned()
                .collect();
            self.commit(next)?;
            for result in results.iter().filter(|result| result.deleted) {
                self.reminders.cancel(&result.id);
                info!(id = result.id.as_str(), "deleted task");
            }
        }
        Ok(results)
    }

    /// Reassign a task to `date` and place it last on that day.
    pub fn move_task(&mut self, id: &str, date: DateKey) -> Result<Mutation> {
        let Some(position) = self.position(id) else {
            debug!(id, "move ignored, unknown task");
            return Ok(Mutation::Unchanged);
        };
        let from = self.tasks[position].date;
        if from == date {
            return Ok(Mutation::Unchanged);
        }

        let mut next = self.tasks.clone();
        let mut task = next.remove(position);
        task.date = date;
        next.push(task.clone());
        self.commit(next)?;

        sync_reminder(self.reminders.as_mut(), &task);
        info!(id, %from, to = %date, "moved task");
        Ok(Mutation::Moved {
            id: id.to_string(),
            from,
            to: date,
        })
    }

    /// Place `drag_id` where `hover_id` sits in `target_date`'s list, taking
    /// the hovered index before the dragged task is removed.
    pub fn reorder(
        &mut self,
        drag_id: &str,
        hover_id: &str,
        target_date: DateKey,
    ) -> Result<Mutation> {
        if drag_id == hover_id {
            return Ok(Mutation::Unchanged);
        }
        let Some(dragged) = self.get(drag_id).cloned() else {
            debug!(drag_id, "reorder ignored, unknown dragged task");
            return Ok(Mutation::Unchanged);
        };

        let target: Vec<&Task> = self.tasks_on(target_date);
        let Some(hover_index) = target.iter().position(|task| task.id == hover_id) else {
            debug!(hover_id, %target_date, "reorder ignored, hovered task not on target day");
            return Ok(Mutation::Unchanged);
        };

        let mut reordered: Vec<Task> = target
            .into_iter()
            .filter(|task| task.id != drag_id)
            .cloned()
            .collect();
        let from = dragged.date;
        let moved = Task {
            date: target_date,
            ..dragged
        };
        let index = hover_index.min(reordered.len());
        reordered.insert(index, moved.clone());

        let mut next: Vec<Task> = self
            .tasks
            .iter()
            .filter(|task| task.date != target_date && task.id != drag_id)
            .cloned()
            .collect();
        next.extend(reordered);

        if next == self.tasks {
            return Ok(Mutation::Unchanged);
        }
        self.commit(next)?;

        if from != target_date {
            sync_reminder(self.reminders.as_mut(), &moved);
        }
        info!(drag_id, hover_id, %from, to = %target_date, index, "reordered task");
        Ok(Mutation::Reordered {
            id: drag_id.to_string(),
            from,
            to: target_date,
            index,
        })
    }

    /// Remove every task and its reminder.
    pub fn clear(&mut self) -> Result<usize> {
        let removed: Vec<String> = self.tasks.iter().map(|task| task.id.clone()).collect();
        self.commit(Vec::new())?;
        for id in &removed {
            self.reminders.cancel(id);
        }
        info!(count = removed.len(), "cleared tasks");
        Ok(removed.len())
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.tasks.iter().position(|task| task.id == id)
    }

    fn commit(&mut self, next: Vec<Task>) -> Result<()> {
        self.storage.save(&next)?;
        self.tasks = next;
        Ok(())
    }
}

fn dedupe_ids(tasks: Vec<Task>) -> Vec<Task> {
    let mut seen = HashSet::new();
    let before = tasks.len();
    let unique: Vec<Task> = tasks
        .into_iter()
        .filter(|task| seen.insert(task.id.clone()))
        .collect();
    if unique.len() != before {
        warn!(dropped = before - unique.len(), "dropped tasks with duplicate ids");
    }
    unique
}
