use std::sync::Arc;

use agenda_core::notify::ReminderScheduler;
use agenda_core::{
    AgendaSession, AppConfig, Database, DateKey, DateWindow, Direction, DragPayload, DropTarget,
    Mutation, NewTask, NotificationQueue, NotificationRequest, PermissionState, Task, TaskStorage,
    TaskStore,
};
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn day(raw: &str) -> DateKey {
    raw.parse().unwrap()
}

fn task(id: &str, text: &str, date: &str) -> Task {
    Task {
        id: id.into(),
        text: text.into(),
        date: day(date),
        time: None,
        is_private: false,
        voice_note: None,
        notification: None,
    }
}

fn session_with(tasks: Vec<Task>) -> AgendaSession {
    let mut storage = Database::open_in_memory().unwrap();
    storage.save(&tasks).unwrap();
    let now = NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(8, 0, 0)
        .unwrap();
    let store = TaskStore::open(
        Box::new(storage),
        Box::new(NotificationQueue::with_clock(Arc::new(move || now))),
        day("2024-03-04"),
    );
    AgendaSession::from_parts(
        store,
        Database::open_in_memory().unwrap(),
        day("2024-03-04"),
        PermissionState::Granted,
    )
}

fn ids_on(session: &AgendaSession, date: &str) -> Vec<String> {
    session
        .tasks_on(day(date))
        .into_iter()
        .map(|task| task.id.clone())
        .collect()
}

#[test]
fn standup_dropped_on_day_container_moves_to_end() {
    let mut standup = task("1", "Standup", "2024-03-04");
    standup.time = Some("09:00".parse().unwrap());
    let mut session = session_with(vec![standup, task("2", "Review", "2024-03-06")]);

    session.begin_drag(DragPayload::task("1", day("2024-03-04")));
    session.hover_drag(DropTarget::Day(day("2024-03-06")));
    session.drop_drag().unwrap();

    assert_eq!(ids_on(&session, "2024-03-06"), vec!["2", "1"]);
    assert!(ids_on(&session, "2024-03-04").is_empty());
    let moved = session.store().get("1").unwrap();
    assert_eq!(moved.text, "Standup");
    assert_eq!(moved.time.map(|t| t.to_string()).as_deref(), Some("09:00"));
}

#[test]
fn dragging_c_over_a_yields_c_a_b() {
    let mut session = session_with(vec![
        task("A", "A", "2024-03-06"),
        task("B", "B", "2024-03-06"),
        task("C", "C", "2024-03-06"),
    ]);
    session.begin_drag(DragPayload::task("C", day("2024-03-06")));
    session.hover_drag(DropTarget::Row {
        task_id: "A".into(),
        date: day("2024-03-06"),
    });
    session.drop_drag().unwrap();
    assert_eq!(ids_on(&session, "2024-03-06"), vec!["C", "A", "B"]);
}

#[test]
fn window_grows_to_fifty_six_contiguous_days() {
    let d = day("2024-03-04");
    let mut window = DateWindow::around(d);
    window.extend(Direction::After);
    window.extend(Direction::Before);
    assert_eq!(window.len(), 56);
    assert_eq!(window.first(), Some(d.offset(-28)));
    assert_eq!(window.last(), Some(d.offset(27)));
    assert!(window
        .dates()
        .windows(2)
        .all(|pair| pair[0].succ() == pair[1]));
}

#[test]
fn noop_drops_keep_store_byte_identical() {
    let mut session = session_with(vec![task("A", "A", "2024-03-06"), task("B", "B", "2024-03-07")]);
    let before = serde_json::to_string(session.store().tasks()).unwrap();

    session.begin_drag(DragPayload::task("A", day("2024-03-06")));
    session.hover_drag(DropTarget::Row {
        task_id: "A".into(),
        date: day("2024-03-06"),
    });
    assert_eq!(session.drop_drag().unwrap(), Mutation::Unchanged);

    session.begin_drag(DragPayload::task("A", day("2024-03-06")));
    session.hover_drag(DropTarget::Day(day("2024-03-06")));
    assert_eq!(session.drop_drag().unwrap(), Mutation::Unchanged);

    session.begin_drag(DragPayload {
        id: None,
        date: day("2024-03-06"),
    });
    assert_eq!(session.drop_drag().unwrap(), Mutation::Unchanged);

    assert_eq!(serde_json::to_string(session.store().tasks()).unwrap(), before);
}

#[test]
fn reorders_preserve_the_id_multiset() {
    let mut session = session_with(vec![
        task("A", "A", "2024-03-05"),
        task("B", "B", "2024-03-06"),
        task("C", "C", "2024-03-06"),
        task("D", "D", "2024-03-07"),
    ]);
    let mut expected: Vec<String> = session.store().tasks().iter().map(|t| t.id.clone()).collect();
    expected.sort();

    session.on_reorder_task("A", "C", day("2024-03-06")).unwrap();
    session.on_reorder_task("D", "B", day("2024-03-06")).unwrap();
    session.on_reorder_task("B", "A", day("2024-03-06")).unwrap();

    let mut ids: Vec<String> = session.store().tasks().iter().map(|t| t.id.clone()).collect();
    ids.sort();
    assert_eq!(ids, expected);
    assert_eq!(ids_on(&session, "2024-03-06"), vec!["D", "A", "B", "C"]);
}

#[test]
fn date_change_keeps_exactly_one_reminder() {
    let mut session = session_with(vec![]);
    let mut draft = NewTask::new("Dentist", day("2024-03-05"));
    draft.time = Some("10:00".parse().unwrap());
    draft.notification = Some(NotificationRequest::minutes_before(30));
    let id = session.add_task(draft).unwrap().id;

    session.on_move_task(&id, day("2024-03-08")).unwrap();
    let mut edited = session.store().get(&id).unwrap().clone();
    edited.time = Some("11:00".parse().unwrap());
    session.update_task(edited).unwrap();

    let reminders = session.store().reminders();
    assert_eq!(reminders.pending_count(), 1);
    assert_eq!(
        reminders.scheduled_at(&id),
        Some(day("2024-03-08").at("10:30".parse().unwrap()))
    );
}

#[test]
fn tasks_survive_a_restart() {
    let dir = TempDir::new().unwrap();
    let config = AppConfig::from_data_dir(dir.path().to_path_buf()).unwrap();
    let id = {
        let mut session = AgendaSession::open(&config).unwrap();
        session
            .add_task(NewTask::new("Water plants", day("2030-01-01")))
            .unwrap()
            .id
    };
    let session = AgendaSession::open(&config).unwrap();
    assert_eq!(session.store().len(), 3);
    assert_eq!(session.store().get(&id).unwrap().text, "Water plants");
}
