use std::time::Duration;

pub(crate) const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
pub(crate) const TICK_RATE: Duration = Duration::from_millis(200);
pub(crate) const STATUS_TTL: Duration = Duration::from_secs(5);

/// Rows from either end of the agenda at which more days are loaded.
pub(crate) const EDGE_THRESHOLD_ROWS: f64 = 8.0;
pub(crate) const DEFAULT_REMINDER_MINUTES: u32 = 15;
pub(crate) const SEARCH_RESULT_LIMIT: usize = 10;

pub(crate) const STATUS_ENTER_ADD: &str =
    "New task for the selected day, tokens allowed: at:HH:MM on:DATE remind:MIN !private (Esc to cancel)";
pub(crate) const STATUS_ENTER_EDIT: &str =
    "Edit task, tokens apply immediately • Enter to save • Esc to cancel";
pub(crate) const STATUS_GOTO: &str = "Jump to a day: YYYY-MM-DD, today, +2w, fri • Enter to go";
pub(crate) const STATUS_SEARCH: &str = "Search tasks • ↑/↓ pick • Enter jumps to the task • Esc closes";
pub(crate) const STATUS_DRAGGING: &str =
    "Moving task • move the cursor onto a day or a task • Enter/m drops • Esc cancels";
pub(crate) const STATUS_SETTINGS: &str =
    "Settings • ↑/↓ select • ←/→ change • Enter opens • Esc closes";
pub(crate) const STATUS_VIEW_DETAILS: &str = "Viewing task details • Enter/Esc to close";
pub(crate) const STATUS_HELP: &str = "Keyboard reference • Enter/Esc to close";
pub(crate) const STATUS_CONFIRM: &str =
    "Confirm • arrows choose, Enter confirms, Esc cancels";
pub(crate) const STATUS_PERMISSION: &str = "Allow reminders? y allows • n blocks • Esc decides later";
pub(crate) const STATUS_JOIN: &str = "Enter the 6-character share code • Enter joins • Esc cancels";
pub(crate) const STATUS_TITLE: &str = "Agenda title, blank restores the default • Enter saves";
pub(crate) const STATUS_NO_TASK: &str = "Put the cursor on a task first";
