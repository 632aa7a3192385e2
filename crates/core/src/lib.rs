pub mod capture;
pub mod commands;
pub mod config;
pub mod database;
pub mod dnd;
pub mod model;
pub mod notify;
pub mod parser;
pub mod services;
pub mod session;
pub mod settings;
pub mod tracker;
pub mod window;

pub use capture::{CaptureError, TaskInput};
pub use commands::delete_tasks;
pub use config::AppConfig;
pub use database::{Database, TaskStorage};
pub use dnd::{DragCommand, DragController, DragPayload, DragState, DropTarget};
pub use model::*;
pub use notify::{
    NotificationQueue, PermissionGate, PermissionPoll, PermissionState, Reminder,
    ReminderScheduler,
};
pub use services::TaskStore;
pub use session::AgendaSession;
pub use settings::{ShareError, UserProfile, UserSettings};
pub use tracker::{resolve_active_date, DayRect, Viewport, VisibleDateTracker};
pub use window::{DateWindow, ExtendOutcome, JumpError, ScrollMetrics};
