pub use agenda_tui::cli;
pub use agenda_tui::commands;
pub use agenda_tui::config;
pub use agenda_tui::logging;
pub use agenda_tui::tui;
pub use agenda_tui::AppConfig;

pub use agenda_core as core;
pub use agenda_core::capture;
pub use agenda_core::database as db;
pub use agenda_core::model;
pub use agenda_core::parser;
pub use agenda_core::session;
pub use agenda_core::settings;
