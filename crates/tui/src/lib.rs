pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;
pub mod tui;

pub use agenda_core as core;
pub use agenda_core::capture;
pub use agenda_core::database as db;
pub use agenda_core::model;
pub use agenda_core::parser;
pub use agenda_core::settings;

pub use agenda_core::AppConfig;
