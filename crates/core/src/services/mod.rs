pub mod tasks;

pub use tasks::{seed_tasks, TaskStore, DEFAULT_SEARCH_LIMIT};
