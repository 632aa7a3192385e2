use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::{BaseDirs, ProjectDirs};
use once_cell::sync::Lazy;

use crate::notify::PermissionState;

static DEFAULT_DB_NAME: &str = "agenda.sqlite3";
static DEFAULT_LOG_NAME: &str = "agenda.log";
static ENV_DATA_DIR: &str = "AGENDA_DATA_DIR";
static ENV_NOTIFICATIONS: &str = "AGENDA_NOTIFICATIONS";

static PROJECT_DIRS: Lazy<Option<ProjectDirs>> =
    Lazy::new(|| ProjectDirs::from("dev", "agenda", "agenda"));

#[derive(Debug, Clone)]
pub struct AppConfig {
    data_dir: PathBuf,
    db_path: PathBuf,
    log_path: PathBuf,
    default_permission: PermissionState,
}

impl AppConfig {
    /// Construct [`AppConfig`] by resolving the data directory using the provided override,
    /// environment variables, and platform defaults.
    pub fn discover(data_dir_override: Option<PathBuf>) -> Result<Self> {
        let data_dir = resolve_data_dir(data_dir_override)?;
        if !data_dir.exists() {
            fs::create_dir_all(&data_dir).with_context(|| {
                format!("Failed to create data directory at {}", data_dir.display())
            })?;
        }
        let mut config = Self::from_data_dir(data_dir)?;
        if let Ok(raw) = env::var(ENV_NOTIFICATIONS) {
            config.default_permission = raw
                .parse()
                .with_context(|| format!("Invalid {} value", ENV_NOTIFICATIONS))?;
        }
        Ok(config)
    }

    /// Construct [`AppConfig`] directly from a resolved data directory.
    pub fn from_data_dir(data_dir: PathBuf) -> Result<Self> {
        let db_path = data_dir.join(DEFAULT_DB_NAME);
        let log_path = data_dir.join(DEFAULT_LOG_NAME);
        Ok(Self {
            data_dir,
            db_path,
            log_path,
            default_permission: PermissionState::Prompt,
        })
    }

    pub fn with_default_permission(mut self, permission: PermissionState) -> Self {
        self.default_permission = permission;
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Reminder permission used until the user makes a decision.
    pub fn default_permission(&self) -> PermissionState {
        self.default_permission
    }
}

fn resolve_data_dir(data_dir_override: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = data_dir_override {
        return Ok(dir);
    }

    if let Ok(env_dir) = env::var(ENV_DATA_DIR) {
        return Ok(PathBuf::from(env_dir));
    }

    if cfg!(debug_assertions) {
        let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        let dev_dir = manifest_dir.join("..").join("tmp").join("dev-agenda");
        return Ok(dev_dir);
    }

    if let Some(project) = &*PROJECT_DIRS {
        return Ok(project.data_dir().to_path_buf());
    }

    if let Some(base) = BaseDirs::new() {
        return Ok(base.home_dir().join(".agenda"));
    }

    Ok(env::current_dir()?.join(".agenda"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn from_data_dir_places_files_inside_directory() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::from_data_dir(dir.path().to_path_buf()).unwrap();
        assert_eq!(config.db_path(), dir.path().join("agenda.sqlite3"));
        assert_eq!(config.log_path(), dir.path().join("agenda.log"));
        assert_eq!(config.default_permission(), PermissionState::Prompt);
    }

    #[test]
    fn discover_creates_missing_override_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("nested").join("agenda");
        let config = AppConfig::discover(Some(nested.clone())).unwrap();
        assert!(nested.exists());
        assert_eq!(config.data_dir(), nested.as_path());
    }
}
