use anyhow::Result;

use crate::config::AppConfig;
use crate::model::DeleteResult;
use crate::session::AgendaSession;

/// Delete the tasks with the provided ids and return per-id results.
pub fn delete_tasks(config: &AppConfig, ids: &[String]) -> Result<Vec<DeleteResult>> {
    let mut session = AgendaSession::open(config)?;
    session.delete_tasks(ids)
}
