use std::path::PathBuf;

use crate::store::User;
use rusqlite::Connection;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Daemon-wide state. `session` is the active-user context: it is loaded
/// from the store when a workspace is selected and mutated only through the
/// `session.*` handlers.
pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub db: Option<Connection>,
    pub session: User,
}
