use std::path::PathBuf;

use rusqlite::Connection;
use serde::Deserialize;

use crate::config::Config;
use crate::notify::Notifier;
use crate::session::SessionAuthenticator;
use crate::storage::MemoryTabStorage;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub config: Config,
    pub workspace: Option<PathBuf>,
    pub db: Option<Connection>,
    pub session: SessionAuthenticator,
    pub notices: Notifier,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            workspace: None,
            db: None,
            session: SessionAuthenticator::new(Box::new(MemoryTabStorage::new())),
            notices: Notifier::default(),
        }
    }
}
