use std::sync::Arc;
use std::time::{Instant, SystemTime};

use crate::db::Database;
use crate::services::llm_provider::ChatApi;

#[derive(Clone)]
pub struct AppState {
    started_at: Instant,
    started_at_system: SystemTime,
    db: Database,
    chat: Arc<dyn ChatApi>,
}

impl AppState {
    pub fn new(db: Database, chat: Arc<dyn ChatApi>) -> Self {
        Self {
            started_at: Instant::now(),
            started_at_system: SystemTime::now(),
            db,
            chat,
        }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn chat(&self) -> &Arc<dyn ChatApi> {
        &self.chat
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn started_at_system(&self) -> SystemTime {
        self.started_at_system
    }
}
