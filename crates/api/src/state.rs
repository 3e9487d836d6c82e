use std::sync::Arc;

use tagvault_db::DbPool;
use tagvault_worker::TaskQueue;

use crate::config::ServerConfig;

/// Shared state for HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub queue: TaskQueue,
    pub config: Arc<ServerConfig>,
}
