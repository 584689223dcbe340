use sqlx::{Pool, Postgres};
use std::sync::Arc;

use crate::jobs::PassStatus;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: Pool<Postgres>,
    pub status: Arc<PassStatus>,
}

impl AppState {
    pub fn new(pool: Pool<Postgres>, status: Arc<PassStatus>) -> Self {
        Self {
            db_pool: pool,
            status,
        }
    }
}
