// src/state.rs
use sqlx::PgPool;

use crate::finance::calculator::BataBase;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub bata_base: BataBase,
}

impl AppState {
    pub fn new(db_pool: PgPool, bata_base: BataBase) -> Self {
        Self { db_pool, bata_base }
    }
}
