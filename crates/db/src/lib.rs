use std::time::Duration;

use sqlx::{PgPool, postgres::PgPoolOptions};

pub mod models;

const MAX_CONNECTIONS: u32 = 5;

/// Handle over the read-only candidate database.
#[derive(Clone)]
pub struct DBService {
    pub pool: PgPool,
}

impl DBService {
    /// Build a pool that connects on first use. Startup never blocks on the
    /// database; an unreachable database surfaces as a query error instead.
    pub fn connect_lazy(database_url: &str, acquire_timeout: Duration) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(acquire_timeout)
            .connect_lazy(database_url)?;
        Ok(Self { pool })
    }
}
