//! PostgreSQL-backed community store over the `user_roles`,
//! `community_members` and `follows` tables.

use agora_core::AppError;
use sqlx::PgPool;

mod follows;
mod roles;


/// PostgreSQL implementation of the role and follow store ports.
#[derive(Clone)]
pub struct PostgresCommunityStore {
    pool: PgPool,
}

impl PostgresCommunityStore {
    /// Creates a store with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn store_error(context: &str, error: sqlx::Error) -> AppError {
    match error {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            AppError::Unavailable(format!("{context}: {error}"))
        }
        other => AppError::Internal(format!("{context}: {other}")),
    }
}
