//! Session store implementation.
//!
//! Sessions are issued by the external auth collaborator; this repository
//! only validates tokens against the `session` table. Expired rows are
//! treated exactly like unknown tokens.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres};
use tracing::debug;

use jotter_core::{AuthPrincipal, Error, Result, Session, SessionStore};

/// PostgreSQL implementation of SessionStore.
pub struct PgSessionRepository {
    pool: Pool<Postgres>,
}

impl PgSessionRepository {
    /// Create a new PgSessionRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionRepository {
    async fn get_session(&self, token: &str) -> Result<Option<AuthPrincipal>> {
        let session = sqlx::query_as::<_, Session>(
            "SELECT token, user_id, expires_at FROM session WHERE token = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        // An expired row reads exactly like an unknown token.
        let live = session.filter(|s| !s.is_expired(Utc::now()));

        debug!(
            subsystem = "db",
            component = "sessions",
            op = "get_session",
            success = live.is_some(),
            "Session lookup"
        );

        Ok(live.map(|s| AuthPrincipal { user_id: s.user_id }))
    }
}
