use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Connection, PgPool, Row, postgres::PgPoolOptions, postgres::PgRow, types::Json};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{Instrument, Span};
use uuid::Uuid;

use super::{Store, StoreError, User, UserQuery};
use crate::hash::IdHashPair;
use crate::token::SessionToken;

/// PostgreSQL-backed store. Schema lives in `sql/schema.sql`.
#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

fn db_span(operation: &'static str, statement: &'static str) -> Span {
    tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = operation,
        db.statement = statement
    )
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a connection pool for `dsn`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be reached.
    pub async fn connect(dsn: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .min_connections(1)
            .max_connections(5)
            .max_lifetime(Duration::from_secs(60 * 2))
            .test_before_acquire(true)
            .connect(dsn)
            .await
            .context("Failed to connect to database")?;

        Ok(Self::new(pool))
    }

    fn token_from_row(row: &PgRow) -> Result<SessionToken, StoreError> {
        Ok(SessionToken {
            token: row.try_get("token")?,
            is_server: row.try_get("is_server")?,
            principal_id: row.try_get("principal_id")?,
            duration_secs: row.try_get("duration_secs")?,
            created_at: row.try_get("created_at")?,
            expires_at: row.try_get("expires_at")?,
        })
    }

    fn user_from_row(row: &PgRow) -> Result<User, StoreError> {
        let emails: Vec<String> = row.try_get("emails")?;
        let Json(private): Json<HashMap<String, IdHashPair>> = row.try_get("private")?;

        Ok(User {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            pw_hash: row.try_get("pw_hash")?,
            emails: emails.into_iter().collect(),
            private,
        })
    }
}

#[async_trait]
impl Store for PgStore {
    async fn add_token(&self, token: &SessionToken) -> Result<(), StoreError> {
        let query = r"
            INSERT INTO session_tokens
                (token, is_server, principal_id, duration_secs, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (token) DO NOTHING
        ";
        sqlx::query(query)
            .bind(&token.token)
            .bind(token.is_server)
            .bind(&token.principal_id)
            .bind(token.duration_secs)
            .bind(token.created_at)
            .bind(token.expires_at)
            .execute(&self.pool)
            .instrument(db_span("INSERT", query))
            .await?;
        Ok(())
    }

    async fn find_token(&self, token: &str) -> Result<Option<SessionToken>, StoreError> {
        let query = r"
            SELECT token, is_server, principal_id, duration_secs, created_at, expires_at
            FROM session_tokens
            WHERE token = $1
        ";
        let row = sqlx::query(query)
            .bind(token)
            .fetch_optional(&self.pool)
            .instrument(db_span("SELECT", query))
            .await?;
        row.as_ref().map(Self::token_from_row).transpose()
    }

    async fn remove_token(&self, token: &str) -> Result<(), StoreError> {
        let query = "DELETE FROM session_tokens WHERE token = $1";
        sqlx::query(query)
            .bind(token)
            .execute(&self.pool)
            .instrument(db_span("DELETE", query))
            .await?;
        Ok(())
    }

    async fn upsert_user(&self, user: &User) -> Result<(), StoreError> {
        let query = r"
            INSERT INTO users (id, name, pw_hash, emails, private)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                pw_hash = EXCLUDED.pw_hash,
                emails = EXCLUDED.emails,
                private = EXCLUDED.private
        ";
        let id = if user.id.is_empty() {
            Uuid::new_v4().simple().to_string()
        } else {
            user.id.clone()
        };
        let emails: Vec<String> = user.emails.iter().cloned().collect();

        sqlx::query(query)
            .bind(id)
            .bind(&user.name)
            .bind(&user.pw_hash)
            .bind(emails)
            .bind(Json(&user.private))
            .execute(&self.pool)
            .instrument(db_span("INSERT", query))
            .await?;
        Ok(())
    }

    async fn find_user(&self, query: &UserQuery) -> Result<Option<User>, StoreError> {
        let (statement, value) = match query {
            UserQuery::ById(id) => (
                "SELECT id, name, pw_hash, emails, private FROM users WHERE id = $1",
                id,
            ),
            UserQuery::ByName(name) => (
                "SELECT id, name, pw_hash, emails, private FROM users WHERE name = $1",
                name,
            ),
        };
        let row = sqlx::query(statement)
            .bind(value)
            .fetch_optional(&self.pool)
            .instrument(db_span("SELECT", statement))
            .await?;
        row.as_ref().map(Self::user_from_row).transpose()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self
            .pool
            .acquire()
            .instrument(tracing::info_span!(
                "db.acquire",
                db.system = "postgresql",
                db.operation = "ACQUIRE"
            ))
            .await?;
        conn.ping()
            .instrument(tracing::info_span!(
                "db.ping",
                db.system = "postgresql",
                db.operation = "PING"
            ))
            .await?;
        Ok(())
    }
}
