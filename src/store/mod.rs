//! Storage collaborator for issued tokens and user records.
//!
//! The engine only depends on the [`Store`] trait. Records are upserted one at
//! a time; there are no cross-record transactions.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;
use utoipa::ToSchema;

use crate::hash::IdHashPair;
use crate::token::SessionToken;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error")]
    Database(#[from] sqlx::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// User record as held by the directory.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub pw_hash: String,
    pub emails: BTreeSet<String>,
    /// Derived correlation ids keyed by caller-supplied key.
    pub private: HashMap<String, IdHashPair>,
}

/// Public view of a user; never includes the password hash or private values.
#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct UserResponse {
    #[serde(rename = "userid")]
    pub user_id: String,
    pub username: String,
    pub emails: Vec<String>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id.clone(),
            username: user.name.clone(),
            emails: user.emails.iter().cloned().collect(),
        }
    }
}

/// Lookup criteria for [`Store::find_user`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UserQuery {
    ById(String),
    ByName(String),
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn add_token(&self, token: &SessionToken) -> Result<(), StoreError>;

    async fn find_token(&self, token: &str) -> Result<Option<SessionToken>, StoreError>;

    async fn remove_token(&self, token: &str) -> Result<(), StoreError>;

    /// Insert or replace a user. An empty `id` is assigned by the store.
    async fn upsert_user(&self, user: &User) -> Result<(), StoreError>;

    async fn find_user(&self, query: &UserQuery) -> Result<Option<User>, StoreError>;

    /// Liveness check used by the health endpoint.
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
