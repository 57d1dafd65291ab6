use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{Store, StoreError, User, UserQuery};
use crate::token::SessionToken;

/// Process-local store for development and tests.
///
/// Every call counts as one operation; [`MemoryStore::set_failing`] makes all
/// subsequent calls fail with [`StoreError::Unavailable`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    tokens: Mutex<HashMap<String, SessionToken>>,
    users: Mutex<HashMap<String, User>>,
    failing: AtomicBool,
    operations: AtomicUsize,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user record.
    #[must_use]
    pub fn with_user(mut self, user: User) -> Self {
        self.users.get_mut().insert(user.id.clone(), user);
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of store calls made so far.
    #[must_use]
    pub fn operations(&self) -> usize {
        self.operations.load(Ordering::SeqCst)
    }

    pub async fn token_count(&self) -> usize {
        self.tokens.lock().await.len()
    }

    fn begin(&self, operation: &str) -> Result<(), StoreError> {
        self.operations.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!("{operation} failure")));
        }
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn add_token(&self, token: &SessionToken) -> Result<(), StoreError> {
        self.begin("add_token")?;
        self.tokens
            .lock()
            .await
            .insert(token.token.clone(), token.clone());
        Ok(())
    }

    async fn find_token(&self, token: &str) -> Result<Option<SessionToken>, StoreError> {
        self.begin("find_token")?;
        Ok(self.tokens.lock().await.get(token).cloned())
    }

    async fn remove_token(&self, token: &str) -> Result<(), StoreError> {
        self.begin("remove_token")?;
        self.tokens.lock().await.remove(token);
        Ok(())
    }

    async fn upsert_user(&self, user: &User) -> Result<(), StoreError> {
        self.begin("upsert_user")?;
        let mut user = user.clone();
        if user.id.is_empty() {
            user.id = Uuid::new_v4().simple().to_string();
        }
        self.users.lock().await.insert(user.id.clone(), user);
        Ok(())
    }

    async fn find_user(&self, query: &UserQuery) -> Result<Option<User>, StoreError> {
        self.begin("find_user")?;
        let users = self.users.lock().await;
        let found = match query {
            UserQuery::ById(id) => users.get(id).cloned(),
            UserQuery::ByName(name) => users.values().find(|user| &user.name == name).cloned(),
        };
        Ok(found)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.begin("ping")
    }
}
