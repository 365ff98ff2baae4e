//! User records derived from OAuth logins.
//!
//! Storage sits behind [`UserRepository`]; the bundled in-memory
//! implementation loses everything on restart.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub picture: Option<String>,
    pub provider: Option<String>,
    pub provider_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub picture: Option<String>,
    pub provider: Option<String>,
    pub provider_id: Option<String>,
}

/// Identity as returned by an OAuth provider callback.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OAuthIdentity {
    pub provider: String,
    pub provider_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub picture: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum UserStoreError {
    #[error("User with ID {0} not found")]
    NotFound(String),
    #[error("User with email {0} already exists")]
    DuplicateEmail(String),
    #[error("user store unavailable: {0}")]
    Backend(String),
}

pub type UserResult<T> = Result<T, UserStoreError>;

#[async_trait::async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, new: NewUser) -> UserResult<User>;
    async fn find_by_id(&self, id: &str) -> UserResult<Option<User>>;
    async fn find_by_email(&self, email: &str) -> UserResult<Option<User>>;
    /// Replace a stored user; `updated_at` is refreshed by the store.
    async fn update(&self, user: User) -> UserResult<User>;
}

#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<String, User>>,
    seq: AtomicU64,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self, now: DateTime<Utc>) -> String {
        let n = self.seq.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}", now.timestamp_millis(), n)
    }
}

fn poisoned<E>(_: E) -> UserStoreError {
    UserStoreError::Backend("lock poisoned".into())
}

#[async_trait::async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, new: NewUser) -> UserResult<User> {
        let now = Utc::now();
        let mut users = self.users.write().map_err(poisoned)?;
        if users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&new.email))
        {
            return Err(UserStoreError::DuplicateEmail(new.email));
        }
        let user = User {
            id: self.next_id(now),
            email: new.email,
            first_name: new.first_name,
            last_name: new.last_name,
            picture: new.picture,
            provider: new.provider,
            provider_id: new.provider_id,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: &str) -> UserResult<Option<User>> {
        let users = self.users.read().map_err(poisoned)?;
        Ok(users.get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> UserResult<Option<User>> {
        let users = self.users.read().map_err(poisoned)?;
        Ok(users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn update(&self, mut user: User) -> UserResult<User> {
        let mut users = self.users.write().map_err(poisoned)?;
        let Some(slot) = users.get_mut(&user.id) else {
            return Err(UserStoreError::NotFound(user.id));
        };
        user.created_at = slot.created_at;
        user.updated_at = Utc::now();
        *slot = user.clone();
        Ok(user)
    }
}

#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self { repo }
    }

    /// First login creates the user; later logins refresh picture and
    /// provider id on the existing record (matched by email).
    pub async fn upsert_oauth_identity(&self, id: OAuthIdentity) -> UserResult<User> {
        match self.repo.find_by_email(&id.email).await? {
            Some(mut existing) => {
                existing.picture = id.picture;
                existing.provider_id = Some(id.provider_id);
                tracing::info!(target: "users", user = %existing.id, "oauth login (existing user)");
                self.repo.update(existing).await
            }
            None => {
                let user = self
                    .repo
                    .create(NewUser {
                        email: id.email,
                        first_name: id.first_name,
                        last_name: id.last_name,
                        picture: id.picture,
                        provider: Some(id.provider),
                        provider_id: Some(id.provider_id),
                    })
                    .await?;
                tracing::info!(target: "users", user = %user.id, "oauth login (new user)");
                Ok(user)
            }
        }
    }

    pub async fn get(&self, id: &str) -> UserResult<User> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| UserStoreError::NotFound(id.to_string()))
    }
}
