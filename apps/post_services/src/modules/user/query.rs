use std::collections::HashMap;

use async_trait::async_trait;
use pgsql_libs::DbPool;
use sqlx::query_as;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::StoreError;

use super::model::UserPayload;

/// Read side of the user module, consumed by the authentication guard.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<UserPayload>, StoreError>;
}

pub struct PgUserStore {
    db_pool: DbPool,
}

impl PgUserStore {
    pub fn new(db_pool: DbPool) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<UserPayload>, StoreError> {
        let user = query_as::<_, UserPayload>(
            r#"
            SELECT id, username, email FROM "user" WHERE id = $1;
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db_pool)
        .await?;
        Ok(user)
    }
}

#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, UserPayload>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, user: UserPayload) {
        self.users.write().await.insert(user.id, user);
    }

    pub async fn remove(&self, id: Uuid) -> Option<UserPayload> {
        self.users.write().await.remove(&id)
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<UserPayload>, StoreError> {
        Ok(self.users.read().await.get(&id).cloned())
    }
}
