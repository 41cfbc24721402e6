use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use moka::future::Cache;
use sqlx::MySqlPool;
use tracing::debug;

/// Current `token_version` per active user.
///
/// Tokens carry the version they were issued with; bumping the stored
/// version invalidates every token issued before it.
#[derive(Clone)]
pub struct TokenVersions {
    cache: Cache<u64, u32>,
    // advanced on every invalidation; a lookup that straddles one is not cached
    epoch: Arc<AtomicU64>,
}

impl TokenVersions {
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(50_000)
                .time_to_live(ttl)
                .build(),
            epoch: Arc::new(AtomicU64::new(0)),
        }
    }

    fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Cache a version read from the database, unless an invalidation ran
    /// since `seen` was taken.
    async fn fill(&self, user_id: u64, version: u32, seen: u64) {
        self.cache.insert(user_id, version).await;
        if self.epoch() != seen {
            self.cache.invalidate(&user_id).await;
        }
    }

    async fn forget(&self, user_id: u64) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.cache.invalidate(&user_id).await;
    }

    /// `None` when the user no longer exists or is inactive.
    pub async fn current(
        &self,
        user_id: u64,
        pool: Option<&MySqlPool>,
    ) -> Result<Option<u32>, sqlx::Error> {
        if let Some(version) = self.cache.get(&user_id).await {
            return Ok(Some(version));
        }

        let Some(pool) = pool else {
            return Ok(None);
        };

        let seen = self.epoch();
        let row: Option<(u32, bool)> =
            sqlx::query_as("SELECT token_version, is_active FROM users WHERE id = ?")
                .bind(user_id)
                .fetch_optional(pool)
                .await?;

        match row {
            Some((version, true)) => {
                self.fill(user_id, version, seen).await;
                Ok(Some(version))
            }
            _ => Ok(None),
        }
    }

    pub async fn remember(&self, user_id: u64, version: u32) {
        self.cache.insert(user_id, version).await;
    }

    /// Increment the stored version. `false` if the user does not exist.
    pub async fn bump(&self, pool: &MySqlPool, user_id: u64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET token_version = token_version + 1 WHERE id = ?")
            .bind(user_id)
            .execute(pool)
            .await?;

        self.forget(user_id).await;
        debug!(user_id, "Token version bumped");

        Ok(result.rows_affected() > 0)
    }

    pub async fn bump_all(&self, pool: &MySqlPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET token_version = token_version + 1")
            .execute(pool)
            .await?;

        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.cache.invalidate_all();
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn cached_versions_answer_without_a_pool() {
        let versions = TokenVersions::new(Duration::from_secs(60));

        assert_eq!(versions.current(1, None).await.unwrap(), None);

        versions.remember(1, 3).await;
        assert_eq!(versions.current(1, None).await.unwrap(), Some(3));
    }

    #[actix_web::test]
    async fn read_racing_a_bump_is_not_cached() {
        let versions = TokenVersions::new(Duration::from_secs(60));

        // lookup starts, bump lands, then the lookup tries to cache its old value
        let seen = versions.epoch();
        versions.forget(1).await;
        versions.fill(1, 3, seen).await;
        assert_eq!(versions.current(1, None).await.unwrap(), None);

        let seen = versions.epoch();
        versions.fill(1, 4, seen).await;
        assert_eq!(versions.current(1, None).await.unwrap(), Some(4));
    }
}
