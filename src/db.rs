use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use sqlx::MySqlPool;
use sqlx::mysql::MySqlPoolOptions;
use tracing::info;

use crate::auth::password::hash_password;
use crate::model::role::Role;

pub async fn init_db(database_url: &str, max_connections: u32) -> Result<MySqlPool> {
    let pool = MySqlPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    info!("Database connected and migrated");
    Ok(pool)
}

/// Create the first admin account. Does nothing once any admin exists.
pub async fn ensure_admin(pool: &MySqlPool, username: &str, password: &str) -> Result<bool> {
    let admins: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role_id = ?")
        .bind(Role::Admin.id())
        .fetch_one(pool)
        .await
        .context("Failed to count admins")?;

    if admins > 0 {
        return Ok(false);
    }

    let hashed = hash_password(password).map_err(|e| anyhow!("Failed to hash admin password: {e}"))?;

    sqlx::query("INSERT INTO users (name, username, password, role_id) VALUES (?, ?, ?, ?)")
        .bind("Administrator")
        .bind(username.trim().to_lowercase())
        .bind(hashed)
        .bind(Role::Admin.id())
        .execute(pool)
        .await
        .context("Failed to create bootstrap admin")?;

    info!(username, "Bootstrap admin created");
    Ok(true)
}
