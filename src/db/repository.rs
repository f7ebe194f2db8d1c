//! Database repository for CRUD operations

use super::migrations::INIT_SCHEMA;
use super::models::{
    date_days_ago, timestamp_days_ago, timestamp_now, Admin, BanRecord, BotStats, CommandCount,
    DailyStat, LeaderboardEntry, LookupRecord, User, UserActivity, UserSummary,
};
use crate::config::DatabaseConfig;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Schema error: {0}")]
    Schema(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DatabaseError {
    /// True when the engine rejected a write because the key already exists
    pub fn is_unique_violation(&self) -> bool {
        match self {
            DatabaseError::Sqlx(sqlx::Error::Database(e)) => e.is_unique_violation(),
            _ => false,
        }
    }
}

/// Database connection and operations
///
/// Every operation acquires its own connection from the pool and returns it
/// when the statement (or transaction) finishes, on success and on error.
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if missing) the database described by `config`
    pub async fn new(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(&config.path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(config.busy_timeout_secs));

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.init_schema().await?;

        tracing::info!("Opened database at {:?}", config.path);
        Ok(db)
    }

    /// Open the database at `path` with default connection settings
    pub async fn open(path: &Path) -> Result<Self, DatabaseError> {
        Self::new(&DatabaseConfig::at(path)).await
    }

    /// Create an in-memory database (for testing)
    pub async fn in_memory() -> Result<Self, DatabaseError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;

        // A single connection that never expires: closing it would drop the data
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.init_schema().await?;

        Ok(db)
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create any missing tables. Safe to run on every start.
    pub async fn init_schema(&self) -> Result<(), DatabaseError> {
        sqlx::query(INIT_SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| DatabaseError::Schema(e.to_string()))?;

        tracing::debug!("Schema initialized");
        Ok(())
    }

    // ========================================================================
    // User operations
    // ========================================================================

    /// Insert a user, or refresh last_seen and names of an existing one.
    ///
    /// Name fields are overwritten as given, `None` included.
    pub async fn upsert_user(
        &self,
        user_id: i64,
        username: Option<&str>,
        first_name: Option<&str>,
        last_name: Option<&str>,
    ) -> Result<(), DatabaseError> {
        let now = timestamp_now();

        sqlx::query(
            r#"
            INSERT INTO users (user_id, first_seen, last_seen, username, first_name, last_name)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                last_seen = excluded.last_seen,
                username = excluded.username,
                first_name = excluded.first_name,
                last_name = excluded.last_name
            "#,
        )
        .bind(user_id)
        .bind(&now)
        .bind(&now)
        .bind(username)
        .bind(first_name)
        .bind(last_name)
        .execute(&self.pool)
        .await?;

        tracing::debug!("Upserted user {}", user_id);
        Ok(())
    }

    /// Get a user by ID
    pub async fn get_user(&self, user_id: i64) -> Result<Option<User>, DatabaseError> {
        Ok(sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, first_seen, last_seen, total_lookups, username, first_name, last_name
            FROM users WHERE user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    /// Page through users, most recently seen first
    pub async fn list_users(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<UserSummary>, DatabaseError> {
        Ok(sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT user_id, username, first_name, total_lookups, last_seen
            FROM users
            ORDER BY last_seen DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(i64::from(limit))
        .bind(i64::from(offset))
        .fetch_all(&self.pool)
        .await?)
    }

    /// Users seen within the last `days` days
    pub async fn get_recent_users(&self, days: u32) -> Result<Vec<UserActivity>, DatabaseError> {
        let cutoff = timestamp_days_ago(days);

        Ok(sqlx::query_as::<_, UserActivity>(
            "SELECT user_id, username, last_seen FROM users WHERE last_seen >= ?",
        )
        .bind(&cutoff)
        .fetch_all(&self.pool)
        .await?)
    }

    /// Users not seen for `days` days or more
    pub async fn get_inactive_users(&self, days: u32) -> Result<Vec<UserActivity>, DatabaseError> {
        let cutoff = timestamp_days_ago(days);

        Ok(sqlx::query_as::<_, UserActivity>(
            "SELECT user_id, username, last_seen FROM users WHERE last_seen < ?",
        )
        .bind(&cutoff)
        .fetch_all(&self.pool)
        .await?)
    }

    // ========================================================================
    // Admin operations
    // ========================================================================

    pub async fn is_admin(&self, user_id: i64) -> Result<bool, DatabaseError> {
        let found = sqlx::query_scalar::<_, i64>("SELECT 1 FROM admins WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(found.is_some())
    }

    /// Grant admin. Granting twice is a no-op.
    pub async fn add_admin(&self, user_id: i64, added_by: i64) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO admins (user_id, added_by, added_on) VALUES (?, ?, ?)",
        )
        .bind(user_id)
        .bind(added_by)
        .bind(timestamp_now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            tracing::info!("User {} granted admin by {}", user_id, added_by);
        }
        Ok(())
    }

    pub async fn remove_admin(&self, user_id: i64) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM admins WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() > 0 {
            tracing::info!("User {} is no longer admin", user_id);
        }
        Ok(())
    }

    pub async fn get_admin(&self, user_id: i64) -> Result<Option<Admin>, DatabaseError> {
        Ok(sqlx::query_as::<_, Admin>(
            "SELECT user_id, added_by, added_on FROM admins WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    pub async fn list_admins(&self) -> Result<Vec<i64>, DatabaseError> {
        Ok(
            sqlx::query_scalar::<_, i64>("SELECT user_id FROM admins ORDER BY user_id")
                .fetch_all(&self.pool)
                .await?,
        )
    }

    // ========================================================================
    // Ban operations
    // ========================================================================

    pub async fn is_banned(&self, user_id: i64) -> Result<bool, DatabaseError> {
        let found = sqlx::query_scalar::<_, i64>("SELECT 1 FROM banned WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(found.is_some())
    }

    /// Ban a user.
    ///
    /// Unlike [`Database::add_admin`] this is a plain insert: banning a user
    /// who is already banned fails with a unique violation
    /// (see [`DatabaseError::is_unique_violation`]).
    pub async fn ban_user(
        &self,
        user_id: i64,
        reason: Option<&str>,
        banned_by: i64,
    ) -> Result<(), DatabaseError> {
        sqlx::query("INSERT INTO banned (user_id, reason, banned_by, banned_on) VALUES (?, ?, ?, ?)")
            .bind(user_id)
            .bind(reason)
            .bind(banned_by)
            .bind(timestamp_now())
            .execute(&self.pool)
            .await?;

        tracing::info!("User {} banned by {}", user_id, banned_by);
        Ok(())
    }

    pub async fn unban_user(&self, user_id: i64) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM banned WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() > 0 {
            tracing::info!("User {} unbanned", user_id);
        }
        Ok(())
    }

    pub async fn get_ban(&self, user_id: i64) -> Result<Option<BanRecord>, DatabaseError> {
        Ok(sqlx::query_as::<_, BanRecord>(
            "SELECT user_id, reason, banned_by, banned_on FROM banned WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    /// All bans, newest first
    pub async fn list_banned(&self) -> Result<Vec<BanRecord>, DatabaseError> {
        Ok(sqlx::query_as::<_, BanRecord>(
            r#"
            SELECT user_id, reason, banned_by, banned_on
            FROM banned
            ORDER BY banned_on DESC, user_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?)
    }

    // ========================================================================
    // Lookup operations
    // ========================================================================

    /// Record one lookup: audit row, user counter and daily counter.
    ///
    /// The three writes commit together or not at all. Returns the id of the
    /// new lookup row.
    pub async fn record_lookup<T: Serialize + ?Sized>(
        &self,
        user_id: i64,
        command: &str,
        query: &str,
        result: &T,
    ) -> Result<i64, DatabaseError> {
        let payload = serde_json::to_string(result)?;
        let now = Utc::now();
        let timestamp = now.to_rfc3339_opts(SecondsFormat::Micros, true);
        let date = now.format("%Y-%m-%d").to_string();

        let mut tx = self.pool.begin().await?;

        let lookup_id = sqlx::query(
            r#"
            INSERT INTO lookups (user_id, command, query, result, timestamp)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(command)
        .bind(query)
        .bind(&payload)
        .bind(&timestamp)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        let updated = sqlx::query(
            "UPDATE users SET total_lookups = total_lookups + 1 WHERE user_id = ?",
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 0 {
            tracing::warn!("Lookup recorded for unknown user {}", user_id);
        }

        sqlx::query(
            r#"
            INSERT INTO daily_stats (date, command, count) VALUES (?, ?, 1)
            ON CONFLICT(date, command) DO UPDATE SET count = count + 1
            "#,
        )
        .bind(&date)
        .bind(command)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::debug!("Recorded lookup {} ({}) for user {}", lookup_id, command, user_id);
        Ok(lookup_id)
    }

    /// Most recent lookups of a user, newest first
    pub async fn get_user_lookups(
        &self,
        user_id: i64,
        limit: u32,
    ) -> Result<Vec<LookupRecord>, DatabaseError> {
        Ok(sqlx::query_as::<_, LookupRecord>(
            r#"
            SELECT id, user_id, command, query, result, timestamp
            FROM lookups
            WHERE user_id = ?
            ORDER BY timestamp DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?)
    }

    /// Top users by lookup count; ties go to the lower user id
    pub async fn get_leaderboard(&self, limit: u32) -> Result<Vec<LeaderboardEntry>, DatabaseError> {
        Ok(sqlx::query_as::<_, LeaderboardEntry>(
            r#"
            SELECT user_id, total_lookups
            FROM users
            ORDER BY total_lookups DESC, user_id ASC
            LIMIT ?
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?)
    }

    // ========================================================================
    // Statistics operations
    // ========================================================================

    pub async fn get_stats(&self) -> Result<BotStats, DatabaseError> {
        Ok(sqlx::query_as::<_, BotStats>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users) AS total_users,
                (SELECT COALESCE(SUM(total_lookups), 0) FROM users) AS total_lookups,
                (SELECT COUNT(*) FROM admins) AS total_admins,
                (SELECT COUNT(*) FROM banned) AS total_banned
            "#,
        )
        .fetch_one(&self.pool)
        .await?)
    }

    /// Daily counters from `days` days ago through today, newest date first
    pub async fn get_daily_stats(&self, days: u32) -> Result<Vec<DailyStat>, DatabaseError> {
        let cutoff = date_days_ago(days);

        Ok(sqlx::query_as::<_, DailyStat>(
            r#"
            SELECT date, command, count
            FROM daily_stats
            WHERE date >= ?
            ORDER BY date DESC, command ASC
            "#,
        )
        .bind(&cutoff)
        .fetch_all(&self.pool)
        .await?)
    }

    /// Lookup totals per command, busiest first
    pub async fn get_lookup_stats(&self, limit: u32) -> Result<Vec<CommandCount>, DatabaseError> {
        Ok(sqlx::query_as::<_, CommandCount>(
            r#"
            SELECT command, COUNT(*) AS count
            FROM lookups
            GROUP BY command
            ORDER BY count DESC, command ASC
            LIMIT ?
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?)
    }

    /// Close the database connection
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
