//! Database models

use chrono::{DateTime, Days, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Current time in the layout every timestamp column uses.
///
/// UTC, microsecond precision, `Z` suffix: lexicographic order is time order.
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Timestamp `days` before now, in the same layout as [`timestamp_now`].
///
/// Windows reaching past chrono's range clamp to its earliest instant, which
/// sorts before every stored timestamp.
pub fn timestamp_days_ago(days: u32) -> String {
    Utc::now()
        .checked_sub_days(Days::new(u64::from(days)))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
        .to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Today's UTC date as a `daily_stats` key (`YYYY-MM-DD`).
pub fn today() -> String {
    Utc::now().date_naive().format("%Y-%m-%d").to_string()
}

/// UTC date `days` before today as a `daily_stats` key.
pub fn date_days_ago(days: u32) -> String {
    Utc::now()
        .date_naive()
        .checked_sub_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MIN)
        .format("%Y-%m-%d")
        .to_string()
}

/// User record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub user_id: i64,
    pub first_seen: String,
    pub last_seen: String,
    pub total_lookups: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl User {
    /// Best human-readable label: `@username`, then first name, then the id.
    pub fn display_name(&self) -> String {
        match (&self.username, &self.first_name) {
            (Some(username), _) => format!("@{}", username),
            (None, Some(first_name)) => first_name.clone(),
            (None, None) => self.user_id.to_string(),
        }
    }
}

/// Row of the paginated user listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserSummary {
    pub user_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub total_lookups: i64,
    pub last_seen: String,
}

/// Row of the recent/inactive user queries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserActivity {
    pub user_id: i64,
    pub username: Option<String>,
    pub last_seen: String,
}

/// Admin membership record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Admin {
    pub user_id: i64,
    pub added_by: Option<i64>,
    pub added_on: String,
}

/// Ban record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct BanRecord {
    pub user_id: i64,
    pub reason: Option<String>,
    pub banned_by: Option<i64>,
    pub banned_on: String,
}

/// Lookup audit record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct LookupRecord {
    pub id: i64,
    pub user_id: i64,
    pub command: String,
    pub query: String,
    pub result: String,
    pub timestamp: String,
}

impl LookupRecord {
    /// Decode the stored result payload
    pub fn result<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.result)
    }
}

/// Leaderboard row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct LeaderboardEntry {
    pub user_id: i64,
    pub total_lookups: i64,
}

/// Daily per-command counter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DailyStat {
    pub date: String,
    pub command: String,
    pub count: i64,
}

/// Lookup count for one command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CommandCount {
    pub command: String,
    pub count: i64,
}

/// Overall bot statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct BotStats {
    pub total_users: i64,
    pub total_lookups: i64,
    pub total_admins: i64,
    pub total_banned: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamps_sort_chronologically() {
        let earlier = timestamp_days_ago(1);
        let now = timestamp_now();
        assert!(earlier < now);
        assert!(now.ends_with('Z'));
    }

    #[test]
    fn test_date_keys() {
        let today = today();
        assert_eq!(today.len(), 10);
        assert_eq!(date_days_ago(0), today);
        assert!(date_days_ago(7) < today);
    }

    #[test]
    fn test_huge_windows_clamp() {
        assert!(timestamp_days_ago(u32::MAX) < timestamp_days_ago(1));
        assert!(date_days_ago(u32::MAX) < date_days_ago(1));
    }

    #[test]
    fn test_display_name() {
        let mut user = User {
            user_id: 42,
            first_seen: timestamp_now(),
            last_seen: timestamp_now(),
            total_lookups: 0,
            username: Some("alice".to_string()),
            first_name: Some("Alice".to_string()),
            last_name: None,
        };
        assert_eq!(user.display_name(), "@alice");

        user.username = None;
        assert_eq!(user.display_name(), "Alice");

        user.first_name = None;
        assert_eq!(user.display_name(), "42");
    }
}
