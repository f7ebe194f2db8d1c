//! Database module for SQLite persistence

mod migrations;
mod models;
mod repository;

pub use models::{
    date_days_ago, timestamp_days_ago, timestamp_now, today, Admin, BanRecord, BotStats,
    CommandCount, DailyStat, LeaderboardEntry, LookupRecord, User, UserActivity, UserSummary,
};
pub use repository::{Database, DatabaseError};
