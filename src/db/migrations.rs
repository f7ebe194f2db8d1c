//! Database schema

/// SQL for creating the database schema
pub const INIT_SCHEMA: &str = r#"
-- Users seen by the bot
CREATE TABLE IF NOT EXISTS users (
    user_id INTEGER PRIMARY KEY,
    first_seen TEXT,
    last_seen TEXT,
    total_lookups INTEGER DEFAULT 0,
    username TEXT,
    first_name TEXT,
    last_name TEXT
);

-- Admin membership
CREATE TABLE IF NOT EXISTS admins (
    user_id INTEGER PRIMARY KEY,
    added_by INTEGER,
    added_on TEXT DEFAULT (strftime('%Y-%m-%dT%H:%M:%f', 'now') || '000Z')
);

-- Ban list
CREATE TABLE IF NOT EXISTS banned (
    user_id INTEGER PRIMARY KEY,
    reason TEXT,
    banned_by INTEGER,
    banned_on TEXT DEFAULT (strftime('%Y-%m-%dT%H:%M:%f', 'now') || '000Z')
);

-- Lookup audit log (append-only)
CREATE TABLE IF NOT EXISTS lookups (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER,
    command TEXT,
    query TEXT,
    result TEXT,
    timestamp TEXT DEFAULT (strftime('%Y-%m-%dT%H:%M:%f', 'now') || '000Z')
);

-- Per-day, per-command counters
CREATE TABLE IF NOT EXISTS daily_stats (
    date TEXT,
    command TEXT,
    count INTEGER DEFAULT 0,
    PRIMARY KEY(date, command)
);
"#;
