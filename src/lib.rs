//! OSINT bot store
//!
//! SQLite persistence for a lookup bot: who used it, who may administer it,
//! who is banned, what was looked up, and how often each command runs per day.
//!
//! # Modules
//!
//! - [`db`] - The [`Database`] store and its record types
//! - [`config`] - Database location and query defaults
//! - [`logging`] - `tracing` subscriber setup for the operator CLI
//!
//! # Example
//!
//! ```rust,no_run
//! use osint_store::{config::DatabaseConfig, Database};
//! use serde_json::json;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let db = Database::new(&DatabaseConfig::at("osint_bot.db")).await?;
//!
//! db.upsert_user(42, Some("alice"), Some("Alice"), None).await?;
//! if !db.is_banned(42).await? {
//!     db.record_lookup(42, "phone", "+15550100", &json!({"carrier": "Example"}))
//!         .await?;
//! }
//! let stats = db.get_stats().await?;
//! println!("{} lookups by {} users", stats.total_lookups, stats.total_users);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod db;
pub mod logging;

pub use config::{AppConfig, DatabaseConfig};
pub use db::{Database, DatabaseError};
