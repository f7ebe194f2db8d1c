//! Integration tests against an on-disk database

use osint_store::config::DatabaseConfig;
use osint_store::db::{today, Database, DailyStat};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

async fn open_temp() -> (TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(&dir.path().join("bot.db")).await.unwrap();
    (dir, db)
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct PhoneReport {
    number: String,
    carrier: Option<String>,
    sightings: Vec<String>,
}

#[tokio::test]
async fn test_creates_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("data").join("bot.db");

    let db = Database::new(&DatabaseConfig::at(&path)).await.unwrap();
    db.upsert_user(1, None, None, None).await.unwrap();
    db.close().await;

    assert!(path.exists());
}

#[tokio::test]
async fn test_data_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bot.db");

    let db = Database::open(&path).await.unwrap();
    db.upsert_user(10, Some("bob"), None, None).await.unwrap();
    db.add_admin(10, 1).await.unwrap();
    db.record_lookup(10, "phone", "+1555", &json!({"ok": true}))
        .await
        .unwrap();
    db.close().await;

    // Reopening runs schema init again over existing tables
    let db = Database::open(&path).await.unwrap();
    let user = db.get_user(10).await.unwrap().unwrap();
    assert_eq!(user.total_lookups, 1);
    assert!(db.is_admin(10).await.unwrap());
    assert_eq!(db.get_user_lookups(10, 10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_typed_result_round_trip() {
    let (_dir, db) = open_temp().await;
    db.upsert_user(1, Some("alice"), None, None).await.unwrap();

    let report = PhoneReport {
        number: "+15550100".to_string(),
        carrier: None,
        sightings: vec!["forum".to_string(), "leak-2021".to_string()],
    };
    db.record_lookup(1, "phone", &report.number, &report)
        .await
        .unwrap();

    let lookups = db.get_user_lookups(1, 10).await.unwrap();
    assert_eq!(lookups[0].result::<PhoneReport>().unwrap(), report);
}

#[tokio::test]
async fn test_bot_session_flow() {
    let (_dir, db) = open_temp().await;

    // An admin bans a user; the banned user still gets upserted on contact
    db.upsert_user(1, Some("owner"), None, None).await.unwrap();
    db.add_admin(1, 1).await.unwrap();
    db.upsert_user(2, Some("spammer"), None, None).await.unwrap();
    db.ban_user(2, Some("flooding"), 1).await.unwrap();

    db.upsert_user(3, Some("carol"), Some("Carol"), None).await.unwrap();
    for query in ["a@example.com", "b@example.com"] {
        db.record_lookup(3, "email", query, &json!({"breaches": []}))
            .await
            .unwrap();
    }
    db.record_lookup(3, "phone", "+1", &json!({})).await.unwrap();

    let stats = db.get_stats().await.unwrap();
    assert_eq!(stats.total_users, 3);
    assert_eq!(stats.total_lookups, 3);
    assert_eq!(stats.total_admins, 1);
    assert_eq!(stats.total_banned, 1);

    let banned = db.list_banned().await.unwrap();
    assert_eq!(banned.len(), 1);
    assert_eq!(banned[0].user_id, 2);

    let daily = db.get_daily_stats(7).await.unwrap();
    assert_eq!(
        daily,
        vec![
            DailyStat {
                date: today(),
                command: "email".to_string(),
                count: 2,
            },
            DailyStat {
                date: today(),
                command: "phone".to_string(),
                count: 1,
            },
        ]
    );

    let top = db.get_leaderboard(10).await.unwrap();
    assert_eq!(top[0].user_id, 3);
    assert_eq!(top[0].total_lookups, 3);
}

#[tokio::test]
async fn test_concurrent_lookups_are_all_counted() {
    let (_dir, db) = open_temp().await;
    let db = Arc::new(db);
    db.upsert_user(1, None, None, None).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..20 {
        let db = Arc::clone(&db);
        handles.push(tokio::spawn(async move {
            db.record_lookup(1, "ip", &format!("10.0.0.{}", i), &json!({"i": i}))
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let user = db.get_user(1).await.unwrap().unwrap();
    assert_eq!(user.total_lookups, 20);
    assert_eq!(db.get_user_lookups(1, 100).await.unwrap().len(), 20);
    assert_eq!(db.get_daily_stats(0).await.unwrap()[0].count, 20);
}
