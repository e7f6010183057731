// tests/leaderboard_tests.rs

use chrono::{Duration, Utc};
use expressly_backend::{config::Config, routes, state::AppState};
use serde_json::{Value, json};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

async fn spawn_app() -> (String, SqlitePool) {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory SQLite");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        rust_log: "error".to_string(),
    };

    let state = AppState {
        pool: pool.clone(),
        config,
    };

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (address, pool)
}

async fn seed_user(pool: &SqlitePool, name: Option<&str>, email: Option<&str>) -> String {
    let id = uuid::Uuid::new_v4().to_string();
    sqlx::query("INSERT INTO users (id, name, email) VALUES (?1, ?2, ?3)")
        .bind(&id)
        .bind(name)
        .bind(email)
        .execute(pool)
        .await
        .expect("Failed to insert user");
    id
}

async fn seed_result(
    pool: &SqlitePool,
    table: &str,
    user_id: &str,
    payload: Value,
    days_ago: i64,
) -> String {
    let id = uuid::Uuid::new_v4().to_string();
    let created_at = Utc::now() - Duration::days(days_ago);
    let sql = format!(
        "INSERT INTO {} (id, user_id, payload, created_at) VALUES (?1, ?2, ?3, ?4)",
        table
    );
    sqlx::query(&sql)
        .bind(&id)
        .bind(user_id)
        .bind(sqlx::types::Json(payload))
        .bind(created_at)
        .execute(pool)
        .await
        .expect("Failed to insert assessment record");
    id
}

fn speech_payload(score: f64) -> Value {
    json!({ "scoring": { "overallScore": score } })
}

fn video_payload(score: f64) -> Value {
    json!({ "overall": { "score": score } })
}

fn text_payload(score: f64) -> Value {
    json!({ "analysisResults": { "overall_score": score } })
}

async fn fetch_leaderboard(address: &str, query: &str) -> Vec<Value> {
    let body: Value = reqwest::Client::new()
        .get(&format!("{}/api/progress/leaderboard{}", address, query))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .expect("Failed to parse response");
    body["leaderboard"]
        .as_array()
        .expect("leaderboard should be an array")
        .clone()
}

#[tokio::test]
async fn window_excludes_stale_records_and_keeps_tie_order() {
    let (address, pool) = spawn_app().await;

    let first = seed_user(&pool, Some("First"), None).await;
    let second = seed_user(&pool, Some("Second"), None).await;
    let third = seed_user(&pool, Some("Third"), None).await;
    let stale = seed_user(&pool, Some("Stale"), None).await;

    seed_result(&pool, "video_results", &first, video_payload(95.0), 2).await;
    seed_result(&pool, "video_results", &second, video_payload(95.0), 5).await;
    seed_result(&pool, "video_results", &third, video_payload(60.0), 8).await;
    // The stale user's only record predates the window entirely.
    seed_result(&pool, "video_results", &stale, video_payload(99.0), 40).await;

    let entries = fetch_leaderboard(&address, "?type=video&days=30").await;
    assert_eq!(entries.len(), 3);

    // The two 95s keep assembly order: ascending user id.
    let (tie_a, tie_b) = if first < second {
        (first.as_str(), second.as_str())
    } else {
        (second.as_str(), first.as_str())
    };
    assert_eq!(entries[0]["userId"], tie_a);
    assert_eq!(entries[0]["score"], 95.0);
    assert_eq!(entries[0]["rank"], 1);
    assert_eq!(entries[1]["userId"], tie_b);
    assert_eq!(entries[1]["rank"], 2);
    assert_eq!(entries[2]["userId"], third.as_str());
    assert_eq!(entries[2]["score"], 60.0);
    assert_eq!(entries[2]["rank"], 3);

    assert!(entries.iter().all(|e| e["userId"] != stale.as_str()));
}

#[tokio::test]
async fn leaderboard_caps_at_fifty_entries() {
    let (address, pool) = spawn_app().await;

    for i in 0..75 {
        let user = seed_user(&pool, Some(&format!("User {}", i)), None).await;
        seed_result(
            &pool,
            "speech_results",
            &user,
            speech_payload(10.0 + i as f64),
            1,
        )
        .await;
    }

    let entries = fetch_leaderboard(&address, "?type=speech").await;
    assert_eq!(entries.len(), 50);
    assert_eq!(entries[0]["score"], 84.0);
    assert_eq!(entries[0]["rank"], 1);
    assert_eq!(entries[49]["score"], 35.0);
    assert_eq!(entries[49]["rank"], 50);
}

#[tokio::test]
async fn overall_blends_only_the_modalities_each_user_has() {
    let (address, pool) = spawn_app().await;

    let ada = seed_user(&pool, Some("Ada"), Some("ada@example.com")).await;
    seed_result(&pool, "speech_results", &ada, speech_payload(80.0), 1).await;
    seed_result(&pool, "text_results", &ada, text_payload(9.0), 1).await;

    // No name in the directory: the email is shown instead.
    let bea = seed_user(&pool, None, Some("bea@example.com")).await;
    seed_result(&pool, "video_results", &bea, video_payload(70.0), 2).await;

    // Not in the directory at all.
    let ghost = uuid::Uuid::new_v4().to_string();
    seed_result(&pool, "video_results", &ghost, video_payload(60.0), 2).await;

    let entries = fetch_leaderboard(&address, "").await;
    assert_eq!(entries.len(), 3);

    // Speech 80 and text 90 blend to 85; the missing video mean is ignored.
    assert_eq!(entries[0]["userId"], ada.as_str());
    assert_eq!(entries[0]["name"], "Ada");
    assert_eq!(entries[0]["score"], 85.0);
    assert_eq!(entries[0]["rank"], 1);

    assert_eq!(entries[1]["userId"], bea.as_str());
    assert_eq!(entries[1]["name"], "bea@example.com");
    assert_eq!(entries[1]["score"], 70.0);

    assert_eq!(entries[2]["userId"], ghost.as_str());
    assert_eq!(entries[2]["name"], "Anonymous");
    assert_eq!(entries[2]["score"], 60.0);
}

#[tokio::test]
async fn unscored_records_never_rank() {
    let (address, pool) = spawn_app().await;

    let user = seed_user(&pool, Some("Quiet"), None).await;
    seed_result(&pool, "video_results", &user, json!({}), 1).await;
    seed_result(&pool, "video_results", &user, json!({}), 2).await;

    let per_modality = fetch_leaderboard(&address, "?type=video").await;
    assert!(per_modality.is_empty());

    let overall = fetch_leaderboard(&address, "").await;
    assert!(overall.is_empty());
}

#[tokio::test]
async fn default_window_is_seven_days() {
    let (address, pool) = spawn_app().await;

    let recent = seed_user(&pool, Some("Recent"), None).await;
    seed_result(&pool, "speech_results", &recent, speech_payload(80.0), 1).await;

    let lapsed = seed_user(&pool, Some("Lapsed"), None).await;
    seed_result(&pool, "speech_results", &lapsed, speech_payload(95.0), 10).await;

    let entries = fetch_leaderboard(&address, "?type=speech").await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["userId"], recent.as_str());
}

#[tokio::test]
async fn unknown_leaderboard_type_is_rejected() {
    let (address, _pool) = spawn_app().await;

    let response = reqwest::Client::new()
        .get(&format!(
            "{}/api/progress/leaderboard?type=conversation",
            address
        ))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 400);
}
