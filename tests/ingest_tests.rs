// tests/ingest_tests.rs

mod common;

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use axum::{
    Form, Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::{Value, json};

use common::MemoryStore;
use newsbot::{
    config::RedditConfig,
    error::AppError,
    ingest,
    reddit::{ContentSource, RedditClient},
};

const TOKEN: &str = "test-token";
const PASSWORD: &str = "correct-horse";

/// Fake content API. A forum missing from `listings` answers 500.
#[derive(Default)]
struct FakeReddit {
    listings: HashMap<String, Vec<Value>>,
    logins: AtomicUsize,
    hot_calls: AtomicUsize,
}

fn entry(id: &str, score: i64, stickied: bool) -> Value {
    json!({
        "kind": "t3",
        "data": {
            "id": id,
            "title": format!("Title {}", id),
            "selftext": "Body",
            "url": format!("https://example.com/{}", id),
            "author": "alice",
            "score": score,
            "created_utc": 1700000000.0,
            "num_comments": 2,
            "permalink": format!("/r/datasets/comments/{}/", id),
            "link_flair_text": null,
            "stickied": stickied
        }
    })
}

async fn access_token(
    State(fake): State<Arc<FakeReddit>>,
    Form(form): Form<HashMap<String, String>>,
) -> impl IntoResponse {
    fake.logins.fetch_add(1, Ordering::SeqCst);
    if form.get("grant_type").map(String::as_str) == Some("password")
        && form.get("password").map(String::as_str) == Some(PASSWORD)
    {
        Json(json!({ "access_token": TOKEN, "token_type": "bearer", "expires_in": 3600 }))
    } else {
        Json(json!({ "error": "invalid_grant" }))
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        == Some(format!("Bearer {}", TOKEN).as_str())
}

async fn me(headers: HeaderMap) -> impl IntoResponse {
    if authorized(&headers) {
        (StatusCode::OK, Json(json!({ "name": "newsbot" })))
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Unauthorized" })))
    }
}

async fn hot(
    State(fake): State<Arc<FakeReddit>>,
    Path(subreddit): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    fake.hot_calls.fetch_add(1, Ordering::SeqCst);
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({}))).into_response();
    }
    let limit: usize = params
        .get("limit")
        .and_then(|l| l.parse().ok())
        .unwrap_or(25);

    match fake.listings.get(&subreddit) {
        Some(children) => {
            let children: Vec<&Value> = children.iter().take(limit).collect();
            Json(json!({ "kind": "Listing", "data": { "children": children } })).into_response()
        }
        None => (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
    }
}

async fn spawn_reddit(listings: HashMap<String, Vec<Value>>) -> (String, Arc<FakeReddit>) {
    let fake = Arc::new(FakeReddit {
        listings,
        ..Default::default()
    });
    let app = Router::new()
        .route("/api/v1/access_token", post(access_token))
        .route("/api/v1/me", get(me))
        .route("/r/{subreddit}/hot", get(hot))
        .with_state(fake.clone());
    (common::serve(app).await, fake)
}

fn reddit_config(address: &str, password: &str) -> RedditConfig {
    RedditConfig {
        client_id: "client".to_string(),
        client_secret: "secret".to_string(),
        username: "newsbot".to_string(),
        password: password.to_string(),
        user_agent: "newsbot-tests".to_string(),
        auth_url: address.to_string(),
        api_url: address.to_string(),
    }
}

#[tokio::test]
async fn bad_credentials_are_an_auth_error() {
    let (address, _) = spawn_reddit(HashMap::new()).await;

    let result = RedditClient::authenticate(&reddit_config(&address, "wrong")).await;

    match result {
        Err(AppError::Auth(msg)) => assert!(msg.contains("invalid_grant")),
        other => panic!("expected auth failure, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn pinned_posts_are_never_stored() {
    let mut listings = HashMap::new();
    let mut removed = entry("a2", 3, false);
    removed["data"]["selftext"] = json!("[removed]");
    listings.insert(
        "datasets".to_string(),
        vec![entry("pin", 900, true), entry("a1", 10, false), removed],
    );
    let (address, _) = spawn_reddit(listings).await;
    let client = RedditClient::authenticate(&reddit_config(&address, PASSWORD))
        .await
        .expect("login should succeed");
    let store = MemoryStore::new();

    let report = ingest::scrape_subreddit(&client, store.as_ref(), "datasets", 20).await;

    assert_eq!(report.fetched, 3);
    assert_eq!(report.skipped_pinned, 1);
    assert_eq!(report.saved(), 2);
    assert!(store.get("pin").is_none());

    let removed = store.get("a2").unwrap();
    assert_eq!(removed.selftext, "");
    assert_eq!(removed.full_text, "Title a2");

    let kept = store.get("a1").unwrap();
    assert_eq!(kept.full_text, "Title a1\n\nBody");
    assert_eq!(kept.subreddit, "datasets");
}

#[tokio::test]
async fn limit_is_forwarded_to_the_listing() {
    let mut listings = HashMap::new();
    listings.insert(
        "datasets".to_string(),
        (0..10).map(|i| entry(&format!("p{}", i), i, false)).collect(),
    );
    let (address, _) = spawn_reddit(listings).await;
    let client = RedditClient::authenticate(&reddit_config(&address, PASSWORD))
        .await
        .unwrap();

    let posts = client.hot("datasets", 4).await.unwrap();
    assert_eq!(posts.len(), 4);
}

#[tokio::test]
async fn one_failed_upsert_does_not_stop_the_forum() {
    let mut listings = HashMap::new();
    listings.insert(
        "datasets".to_string(),
        vec![entry("a1", 1, false), entry("bad", 2, false), entry("a3", 3, false)],
    );
    let (address, _) = spawn_reddit(listings).await;
    let client = RedditClient::authenticate(&reddit_config(&address, PASSWORD))
        .await
        .unwrap();
    let store = MemoryStore::new();
    store.fail_on("bad");

    let report = ingest::scrape_subreddit(&client, store.as_ref(), "datasets", 20).await;

    assert_eq!(report.failed, 1);
    assert_eq!(report.saved(), 2);
    assert!(store.get("a1").is_some());
    assert!(store.get("a3").is_some());
}

#[tokio::test]
async fn failed_forum_is_skipped_and_the_run_continues() {
    let mut listings = HashMap::new();
    listings.insert("datasets".to_string(), vec![entry("a1", 1, false)]);
    listings.insert("learnpython".to_string(), vec![entry("b1", 1, false)]);
    let (address, _) = spawn_reddit(listings).await;
    let client = RedditClient::authenticate(&reddit_config(&address, PASSWORD))
        .await
        .unwrap();
    let store = MemoryStore::new();

    let forums = vec![
        "datasets".to_string(),
        "broken".to_string(),
        "learnpython".to_string(),
    ];
    let reports = ingest::run(&client, store.as_ref(), &forums, 20).await;

    assert_eq!(reports.len(), 3);
    assert!(reports[0].error.is_none());
    assert!(reports[1].error.is_some());
    assert_eq!(reports[1].saved(), 0);
    assert!(reports[2].error.is_none());
    assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn second_run_refreshes_score_only() {
    let mut first = HashMap::new();
    first.insert("datasets".to_string(), vec![entry("a1", 10, false)]);
    let (address, _) = spawn_reddit(first).await;
    let client = RedditClient::authenticate(&reddit_config(&address, PASSWORD))
        .await
        .unwrap();
    let store = MemoryStore::new();
    ingest::scrape_subreddit(&client, store.as_ref(), "datasets", 20).await;

    let mut second = HashMap::new();
    second.insert("datasets".to_string(), vec![entry("a1", 25, false)]);
    let (address, _) = spawn_reddit(second).await;
    let client = RedditClient::authenticate(&reddit_config(&address, PASSWORD))
        .await
        .unwrap();
    let report = ingest::scrape_subreddit(&client, store.as_ref(), "datasets", 20).await;

    assert_eq!(report.updated, 1);
    assert_eq!(report.inserted, 0);
    assert_eq!(store.len(), 1);
    assert_eq!(store.get("a1").unwrap().score, 25);
}

fn forums() -> Vec<String> {
    vec!["datasets".to_string(), "learnpython".to_string()]
}

fn full_listings() -> HashMap<String, Vec<Value>> {
    let mut listings = HashMap::new();
    listings.insert("datasets".to_string(), vec![entry("a1", 1, false)]);
    listings.insert("learnpython".to_string(), vec![entry("b1", 1, false)]);
    listings
}

#[tokio::test]
async fn schema_failure_aborts_before_login_and_listings() {
    let (address, fake) = spawn_reddit(full_listings()).await;
    let config = reddit_config(&address, PASSWORD);
    let store = MemoryStore::new();
    store.break_schema();

    let result = ingest::run_batch(
        store.as_ref(),
        || RedditClient::authenticate(&config),
        &forums(),
        20,
    )
    .await;

    assert!(matches!(result, Err(AppError::Database(_))));
    assert_eq!(fake.logins.load(Ordering::SeqCst), 0);
    assert_eq!(fake.hot_calls.load(Ordering::SeqCst), 0);
    assert_eq!(store.len(), 0);
}

#[tokio::test]
async fn login_failure_aborts_before_any_listing() {
    let (address, fake) = spawn_reddit(full_listings()).await;
    let config = reddit_config(&address, "wrong");
    let store = MemoryStore::new();

    let result = ingest::run_batch(
        store.as_ref(),
        || RedditClient::authenticate(&config),
        &forums(),
        20,
    )
    .await;

    assert!(matches!(result, Err(AppError::Auth(_))));
    assert_eq!(fake.logins.load(Ordering::SeqCst), 1);
    assert_eq!(fake.hot_calls.load(Ordering::SeqCst), 0);
    assert_eq!(store.len(), 0);
}

#[tokio::test]
async fn batch_run_scrapes_every_forum_after_setup() {
    let (address, fake) = spawn_reddit(full_listings()).await;
    let config = reddit_config(&address, PASSWORD);
    let store = MemoryStore::new();

    let reports = ingest::run_batch(
        store.as_ref(),
        || RedditClient::authenticate(&config),
        &forums(),
        20,
    )
    .await
    .expect("batch run should succeed");

    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(|r| r.error.is_none()));
    assert_eq!(fake.hot_calls.load(Ordering::SeqCst), 2);
    assert_eq!(store.len(), 2);
}
