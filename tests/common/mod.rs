// tests/common/mod.rs
#![allow(dead_code)]

use std::{
    collections::{BTreeMap, HashSet},
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use axum::Router;
use chrono::{DateTime, Utc};
use newsbot::{
    error::AppError,
    models::post::{NewPost, PostSummary, SubredditCount, UpsertOutcome},
    store::PostRepository,
};

/// Repository kept in memory, with the same upsert rules as the real table.
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<BTreeMap<String, NewPost>>,
    failing: Mutex<HashSet<String>>,
    schema_broken: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Upserts of this id will fail.
    pub fn fail_on(&self, post_id: &str) {
        self.failing.lock().unwrap().insert(post_id.to_string());
    }

    /// Schema setup will fail.
    pub fn break_schema(&self) {
        self.schema_broken.store(true, Ordering::SeqCst);
    }

    pub fn get(&self, post_id: &str) -> Option<NewPost> {
        self.rows.lock().unwrap().get(post_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn insert(&self, post: NewPost) {
        self.rows.lock().unwrap().insert(post.post_id.clone(), post);
    }
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn ensure_schema(&self) -> Result<(), AppError> {
        if self.schema_broken.load(Ordering::SeqCst) {
            return Err(AppError::Database("permission denied for schema public".to_string()));
        }
        Ok(())
    }

    async fn upsert_post(&self, post: &NewPost) -> Result<UpsertOutcome, AppError> {
        if self.failing.lock().unwrap().contains(&post.post_id) {
            return Err(AppError::Database(format!("cannot write {}", post.post_id)));
        }

        let mut rows = self.rows.lock().unwrap();
        match rows.get_mut(&post.post_id) {
            Some(existing) => {
                existing.title = post.title.clone();
                existing.selftext = post.selftext.clone();
                existing.score = post.score;
                existing.num_of_comments = post.num_of_comments;
                existing.full_text = post.full_text.clone();
                Ok(UpsertOutcome::Updated)
            }
            None => {
                rows.insert(post.post_id.clone(), post.clone());
                Ok(UpsertOutcome::Inserted)
            }
        }
    }

    async fn list_posts(
        &self,
        subreddit: Option<&str>,
        limit: i64,
    ) -> Result<Vec<PostSummary>, AppError> {
        let rows = self.rows.lock().unwrap();
        let mut posts: Vec<&NewPost> = rows
            .values()
            .filter(|p| subreddit.is_none_or(|s| p.subreddit == s))
            .collect();
        posts.sort_by(|a, b| b.publish_date.cmp(&a.publish_date));

        Ok(posts
            .into_iter()
            .take(limit.max(0) as usize)
            .map(|p| PostSummary {
                post_id: p.post_id.clone(),
                title: p.title.clone(),
                url: p.url.clone(),
                permalink: p.permalink.clone(),
                score: p.score,
                subreddit: p.subreddit.clone(),
                publish_date: Some(p.publish_date),
                full_text: p.full_text.clone(),
            })
            .collect())
    }

    async fn count_by_subreddit(&self) -> Result<Vec<SubredditCount>, AppError> {
        let rows = self.rows.lock().unwrap();
        let mut counts: BTreeMap<String, i64> = BTreeMap::new();
        for post in rows.values() {
            *counts.entry(post.subreddit.clone()).or_default() += 1;
        }
        Ok(counts
            .into_iter()
            .map(|(subreddit, posts)| SubredditCount { subreddit, posts })
            .collect())
    }
}

pub fn new_post(post_id: &str, subreddit: &str, minutes_after_epoch: i64) -> NewPost {
    let title = format!("Post {}", post_id);
    NewPost {
        post_id: post_id.to_string(),
        title: title.clone(),
        selftext: String::new(),
        url: format!("https://example.com/{}", post_id),
        author: "alice".to_string(),
        score: 1,
        publish_date: DateTime::<Utc>::from_timestamp(1_700_000_000 + minutes_after_epoch * 60, 0)
            .unwrap(),
        num_of_comments: 0,
        permalink: format!("/r/{}/comments/{}/", subreddit, post_id),
        flair: String::new(),
        subreddit: subreddit.to_string(),
        full_text: title,
    }
}

/// Serves `app` on a random local port and returns its base URL.
pub async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}
