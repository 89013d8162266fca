use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'reddit_posts' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Post {
    /// Identifier assigned by the content API; the upsert key.
    pub post_id: String,
    pub title: Option<String>,
    pub selftext: Option<String>,
    pub url: Option<String>,
    pub author: Option<String>,
    pub score: Option<i32>,
    pub publish_date: Option<DateTime<Utc>>,
    pub num_of_comments: Option<i32>,
    pub permalink: Option<String>,
    pub flair: Option<String>,
    pub subreddit: Option<String>,
    pub full_text: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// A normalized record ready to be upserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub post_id: String,
    pub title: String,
    pub selftext: String,
    pub url: String,
    pub author: String,
    pub score: i32,
    pub publish_date: DateTime<Utc>,
    pub num_of_comments: i32,
    pub permalink: String,
    pub flair: String,
    pub subreddit: String,
    pub full_text: String,
}

/// Projection used by the dashboard.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PostSummary {
    pub post_id: String,
    pub title: String,
    pub url: String,
    pub permalink: String,
    pub score: i32,
    pub subreddit: String,
    pub publish_date: Option<DateTime<Utc>>,
    pub full_text: String,
}

/// Whether an upsert created the row or refreshed an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// Stored row count for one forum.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubredditCount {
    pub subreddit: String,
    pub posts: i64,
}

/// Query parameters for listing posts.
#[derive(Debug, Deserialize, Validate)]
pub struct PostListParams {
    /// Exact forum name; absent or "all" means no filter.
    pub subreddit: Option<String>,

    /// Number of items to return (default: 20).
    #[validate(range(min = 5, max = 100, message = "limit must be between 5 and 100"))]
    pub limit: Option<i64>,
}

/// Longest keyword accepted for explanation, in characters.
pub const MAX_KEYWORD_CHARS: usize = 200;

/// DTO for the keyword explanation endpoint.
#[derive(Debug, Deserialize, Validate)]
pub struct ExplainRequest {
    #[validate(length(
        min = 1,
        max = 200,
        message = "Keyword length must be between 1 and 200 chars"
    ))]
    pub keyword: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExplainResponse {
    pub keyword: String,
    pub explanation: String,
}
