// src/store.rs

use async_trait::async_trait;
use sqlx::{Connection, PgConnection, postgres::PgConnectOptions};

use crate::{
    error::AppError,
    models::post::{NewPost, Post, PostSummary, SubredditCount, UpsertOutcome},
};

/// Storage seam shared by the scraper (writer) and the dashboard (reader).
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Makes sure the backing table exists. A scrape run starts with this.
    async fn ensure_schema(&self) -> Result<(), AppError>;

    /// Inserts the post, or refreshes the mutable columns of an existing row
    /// with the same `post_id`.
    async fn upsert_post(&self, post: &NewPost) -> Result<UpsertOutcome, AppError>;

    /// Newest first. `None` lists every forum.
    async fn list_posts(
        &self,
        subreddit: Option<&str>,
        limit: i64,
    ) -> Result<Vec<PostSummary>, AppError>;

    async fn count_by_subreddit(&self) -> Result<Vec<SubredditCount>, AppError>;
}

/// Postgres-backed repository.
///
/// Every call opens its own connection and closes it when done; nothing is
/// pooled or held between calls.
#[derive(Debug, Clone)]
pub struct PgPostStore {
    options: PgConnectOptions,
}

impl PgPostStore {
    pub fn new(options: PgConnectOptions) -> Self {
        Self { options }
    }

    async fn connect(&self) -> Result<PgConnection, AppError> {
        PgConnection::connect_with(&self.options)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Full row lookup, mostly useful for checking what an upsert left behind.
    pub async fn find_post(&self, post_id: &str) -> Result<Option<Post>, AppError> {
        let mut conn = self.connect().await?;
        let post = sqlx::query_as::<_, Post>(
            r#"
            SELECT
                post_id, title, selftext, url, author, score, publish_date,
                num_of_comments, permalink, flair, subreddit, full_text, created_at
            FROM reddit_posts
            WHERE post_id = $1
            "#,
        )
        .bind(post_id)
        .fetch_optional(&mut conn)
        .await?;
        close(conn).await;
        Ok(post)
    }
}

async fn close(conn: PgConnection) {
    if let Err(e) = conn.close().await {
        tracing::debug!("Closing database connection failed: {:?}", e);
    }
}

#[async_trait]
impl PostRepository for PgPostStore {
    /// Creates the `reddit_posts` table if needed by applying pending migrations.
    async fn ensure_schema(&self) -> Result<(), AppError> {
        let mut conn = self.connect().await?;
        sqlx::migrate!("./migrations").run_direct(&mut conn).await?;
        close(conn).await;
        Ok(())
    }

    async fn upsert_post(&self, post: &NewPost) -> Result<UpsertOutcome, AppError> {
        let mut conn = self.connect().await?;

        // xmax is 0 only for a freshly inserted tuple.
        let inserted = sqlx::query_scalar::<_, bool>(
            r#"
            INSERT INTO reddit_posts (
                post_id, title, selftext, url, author, score,
                publish_date, num_of_comments, permalink,
                flair, subreddit, full_text
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (post_id) DO UPDATE SET
                title = EXCLUDED.title,
                selftext = EXCLUDED.selftext,
                score = EXCLUDED.score,
                num_of_comments = EXCLUDED.num_of_comments,
                full_text = EXCLUDED.full_text
            RETURNING (xmax = 0) AS inserted
            "#,
        )
        .bind(&post.post_id)
        .bind(&post.title)
        .bind(&post.selftext)
        .bind(&post.url)
        .bind(&post.author)
        .bind(post.score)
        .bind(post.publish_date)
        .bind(post.num_of_comments)
        .bind(&post.permalink)
        .bind(&post.flair)
        .bind(&post.subreddit)
        .bind(&post.full_text)
        .fetch_one(&mut conn)
        .await?;

        close(conn).await;

        Ok(if inserted {
            UpsertOutcome::Inserted
        } else {
            UpsertOutcome::Updated
        })
    }

    async fn list_posts(
        &self,
        subreddit: Option<&str>,
        limit: i64,
    ) -> Result<Vec<PostSummary>, AppError> {
        let mut conn = self.connect().await?;

        let posts = sqlx::query_as::<_, PostSummary>(
            r#"
            SELECT
                post_id,
                COALESCE(title, '') AS title,
                COALESCE(url, '') AS url,
                COALESCE(permalink, '') AS permalink,
                COALESCE(score, 0) AS score,
                COALESCE(subreddit, '') AS subreddit,
                publish_date,
                COALESCE(full_text, '') AS full_text
            FROM reddit_posts
            WHERE ($1::TEXT IS NULL OR subreddit = $1)
            ORDER BY publish_date DESC NULLS LAST
            LIMIT $2
            "#,
        )
        .bind(subreddit)
        .bind(limit)
        .fetch_all(&mut conn)
        .await?;

        close(conn).await;
        Ok(posts)
    }

    async fn count_by_subreddit(&self) -> Result<Vec<SubredditCount>, AppError> {
        let mut conn = self.connect().await?;

        let counts = sqlx::query_as::<_, SubredditCount>(
            r#"
            SELECT COALESCE(subreddit, '') AS subreddit, COUNT(*) AS posts
            FROM reddit_posts
            GROUP BY subreddit
            ORDER BY subreddit
            "#,
        )
        .fetch_all(&mut conn)
        .await?;

        close(conn).await;
        Ok(counts)
    }
}
