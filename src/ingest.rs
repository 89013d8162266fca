// src/ingest.rs

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{
    error::AppError,
    models::post::{NewPost, UpsertOutcome},
    reddit::{ContentSource, Submission},
    store::PostRepository,
};

/// Body markers the content API leaves behind after moderation.
const REMOVED_MARKERS: [&str; 2] = ["[removed]", "[deleted]"];

/// Stored when the author's account no longer exists.
pub const UNKNOWN_AUTHOR: &str = "[deleted]";

/// Outcome of scraping one forum.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapeReport {
    pub subreddit: String,
    pub requested: u32,
    pub fetched: usize,
    pub skipped_pinned: usize,
    pub inserted: usize,
    pub updated: usize,
    pub failed: usize,
    /// Set when the listing itself could not be fetched.
    pub error: Option<String>,
}

impl ScrapeReport {
    pub fn saved(&self) -> usize {
        self.inserted + self.updated
    }
}

pub fn clean_selftext(selftext: &str) -> &str {
    if REMOVED_MARKERS.contains(&selftext) {
        ""
    } else {
        selftext
    }
}

/// Title and body separated by a blank line; just the title when there is no body.
pub fn derive_full_text(title: &str, selftext: &str) -> String {
    if selftext.is_empty() {
        title.to_string()
    } else {
        format!("{}\n\n{}", title, selftext)
    }
}

/// Out-of-range values fall back to the epoch instead of failing the record.
pub fn publish_date_from_epoch(created_utc: f64) -> DateTime<Utc> {
    let floor = created_utc.floor();
    let secs = floor as i64;
    // Always a non-negative offset from `secs`, also before 1970.
    let nanos = (((created_utc - floor) * 1e9) as u32).min(999_999_999);
    DateTime::from_timestamp(secs, nanos).unwrap_or(DateTime::UNIX_EPOCH)
}

fn saturate(n: i64) -> i32 {
    n.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

/// Flattens one listing entry. Pinned entries yield `None`.
pub fn normalize(submission: &Submission, subreddit: &str) -> Option<NewPost> {
    if submission.is_pinned() {
        return None;
    }

    let selftext = clean_selftext(&submission.selftext);

    Some(NewPost {
        post_id: submission.id.clone(),
        title: submission.title.clone(),
        selftext: selftext.to_string(),
        url: submission.url.clone(),
        author: submission
            .author
            .clone()
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
        score: saturate(submission.score),
        publish_date: publish_date_from_epoch(submission.created_utc),
        num_of_comments: saturate(submission.num_comments),
        permalink: submission.permalink.clone(),
        flair: submission.link_flair_text.clone().unwrap_or_default(),
        subreddit: subreddit.to_string(),
        full_text: derive_full_text(&submission.title, selftext),
    })
}

/// Fetches one forum's hot listing and upserts every non-pinned entry.
///
/// A failed upsert is logged and counted; the remaining entries are still
/// processed. A failed fetch is logged and recorded in the report.
pub async fn scrape_subreddit<S, R>(
    source: &S,
    store: &R,
    subreddit: &str,
    limit: u32,
) -> ScrapeReport
where
    S: ContentSource + ?Sized,
    R: PostRepository + ?Sized,
{
    tracing::info!("Scraping r/{} (hot, {} posts)", subreddit, limit);

    let mut report = ScrapeReport {
        subreddit: subreddit.to_string(),
        requested: limit,
        ..Default::default()
    };

    let submissions = match source.hot(subreddit, limit).await {
        Ok(submissions) => submissions,
        Err(e) => {
            tracing::error!(subreddit, "Error scraping r/{}: {}", subreddit, e);
            report.error = Some(e.to_string());
            return report;
        }
    };
    report.fetched = submissions.len();

    for submission in &submissions {
        let Some(post) = normalize(submission, subreddit) else {
            tracing::debug!(post_id = %submission.id, "Skipping pinned post");
            report.skipped_pinned += 1;
            continue;
        };

        match store.upsert_post(&post).await {
            Ok(UpsertOutcome::Inserted) => report.inserted += 1,
            Ok(UpsertOutcome::Updated) => report.updated += 1,
            Err(e) => {
                tracing::warn!(post_id = %post.post_id, "Insert error: {}", e);
                report.failed += 1;
            }
        }
    }

    tracing::info!(
        subreddit,
        inserted = report.inserted,
        updated = report.updated,
        skipped_pinned = report.skipped_pinned,
        failed = report.failed,
        "Saved {}/{} posts from r/{}",
        report.saved(),
        limit,
        subreddit
    );

    report
}

/// Scrapes each forum in order, one after the other.
pub async fn run<S, R>(source: &S, store: &R, subreddits: &[String], limit: u32) -> Vec<ScrapeReport>
where
    S: ContentSource + ?Sized,
    R: PostRepository + ?Sized,
{
    let mut reports = Vec::with_capacity(subreddits.len());
    for subreddit in subreddits {
        reports.push(scrape_subreddit(source, store, subreddit, limit).await);
    }
    reports
}

/// A full batch run: schema setup, then login, then every forum.
///
/// Schema and login failures abort before any listing is requested. Once
/// both succeed, per-forum failures are only reported.
pub async fn run_batch<R, S, L, F>(
    store: &R,
    login: L,
    subreddits: &[String],
    limit: u32,
) -> Result<Vec<ScrapeReport>, AppError>
where
    R: PostRepository + ?Sized,
    S: ContentSource,
    L: FnOnce() -> F,
    F: Future<Output = Result<S, AppError>>,
{
    store.ensure_schema().await?;
    tracing::info!("Schema verified");

    let source = login().await?;

    Ok(run(&source, store, subreddits, limit).await)
}
