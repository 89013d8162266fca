// src/bin/scraper.rs
//
// Batch job: scrapes the hot listing of every configured forum once and
// upserts the posts. Meant to be run from cron.

use std::process::ExitCode;

use newsbot::{
    config::{Config, RedditConfig, ScraperConfig},
    error::AppError,
    ingest,
    reddit::RedditClient,
    store::PgPostStore,
    telemetry,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let _guard = match telemetry::init(&config, "scraper.log") {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Scraper aborted: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> Result<(), AppError> {
    let reddit = RedditConfig::from_env()?;
    let scraper = ScraperConfig::from_env()?;

    tracing::info!(
        forums = scraper.subreddits.len(),
        limit = scraper.limit,
        "Reddit scraper (batch mode) starting"
    );

    let store = PgPostStore::new(config.database.clone());
    let reports = ingest::run_batch(
        &store,
        || RedditClient::authenticate(&reddit),
        &scraper.subreddits,
        scraper.limit,
    )
    .await?;

    let saved: usize = reports.iter().map(|r| r.saved()).sum();
    let failed_forums: Vec<&str> = reports
        .iter()
        .filter(|r| r.error.is_some())
        .map(|r| r.subreddit.as_str())
        .collect();

    tracing::info!(
        saved,
        failed_forums = ?failed_forums,
        "Run finished: {} posts saved across {} forums",
        saved,
        reports.len()
    );

    Ok(())
}
