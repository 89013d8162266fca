// src/reddit.rs

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use url::Url;

use crate::{config::RedditConfig, error::AppError};

/// One entry of a forum's hot listing, as the content API returns it.
#[derive(Debug, Clone, Deserialize)]
pub struct Submission {
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// Body text; "[removed]" / "[deleted]" when moderated away.
    #[serde(default)]
    pub selftext: String,
    #[serde(default)]
    pub url: String,
    /// Missing or null when the account no longer exists.
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub score: i64,
    /// Seconds since the Unix epoch (fractional in the wire format).
    pub created_utc: f64,
    #[serde(default)]
    pub num_comments: i64,
    #[serde(default)]
    pub permalink: String,
    #[serde(default)]
    pub link_flair_text: Option<String>,
    /// Moderator announcement pinned to the top of the forum.
    #[serde(default)]
    pub stickied: bool,
    #[serde(default)]
    pub pinned: bool,
}

impl Submission {
    pub fn is_pinned(&self) -> bool {
        self.stickied || self.pinned
    }
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    children: Vec<ListingChild>,
}

#[derive(Debug, Deserialize)]
struct ListingChild {
    data: Submission,
}

/// The token endpoint answers 200 with an `error` field on bad credentials.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Me {
    name: String,
}

/// Where hot listings come from. The scraper only needs this one call.
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn hot(&self, subreddit: &str, limit: u32) -> Result<Vec<Submission>, AppError>;
}

/// Authenticated content API session. One per scraper run.
#[derive(Debug, Clone)]
pub struct RedditClient {
    http: reqwest::Client,
    api_url: Url,
    token: String,
}

impl RedditClient {
    /// Logs in with the password grant and checks the session by fetching
    /// the account it belongs to. Any failure here is an `AppError::Auth`.
    pub async fn authenticate(config: &RedditConfig) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;

        let api_url = Url::parse(&config.api_url)
            .map_err(|e| AppError::Config(format!("REDDIT_API_URL is invalid: {}", e)))?;

        let token_url = format!(
            "{}/api/v1/access_token",
            config.auth_url.trim_end_matches('/')
        );
        let response = http
            .post(token_url)
            .basic_auth(&config.client_id, Some(&config.client_secret))
            .form(&[
                ("grant_type", "password"),
                ("username", config.username.as_str()),
                ("password", config.password.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::Auth(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::Auth(format!(
                "token endpoint answered {}",
                response.status()
            )));
        }

        let token = response
            .json::<TokenResponse>()
            .await
            .map_err(|e| AppError::Auth(e.to_string()))?;

        let token = match (token.access_token, token.error) {
            (Some(access_token), None) => access_token,
            (_, Some(error)) => return Err(AppError::Auth(error)),
            (None, None) => return Err(AppError::Auth("no access token issued".to_string())),
        };

        let client = Self {
            http,
            api_url,
            token,
        };

        let me = client.whoami().await?;
        tracing::info!(account = %me, "Authenticated with the content API");

        Ok(client)
    }

    async fn whoami(&self) -> Result<String, AppError> {
        let url = self.endpoint(&["api", "v1", "me"])?;
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| AppError::Auth(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::Auth(format!(
                "credential check answered {}",
                response.status()
            )));
        }

        let me = response
            .json::<Me>()
            .await
            .map_err(|e| AppError::Auth(e.to_string()))?;
        Ok(me.name)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, AppError> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::Config("REDDIT_API_URL cannot be a base URL".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[async_trait]
impl ContentSource for RedditClient {
    async fn hot(&self, subreddit: &str, limit: u32) -> Result<Vec<Submission>, AppError> {
        if subreddit.trim().is_empty() {
            return Err(AppError::BadRequest("forum name must not be empty".to_string()));
        }

        let url = self.endpoint(&["r", subreddit, "hot"])?;
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .query(&[("limit", limit.to_string()), ("raw_json", "1".to_string())])
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(AppError::Auth(format!(
                    "r/{} refused the session ({})",
                    subreddit,
                    response.status()
                )));
            }
            StatusCode::NOT_FOUND => {
                return Err(AppError::NotFound(format!("r/{} does not exist", subreddit)));
            }
            _ => {}
        }

        let listing = response.error_for_status()?.json::<Listing>().await?;

        Ok(listing
            .data
            .children
            .into_iter()
            .map(|child| child.data)
            .collect())
    }
}
