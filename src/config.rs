// src/config.rs

use std::{env, net::SocketAddr, str::FromStr};

use dotenvy::dotenv;
use sqlx::postgres::PgConnectOptions;

use crate::error::AppError;

/// Forums scraped and offered in the dashboard unless overridden.
pub const DEFAULT_SUBREDDITS: [&str; 8] = [
    "datascience",
    "MachineLearning",
    "LanguageTechnology",
    "deeplearning",
    "datasets",
    "visualization",
    "dataisbeautiful",
    "learnpython",
];

pub const DEFAULT_GEMINI_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent";

/// Settings shared by both processes: where the posts table lives and how to log.
#[derive(Debug, Clone)]
pub struct Config {
    pub database: PgConnectOptions,
    pub rust_log: String,
    pub log_dir: String,
}

/// Content API credentials. Only the scraper builds this.
#[derive(Debug, Clone)]
pub struct RedditConfig {
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
    pub user_agent: String,
    pub auth_url: String,
    pub api_url: String,
}

#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub subreddits: Vec<String>,
    pub limit: u32,
}

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub bind_addr: SocketAddr,
    /// Forums selectable in the sidebar, kept apart from the scraper's list.
    pub subreddits: Vec<String>,
    pub gemini_api_key: Option<String>,
    pub gemini_api_url: String,
}

/// Variable lookup used by the `from_vars` constructors.
pub type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

fn process_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn required(vars: Lookup, name: &str) -> Result<String, AppError> {
    vars(name).ok_or_else(|| AppError::Config(format!("{} must be set", name)))
}

fn list_or_default(vars: Lookup, name: &str) -> Vec<String> {
    match vars(name) {
        Some(raw) => raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        None => DEFAULT_SUBREDDITS.iter().map(|s| s.to_string()).collect(),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenv().ok();
        Self::from_vars(&process_env)
    }

    pub fn from_vars(vars: Lookup) -> Result<Self, AppError> {
        let database = match vars("DATABASE_URL") {
            Some(url) => PgConnectOptions::from_str(&url)
                .map_err(|e| AppError::Config(format!("DATABASE_URL is invalid: {}", e)))?,
            None => {
                let port = match vars("DB_PORT") {
                    Some(p) => p
                        .parse::<u16>()
                        .map_err(|_| AppError::Config(format!("DB_PORT is invalid: {}", p)))?,
                    None => 5432,
                };
                PgConnectOptions::new()
                    .host(&vars("DB_HOST").unwrap_or_else(|| "localhost".to_string()))
                    .port(port)
                    .username(&vars("DB_USER").unwrap_or_else(|| "postgres".to_string()))
                    .password(&required(vars, "DB_PASSWORD")?)
                    .database(&vars("DB_NAME").unwrap_or_else(|| "reddit_posts".to_string()))
            }
        };

        let rust_log = vars("RUST_LOG").unwrap_or_else(|| "info".to_string());
        let log_dir = vars("LOG_DIR").unwrap_or_else(|| "logs".to_string());

        Ok(Self {
            database,
            rust_log,
            log_dir,
        })
    }
}

impl RedditConfig {
    pub fn from_env() -> Result<Self, AppError> {
        dotenv().ok();
        Self::from_vars(&process_env)
    }

    pub fn from_vars(vars: Lookup) -> Result<Self, AppError> {
        Ok(Self {
            client_id: required(vars, "REDDIT_CLIENT_ID")?,
            client_secret: required(vars, "REDDIT_CLIENT_SECRET")?,
            username: required(vars, "REDDIT_USERNAME")?,
            password: required(vars, "REDDIT_PASSWORD")?,
            user_agent: vars("REDDIT_USER_AGENT").unwrap_or_else(|| "newsbot".to_string()),
            auth_url: vars("REDDIT_AUTH_URL")
                .unwrap_or_else(|| "https://www.reddit.com".to_string()),
            api_url: vars("REDDIT_API_URL")
                .unwrap_or_else(|| "https://oauth.reddit.com".to_string()),
        })
    }
}

impl ScraperConfig {
    pub fn from_env() -> Result<Self, AppError> {
        dotenv().ok();
        Self::from_vars(&process_env)
    }

    pub fn from_vars(vars: Lookup) -> Result<Self, AppError> {
        let limit = match vars("SCRAPER_LIMIT") {
            Some(raw) => match raw.parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(AppError::Config(format!(
                        "SCRAPER_LIMIT must be a positive integer, got {}",
                        raw
                    )));
                }
            },
            None => 20,
        };

        let subreddits = list_or_default(vars, "SCRAPER_SUBREDDITS");
        if subreddits.is_empty() {
            return Err(AppError::Config(
                "SCRAPER_SUBREDDITS must name at least one forum".to_string(),
            ));
        }

        Ok(Self { subreddits, limit })
    }
}

impl DashboardConfig {
    pub fn from_env() -> Result<Self, AppError> {
        dotenv().ok();
        Self::from_vars(&process_env)
    }

    pub fn from_vars(vars: Lookup) -> Result<Self, AppError> {
        let raw_addr = vars("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let bind_addr = raw_addr
            .parse::<SocketAddr>()
            .map_err(|_| AppError::Config(format!("BIND_ADDR is invalid: {}", raw_addr)))?;

        Ok(Self {
            bind_addr,
            subreddits: list_or_default(vars, "DASHBOARD_SUBREDDITS"),
            gemini_api_key: vars("GEMINI_API_KEY"),
            gemini_api_url: vars("GEMINI_API_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_URL.to_string()),
        })
    }
}
