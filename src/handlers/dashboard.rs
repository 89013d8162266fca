// src/handlers/dashboard.rs

use std::str::FromStr;

use askama::Template;
use axum::{
    extract::{Query, State},
    response::Html,
};
use serde::Deserialize;

use crate::{
    error::AppError,
    models::post::MAX_KEYWORD_CHARS,
    state::AppState,
    view::{DashboardPage, DEFAULT_LIMIT, ViewState},
};

/// Query parameters of the dashboard page. Together they are the session state.
///
/// Numbers arrive as raw text so a hand-edited URL degrades to defaults
/// instead of failing the whole page.
#[derive(Debug, Default, Deserialize)]
pub struct DashboardParams {
    pub subreddit: Option<String>,
    pub limit: Option<String>,
    pub visible: Option<String>,
    pub keyword: Option<String>,
}

/// Blank counts as absent. `Err` carries the text that failed to parse.
fn parse_number<T: FromStr>(raw: Option<&str>) -> Result<Option<T>, String> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => s.parse().map(Some).map_err(|_| s.to_string()),
    }
}

impl DashboardParams {
    /// Decodes the view state, dropping filters that are not on the selectable list
    /// and numbers that do not parse. Each correction yields a notice.
    pub fn view_state(&self, selectable: &[String]) -> (ViewState, Vec<String>) {
        let mut notices = Vec::new();

        let limit = match parse_number::<i64>(self.limit.as_deref()) {
            Ok(limit) => limit.unwrap_or(DEFAULT_LIMIT),
            Err(raw) => {
                notices.push(format!(
                    "Number of posts must be a whole number, got {}; showing {}.",
                    raw, DEFAULT_LIMIT
                ));
                DEFAULT_LIMIT
            }
        };

        let view = ViewState::select(self.subreddit.as_deref(), limit);
        let view = match parse_number::<usize>(self.visible.as_deref()) {
            Ok(Some(visible)) => view.with_visible(visible),
            Ok(None) => view,
            Err(raw) => {
                tracing::debug!("Ignoring unparsable visible count {:?}", raw);
                view
            }
        };

        match view.filter.as_deref() {
            Some(forum) if !selectable.iter().any(|s| s == forum) => {
                notices.push(format!("r/{} is not available in this dashboard.", forum));
                let fallback = ViewState {
                    limit: view.limit,
                    ..ViewState::default()
                };
                (fallback, notices)
            }
            _ => (view, notices),
        }
    }

    pub fn keyword(&self) -> Option<&str> {
        self.keyword
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

/// Renders the dashboard.
///
/// Every request runs the listing query (when a forum is selected) and the
/// explanation call (when a keyword is given) from scratch. Failures of
/// either are shown on the page.
pub async fn index(
    State(state): State<AppState>,
    Query(params): Query<DashboardParams>,
) -> Result<Html<String>, AppError> {
    let (view, notices) = params.view_state(&state.config.subreddits);

    let mut page = DashboardPage::new(&state.config.subreddits, &view);
    page.notices = notices;

    let mut keyword = params.keyword();
    if keyword.is_some_and(|k| k.chars().count() > MAX_KEYWORD_CHARS) {
        page.notices.push(format!(
            "Keyword must be at most {} characters.",
            MAX_KEYWORD_CHARS
        ));
        keyword = None;
    }

    if let Some(forum) = view.filter.as_deref() {
        match state.store.list_posts(Some(forum), view.limit).await {
            Ok(posts) => page.show_posts(&view, &posts, keyword),
            Err(e) => {
                tracing::error!("Failed to fetch posts: {}", e);
                page.error = Some(format!("Failed to fetch posts: {}", e));
            }
        }
    }

    match state.store.count_by_subreddit().await {
        Ok(counts) => page.counts = counts,
        Err(e) => tracing::warn!("Failed to count stored posts: {}", e),
    }

    if let Some(keyword) = keyword {
        page.keyword = keyword.to_string();
        page.explanation = Some(state.explainer.explain(keyword).await);
    }

    let html = page
        .render()
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    Ok(Html(html))
}
