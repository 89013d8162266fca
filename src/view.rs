// src/view.rs

use askama::Template;
use chrono::{DateTime, Utc};
use url::form_urlencoded;

use crate::models::post::{PostSummary, SubredditCount};

/// Selector entry meaning "no forum filter".
pub const ALL: &str = "All";

pub const DEFAULT_LIMIT: i64 = 20;
pub const MIN_LIMIT: i64 = 5;
pub const MAX_LIMIT: i64 = 100;

/// Posts revealed initially and per "show more".
pub const PAGE_STEP: usize = 5;

/// Characters of `full_text` shown in an expanded post.
pub const PREVIEW_CHARS: usize = 1500;
pub const TRUNCATION_MARKER: &str = "...";

pub const THREAD_HOST: &str = "https://reddit.com";

/// Per-session dashboard state.
///
/// It travels in the page's query string: every form and link on the page
/// carries the next state, and a visit without parameters starts over.
/// Changing the forum or the limit drops `visible`, which resets it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    /// `None` until a specific forum is selected.
    pub filter: Option<String>,
    pub limit: i64,
    pub visible: usize,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            filter: None,
            limit: DEFAULT_LIMIT,
            visible: PAGE_STEP,
        }
    }
}

impl ViewState {
    /// State right after picking a forum and a limit.
    pub fn select(filter: Option<&str>, limit: i64) -> Self {
        let filter = filter
            .map(str::trim)
            .filter(|f| !f.is_empty() && !f.eq_ignore_ascii_case(ALL))
            .map(str::to_string);

        Self {
            filter,
            limit: limit.clamp(MIN_LIMIT, MAX_LIMIT),
            visible: PAGE_STEP,
        }
    }

    /// Restores a state carried by a link, never showing fewer than one page.
    pub fn with_visible(mut self, visible: usize) -> Self {
        self.visible = visible.max(PAGE_STEP);
        self
    }

    pub fn is_filtered(&self) -> bool {
        self.filter.is_some()
    }

    pub fn visible_count(&self, total: usize) -> usize {
        self.visible.min(total)
    }

    pub fn can_show_more(&self, total: usize) -> bool {
        self.visible < total
    }

    /// Next state after a "show more" request; capped at `total`.
    pub fn show_more(&self, total: usize) -> Self {
        let mut next = self.clone();
        if self.can_show_more(total) {
            next.visible = (self.visible + PAGE_STEP).min(total);
        }
        next
    }

    /// Query string reproducing this state (plus the keyword, if any).
    pub fn to_query(&self, keyword: Option<&str>) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        query.append_pair("subreddit", self.filter.as_deref().unwrap_or(ALL));
        query.append_pair("limit", &self.limit.to_string());
        query.append_pair("visible", &self.visible.to_string());
        if let Some(keyword) = keyword {
            query.append_pair("keyword", keyword);
        }
        query.finish()
    }
}

/// First `PREVIEW_CHARS` characters, with a marker when something was cut.
pub fn preview(full_text: &str) -> String {
    match full_text.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}{}", &full_text[..cut], TRUNCATION_MARKER),
        None => full_text.to_string(),
    }
}

/// Link to the discussion thread.
pub fn thread_link(permalink: &str, url: &str) -> String {
    if !permalink.is_empty() {
        format!("{}{}", THREAD_HOST, permalink)
    } else if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("{}{}", THREAD_HOST, url)
    }
}

pub fn format_timestamp(date: Option<DateTime<Utc>>) -> String {
    date.map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// One expandable entry of the post list.
#[derive(Debug, Clone)]
pub struct PostCard {
    pub heading: String,
    pub subreddit: String,
    pub published: String,
    pub body: String,
    pub link: String,
}

impl From<&PostSummary> for PostCard {
    fn from(post: &PostSummary) -> Self {
        Self {
            heading: format!("{} ({} upvotes)", post.title, post.score),
            subreddit: post.subreddit.clone(),
            published: format_timestamp(post.publish_date),
            body: preview(&post.full_text),
            link: thread_link(&post.permalink, &post.url),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ForumOption {
    pub name: String,
    pub selected: bool,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardPage {
    pub forums: Vec<ForumOption>,
    pub limit: i64,
    pub visible: usize,
    pub min_limit: i64,
    pub max_limit: i64,
    pub filter: Option<String>,
    pub notices: Vec<String>,
    pub error: Option<String>,
    pub posts: Vec<PostCard>,
    pub shown: usize,
    pub total: usize,
    pub show_more_href: Option<String>,
    pub keyword: String,
    pub explanation: Option<String>,
    pub counts: Vec<SubredditCount>,
}

impl DashboardPage {
    pub fn new(subreddits: &[String], view: &ViewState) -> Self {
        let selected = view.filter.as_deref().unwrap_or(ALL);
        let forums = std::iter::once(ALL.to_string())
            .chain(subreddits.iter().cloned())
            .map(|name| ForumOption {
                selected: name == selected,
                name,
            })
            .collect();

        Self {
            forums,
            limit: view.limit,
            visible: view.visible,
            min_limit: MIN_LIMIT,
            max_limit: MAX_LIMIT,
            filter: view.filter.clone(),
            notices: Vec::new(),
            error: None,
            posts: Vec::new(),
            shown: 0,
            total: 0,
            show_more_href: None,
            keyword: String::new(),
            explanation: None,
            counts: Vec::new(),
        }
    }

    /// Fills the list with the rows the current state makes visible.
    pub fn show_posts(&mut self, view: &ViewState, posts: &[PostSummary], keyword: Option<&str>) {
        self.total = posts.len();
        self.shown = view.visible_count(posts.len());
        self.posts = posts[..self.shown].iter().map(PostCard::from).collect();
        self.show_more_href = view
            .can_show_more(posts.len())
            .then(|| format!("/?{}", view.show_more(posts.len()).to_query(keyword)));
    }

    pub fn is_empty_listing(&self) -> bool {
        self.filter.is_some() && self.error.is_none() && self.total == 0
    }
}
