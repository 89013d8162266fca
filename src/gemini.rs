// src/gemini.rs

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

use crate::error::AppError;

/// Upper bound on a single generation request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub fn explanation_prompt(keyword: &str) -> String {
    format!(
        "Explain the concept of '{}' in simple terms for a data enthusiast.",
        keyword
    )
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

/// Pulls the first candidate's first text part out of a response body.
fn first_text(body: &str) -> Result<String, AppError> {
    let response: GenerateResponse = serde_json::from_str(body)?;
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content.parts.into_iter().next())
        .and_then(|p| p.text)
        .ok_or_else(|| AppError::Upstream("response contained no candidates".to_string()))
}

/// Client for the keyword explanation service.
#[derive(Debug, Clone)]
pub struct Explainer {
    http: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
}

impl Explainer {
    pub fn new(api_url: impl Into<String>, api_key: Option<String>) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;

        Ok(Self {
            http,
            api_url: api_url.into(),
            api_key,
        })
    }

    /// Sends `prompt` as the only input and returns the generated text.
    pub async fn generate(&self, prompt: &str) -> Result<String, AppError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            AppError::Config("GEMINI_API_KEY is not set; explanations are unavailable".to_string())
        })?;

        let payload = json!({
            "contents": [
                { "parts": [ { "text": prompt } ] }
            ]
        });

        let response = self
            .http
            .post(&self.api_url)
            .header("x-goog-api-key", api_key)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;

        let body = response.text().await?;
        first_text(&body)
    }

    /// Explanation text for `keyword`, or `Error: ...` when the service could
    /// not provide one. Never fails.
    pub async fn explain(&self, keyword: &str) -> String {
        match self.generate(&explanation_prompt(keyword)).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(keyword, "Explanation request failed: {}", e);
                format!("Error: {}", e)
            }
        }
    }
}
