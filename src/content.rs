use std::time::Duration;

use async_trait::async_trait;
use scraper::{Html, Node};

use crate::config::AppConfig;
use crate::errors::{AppError, AppResult};

#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> AppResult<String>;
}

pub struct HttpContentFetcher {
    http: reqwest::Client,
}

impl HttpContentFetcher {
    pub fn new(config: &AppConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("smart-meal-finder/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.menu_fetch_timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(AppError::fetch)?;
        Ok(Self { http })
    }
}

#[async_trait]
impl ContentFetcher for HttpContentFetcher {
    async fn fetch(&self, url: &str) -> AppResult<String> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(AppError::fetch)?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Fetch(format!("HTTP {status} for {url}")));
        }

        let html = response.text().await.map_err(AppError::fetch)?;
        Ok(visible_text(&html))
    }
}

pub fn visible_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut parts: Vec<&str> = Vec::new();
    for node in document.tree.nodes() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| match ancestor.value() {
            Node::Element(element) => {
                matches!(element.name(), "script" | "style" | "noscript")
            }
            _ => false,
        });
        if hidden {
            continue;
        }
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            parts.push(trimmed);
        }
    }
    parts.join(" ")
}
