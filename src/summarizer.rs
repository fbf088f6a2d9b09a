use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::errors::{AppError, AppResult};

const COMPLETION_HTTP_TIMEOUT_SECS: u64 = 30;

#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn complete(&self, system_context: &str, user_context: &str) -> AppResult<String>;
}

pub struct OpenAiSummarizer {
    http: Client,
    api_base: String,
    api_key: SecretString,
    model: String,
    temperature: f32,
}

impl OpenAiSummarizer {
    pub fn new(config: &AppConfig, temperature: f32) -> AppResult<Self> {
        let api_key = config
            .openai_api_key
            .clone()
            .ok_or_else(|| AppError::Config("OPENAI_API_KEY is not set".into()))?;
        let http = Client::builder()
            .user_agent(concat!("smart-meal-finder/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(COMPLETION_HTTP_TIMEOUT_SECS))
            .build()
            .map_err(AppError::generation)?;
        Ok(Self {
            http,
            api_base: config.openai_api_base.clone(),
            api_key,
            model: config.openai_model.clone(),
            temperature,
        })
    }
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    async fn complete(&self, system_context: &str, user_context: &str) -> AppResult<String> {
        #[derive(Serialize)]
        struct RequestBody<'a> {
            model: &'a str,
            temperature: f32,
            messages: Vec<RequestMessage<'a>>,
        }

        #[derive(Serialize)]
        struct RequestMessage<'a> {
            role: &'a str,
            content: &'a str,
        }

        #[derive(Deserialize)]
        struct Response {
            choices: Vec<ResponseChoice>,
        }

        #[derive(Deserialize)]
        struct ResponseChoice {
            message: ResponseMessage,
        }

        #[derive(Deserialize)]
        struct ResponseMessage {
            content: Option<String>,
        }

        let body = RequestBody {
            model: &self.model,
            temperature: self.temperature,
            messages: vec![
                RequestMessage {
                    role: "system",
                    content: system_context,
                },
                RequestMessage {
                    role: "user",
                    content: user_context,
                },
            ],
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(AppError::generation)?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Generation(format!(
                "completion request rejected ({status})"
            )));
        }

        let parsed: Response = response.json().await.map_err(AppError::generation)?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| AppError::Generation("completion response had no content".into()))
    }
}
