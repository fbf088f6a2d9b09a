use std::sync::Arc;

use crate::errors::AppResult;
use crate::prompts;
use crate::summarizer::Summarizer;

pub struct Translator {
    summarizer: Arc<dyn Summarizer>,
    target_language: String,
}

impl Translator {
    pub fn new(summarizer: Arc<dyn Summarizer>, target_language: impl Into<String>) -> Self {
        Self {
            summarizer,
            target_language: target_language.into(),
        }
    }

    pub async fn translate(&self, text: &str) -> AppResult<String> {
        if text.is_empty() || is_english(&self.target_language) {
            return Ok(text.to_string());
        }
        self.summarizer
            .complete(
                prompts::TRANSLATOR_SYSTEM,
                &prompts::translation_request(text, &self.target_language),
            )
            .await
    }
}

fn is_english(language: &str) -> bool {
    matches!(language.trim().to_lowercase().as_str(), "english" | "en")
}
