use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::AppResult;
use crate::summarizer::Summarizer;

const SUGGESTER_SYSTEM: &str =
    "You produce compact JSON lists of meal ideas. Reply with the JSON array only, no prose.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub emoji: String,
    pub label: String,
}

pub struct MealSuggester {
    summarizer: Arc<dyn Summarizer>,
}

impl MealSuggester {
    pub fn new(summarizer: Arc<dyn Summarizer>) -> Self {
        Self { summarizer }
    }

    pub async fn category_suggestions(&self) -> AppResult<Vec<Suggestion>> {
        let prompt = "Return a JSON list of 4 popular general meal categories, each with an emoji \
and short label. Example format: [[\"🍗\", \"Meat\"], [\"🥦\", \"Vege\"], [\"🍭\", \"Sweets\"]]";
        let response = self.summarizer.complete(SUGGESTER_SYSTEM, prompt).await?;
        Ok(parse_labeled_list(&response))
    }

    pub async fn general_suggestions(&self, category: &str) -> AppResult<Vec<Suggestion>> {
        let prompt = format!(
            "Return a JSON list of 8 popular meals based on category {}, each with an emoji and \
short label. Example format: [[\"🍔\", \"Burger\"], [\"🍕\", \"Pizza\"], [\"🍣\", \"Sushi\"]]",
            category.to_lowercase()
        );
        let response = self.summarizer.complete(SUGGESTER_SYSTEM, &prompt).await?;
        Ok(parse_labeled_list(&response))
    }

    pub async fn sub_suggestions(&self, meal: &str) -> AppResult<Vec<String>> {
        let prompt = format!(
            "Return a JSON list of 4 specific types of {} someone might want to eat. Example for \
'Burger': [\"Chicken Burger\", \"Cheeseburger\", \"Vegan Burger\"]",
            meal.to_lowercase()
        );
        let response = self.summarizer.complete(SUGGESTER_SYSTEM, &prompt).await?;
        Ok(parse_string_list(&response))
    }
}

fn parse_labeled_list(response: &str) -> Vec<Suggestion> {
    match serde_json::from_str::<Vec<(String, String)>>(response.trim()) {
        Ok(pairs) => pairs
            .into_iter()
            .map(|(emoji, label)| Suggestion { emoji, label })
            .collect(),
        Err(err) => {
            warn!(?err, response, "could not parse suggestion list");
            Vec::new()
        }
    }
}

fn parse_string_list(response: &str) -> Vec<String> {
    match serde_json::from_str::<Vec<String>>(response.trim()) {
        Ok(items) => items,
        Err(err) => {
            warn!(?err, response, "could not parse sub-suggestion list");
            Vec::new()
        }
    }
}
