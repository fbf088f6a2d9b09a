pub const MATCHER_SYSTEM: &str = "You are a food recommendation assistant. Given a user's craving \
and a restaurant, say in one or two sentences how well the place matches the craving. Be concrete \
and do not invent menu items.";

pub const REVIEWER_SYSTEM: &str = "You summarize customer reviews of a restaurant. Write two or \
three sentences covering overall sentiment, frequently praised dishes and recurring complaints.";

pub const TRANSLATOR_SYSTEM: &str =
    "You translate text faithfully, keeping tone and formatting. Reply with the translation only.";

pub const MENU_PROMPT_MAX_CHARS: usize = 1_000;

pub fn match_request(query: &str, name: &str, types: &[String]) -> String {
    format!(
        "The user is craving: {query}\nPlace: {name}\nCategories: {}",
        types.join(", ")
    )
}

pub fn menu_segment(query: &str, name: &str, menu_text: &str) -> String {
    format!(
        "Menu excerpt scraped from the website of {name}:\n{}\n\nMention any menu items relevant \
to \"{query}\".",
        truncate_chars(menu_text, MENU_PROMPT_MAX_CHARS)
    )
}

pub fn review_request(reviews: &str) -> String {
    format!("Customer reviews:\n{reviews}")
}

pub fn translation_request(text: &str, language: &str) -> String {
    format!("Translate into {language}:\n{text}")
}

pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_segment_is_bounded() {
        let long_menu = "x".repeat(10_000);
        let segment = menu_segment("burger", "Spot", &long_menu);
        assert!(segment.chars().count() < MENU_PROMPT_MAX_CHARS + 200);
        assert!(segment.contains("burger"));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let text = "żółć".repeat(300);
        let truncated = truncate_chars(&text, 500);
        assert_eq!(truncated.chars().count(), 500);
    }
}
