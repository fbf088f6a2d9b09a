use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use crate::content::ContentFetcher;
use crate::errors::AppResult;
use crate::places::{Candidate, PlacesService};
use crate::prompts;
use crate::summarizer::Summarizer;

pub const MENU_EXCERPT_MAX_CHARS: usize = 500;
pub const MAX_REVIEWS_SUMMARIZED: usize = 5;
pub const NO_REVIEWS_TEXT: &str = "No reviews found.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentStep {
    MenuFetch,
    MatchSummary,
    IdentifierResolution,
    ReviewSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnrichmentIssue {
    pub step: EnrichmentStep,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct MatchEnrichment {
    pub match_summary: Option<String>,
    pub menu_excerpt: Option<String>,
    pub issues: Vec<EnrichmentIssue>,
}

pub struct CandidateEnricher {
    fetcher: Arc<dyn ContentFetcher>,
    summarizer: Arc<dyn Summarizer>,
}

impl CandidateEnricher {
    pub fn new(fetcher: Arc<dyn ContentFetcher>, summarizer: Arc<dyn Summarizer>) -> Self {
        Self {
            fetcher,
            summarizer,
        }
    }

    pub async fn enrich(&self, query: &str, candidate: &Candidate) -> MatchEnrichment {
        let mut issues = Vec::new();

        let menu_text = match candidate.website.as_deref() {
            None => None,
            Some(url) => match self.fetcher.fetch(url).await {
                Ok(text) if !text.trim().is_empty() => Some(text),
                Ok(_) => None,
                Err(err) => {
                    warn!(?err, url, name = %candidate.name, "menu fetch failed");
                    issues.push(EnrichmentIssue {
                        step: EnrichmentStep::MenuFetch,
                        reason: err.to_string(),
                    });
                    None
                }
            },
        };

        let mut user_context = prompts::match_request(query, &candidate.name, &candidate.types);
        if let Some(menu) = &menu_text {
            user_context.push_str("\n\n");
            user_context.push_str(&prompts::menu_segment(query, &candidate.name, menu));
        }

        let match_summary = match self
            .summarizer
            .complete(prompts::MATCHER_SYSTEM, &user_context)
            .await
        {
            Ok(text) => Some(text),
            Err(err) => {
                warn!(?err, name = %candidate.name, "match summary generation failed");
                issues.push(EnrichmentIssue {
                    step: EnrichmentStep::MatchSummary,
                    reason: err.to_string(),
                });
                None
            }
        };

        MatchEnrichment {
            match_summary,
            menu_excerpt: menu_text
                .map(|text| prompts::truncate_chars(&text, MENU_EXCERPT_MAX_CHARS)),
            issues,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewSummary {
    pub summary: String,
    pub price_label: String,
    pub opening_hours: Vec<String>,
    pub rating: Option<f64>,
    pub rating_count: Option<u32>,
}

pub struct ReviewEnricher {
    places: PlacesService,
    summarizer: Arc<dyn Summarizer>,
}

impl ReviewEnricher {
    pub fn new(places: PlacesService, summarizer: Arc<dyn Summarizer>) -> Self {
        Self { places, summarizer }
    }

    pub async fn enrich(&self, place_id: &str) -> AppResult<ReviewSummary> {
        let details = self.places.details(place_id).await?;

        let summary = if details.reviews.is_empty() {
            NO_REVIEWS_TEXT.to_string()
        } else {
            let combined = details
                .reviews
                .iter()
                .take(MAX_REVIEWS_SUMMARIZED)
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join("\n");
            self.summarizer
                .complete(prompts::REVIEWER_SYSTEM, &prompts::review_request(&combined))
                .await?
        };

        Ok(ReviewSummary {
            summary,
            price_label: price_label(details.price_level).to_string(),
            opening_hours: details.opening_hours,
            rating: details.rating,
            rating_count: details.rating_count,
        })
    }
}

pub fn price_label(level: Option<u8>) -> &'static str {
    match level {
        Some(0) => "Free",
        Some(1) => "$ Inexpensive",
        Some(2) => "$$ Moderate",
        Some(3) => "$$$ Expensive",
        Some(4) => "$$$$ Very Expensive",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use parking_lot::Mutex;

    use crate::errors::AppError;
    use crate::places::{DetailRecord, LatLng, PlacesDirectory};

    use super::*;

    struct ScriptedSummarizer {
        reply: AppResult<String>,
        seen: Mutex<Vec<(String, String)>>,
    }

    impl ScriptedSummarizer {
        fn replying(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(text.to_string()),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn failing(reason: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(AppError::Generation(reason.into())),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Summarizer for ScriptedSummarizer {
        async fn complete(&self, system_context: &str, user_context: &str) -> AppResult<String> {
            self.seen
                .lock()
                .push((system_context.to_string(), user_context.to_string()));
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(err) => Err(AppError::Generation(err.to_string())),
            }
        }
    }

    struct ScriptedFetcher {
        result: AppResult<String>,
    }

    #[async_trait]
    impl ContentFetcher for ScriptedFetcher {
        async fn fetch(&self, _url: &str) -> AppResult<String> {
            match &self.result {
                Ok(text) => Ok(text.clone()),
                Err(err) => Err(AppError::Fetch(err.to_string())),
            }
        }
    }

    struct ScriptedDirectory {
        details: Mutex<Vec<AppResult<DetailRecord>>>,
    }

    #[async_trait]
    impl PlacesDirectory for ScriptedDirectory {
        async fn search(
            &self,
            _query: &str,
            _location: LatLng,
            _radius: Option<u32>,
        ) -> AppResult<Vec<Candidate>> {
            Ok(Vec::new())
        }

        async fn details(&self, place_id: &str) -> AppResult<DetailRecord> {
            self.details
                .lock()
                .pop()
                .unwrap_or_else(|| Err(AppError::Upstream(format!("no script for {place_id}"))))
        }
    }

    fn candidate_with_website(website: Option<&str>) -> Candidate {
        Candidate {
            name: "Burger Spot".into(),
            address: Some("1 Main St".into()),
            location: Some(LatLng {
                lat: 52.23,
                lng: 21.01,
            }),
            place_id: Some("p1".into()),
            types: vec!["restaurant".into(), "food".into()],
            rating: Some(4.4),
            rating_count: Some(120),
            website: website.map(str::to_string),
        }
    }

    fn detail_with_reviews(reviews: Vec<&str>, price_level: Option<u8>) -> DetailRecord {
        DetailRecord {
            name: Some("Burger Spot".into()),
            address: Some("1 Main St".into()),
            rating: Some(4.6),
            rating_count: Some(133),
            price_level,
            opening_hours: vec!["Monday: 9-17".into()],
            reviews: reviews.into_iter().map(str::to_string).collect(),
        }
    }

    #[test]
    fn step_tags_serialize_as_snake_case() {
        let tags: Vec<String> = [
            EnrichmentStep::MenuFetch,
            EnrichmentStep::MatchSummary,
            EnrichmentStep::IdentifierResolution,
            EnrichmentStep::ReviewSummary,
        ]
        .iter()
        .map(|step| serde_json::to_string(step).unwrap())
        .collect();
        assert_eq!(
            tags,
            vec![
                "\"menu_fetch\"",
                "\"match_summary\"",
                "\"identifier_resolution\"",
                "\"review_summary\"",
            ]
        );
    }

    #[test]
    fn price_mapping_is_total_and_exact() {
        assert_eq!(price_label(Some(0)), "Free");
        assert_eq!(price_label(Some(1)), "$ Inexpensive");
        assert_eq!(price_label(Some(2)), "$$ Moderate");
        assert_eq!(price_label(Some(3)), "$$$ Expensive");
        assert_eq!(price_label(Some(4)), "$$$$ Very Expensive");
        assert_eq!(price_label(Some(5)), "Unknown");
        assert_eq!(price_label(Some(255)), "Unknown");
        assert_eq!(price_label(None), "Unknown");
    }

    #[tokio::test]
    async fn failed_menu_fetch_still_yields_match_summary() {
        let summarizer = ScriptedSummarizer::replying("Great fit for burgers.");
        let enricher = CandidateEnricher::new(
            Arc::new(ScriptedFetcher {
                result: Err(AppError::Fetch("timeout".into())),
            }),
            summarizer.clone(),
        );

        let outcome = enricher
            .enrich("chicken burger", &candidate_with_website(Some("https://spot.test")))
            .await;

        assert_eq!(outcome.match_summary.as_deref(), Some("Great fit for burgers."));
        assert!(outcome.menu_excerpt.is_none());
        assert_eq!(outcome.issues.len(), 1);
        assert_eq!(outcome.issues[0].step, EnrichmentStep::MenuFetch);

        let seen = summarizer.seen.lock();
        assert_eq!(seen.len(), 1);
        assert!(!seen[0].1.contains("Menu excerpt"));
    }

    #[tokio::test]
    async fn menu_excerpt_is_capped_and_prompt_is_bounded() {
        let page_text = "menu ".repeat(2_000);
        let summarizer = ScriptedSummarizer::replying("Match.");
        let enricher = CandidateEnricher::new(
            Arc::new(ScriptedFetcher {
                result: Ok(page_text),
            }),
            summarizer.clone(),
        );

        let outcome = enricher
            .enrich("burger", &candidate_with_website(Some("https://spot.test")))
            .await;

        let excerpt = outcome.menu_excerpt.expect("excerpt");
        assert_eq!(excerpt.chars().count(), MENU_EXCERPT_MAX_CHARS);
        assert!(outcome.issues.is_empty());

        let seen = summarizer.seen.lock();
        let user_context = &seen[0].1;
        assert!(user_context.contains("Menu excerpt"));
        assert!(user_context.chars().count() < prompts::MENU_PROMPT_MAX_CHARS + 400);
    }

    #[tokio::test]
    async fn absent_website_skips_fetch_without_issue() {
        let summarizer = ScriptedSummarizer::replying("Match.");
        let enricher = CandidateEnricher::new(
            Arc::new(ScriptedFetcher {
                result: Err(AppError::Fetch("must not be called".into())),
            }),
            summarizer,
        );

        let outcome = enricher.enrich("burger", &candidate_with_website(None)).await;
        assert!(outcome.menu_excerpt.is_none());
        assert!(outcome.issues.is_empty());
        assert!(outcome.match_summary.is_some());
    }

    #[tokio::test]
    async fn summarizer_failure_degrades_match_summary_only() {
        let enricher = CandidateEnricher::new(
            Arc::new(ScriptedFetcher {
                result: Ok("Chicken burger 25 PLN".into()),
            }),
            ScriptedSummarizer::failing("model offline"),
        );

        let outcome = enricher
            .enrich("burger", &candidate_with_website(Some("https://spot.test")))
            .await;

        assert!(outcome.match_summary.is_none());
        assert_eq!(outcome.menu_excerpt.as_deref(), Some("Chicken burger 25 PLN"));
        assert_eq!(outcome.issues.len(), 1);
        assert_eq!(outcome.issues[0].step, EnrichmentStep::MatchSummary);
    }

    #[tokio::test]
    async fn summarizes_at_most_five_reviews_in_order() {
        let summarizer = ScriptedSummarizer::replying("Loved by regulars.");
        let directory = Arc::new(ScriptedDirectory {
            details: Mutex::new(vec![Ok(detail_with_reviews(
                vec!["first", "second", "third", "fourth", "fifth", "sixth"],
                Some(2),
            ))]),
        });
        let enricher = ReviewEnricher::new(
            PlacesService::from_directory(directory),
            summarizer.clone(),
        );

        let review = enricher.enrich("p1").await.unwrap();
        assert_eq!(review.summary, "Loved by regulars.");
        assert_eq!(review.price_label, "$$ Moderate");
        assert_eq!(review.rating, Some(4.6));
        assert_eq!(review.rating_count, Some(133));

        let seen = summarizer.seen.lock();
        assert!(seen[0].1.contains("first\nsecond\nthird\nfourth\nfifth"));
        assert!(!seen[0].1.contains("sixth"));
    }

    #[tokio::test]
    async fn zero_reviews_is_a_normal_terminal_state() {
        let summarizer = ScriptedSummarizer::failing("must not be called");
        let directory = Arc::new(ScriptedDirectory {
            details: Mutex::new(vec![Ok(detail_with_reviews(vec![], None))]),
        });
        let enricher =
            ReviewEnricher::new(PlacesService::from_directory(directory), summarizer.clone());

        let review = enricher.enrich("p1").await.unwrap();
        assert_eq!(review.summary, NO_REVIEWS_TEXT);
        assert_eq!(review.price_label, "Unknown");
        assert!(summarizer.seen.lock().is_empty());
    }

    #[tokio::test]
    async fn details_failure_propagates() {
        let directory = Arc::new(ScriptedDirectory {
            details: Mutex::new(vec![Err(AppError::Upstream("quota".into()))]),
        });
        let enricher = ReviewEnricher::new(
            PlacesService::from_directory(directory),
            ScriptedSummarizer::replying("unused"),
        );

        let err = enricher.enrich("p1").await.unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
    }
}
