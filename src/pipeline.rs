use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::content::{ContentFetcher, HttpContentFetcher};
use crate::enrich::{
    CandidateEnricher, EnrichmentIssue, EnrichmentStep, MatchEnrichment, ReviewEnricher,
    ReviewSummary,
};
use crate::errors::{AppError, AppResult};
use crate::places::{Candidate, LatLng, PlacesService};
use crate::summarizer::{OpenAiSummarizer, Summarizer};

const MATCHER_TEMPERATURE: f32 = 0.2;
const REVIEWER_TEMPERATURE: f32 = 0.3;

pub type WarningObserver = Arc<dyn Fn(EnrichmentWarning) + Send + Sync>;

#[derive(Debug, Clone, Serialize)]
pub struct EnrichmentWarning {
    pub candidate: String,
    pub step: EnrichmentStep,
    pub reason: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub name: String,
    pub address: Option<String>,
    pub location: Option<LatLng>,
    pub place_id: Option<String>,
    pub match_summary: Option<String>,
    pub menu_excerpt: Option<String>,
    pub rating: Option<f64>,
    pub rating_count: Option<u32>,
    pub review: Option<ReviewSummary>,
}

pub struct RecommendationPipeline {
    places: PlacesService,
    candidate_enricher: CandidateEnricher,
    review_enricher: ReviewEnricher,
    max_candidates: usize,
    concurrency: usize,
    default_radius_meters: u32,
}

impl RecommendationPipeline {
    pub fn new(config: &AppConfig) -> AppResult<Self> {
        let places = PlacesService::new(config)?;
        let fetcher: Arc<dyn ContentFetcher> = Arc::new(HttpContentFetcher::new(config)?);
        let matcher: Arc<dyn Summarizer> =
            Arc::new(OpenAiSummarizer::new(config, MATCHER_TEMPERATURE)?);
        let reviewer: Arc<dyn Summarizer> =
            Arc::new(OpenAiSummarizer::new(config, REVIEWER_TEMPERATURE)?);
        Ok(Self::with_collaborators(
            places,
            fetcher,
            matcher,
            reviewer,
            config.max_candidates,
            config.enrichment_concurrency,
            config.default_radius_meters,
        ))
    }

    pub fn with_collaborators(
        places: PlacesService,
        fetcher: Arc<dyn ContentFetcher>,
        matcher: Arc<dyn Summarizer>,
        reviewer: Arc<dyn Summarizer>,
        max_candidates: usize,
        concurrency: usize,
        default_radius_meters: u32,
    ) -> Self {
        Self {
            candidate_enricher: CandidateEnricher::new(fetcher, matcher),
            review_enricher: ReviewEnricher::new(places.clone(), reviewer),
            places,
            max_candidates: max_candidates.max(1),
            concurrency: concurrency.max(1),
            default_radius_meters: default_radius_meters.max(1),
        }
    }

    pub async fn run(
        &self,
        query: &str,
        location: LatLng,
        radius: Option<u32>,
    ) -> AppResult<Vec<Recommendation>> {
        self.run_with_observer(query, location, radius, None, None)
            .await
    }

    pub async fn run_with_observer(
        &self,
        query: &str,
        location: LatLng,
        radius: Option<u32>,
        observer: Option<WarningObserver>,
        cancel_flag: Option<Arc<AtomicBool>>,
    ) -> AppResult<Vec<Recommendation>> {
        if query.trim().is_empty() {
            return Err(AppError::Config("query must not be empty".into()));
        }
        if radius == Some(0) {
            return Err(AppError::Config("radius must be positive".into()));
        }
        let radius = radius.unwrap_or(self.default_radius_meters);

        let mut candidates = self.places.search(query, location, Some(radius)).await?;
        candidates.truncate(self.max_candidates);
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            query,
            count = candidates.len(),
            "discovery complete, enriching candidates"
        );

        let worker_cap = self.concurrency.min(candidates.len());
        let mut slots: Vec<Option<Recommendation>> = Vec::new();
        slots.resize_with(candidates.len(), || None);

        let tasks = candidates
            .into_iter()
            .enumerate()
            .map(|(index, candidate)| {
                let observer = observer.clone();
                let cancel_flag = cancel_flag.clone();
                async move {
                    if cancelled(&cancel_flag) {
                        return (index, None);
                    }
                    let record = self
                        .enrich_candidate(query, location, candidate, &observer)
                        .await;
                    (index, Some(record))
                }
            });

        let mut merged = stream::iter(tasks).buffer_unordered(worker_cap);
        while let Some((index, record)) = merged.next().await {
            slots[index] = record;
        }
        drop(merged);

        Ok(slots.into_iter().flatten().collect())
    }

    async fn enrich_candidate(
        &self,
        query: &str,
        location: LatLng,
        candidate: Candidate,
        observer: &Option<WarningObserver>,
    ) -> Recommendation {
        let (match_part, review_part) = tokio::join!(
            self.candidate_enricher.enrich(query, &candidate),
            self.review_for(&candidate, location),
        );
        let MatchEnrichment {
            match_summary,
            menu_excerpt,
            issues,
        } = match_part;
        let (place_id, review, review_issues) = review_part;

        for issue in issues.iter().chain(review_issues.iter()) {
            emit_warning(observer, &candidate.name, issue);
        }

        Recommendation {
            rating: review.as_ref().and_then(|r| r.rating).or(candidate.rating),
            rating_count: review
                .as_ref()
                .and_then(|r| r.rating_count)
                .or(candidate.rating_count),
            name: candidate.name,
            address: candidate.address,
            location: candidate.location,
            place_id,
            match_summary,
            menu_excerpt,
            review,
        }
    }

    async fn review_for(
        &self,
        candidate: &Candidate,
        location: LatLng,
    ) -> (Option<String>, Option<ReviewSummary>, Vec<EnrichmentIssue>) {
        let mut issues = Vec::new();

        let place_id = match &candidate.place_id {
            Some(id) => Some(id.clone()),
            None => match self.resolve_identifier(candidate, location).await {
                Ok(id) => Some(id),
                Err(err) => {
                    warn!(?err, name = %candidate.name, "identifier resolution failed");
                    issues.push(EnrichmentIssue {
                        step: EnrichmentStep::IdentifierResolution,
                        reason: err.to_string(),
                    });
                    None
                }
            },
        };

        let review = match &place_id {
            None => None,
            Some(id) => match self.review_enricher.enrich(id).await {
                Ok(summary) => Some(summary),
                Err(err) => {
                    warn!(?err, name = %candidate.name, "review enrichment failed");
                    issues.push(EnrichmentIssue {
                        step: EnrichmentStep::ReviewSummary,
                        reason: err.to_string(),
                    });
                    None
                }
            },
        };

        (place_id, review, issues)
    }

    async fn resolve_identifier(
        &self,
        candidate: &Candidate,
        location: LatLng,
    ) -> AppResult<String> {
        let near = candidate.location.unwrap_or(location);
        let results = self
            .places
            .search(&candidate.name, near, Some(self.default_radius_meters))
            .await?;
        results
            .into_iter()
            .next()
            .and_then(|found| found.place_id)
            .ok_or_else(|| AppError::Resolution(candidate.name.clone()))
    }
}

fn cancelled(flag: &Option<Arc<AtomicBool>>) -> bool {
    flag.as_ref()
        .map(|f| f.load(Ordering::SeqCst))
        .unwrap_or(false)
}

fn emit_warning(observer: &Option<WarningObserver>, candidate: &str, issue: &EnrichmentIssue) {
    if let Some(callback) = observer {
        callback(EnrichmentWarning {
            candidate: candidate.to_string(),
            step: issue.step,
            reason: issue.reason.clone(),
            at: Utc::now(),
        });
    }
}
