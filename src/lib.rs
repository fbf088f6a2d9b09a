pub mod config;
pub mod content;
pub mod enrich;
pub mod errors;
pub mod pipeline;
pub mod places;
pub mod prompts;
pub mod suggest;
pub mod summarizer;
pub mod translate;

use once_cell::sync::OnceCell;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use config::{AppConfig, PublicAppConfig};
pub use content::{ContentFetcher, HttpContentFetcher};
pub use enrich::{
    CandidateEnricher, EnrichmentIssue, EnrichmentStep, ReviewEnricher, ReviewSummary,
};
pub use errors::{AppError, AppResult};
pub use pipeline::{EnrichmentWarning, Recommendation, RecommendationPipeline, WarningObserver};
pub use places::{Candidate, DetailRecord, GooglePlacesClient, LatLng, PlacesDirectory, PlacesService};
pub use suggest::{MealSuggester, Suggestion};
pub use summarizer::{OpenAiSummarizer, Summarizer};
pub use translate::Translator;

pub fn init_tracing() {
    static INIT: OnceCell<()> = OnceCell::new();
    let _ = INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info,smart_meal_finder=debug"));
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    });
}
