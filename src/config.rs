use std::{env, io};

use secrecy::SecretString;
use serde::Serialize;
use tracing::debug;

const DEFAULT_PLACES_API_BASE: &str = "https://maps.googleapis.com/maps/api/place";
const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
const DEFAULT_RADIUS_METERS: u32 = 1_500;
const DEFAULT_MAX_CANDIDATES: usize = 10;
const DEFAULT_ENRICHMENT_CONCURRENCY: usize = 10;
const DEFAULT_MENU_FETCH_TIMEOUT_SECS: u64 = 5;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub places_api_base: String,
    pub openai_api_base: String,
    pub openai_model: String,
    pub default_radius_meters: u32,
    pub max_candidates: usize,
    pub enrichment_concurrency: usize,
    pub menu_fetch_timeout_secs: u64,
    pub google_maps_api_key: Option<SecretString>,
    pub openai_api_key: Option<SecretString>,
}

#[derive(Clone, Debug, Serialize)]
pub struct PublicAppConfig {
    pub places_api_base: String,
    pub openai_api_base: String,
    pub openai_model: String,
    pub default_radius_meters: u32,
    pub max_candidates: usize,
    pub enrichment_concurrency: usize,
    pub menu_fetch_timeout_secs: u64,
    pub has_google_maps_key: bool,
    pub has_openai_key: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        load_dotenv_if_applicable();
        Self {
            places_api_base: trimmed_base("GOOGLE_PLACES_API_BASE", DEFAULT_PLACES_API_BASE),
            openai_api_base: trimmed_base("OPENAI_API_BASE", DEFAULT_OPENAI_API_BASE),
            openai_model: env::var("OPENAI_MODEL")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            default_radius_meters: parse_u32("DEFAULT_RADIUS_METERS", DEFAULT_RADIUS_METERS).max(1),
            max_candidates: parse_usize("MAX_CANDIDATES", DEFAULT_MAX_CANDIDATES).max(1),
            enrichment_concurrency: parse_usize(
                "ENRICHMENT_CONCURRENCY",
                DEFAULT_ENRICHMENT_CONCURRENCY,
            )
            .max(1),
            menu_fetch_timeout_secs: parse_u64(
                "MENU_FETCH_TIMEOUT_SECS",
                DEFAULT_MENU_FETCH_TIMEOUT_SECS,
            )
            .max(1),
            google_maps_api_key: secret_from_env("GOOGLE_MAPS_API_KEY"),
            openai_api_key: secret_from_env("OPENAI_API_KEY"),
        }
    }

    pub fn public_profile(&self) -> PublicAppConfig {
        PublicAppConfig {
            places_api_base: self.places_api_base.clone(),
            openai_api_base: self.openai_api_base.clone(),
            openai_model: self.openai_model.clone(),
            default_radius_meters: self.default_radius_meters,
            max_candidates: self.max_candidates,
            enrichment_concurrency: self.enrichment_concurrency,
            menu_fetch_timeout_secs: self.menu_fetch_timeout_secs,
            has_google_maps_key: self.google_maps_api_key.is_some(),
            has_openai_key: self.openai_api_key.is_some(),
        }
    }
}

fn load_dotenv_if_applicable() {
    if !should_load_dotenv() {
        debug!("skipping .env load outside dev mode");
        return;
    }

    if let Err(err) = dotenvy::dotenv() {
        match &err {
            dotenvy::Error::Io(io_err) if io_err.kind() == io::ErrorKind::NotFound => {}
            _ => debug!(?err, "unable to load .env file"),
        }
    }
}

fn should_load_dotenv() -> bool {
    cfg!(debug_assertions) || parse_bool("ALLOW_DOTENV", false)
}

fn secret_from_env(key: &str) -> Option<SecretString> {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(SecretString::from)
}

fn trimmed_base(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
        .trim_end_matches('/')
        .to_string()
}

fn parse_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .map(|v| matches!(v.trim(), "1" | "true" | "TRUE" | "True"))
        .unwrap_or(default)
}

fn parse_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

fn parse_usize(key: &str, default: usize) -> usize {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default)
}

fn parse_u32(key: &str, default: u32) -> u32 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(default)
}
