use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::errors::{AppError, AppResult};

const DETAIL_FIELDS: &str =
    "name,rating,review,user_ratings_total,formatted_address,opening_hours,price_level,website";
const PLACES_HTTP_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> AppResult<Self> {
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return Err(AppError::Config(format!(
                "coordinate out of range: {lat},{lng}"
            )));
        }
        Ok(Self { lat, lng })
    }

    pub fn parse(value: &str) -> AppResult<Self> {
        let mut parts = value.splitn(2, ',');
        let lat = parts.next().and_then(|p| p.trim().parse::<f64>().ok());
        let lng = parts.next().and_then(|p| p.trim().parse::<f64>().ok());
        match (lat, lng) {
            (Some(lat), Some(lng)) => Self::new(lat, lng),
            _ => Err(AppError::Config(format!(
                "expected \"lat,lng\", got: {value}"
            ))),
        }
    }

    pub fn as_query(&self) -> String {
        format!("{},{}", self.lat, self.lng)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub name: String,
    pub address: Option<String>,
    pub location: Option<LatLng>,
    pub place_id: Option<String>,
    pub types: Vec<String>,
    pub rating: Option<f64>,
    pub rating_count: Option<u32>,
    pub website: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailRecord {
    pub name: Option<String>,
    pub address: Option<String>,
    pub rating: Option<f64>,
    pub rating_count: Option<u32>,
    pub price_level: Option<u8>,
    pub opening_hours: Vec<String>,
    pub reviews: Vec<String>,
}

#[async_trait]
pub trait PlacesDirectory: Send + Sync {
    async fn search(
        &self,
        query: &str,
        location: LatLng,
        radius: Option<u32>,
    ) -> AppResult<Vec<Candidate>>;

    async fn details(&self, place_id: &str) -> AppResult<DetailRecord>;
}

#[derive(Clone)]
pub struct PlacesService {
    inner: Arc<dyn PlacesDirectory>,
}

impl PlacesService {
    pub fn new(config: &AppConfig) -> AppResult<Self> {
        let client = GooglePlacesClient::new(config)?;
        Ok(Self {
            inner: Arc::new(client),
        })
    }

    pub fn from_directory(directory: Arc<dyn PlacesDirectory>) -> Self {
        Self { inner: directory }
    }

    pub async fn search(
        &self,
        query: &str,
        location: LatLng,
        radius: Option<u32>,
    ) -> AppResult<Vec<Candidate>> {
        self.inner.search(query, location, radius).await
    }

    pub async fn details(&self, place_id: &str) -> AppResult<DetailRecord> {
        self.inner.details(place_id).await
    }
}

pub struct GooglePlacesClient {
    http: Client,
    api_base: String,
    api_key: SecretString,
}

impl GooglePlacesClient {
    pub fn new(config: &AppConfig) -> AppResult<Self> {
        let api_key = config
            .google_maps_api_key
            .clone()
            .ok_or_else(|| AppError::Config("GOOGLE_MAPS_API_KEY is not set".into()))?;
        let http = Client::builder()
            .user_agent(concat!("smart-meal-finder/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(PLACES_HTTP_TIMEOUT_SECS))
            .build()
            .map_err(AppError::upstream)?;
        Ok(Self {
            http,
            api_base: config.places_api_base.clone(),
            api_key,
        })
    }
}

#[async_trait]
impl PlacesDirectory for GooglePlacesClient {
    async fn search(
        &self,
        query: &str,
        location: LatLng,
        radius: Option<u32>,
    ) -> AppResult<Vec<Candidate>> {
        #[derive(Deserialize)]
        struct Response {
            status: String,
            #[serde(default)]
            results: Vec<ResponsePlace>,
            error_message: Option<String>,
        }

        #[derive(Deserialize)]
        struct ResponsePlace {
            name: Option<String>,
            formatted_address: Option<String>,
            geometry: Option<ResponseGeometry>,
            place_id: Option<String>,
            #[serde(default)]
            types: Vec<String>,
            rating: Option<f64>,
            user_ratings_total: Option<u32>,
            website: Option<String>,
            url: Option<String>,
        }

        #[derive(Deserialize)]
        struct ResponseGeometry {
            location: Option<ResponseLocation>,
        }

        #[derive(Deserialize)]
        struct ResponseLocation {
            lat: Option<f64>,
            lng: Option<f64>,
        }

        let url = format!("{}/textsearch/json", self.api_base);
        let mut params = vec![
            ("query", query.to_string()),
            ("location", location.as_query()),
            ("key", self.api_key.expose_secret().to_string()),
        ];
        if let Some(radius) = radius {
            params.push(("radius", radius.to_string()));
        }

        let response = self
            .http
            .get(url)
            .query(&params)
            .send()
            .await
            .map_err(AppError::upstream)?
            .error_for_status()
            .map_err(AppError::upstream)?;

        let parsed: Response = response.json().await.map_err(AppError::upstream)?;
        match parsed.status.as_str() {
            "OK" | "ZERO_RESULTS" => {}
            other => {
                return Err(AppError::Upstream(format!(
                    "text search rejected ({other}): {}",
                    parsed.error_message.unwrap_or_default()
                )))
            }
        }

        Ok(parsed
            .results
            .into_iter()
            .map(|place| Candidate {
                name: place.name.unwrap_or_default(),
                address: place.formatted_address,
                location: place.geometry.and_then(|g| g.location).and_then(|l| {
                    match (l.lat, l.lng) {
                        (Some(lat), Some(lng)) => Some(LatLng { lat, lng }),
                        _ => None,
                    }
                }),
                place_id: place.place_id,
                types: place.types,
                rating: place.rating,
                rating_count: place.user_ratings_total,
                website: place.website.or(place.url),
            })
            .collect())
    }

    async fn details(&self, place_id: &str) -> AppResult<DetailRecord> {
        #[derive(Deserialize)]
        struct Response {
            status: String,
            result: Option<ResponseDetail>,
            error_message: Option<String>,
        }

        #[derive(Deserialize)]
        struct ResponseDetail {
            name: Option<String>,
            formatted_address: Option<String>,
            rating: Option<f64>,
            user_ratings_total: Option<u32>,
            price_level: Option<u8>,
            opening_hours: Option<ResponseHours>,
            #[serde(default)]
            reviews: Vec<ResponseReview>,
        }

        #[derive(Deserialize)]
        struct ResponseHours {
            #[serde(default)]
            weekday_text: Vec<String>,
        }

        #[derive(Deserialize)]
        struct ResponseReview {
            text: Option<String>,
        }

        let url = format!("{}/details/json", self.api_base);
        let response = self
            .http
            .get(url)
            .query(&[
                ("place_id", place_id),
                ("fields", DETAIL_FIELDS),
                ("key", self.api_key.expose_secret()),
            ])
            .send()
            .await
            .map_err(AppError::upstream)?
            .error_for_status()
            .map_err(AppError::upstream)?;

        let parsed: Response = response.json().await.map_err(AppError::upstream)?;
        if parsed.status != "OK" {
            return Err(AppError::Upstream(format!(
                "details rejected ({}): {}",
                parsed.status,
                parsed.error_message.unwrap_or_default()
            )));
        }

        let detail = parsed
            .result
            .ok_or_else(|| AppError::Upstream("details response missing result".into()))?;

        Ok(DetailRecord {
            name: detail.name,
            address: detail.formatted_address,
            rating: detail.rating,
            rating_count: detail.user_ratings_total,
            price_level: detail.price_level,
            opening_hours: detail
                .opening_hours
                .map(|h| h.weekday_text)
                .unwrap_or_default(),
            reviews: detail
                .reviews
                .into_iter()
                .filter_map(|r| r.text)
                .collect(),
        })
    }
}
