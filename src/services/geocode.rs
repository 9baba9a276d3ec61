//! Free-text place search against a Nominatim-style geocoder.

use super::http::HTTP_CLIENT;
use crate::{geo::LatLng, Result, WaymarkError};
use async_trait::async_trait;
use serde::Deserialize;

/// A named place returned by the geocoder
#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    pub label: String,
    pub position: LatLng,
}

/// Trait representing anything that can turn free text into coordinates.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Single best match for `query`, if any.
    async fn search(&self, query: &str) -> Result<Option<Place>>;

    /// Up to `limit` ranked candidates for autocomplete.
    async fn suggest(&self, query: &str, limit: usize) -> Result<Vec<Place>>;
}

/// Nominatim wire format: coordinates arrive as decimal strings
#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
    display_name: String,
}

fn hit_to_place(hit: SearchHit) -> Result<Place> {
    let lat: f64 = hit.lat.parse().map_err(|_| {
        WaymarkError::Upstream(format!("geocoder returned malformed latitude {:?}", hit.lat))
    })?;
    let lon: f64 = hit.lon.parse().map_err(|_| {
        WaymarkError::Upstream(format!("geocoder returned malformed longitude {:?}", hit.lon))
    })?;

    let position = LatLng::new(lat, lon);
    if !position.is_valid() {
        return Err(WaymarkError::InvalidCoordinates(format!(
            "geocoder hit out of range: ({}, {})",
            lat, lon
        )));
    }

    Ok(Place {
        label: hit.display_name,
        position,
    })
}

/// Client for any `GET /search?q=..&format=json&limit=..` endpoint speaking
/// the Nominatim response shape.
pub struct NominatimGeocoder {
    base_url: String,
}

impl NominatimGeocoder {
    pub const DEFAULT_BASE_URL: &'static str = "https://nominatim.openstreetmap.org";

    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    async fn request(&self, query: &str, limit: usize) -> Result<Vec<Place>> {
        let url = format!("{}/search", self.base_url);
        log::debug!("geocode query {:?} (limit {})", query, limit);

        let resp = HTTP_CLIENT
            .get(&url)
            .query(&[("q", query), ("format", "json"), ("limit", &limit.to_string())])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(WaymarkError::Upstream(format!(
                "geocoder returned HTTP {}",
                resp.status()
            )));
        }

        let hits: Vec<SearchHit> = resp.json().await?;
        log::debug!("geocode query {:?} produced {} hits", query, hits.len());
        hits.into_iter().map(hit_to_place).collect()
    }
}

impl Default for NominatimGeocoder {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BASE_URL)
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn search(&self, query: &str) -> Result<Option<Place>> {
        let mut places = self.request(query, 1).await?;
        Ok(if places.is_empty() {
            None
        } else {
            Some(places.remove(0))
        })
    }

    async fn suggest(&self, query: &str, limit: usize) -> Result<Vec<Place>> {
        self.request(query, limit).await
    }
}
