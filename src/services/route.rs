//! Point-to-point routes from an OSRM-style routing service.

use super::http::HTTP_CLIENT;
use crate::{geo::LatLng, Result, WaymarkError};
use async_trait::async_trait;
use serde::Deserialize;

/// Routing profile selecting the service's mode segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TravelMode {
    #[default]
    Foot,
    Bike,
    Car,
}

impl TravelMode {
    pub fn profile(self) -> &'static str {
        match self {
            TravelMode::Foot => "foot",
            TravelMode::Bike => "bike",
            TravelMode::Car => "car",
        }
    }
}

/// Trait representing anything that can compute a path between two points.
#[async_trait]
pub trait Router: Send + Sync {
    /// Ordered path from `origin` to `destination`, or `None` when the
    /// service answered but found no route.
    async fn route(&self, origin: LatLng, destination: LatLng) -> Result<Option<Vec<LatLng>>>;
}

// OSRM wire format. Geometry is GeoJSON, so coordinates are lon-first and
// must be swapped for the internal lat-first representation.
#[derive(Debug, Deserialize)]
struct RouteResponse {
    #[serde(default)]
    routes: Vec<RouteEntry>,
}

#[derive(Debug, Deserialize)]
struct RouteEntry {
    geometry: RouteGeometry,
}

#[derive(Debug, Deserialize)]
struct RouteGeometry {
    coordinates: Vec<[f64; 2]>,
}

fn response_to_points(response: RouteResponse) -> Option<Vec<LatLng>> {
    let entry = response.routes.into_iter().next()?;
    let points: Vec<LatLng> = entry
        .geometry
        .coordinates
        .into_iter()
        .map(|[lon, lat]| LatLng::new(lat, lon))
        .collect();

    if points.len() < 2 {
        None
    } else {
        Some(points)
    }
}

/// Client for `GET {base}/route/{mode}/{lon},{lat};{lon},{lat}` endpoints
/// returning full-overview GeoJSON geometry.
pub struct OsrmRouter {
    base_url: String,
    mode: TravelMode,
}

impl OsrmRouter {
    pub const DEFAULT_BASE_URL: &'static str = "https://routing.openstreetmap.de";

    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            mode: TravelMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: TravelMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> TravelMode {
        self.mode
    }
}

impl Default for OsrmRouter {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BASE_URL)
    }
}

#[async_trait]
impl Router for OsrmRouter {
    async fn route(&self, origin: LatLng, destination: LatLng) -> Result<Option<Vec<LatLng>>> {
        let url = format!(
            "{}/route/{}/{},{};{},{}",
            self.base_url,
            self.mode.profile(),
            origin.lng,
            origin.lat,
            destination.lng,
            destination.lat
        );
        log::debug!(
            "route request {} ({:.5},{:.5}) -> ({:.5},{:.5})",
            self.mode.profile(),
            origin.lat,
            origin.lng,
            destination.lat,
            destination.lng
        );

        let resp = HTTP_CLIENT
            .get(&url)
            .query(&[("overview", "full"), ("geometries", "geojson")])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(WaymarkError::Upstream(format!(
                "router returned HTTP {}",
                resp.status()
            )));
        }

        let response: RouteResponse = resp.json().await?;
        Ok(response_to_points(response))
    }
}
