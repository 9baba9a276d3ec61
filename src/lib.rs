//! # Waymark
//!
//! An embeddable map view controller.
//!
//! Waymark keeps a map surface's tile layer, user marker, destination marker
//! and route overlay consistent with style switches, live location fixes and
//! destination changes, and persists the interesting bits of UI state
//! (active style, last view, last fix, destination) across sessions through
//! a pluggable key-value store.
//!
//! The map surface itself, the tile providers, the geocoder and the router
//! are collaborators: the surface sits behind [`MapSurface`], the services
//! behind [`Geocoder`] and [`Router`], with ready-made clients for
//! Nominatim-style search and OSRM-style routing.

pub mod controller;
pub mod geo;
pub mod services;
pub mod store;
pub mod styles;
pub mod surface;

// Re-export public API
pub use controller::{ControllerOptions, MapController, PositionFix, RouteSummary, ViewState};
pub use geo::{LatLng, TileCoord};
pub use services::{
    geocode::{Geocoder, NominatimGeocoder, Place},
    route::{OsrmRouter, Router, TravelMode},
};
pub use store::{FileStore, MemoryStore, StateStore};
pub use styles::{LabelTone, StyleCatalog, TileStyle};
pub use surface::{LayerHandle, MapSurface, MarkerAppearance, Notice};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, WaymarkError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum WaymarkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("style index {index} out of range for catalog of {len}")]
    InvalidStyleIndex { index: usize, len: usize },

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Error type alias for convenience
pub type Error = WaymarkError;
