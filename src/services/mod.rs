//! HTTP service clients: geocoding and routing.

pub mod geocode;
pub mod http;
pub mod route;

pub use geocode::{Geocoder, NominatimGeocoder, Place};
pub use route::{OsrmRouter, Router, TravelMode};
