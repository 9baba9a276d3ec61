//! The map surface collaborator.
//!
//! The controller never draws anything itself: it installs and removes
//! entities on a host-provided surface (a GL canvas, an egui widget, a
//! wrapped Leaflet map) and the surface owns rendering, tile fetching and
//! input. Inbound events travel the other way: the host forwards position
//! fixes, view settles and destination picks to the controller's methods.

use crate::{geo::LatLng, styles::{LabelTone, TileStyle}};

/// Opaque handle to an entity the surface has installed. Handles are only
/// meaningful to the surface that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerHandle(pub u64);

/// How a marker should be presented
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerAppearance {
    /// Optional display name rendered next to the marker
    pub label: Option<String>,
    /// Label tone matching the active basemap
    pub tone: LabelTone,
}

impl MarkerAppearance {
    pub fn unlabeled(tone: LabelTone) -> Self {
        Self { label: None, tone }
    }
}

/// Non-fatal, user-facing notices. The surface decides how to present them
/// (toast, alert, status line); the controller only reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// Search submitted with an empty query
    EmptyQuery,
    /// Geocoder returned no results for the query
    LocationNotFound,
    /// Geocoder or suggestion request failed
    SearchFailed,
    /// Router answered but found no route between the endpoints
    NoRouteFound,
    /// Routing request failed outright
    RoutingFailed,
    /// Position watch reported an error (permission denied, timeout)
    LocationError,
    /// Too many tile errors; reverted to the default style
    StyleFallback,
}

/// Host-implemented presentation surface.
///
/// Every mutating call is synchronous and infallible from the controller's
/// point of view: per-tile network failures and render hiccups are the
/// surface's problem (reported back through
/// [`note_tile_error`](crate::MapController::note_tile_error) if the host
/// wants the fallback policy).
pub trait MapSurface {
    /// Install a tile layer for `style`. The previous layer, if any, is
    /// removed separately by the controller.
    fn add_tile_layer(&mut self, style: &TileStyle) -> LayerHandle;

    fn add_marker(&mut self, position: LatLng, appearance: MarkerAppearance) -> LayerHandle;

    /// Relocate an existing marker in place, keeping its appearance.
    fn move_marker(&mut self, marker: LayerHandle, position: LatLng);

    fn add_polyline(&mut self, points: &[LatLng]) -> LayerHandle;

    /// Remove any previously installed entity. Unknown handles are ignored.
    fn remove_layer(&mut self, layer: LayerHandle);

    fn set_view(&mut self, center: LatLng, zoom: f64);

    fn pan_to(&mut self, center: LatLng);

    fn notify(&mut self, notice: Notice);
}
