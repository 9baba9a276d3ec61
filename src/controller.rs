//! The map-state reconciliation controller.
//!
//! One controller instance owns everything the crate puts on a map surface:
//! the active tile layer, the user marker, the optional destination marker
//! and the optional route overlay. Every entry point takes `&mut self`, so
//! reconciliation is free of locking; the only suspension points are the
//! geocoding and routing requests, and overlapping route requests are
//! serialized by a sequence-number guard rather than by cancellation.

use crate::{
    geo::{path_distance_m, LatLng},
    services::{geocode::{Geocoder, Place}, route::Router},
    store::{self, keys, StateStore},
    styles::StyleCatalog,
    surface::{LayerHandle, MapSurface, MarkerAppearance, Notice},
    Result, WaymarkError,
};
use serde::{Deserialize, Serialize};

/// Map view persisted after every settle event and restored at startup
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub center: LatLng,
    pub zoom: f64,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            center: LatLng::new(20.0, 0.0),
            zoom: 2.0,
        }
    }
}

/// A live position fix as delivered by the surface's position watch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionFix {
    pub position: LatLng,
    pub accuracy_m: f64,
    pub timestamp_ms: u64,
}

/// Shape of the route currently on screen
#[derive(Debug, Clone, PartialEq)]
pub struct RouteSummary {
    pub points: usize,
    pub distance_m: f64,
}

/// Controller configuration
#[derive(Debug, Clone)]
pub struct ControllerOptions {
    /// Ordered tile style catalog; must not be empty
    pub catalog: StyleCatalog,
    /// Route origin used before the first position fix arrives
    pub default_origin: LatLng,
    /// Consecutive tile errors tolerated before reverting to style 0
    pub tile_error_threshold: u32,
    /// Minimum movement between fixes before a route recompute fires
    pub min_recompute_move_m: f64,
    /// Candidate count requested per suggestion lookup
    pub suggest_limit: usize,
    /// Display name shown on the user marker
    pub marker_label: Option<String>,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            catalog: StyleCatalog::default_catalog(None),
            default_origin: ViewState::default().center,
            tile_error_threshold: 8,
            min_recompute_move_m: 15.0,
            suggest_limit: 5,
            marker_label: None,
        }
    }
}

pub struct MapController {
    surface: Box<dyn MapSurface>,
    store: Box<dyn StateStore>,
    geocoder: Box<dyn Geocoder>,
    router: Box<dyn Router>,
    options: ControllerOptions,

    view: ViewState,
    style_index: usize,
    tile_layer: LayerHandle,
    tile_errors: u32,

    user_position: Option<LatLng>,
    user_marker: Option<LayerHandle>,

    destination: Option<LatLng>,
    destination_marker: Option<LayerHandle>,
    route_overlay: Option<LayerHandle>,
    route_summary: Option<RouteSummary>,
    last_routed_origin: Option<LatLng>,
    route_seq: u64,
}

impl MapController {
    /// Build the controller and restore persisted state onto the surface:
    /// view, active style, last known position, destination. Restoring
    /// installs exactly one tile layer and re-adds surviving markers; the
    /// route overlay is re-established by the first position fix or an
    /// explicit [`recompute_route`](Self::recompute_route).
    pub fn new(
        mut surface: Box<dyn MapSurface>,
        store: Box<dyn StateStore>,
        geocoder: Box<dyn Geocoder>,
        router: Box<dyn Router>,
        options: ControllerOptions,
    ) -> Result<Self> {
        let style = options
            .catalog
            .get(0)
            .ok_or(WaymarkError::InvalidStyleIndex { index: 0, len: 0 })?;

        let view: ViewState = store::get_as(store.as_ref(), keys::VIEW).unwrap_or_default();
        let style_index = options
            .catalog
            .clamp(store::get_as(store.as_ref(), keys::STYLE).unwrap_or(0));
        let user_position =
            store::get_as::<LatLng>(store.as_ref(), keys::POSITION).filter(LatLng::is_valid);
        let destination =
            store::get_as::<LatLng>(store.as_ref(), keys::DESTINATION).filter(LatLng::is_valid);

        let style = options.catalog.get(style_index).unwrap_or(style).clone();
        log::debug!(
            "restoring session: style {} ({}), view ({:.4}, {:.4}) z{}",
            style_index,
            style.name,
            view.center.lat,
            view.center.lng,
            view.zoom
        );

        surface.set_view(view.center, view.zoom);
        let tile_layer = surface.add_tile_layer(&style);

        let appearance = MarkerAppearance {
            label: options.marker_label.clone(),
            tone: style.label_tone,
        };
        let user_marker = user_position.map(|p| surface.add_marker(p, appearance));
        let destination_marker =
            destination.map(|p| surface.add_marker(p, MarkerAppearance::unlabeled(style.label_tone)));

        Ok(Self {
            surface,
            store,
            geocoder,
            router,
            options,
            view,
            style_index,
            tile_layer,
            tile_errors: 0,
            user_position,
            user_marker,
            destination,
            destination_marker,
            route_overlay: None,
            route_summary: None,
            last_routed_origin: None,
            route_seq: 0,
        })
    }

    // --- style switching ---

    /// Swap the active tile layer for catalog entry `index`, keeping the
    /// current view. Persists the choice and rebuilds the user marker with
    /// the new style's label tone. Out-of-range indices are rejected with
    /// no side effects.
    pub fn set_style(&mut self, index: usize) -> Result<()> {
        let style = self
            .options
            .catalog
            .get(index)
            .ok_or(WaymarkError::InvalidStyleIndex {
                index,
                len: self.options.catalog.len(),
            })?
            .clone();

        self.surface.remove_layer(self.tile_layer);
        self.tile_layer = self.surface.add_tile_layer(&style);
        self.style_index = index;
        self.tile_errors = 0;
        store::persist(self.store.as_mut(), keys::STYLE, &index);

        if let Some(marker) = self.user_marker.take() {
            self.surface.remove_layer(marker);
            if let Some(position) = self.user_position {
                let appearance = self.marker_appearance();
                self.user_marker = Some(self.surface.add_marker(position, appearance));
            }
        }
        Ok(())
    }

    /// Record a failed tile load on the active layer. Per-tile failures are
    /// independent and non-fatal; a run of them past the threshold reverts
    /// to the default style.
    pub fn note_tile_error(&mut self) {
        self.tile_errors += 1;
        if self.tile_errors < self.options.tile_error_threshold || self.style_index == 0 {
            return;
        }
        log::warn!(
            "{} consecutive tile errors on style {}, reverting to default",
            self.tile_errors,
            self.style_index
        );
        self.surface.notify(Notice::StyleFallback);
        if let Err(e) = self.set_style(0) {
            log::error!("fallback to default style failed: {}", e);
        }
    }

    /// Record a successful tile load, ending any error run.
    pub fn note_tile_loaded(&mut self) {
        self.tile_errors = 0;
    }

    // --- location tracking ---

    /// Consume one position fix: update and persist the current position,
    /// relocate (or create) the user marker, and recompute the route from
    /// the new origin when a destination is active. The recompute is
    /// fire-and-forget: its failure surfaces a notice but never disturbs
    /// position or marker state.
    pub async fn on_position_update(&mut self, fix: PositionFix) {
        if !fix.position.is_valid() {
            log::warn!("ignoring invalid position fix {:?}", fix.position);
            return;
        }
        log::debug!(
            "position fix ({:.6}, {:.6}) accuracy {:.0} m",
            fix.position.lat,
            fix.position.lng,
            fix.accuracy_m
        );

        self.user_position = Some(fix.position);
        store::persist(self.store.as_mut(), keys::POSITION, &fix.position);

        match self.user_marker {
            Some(marker) => self.surface.move_marker(marker, fix.position),
            None => {
                let appearance = self.marker_appearance();
                self.user_marker = Some(self.surface.add_marker(fix.position, appearance));
            }
        }

        if self.destination.is_some() && self.should_recompute_from(fix.position) {
            self.recompute_route().await;
        }
    }

    /// Position watch error: keep whatever position and marker already
    /// exist, tell the user, carry on. A later fix may still arrive.
    pub fn on_position_error(&mut self, message: &str) {
        log::warn!("position watch error: {}", message);
        self.surface.notify(Notice::LocationError);
    }

    fn should_recompute_from(&self, position: LatLng) -> bool {
        match self.last_routed_origin {
            Some(origin) => origin.distance_to(&position) >= self.options.min_recompute_move_m,
            None => true,
        }
    }

    // --- destination & route ---

    /// Make `position` the destination: replace any prior destination marker
    /// and overlay, persist, and compute a route from the current position
    /// (or the configured default origin when no fix exists yet).
    pub async fn set_destination(&mut self, position: LatLng) -> Result<()> {
        if !position.is_valid() {
            return Err(WaymarkError::InvalidCoordinates(format!(
                "destination ({}, {})",
                position.lat, position.lng
            )));
        }

        if let Some(marker) = self.destination_marker.take() {
            self.surface.remove_layer(marker);
        }
        self.clear_overlay();

        self.destination = Some(position);
        let appearance = MarkerAppearance::unlabeled(self.active_tone());
        self.destination_marker = Some(self.surface.add_marker(position, appearance));
        store::persist(self.store.as_mut(), keys::DESTINATION, &position);

        self.recompute_route().await;
        Ok(())
    }

    /// Remove destination marker, route overlay and the persisted
    /// destination. Idempotent, and discards any in-flight route request.
    pub fn clear_destination(&mut self) {
        if let Some(marker) = self.destination_marker.take() {
            self.surface.remove_layer(marker);
        }
        self.clear_overlay();
        self.destination = None;
        self.last_routed_origin = None;
        store::forget(self.store.as_mut(), keys::DESTINATION);
        // invalidate any request still in flight
        self.route_seq += 1;
    }

    /// Recompute the overlay for the current destination, if one is set.
    /// Failures surface as notices; the call itself never fails.
    pub async fn recompute_route(&mut self) {
        let Some(destination) = self.destination else {
            return;
        };
        let origin = self.user_position.unwrap_or(self.options.default_origin);
        if let Err(e) = self.compute_route(origin, destination).await {
            log::warn!("route computation rejected: {}", e);
        }
    }

    /// Compute and install a route between two explicit endpoints. Endpoint
    /// validation failures return an error without touching the surface;
    /// upstream failures clear the overlay and surface a notice. The result
    /// is `None` whenever no overlay was installed (no route, upstream
    /// failure, or a newer request superseded this one).
    pub async fn compute_route(
        &mut self,
        origin: LatLng,
        destination: LatLng,
    ) -> Result<Option<RouteSummary>> {
        if !origin.is_valid() || !destination.is_valid() {
            return Err(WaymarkError::InvalidCoordinates(format!(
                "route endpoints ({}, {}) -> ({}, {})",
                origin.lat, origin.lng, destination.lat, destination.lng
            )));
        }

        let seq = self.begin_route_request();
        self.last_routed_origin = Some(origin);
        let outcome = self.router.route(origin, destination).await;
        Ok(self.finish_route_request(seq, outcome))
    }

    fn begin_route_request(&mut self) -> u64 {
        self.route_seq += 1;
        self.route_seq
    }

    /// Apply a settled route request. Only the most recently initiated
    /// request may take effect; older completions are discarded no matter
    /// what order the responses arrive in. The previous overlay is always
    /// cleared before a new one is installed or a failure is reported, so a
    /// stale route is never left on screen.
    fn finish_route_request(
        &mut self,
        seq: u64,
        outcome: Result<Option<Vec<LatLng>>>,
    ) -> Option<RouteSummary> {
        if seq != self.route_seq {
            log::debug!(
                "discarding stale route response {} (latest is {})",
                seq,
                self.route_seq
            );
            return None;
        }

        self.clear_overlay();
        match outcome {
            Ok(Some(points)) => {
                let summary = RouteSummary {
                    points: points.len(),
                    distance_m: path_distance_m(&points),
                };
                log::debug!(
                    "route overlay installed: {} points, {:.0} m",
                    summary.points,
                    summary.distance_m
                );
                self.route_overlay = Some(self.surface.add_polyline(&points));
                self.route_summary = Some(summary.clone());
                Some(summary)
            }
            Ok(None) => {
                self.surface.notify(Notice::NoRouteFound);
                None
            }
            Err(e) => {
                log::warn!("routing request failed: {}", e);
                self.surface.notify(Notice::RoutingFailed);
                None
            }
        }
    }

    fn clear_overlay(&mut self) {
        if let Some(overlay) = self.route_overlay.take() {
            self.surface.remove_layer(overlay);
        }
        self.route_summary = None;
    }

    // --- search ---

    /// Geocode `query` and recenter on the best hit. Empty queries are
    /// rejected locally with a notice and no request; misses and upstream
    /// failures notify and leave destination state untouched.
    pub async fn search(&mut self, query: &str) -> Result<Option<Place>> {
        let query = query.trim();
        if query.is_empty() {
            self.surface.notify(Notice::EmptyQuery);
            return Ok(None);
        }

        match self.geocoder.search(query).await {
            Ok(Some(place)) => {
                self.surface.pan_to(place.position);
                self.view.center = place.position;
                store::persist(self.store.as_mut(), keys::VIEW, &self.view);
                Ok(Some(place))
            }
            Ok(None) => {
                self.surface.notify(Notice::LocationNotFound);
                Ok(None)
            }
            Err(e) => {
                log::warn!("search for {:?} failed: {}", query, e);
                self.surface.notify(Notice::SearchFailed);
                Err(e)
            }
        }
    }

    /// Search, then make the hit the active destination. This is the
    /// search-driven destination flow; picking straight off the map goes
    /// through [`set_destination`](Self::set_destination).
    pub async fn route_to(&mut self, query: &str) -> Result<Option<Place>> {
        let Some(place) = self.search(query).await? else {
            return Ok(None);
        };
        self.set_destination(place.position).await?;
        Ok(Some(place))
    }

    /// Autocomplete candidates for a partial query. Queries under two
    /// characters yield nothing without a request.
    pub async fn suggest(&mut self, query: &str) -> Result<Vec<Place>> {
        let query = query.trim();
        if query.chars().count() < 2 {
            return Ok(Vec::new());
        }

        match self.geocoder.suggest(query, self.options.suggest_limit).await {
            Ok(places) => Ok(places),
            Err(e) => {
                log::warn!("suggestion lookup for {:?} failed: {}", query, e);
                self.surface.notify(Notice::SearchFailed);
                Err(e)
            }
        }
    }

    // --- view ---

    /// Persist the settled view after a move or zoom so a reload restores it.
    pub fn on_view_changed(&mut self, center: LatLng, zoom: f64) {
        self.view = ViewState { center, zoom };
        store::persist(self.store.as_mut(), keys::VIEW, &self.view);
    }

    // --- accessors ---

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn style_index(&self) -> usize {
        self.style_index
    }

    pub fn user_position(&self) -> Option<LatLng> {
        self.user_position
    }

    pub fn destination(&self) -> Option<LatLng> {
        self.destination
    }

    pub fn has_route_overlay(&self) -> bool {
        self.route_overlay.is_some()
    }

    pub fn route_summary(&self) -> Option<&RouteSummary> {
        self.route_summary.as_ref()
    }

    fn active_tone(&self) -> crate::styles::LabelTone {
        self.options
            .catalog
            .get(self.style_index)
            .map(|s| s.label_tone)
            .unwrap_or(crate::styles::LabelTone::Dark)
    }

    fn marker_appearance(&self) -> MarkerAppearance {
        MarkerAppearance {
            label: self.options.marker_label.clone(),
            tone: self.active_tone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::styles::{LabelTone, TileStyle};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct SurfaceState {
        next_handle: u64,
        tiles: Vec<(LayerHandle, String)>,
        markers: Vec<(LayerHandle, LatLng, MarkerAppearance)>,
        polylines: Vec<(LayerHandle, Vec<LatLng>)>,
        notices: Vec<Notice>,
    }

    #[derive(Clone, Default)]
    struct SurfaceLog(Arc<Mutex<SurfaceState>>);

    impl SurfaceLog {
        fn lock(&self) -> std::sync::MutexGuard<'_, SurfaceState> {
            self.0.lock().unwrap()
        }

        fn notices(&self) -> Vec<Notice> {
            self.lock().notices.clone()
        }

        fn live_polylines(&self) -> Vec<Vec<LatLng>> {
            self.lock().polylines.iter().map(|(_, p)| p.clone()).collect()
        }

        fn live_tiles(&self) -> Vec<String> {
            self.lock().tiles.iter().map(|(_, n)| n.clone()).collect()
        }

        fn live_markers(&self) -> usize {
            self.lock().markers.len()
        }
    }

    struct FakeSurface(SurfaceLog);

    impl MapSurface for FakeSurface {
        fn add_tile_layer(&mut self, style: &TileStyle) -> LayerHandle {
            let mut s = self.0.lock();
            s.next_handle += 1;
            let handle = LayerHandle(s.next_handle);
            s.tiles.push((handle, style.name.clone()));
            handle
        }

        fn add_marker(&mut self, position: LatLng, appearance: MarkerAppearance) -> LayerHandle {
            let mut s = self.0.lock();
            s.next_handle += 1;
            let handle = LayerHandle(s.next_handle);
            s.markers.push((handle, position, appearance));
            handle
        }

        fn move_marker(&mut self, marker: LayerHandle, position: LatLng) {
            let mut s = self.0.lock();
            if let Some(entry) = s.markers.iter_mut().find(|(h, _, _)| *h == marker) {
                entry.1 = position;
            }
        }

        fn add_polyline(&mut self, points: &[LatLng]) -> LayerHandle {
            let mut s = self.0.lock();
            s.next_handle += 1;
            let handle = LayerHandle(s.next_handle);
            s.polylines.push((handle, points.to_vec()));
            handle
        }

        fn remove_layer(&mut self, layer: LayerHandle) {
            let mut s = self.0.lock();
            s.tiles.retain(|(h, _)| *h != layer);
            s.markers.retain(|(h, _, _)| *h != layer);
            s.polylines.retain(|(h, _)| *h != layer);
        }

        fn set_view(&mut self, _center: LatLng, _zoom: f64) {}

        fn pan_to(&mut self, _center: LatLng) {}

        fn notify(&mut self, notice: Notice) {
            self.0.lock().notices.push(notice);
        }
    }

    struct NullGeocoder;

    #[async_trait::async_trait]
    impl Geocoder for NullGeocoder {
        async fn search(&self, _query: &str) -> Result<Option<Place>> {
            Ok(None)
        }

        async fn suggest(&self, _query: &str, _limit: usize) -> Result<Vec<Place>> {
            Ok(Vec::new())
        }
    }

    struct ScriptedRouter {
        responses: Mutex<VecDeque<Result<Option<Vec<LatLng>>>>>,
    }

    impl ScriptedRouter {
        fn new(responses: Vec<Result<Option<Vec<LatLng>>>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
            }
        }
    }

    #[async_trait::async_trait]
    impl Router for ScriptedRouter {
        async fn route(&self, _origin: LatLng, _destination: LatLng) -> Result<Option<Vec<LatLng>>> {
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(None))
        }
    }

    fn test_catalog() -> StyleCatalog {
        StyleCatalog::new(vec![
            TileStyle::new("base", "https://{s}.example.org/{z}/{x}/{y}.png", "", LabelTone::Dark),
            TileStyle::new("night", "https://night.example.org/{z}/{x}/{y}.png", "", LabelTone::Light),
        ])
    }

    fn controller_with(
        log: &SurfaceLog,
        router: ScriptedRouter,
    ) -> MapController {
        MapController::new(
            Box::new(FakeSurface(log.clone())),
            Box::new(crate::store::MemoryStore::new()),
            Box::new(NullGeocoder),
            Box::new(router),
            ControllerOptions {
                catalog: test_catalog(),
                ..ControllerOptions::default()
            },
        )
        .expect("controller builds")
    }

    fn geom(points: &[(f64, f64)]) -> Vec<LatLng> {
        points.iter().map(|&(lat, lng)| LatLng::new(lat, lng)).collect()
    }

    #[test]
    fn empty_catalog_is_rejected() {
        let log = SurfaceLog::default();
        let result = MapController::new(
            Box::new(FakeSurface(log.clone())),
            Box::new(crate::store::MemoryStore::new()),
            Box::new(NullGeocoder),
            Box::new(ScriptedRouter::new(vec![])),
            ControllerOptions {
                catalog: StyleCatalog::new(vec![]),
                ..ControllerOptions::default()
            },
        );
        assert!(matches!(
            result.err(),
            Some(WaymarkError::InvalidStyleIndex { .. })
        ));
    }

    #[test]
    fn out_of_range_style_is_a_no_op() {
        let log = SurfaceLog::default();
        let mut controller = controller_with(&log, ScriptedRouter::new(vec![]));

        let err = controller.set_style(7).unwrap_err();
        assert!(matches!(err, WaymarkError::InvalidStyleIndex { index: 7, len: 2 }));
        assert_eq!(controller.style_index(), 0);
        assert_eq!(log.live_tiles(), vec!["base".to_string()]);
    }

    #[test]
    fn stale_route_completion_is_discarded() {
        let log = SurfaceLog::default();
        let mut controller = controller_with(&log, ScriptedRouter::new(vec![]));

        let older = geom(&[(48.0, 2.0), (48.1, 2.0)]);
        let newer = geom(&[(48.0, 2.0), (48.0, 2.2)]);

        // Two requests in flight; the newer one settles first, then the
        // older response straggles in.
        let seq1 = controller.begin_route_request();
        let seq2 = controller.begin_route_request();
        assert!(controller
            .finish_route_request(seq2, Ok(Some(newer.clone())))
            .is_some());
        assert!(controller
            .finish_route_request(seq1, Ok(Some(older)))
            .is_none());

        assert_eq!(log.live_polylines(), vec![newer]);
    }

    #[test]
    fn stale_failure_does_not_clear_newer_overlay() {
        let log = SurfaceLog::default();
        let mut controller = controller_with(&log, ScriptedRouter::new(vec![]));

        let seq1 = controller.begin_route_request();
        let seq2 = controller.begin_route_request();
        controller.finish_route_request(seq2, Ok(Some(geom(&[(48.0, 2.0), (48.1, 2.0)]))));
        controller.finish_route_request(seq1, Err(WaymarkError::Upstream("HTTP 502".into())));

        assert!(controller.has_route_overlay());
        assert_eq!(log.live_polylines().len(), 1);
        // the stale failure must not even notify
        assert!(log.notices().is_empty());
    }

    #[test]
    fn tile_error_threshold_reverts_to_default() {
        let log = SurfaceLog::default();
        let mut controller = controller_with(&log, ScriptedRouter::new(vec![]));
        controller.set_style(1).unwrap();

        for _ in 0..7 {
            controller.note_tile_error();
        }
        assert_eq!(controller.style_index(), 1);

        controller.note_tile_error();
        assert_eq!(controller.style_index(), 0);
        assert_eq!(log.live_tiles(), vec!["base".to_string()]);
        assert_eq!(log.notices(), vec![Notice::StyleFallback]);
    }

    #[test]
    fn tile_error_run_is_reset_by_success() {
        let log = SurfaceLog::default();
        let mut controller = controller_with(&log, ScriptedRouter::new(vec![]));
        controller.set_style(1).unwrap();

        for _ in 0..7 {
            controller.note_tile_error();
        }
        controller.note_tile_loaded();
        controller.note_tile_error();

        assert_eq!(controller.style_index(), 1);
    }

    #[tokio::test]
    async fn jittering_fixes_skip_route_recompute() {
        let log = SurfaceLog::default();
        let route = geom(&[(48.0, 2.0), (48.5, 2.0)]);
        // exactly two scripted responses: set_destination and the first fix.
        // A third request would hit the Ok(None) fallback and clear the
        // overlay, so the jittering fix below must not issue one.
        let mut controller = controller_with(
            &log,
            ScriptedRouter::new(vec![Ok(Some(route.clone())), Ok(Some(route.clone()))]),
        );

        let fix = |lat: f64| PositionFix {
            position: LatLng::new(lat, 2.0),
            accuracy_m: 5.0,
            timestamp_ms: 0,
        };

        controller.set_destination(LatLng::new(48.5, 2.0)).await.unwrap();
        controller.on_position_update(fix(48.0)).await;
        assert!(controller.has_route_overlay());
        assert!(log.notices().is_empty());

        // ~1 m north of the last routed origin: position and marker move,
        // but no recompute fires
        controller.on_position_update(fix(48.00001)).await;
        assert!(controller.has_route_overlay());
        assert!(log.notices().is_empty());
        assert_eq!(controller.user_position(), Some(LatLng::new(48.00001, 2.0)));
    }

    #[tokio::test]
    async fn clear_destination_is_idempotent() {
        let log = SurfaceLog::default();
        let mut controller = controller_with(
            &log,
            ScriptedRouter::new(vec![Ok(Some(geom(&[(48.0, 2.0), (48.5, 2.0)])))]),
        );

        controller.set_destination(LatLng::new(48.5, 2.0)).await.unwrap();
        assert!(controller.has_route_overlay());

        controller.clear_destination();
        controller.clear_destination();

        assert!(!controller.has_route_overlay());
        assert!(controller.destination().is_none());
        assert_eq!(log.live_polylines().len(), 0);
        assert_eq!(log.live_markers(), 0);
    }
}
