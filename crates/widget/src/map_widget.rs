use catalog::{Location, LocationStore, Upserted};
use foundation::geo::FlyTo;
use foundation::ids::LocationId;
use foundation::viewport::ContainerSize;
use geocode::{GeocodeError, Geocoder};
use runtime::event_bus::{Event, EventBus, WidgetEvent};
use runtime::metrics::{self, Metrics};
use runtime::pass::RenderPass;
use surface::style::find_style;
use surface::{MapSurfaceHandle, SurfaceFactory, SurfaceOptions};
use tracing::{debug, info};

use crate::config::WidgetConfig;
use crate::error::WidgetError;
use crate::reconciler::{MarkerReconciler, ReconcileReport};
use crate::search::{SearchOutcome, SearchResolver, SearchTicket};
use crate::selection::SelectionController;
use crate::style_switch::{StyleSwitchCoordinator, SwitchCompleted, SwitchRequest};
use crate::theme::ThemeSink;

/// The map widget: one surface, one store, and the controllers that keep
/// them in step.
///
/// Hosts forward renderer events (`on_surface_loaded`, `on_style_loaded`,
/// clicks, hovers, resizes) and call [`MapWidget::render_pass`] once per
/// frame. Everything runs on one thread.
pub struct MapWidget {
    config: WidgetConfig,
    handle: MapSurfaceHandle,
    store: LocationStore,
    reconciler: MarkerReconciler,
    switcher: StyleSwitchCoordinator,
    search: SearchResolver,
    selection: SelectionController,
    sink: Box<dyn ThemeSink>,
    /// Searched location to fly to once it has a marker.
    pending_focus: Option<LocationId>,
    pass: RenderPass,
    bus: EventBus,
    metrics: Metrics,
}

impl std::fmt::Debug for MapWidget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapWidget")
            .field("handle", &self.handle)
            .field("locations", &self.store.len())
            .field("reconciler", &self.reconciler)
            .field("switcher", &self.switcher)
            .field("selection", &self.selection)
            .field("pending_focus", &self.pending_focus)
            .field("pass", &self.pass)
            .finish()
    }
}

impl MapWidget {
    /// Constructs the surface. Fails with [`WidgetError::SurfaceInit`] when
    /// the renderer cannot start; there is no retry.
    pub fn create(
        config: WidgetConfig,
        factory: &mut dyn SurfaceFactory,
        store: LocationStore,
        sink: Box<dyn ThemeSink>,
    ) -> Result<Self, WidgetError> {
        config.validate()?;
        let style = config.resolve_default_style()?;
        let handle = MapSurfaceHandle::create(
            factory,
            &SurfaceOptions {
                container: config.container.clone(),
                style_url: style.url.to_string(),
                camera: config.initial_camera(),
            },
        )?;
        info!(style = style.name, locations = store.len(), "map widget created");
        Ok(Self {
            reconciler: MarkerReconciler::new(style.theme),
            switcher: StyleSwitchCoordinator::new(style, config.style_load_timeout_passes),
            search: SearchResolver::new(),
            selection: SelectionController::new(config.focus_zoom, config.click_flight_ms),
            config,
            handle,
            store,
            sink,
            pending_focus: None,
            pass: RenderPass::default(),
            bus: EventBus::new(),
            metrics: Metrics::new(),
        })
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    pub fn handle(&self) -> &MapSurfaceHandle {
        &self.handle
    }

    pub fn store(&self) -> &LocationStore {
        &self.store
    }

    pub fn reconciler(&self) -> &MarkerReconciler {
        &self.reconciler
    }

    pub fn switcher(&self) -> &StyleSwitchCoordinator {
        &self.switcher
    }

    pub fn selection(&self) -> &SelectionController {
        &self.selection
    }

    pub fn active_location(&self) -> Option<&Location> {
        self.selection.active_location(&self.store)
    }

    pub fn pending_focus(&self) -> Option<&LocationId> {
        self.pending_focus.as_ref()
    }

    pub fn pass(&self) -> RenderPass {
        self.pass
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn events(&self) -> &[Event] {
        self.bus.events()
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        self.bus.drain()
    }

    /// The renderer's "loaded" event. Places the initial markers.
    pub fn on_surface_loaded(&mut self) -> ReconcileReport {
        if !self.handle.on_loaded() {
            return ReconcileReport {
                skipped: true,
                ..ReconcileReport::default()
            };
        }
        self.bus.emit(self.pass, WidgetEvent::SurfaceLoaded);
        self.reconcile()
    }

    pub fn on_container_resized(&mut self, size: ContainerSize) -> bool {
        self.handle.on_container_resized(size)
    }

    /// One render pass: sync markers with the store, then apply a pending
    /// search focus if its marker now exists.
    pub fn render_pass(&mut self) -> ReconcileReport {
        self.pass = self.pass.next();
        self.reconcile()
    }

    fn reconcile(&mut self) -> ReconcileReport {
        let report = self.reconciler.reconcile(&mut self.handle, &self.store);
        if !report.skipped {
            self.metrics
                .inc_counter(metrics::DECORATIONS_CREATED, report.created as u64);
            self.metrics
                .inc_counter(metrics::DECORATIONS_REMOVED, report.removed as u64);
            self.metrics
                .inc_counter(metrics::DECORATIONS_MOVED, report.updated as u64);
            self.metrics
                .set_gauge(metrics::GAUGE_RENDERED, self.reconciler.len() as i64);
            if !report.is_noop() {
                self.bus.emit(
                    self.pass,
                    WidgetEvent::Reconciled {
                        created: report.created,
                        updated: report.updated,
                        removed: report.removed,
                    },
                );
            }
        }
        self.apply_pending_focus();
        report
    }

    fn apply_pending_focus(&mut self) {
        let Some(id) = self.pending_focus.clone() else {
            return;
        };
        // Markers recorded before a style change belong to the old style;
        // wait for a ready pass to render the id.
        if !self.handle.is_ready() || !self.reconciler.is_rendered(&id) {
            return;
        }
        self.pending_focus = None;
        let Some(location) = self.store.get(&id).cloned() else {
            return;
        };
        let before = self.selection.active().cloned();
        self.selection
            .focus(&mut self.handle, &location, self.config.search_flight_ms);
        self.metrics.inc_counter(metrics::CAMERA_FLIGHTS, 1);
        self.bus
            .emit(self.pass, WidgetEvent::FocusApplied { id: id.clone() });
        self.emit_selection_if_changed(before);
    }

    /// A click on a marker. Ids without a marker are not clickable, and
    /// nothing is clickable while a style is loading.
    pub fn on_decoration_click(&mut self, id: &LocationId) -> Option<FlyTo> {
        if !self.handle.is_ready() || !self.reconciler.is_rendered(id) {
            debug!(id = %id, "click on unrendered marker ignored");
            return None;
        }
        self.click(id)
    }

    /// A click on a location badge in the list panel.
    pub fn select_from_list(&mut self, id: &LocationId) -> Option<FlyTo> {
        self.click(id)
    }

    fn click(&mut self, id: &LocationId) -> Option<FlyTo> {
        let location = self.store.get(id)?.clone();
        let before = self.selection.active().cloned();
        let flight = self.selection.on_marker_click(&mut self.handle, &location);
        self.metrics.inc_counter(metrics::CAMERA_FLIGHTS, 1);
        self.emit_selection_if_changed(before);
        Some(flight)
    }

    pub fn on_decoration_hover(&mut self, id: &LocationId, hovered: bool) -> bool {
        self.reconciler.set_hovered(id, hovered)
    }

    /// Returns the new collapsed flag.
    pub fn on_panel_toggle(&mut self) -> bool {
        self.selection.on_panel_toggle()
    }

    pub fn set_filter(&mut self, query: &str) {
        self.selection.set_filter(query);
    }

    pub fn filtered(&self) -> Vec<&Location> {
        self.selection.filtered(&self.store)
    }

    /// Switches to the named style (see [`surface::MAP_STYLES`]).
    pub fn request_style(&mut self, name: &str) -> Result<SwitchRequest, WidgetError> {
        let style = find_style(name).ok_or_else(|| WidgetError::UnknownStyle(name.to_string()))?;
        let request = self
            .switcher
            .request_switch(&mut self.handle, style, self.pass)?;
        match &request {
            SwitchRequest::Started(_) => self.bus.emit(
                self.pass,
                WidgetEvent::StyleSwitchStarted {
                    style: style.name.to_string(),
                },
            ),
            SwitchRequest::Queued { .. } => self.bus.emit(
                self.pass,
                WidgetEvent::StyleSwitchQueued {
                    style: style.name.to_string(),
                },
            ),
            SwitchRequest::AlreadyActive => {}
        }
        Ok(request)
    }

    /// The renderer's "style-loaded" event.
    pub fn on_style_loaded(&mut self) -> Option<SwitchCompleted> {
        let completed = self.switcher.on_style_loaded(
            &mut self.handle,
            &mut self.reconciler,
            &self.store,
            self.sink.as_mut(),
            self.pass,
        )?;
        self.metrics.inc_counter(metrics::STYLE_SWITCHES, 1);
        self.metrics
            .inc_counter(metrics::DECORATIONS_CREATED, completed.rebuilt as u64);
        self.metrics
            .set_gauge(metrics::GAUGE_RENDERED, self.reconciler.len() as i64);
        self.bus.emit(
            self.pass,
            WidgetEvent::Rebuilt {
                created: completed.rebuilt,
            },
        );
        self.bus.emit(
            self.pass,
            WidgetEvent::StyleSwitchCompleted {
                style: completed.style.name.to_string(),
            },
        );
        if let Some(next) = completed.next {
            self.bus.emit(
                self.pass,
                WidgetEvent::StyleSwitchStarted {
                    style: next.name.to_string(),
                },
            );
        }
        self.apply_pending_focus();
        Some(completed)
    }

    /// Errors with [`WidgetError::StyleLoadTimeout`] when a configured
    /// timeout has elapsed. The switch keeps waiting.
    pub fn poll_style_timeout(&self) -> Result<(), WidgetError> {
        self.switcher.check_timeout(self.pass)
    }

    /// Issues a search for `text`; `None` when it trims to empty. Pair with
    /// [`MapWidget::finish_search`] once the geocoder answers.
    pub fn begin_search(&mut self, text: &str) -> Option<SearchTicket> {
        self.search.begin(text)
    }

    /// Applies a geocoder answer. Only the latest ticket can touch the store;
    /// failures leave store and selection as they were.
    pub fn finish_search(
        &mut self,
        ticket: SearchTicket,
        response: Result<Option<Location>, GeocodeError>,
    ) -> SearchOutcome {
        let outcome = self.search.settle(&ticket, response);
        match &outcome {
            SearchOutcome::Resolved(location) => {
                let id = location.id.clone();
                self.upsert_location(location.clone());
                self.pending_focus = Some(id.clone());
                info!(seq = ticket.seq, id = %id, "search resolved");
                self.bus.emit(
                    self.pass,
                    WidgetEvent::SearchResolved {
                        seq: ticket.seq,
                        id,
                    },
                );
            }
            SearchOutcome::NoMatch => {}
            SearchOutcome::Stale { seq, .. } => {
                self.metrics.inc_counter(metrics::SEARCH_STALE, 1);
                self.bus
                    .emit(self.pass, WidgetEvent::SearchDiscarded { seq: *seq });
            }
            SearchOutcome::Failed(e) => {
                self.metrics.inc_counter(metrics::SEARCH_FAILED, 1);
                self.bus.emit(
                    self.pass,
                    WidgetEvent::SearchFailed {
                        seq: ticket.seq,
                        message: e.to_string(),
                    },
                );
            }
        }
        outcome
    }

    /// Looks `text` up and applies the answer. `None` for blank input.
    pub async fn search(
        &mut self,
        geocoder: &dyn Geocoder,
        text: &str,
    ) -> Option<SearchOutcome> {
        let ticket = self.begin_search(text)?;
        let response = geocoder.lookup(&ticket.query).await;
        Some(self.finish_search(ticket, response))
    }

    pub fn upsert_location(&mut self, location: Location) -> Upserted {
        self.mutate_store(|store| store.upsert(location))
    }

    pub fn remove_location(&mut self, id: &LocationId) -> Option<Location> {
        self.mutate_store(|store| store.remove(id))
    }

    // Every store write goes through here so the selection never dangles.
    fn mutate_store<R>(&mut self, f: impl FnOnce(&mut LocationStore) -> R) -> R {
        let result = f(&mut self.store);
        if self.selection.validate(&self.store) {
            self.bus
                .emit(self.pass, WidgetEvent::SelectionChanged { id: None });
        }
        if self
            .pending_focus
            .as_ref()
            .is_some_and(|id| !self.store.contains(id))
        {
            self.pending_focus = None;
        }
        result
    }

    fn emit_selection_if_changed(&mut self, before: Option<LocationId>) {
        let after = self.selection.active().cloned();
        if after != before {
            self.bus
                .emit(self.pass, WidgetEvent::SelectionChanged { id: after });
        }
    }

    /// Removes every marker, releases the surface and detaches the resize
    /// observation. Safe to call more than once.
    pub fn destroy(&mut self) {
        if self.handle.is_destroyed() {
            return;
        }
        self.reconciler.clear();
        self.switcher.reset();
        self.handle.destroy();
        self.pending_focus = None;
        self.bus.emit(self.pass, WidgetEvent::Destroyed);
        info!("map widget destroyed");
    }
}

impl Drop for MapWidget {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::MapWidget;
    use crate::config::WidgetConfig;
    use crate::error::WidgetError;
    use crate::search::SearchOutcome;
    use crate::style_switch::SwitchRequest;
    use crate::theme::{PreferenceThemeSink, RecordingThemeSink};
    use catalog::{InMemoryKeyValueStore, KeyValueStore, Location, LocationStore, THEME_KEY, default_locations};
    use foundation::geo::{CameraState, LngLat};
    use foundation::ids::LocationId;
    use foundation::viewport::ContainerSize;
    use geocode::{Feature, FixtureGeocoder, GeocodeError, GeocodeResponse};
    use pretty_assertions::assert_eq;
    use runtime::metrics;
    use surface::headless::{HeadlessFactory, HeadlessProbe, SurfaceOp};

    fn widget_with_store(store: LocationStore) -> (MapWidget, HeadlessProbe) {
        let mut factory = HeadlessFactory::new();
        let probe = factory.probe();
        let widget = MapWidget::create(
            WidgetConfig::default(),
            &mut factory,
            store,
            Box::new(RecordingThemeSink::default()),
        )
        .unwrap();
        (widget, probe)
    }

    fn loaded_widget() -> (MapWidget, HeadlessProbe) {
        let (mut widget, probe) =
            widget_with_store(LocationStore::seeded(default_locations()).unwrap());
        widget.on_surface_loaded();
        (widget, probe)
    }

    fn sorted_store_ids(widget: &MapWidget) -> Vec<LocationId> {
        let mut ids: Vec<_> = widget.store().ids().cloned().collect();
        ids.sort();
        ids
    }

    fn pune() -> Location {
        Location::new("place.pune", "Pune", 18.5204, 73.8567, "Pune, Maharashtra, India").unwrap()
    }

    fn id(raw: &str) -> LocationId {
        LocationId::from(raw)
    }

    #[test]
    fn surface_init_failure_is_fatal() {
        let mut factory = HeadlessFactory::failing("webgl unavailable");
        let err = MapWidget::create(
            WidgetConfig::default(),
            &mut factory,
            LocationStore::new(),
            Box::new(RecordingThemeSink::default()),
        )
        .unwrap_err();
        assert_eq!(err, WidgetError::SurfaceInit("webgl unavailable".to_string()));
    }

    #[test]
    fn nothing_renders_before_loaded() {
        let (mut widget, probe) =
            widget_with_store(LocationStore::seeded(default_locations()).unwrap());
        assert!(widget.render_pass().skipped);
        assert!(probe.markers().is_empty());

        let report = widget.on_surface_loaded();
        assert_eq!(report.created, 6);
        assert_eq!(widget.events()[0].event.kind(), "surface_loaded");
    }

    #[test]
    fn seed_remove_reconcile_end_to_end() {
        let (mut widget, probe) = loaded_widget();
        assert_eq!(probe.live_ids().len(), 6);

        let hyderabad = id("hyderabad");
        assert!(widget.remove_location(&hyderabad).is_some());
        let report = widget.render_pass();
        assert_eq!(report.removed, 1);
        assert_eq!(probe.live_ids().len(), 5);
        assert!(!probe.live_ids().contains(&hyderabad));
        assert_eq!(widget.on_decoration_click(&hyderabad), None);
        assert_eq!(widget.selection().active(), None);
    }

    #[test]
    fn rendered_set_tracks_random_mutations() {
        let (mut widget, probe) = loaded_widget();
        let pool = [
            "delhi", "mumbai", "goa", "jaipur", "pune", "kochi", "agra", "surat",
        ];
        // Small LCG so the sequence is reproducible.
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        let mut next = move || {
            seed = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
            seed >> 33
        };

        for _ in 0..200 {
            let pick = pool[(next() % pool.len() as u64) as usize];
            match next() % 3 {
                0 => {
                    widget.remove_location(&id(pick));
                }
                _ => {
                    let lat = (next() % 170) as f64 - 85.0;
                    let lng = (next() % 350) as f64 - 175.0;
                    widget.upsert_location(Location::new(pick, pick, lat, lng, "").unwrap());
                }
            }
            if next() % 2 == 0 {
                widget.render_pass();
                assert_eq!(widget.reconciler().rendered_ids(), sorted_store_ids(&widget));
                assert_eq!(probe.live_ids(), sorted_store_ids(&widget));
                for l in widget.store().iter() {
                    assert_eq!(probe.marker(&l.id).unwrap().position, l.position());
                }
            }
        }
        widget.render_pass();
        assert_eq!(probe.live_ids(), sorted_store_ids(&widget));
    }

    #[test]
    fn unchanged_store_reconciles_to_nothing() {
        let (mut widget, probe) = loaded_widget();
        widget.render_pass();
        let journal = probe.journal().len();
        let report = widget.render_pass();
        assert!(report.is_noop());
        assert_eq!(probe.journal().len(), journal);
    }

    #[test]
    fn camera_round_trips_through_style_switch() {
        let (mut widget, probe) = loaded_widget();
        let before = CameraState::new(LngLat::new(77.209, 28.6139), 4.0);
        assert_eq!(probe.camera(), Some(before));

        widget.request_style("Dark").unwrap();
        assert!(widget.render_pass().skipped);
        widget.on_style_loaded().unwrap();

        assert!(widget.handle().camera().unwrap().approx_eq(&before, 1e-9));
        assert_eq!(probe.live_ids().len(), 6);
        assert_eq!(probe.stale_count(), 0);
        assert_eq!(widget.metrics().counter(metrics::STYLE_SWITCHES), 1);
    }

    #[test]
    fn panned_camera_is_what_gets_restored() {
        let (mut widget, probe) = loaded_widget();
        let panned = CameraState::new(LngLat::new(72.8777, 19.076), 9.5);
        probe.pan_to(panned);

        widget.request_style("Satellite Streets").unwrap();
        widget.on_style_loaded().unwrap();
        assert!(widget.handle().camera().unwrap().approx_eq(&panned, 1e-9));
    }

    #[test]
    fn unknown_style_is_rejected() {
        let (mut widget, _) = loaded_widget();
        assert_eq!(
            widget.request_style("Watercolor"),
            Err(WidgetError::UnknownStyle("Watercolor".to_string()))
        );
    }

    #[test]
    fn theme_key_written_on_every_completed_switch() {
        let prefs = Rc::new(RefCell::new(InMemoryKeyValueStore::new()));
        let mut factory = HeadlessFactory::new();
        let mut widget = MapWidget::create(
            WidgetConfig::default(),
            &mut factory,
            LocationStore::seeded(default_locations()).unwrap(),
            Box::new(PreferenceThemeSink::new(prefs.clone())),
        )
        .unwrap();
        widget.on_surface_loaded();

        widget.request_style("Navigation Night").unwrap();
        widget.on_style_loaded();
        assert_eq!(prefs.borrow().get(THEME_KEY).unwrap().as_deref(), Some("dark"));

        widget.request_style("Outdoors").unwrap();
        widget.on_style_loaded();
        assert_eq!(prefs.borrow().get(THEME_KEY).unwrap().as_deref(), Some("light"));

        widget.request_style("Light").unwrap();
        widget.on_style_loaded();
        assert_eq!(prefs.borrow().writes(), 3);
    }

    #[test]
    fn queued_switches_coalesce() {
        let (mut widget, probe) = loaded_widget();
        widget.request_style("Dark").unwrap();
        assert!(matches!(
            widget.request_style("Outdoors").unwrap(),
            SwitchRequest::Queued { .. }
        ));
        widget.request_style("Navigation Day").unwrap();

        let first = widget.on_style_loaded().unwrap();
        assert_eq!(first.next.map(|s| s.name), Some("Navigation Day"));
        let second = widget.on_style_loaded().unwrap();
        assert_eq!(second.style.name, "Navigation Day");
        assert_eq!(
            probe.count_ops(|op| matches!(op, SurfaceOp::SetStyle(_))),
            2
        );
        assert_eq!(probe.live_ids().len(), 6);
        assert!(probe.markers().iter().all(|m| m.fill == "#ef4444"));
    }

    #[test]
    fn style_timeout_is_reported_when_configured() {
        let mut factory = HeadlessFactory::new();
        let config = WidgetConfig {
            style_load_timeout_passes: Some(2),
            ..WidgetConfig::default()
        };
        let mut widget = MapWidget::create(
            config,
            &mut factory,
            LocationStore::new(),
            Box::new(RecordingThemeSink::default()),
        )
        .unwrap();
        widget.on_surface_loaded();
        widget.request_style("Dark").unwrap();
        widget.render_pass();
        widget.render_pass();
        assert!(widget.poll_style_timeout().is_ok());
        widget.render_pass();
        assert!(matches!(
            widget.poll_style_timeout(),
            Err(WidgetError::StyleLoadTimeout { waited_passes: 3, .. })
        ));
        assert!(widget.on_style_loaded().is_some());
    }

    #[test]
    fn click_selects_and_flies() {
        let (mut widget, probe) = loaded_widget();
        let flight = widget.on_decoration_click(&id("jaipur")).unwrap();
        assert_eq!(flight.center, LngLat::new(75.7873, 26.9124));
        assert_eq!((flight.zoom, flight.duration_ms), (12.0, 1000));
        assert_eq!(probe.last_flight(), Some(flight));
        assert_eq!(widget.active_location().map(|l| l.display_name.as_str()), Some("Jaipur"));
        assert_eq!(widget.metrics().counter(metrics::CAMERA_FLIGHTS), 1);
    }

    #[test]
    fn list_click_matches_marker_click() {
        let (mut widget, _) = loaded_widget();
        widget.on_panel_toggle();
        let flight = widget.select_from_list(&id("goa")).unwrap();
        assert_eq!(flight.duration_ms, 1000);
        assert!(!widget.selection().is_panel_collapsed());
        assert_eq!(widget.select_from_list(&id("atlantis")), None);
    }

    #[test]
    fn hover_reaches_the_marker() {
        let (mut widget, probe) = loaded_widget();
        assert!(widget.on_decoration_hover(&id("delhi"), true));
        assert!(probe.marker(&id("delhi")).unwrap().hovered);
        assert!(widget.on_decoration_hover(&id("delhi"), false));
        assert!(!probe.marker(&id("delhi")).unwrap().hovered);
    }

    #[test]
    fn filter_view_follows_the_store() {
        let (mut widget, _) = loaded_widget();
        assert_eq!(widget.filtered().len(), 6);
        widget.set_filter("del");
        let names: Vec<_> = widget.filtered().iter().map(|l| l.display_name.clone()).collect();
        assert_eq!(names, vec!["Delhi".to_string()]);
    }

    #[test]
    fn removing_the_selection_clears_it() {
        let (mut widget, _) = loaded_widget();
        widget.on_decoration_click(&id("mumbai"));
        widget.remove_location(&id("mumbai"));
        assert_eq!(widget.selection().active(), None);
        assert_eq!(
            widget.events().last().map(|e| e.event.kind()),
            Some("selection_changed")
        );
    }

    #[test]
    fn resize_forwarded_only_on_change() {
        let (mut widget, probe) = loaded_widget();
        assert!(widget.on_container_resized(ContainerSize::new(800, 600)));
        assert!(!widget.on_container_resized(ContainerSize::new(800, 600)));
        assert!(widget.on_container_resized(ContainerSize::new(640, 600)));
        assert_eq!(probe.resize_count(), 2);
    }

    #[test]
    fn focus_waits_for_the_marker() {
        let (mut widget, probe) = loaded_widget();
        let ticket = widget.begin_search("pune").unwrap();
        let outcome = widget.finish_search(ticket, Ok(Some(pune())));
        assert_eq!(outcome, SearchOutcome::Resolved(pune()));

        // Stored, but not yet rendered: no flight, no selection.
        assert!(widget.store().contains(&id("place.pune")));
        assert_eq!(widget.pending_focus(), Some(&id("place.pune")));
        assert_eq!(probe.last_flight(), None);
        assert_eq!(widget.selection().active(), None);

        widget.render_pass();
        let flight = probe.last_flight().unwrap();
        assert_eq!(flight.center, LngLat::new(73.8567, 18.5204));
        assert_eq!((flight.zoom, flight.duration_ms), (12.0, 1500));
        assert_eq!(widget.selection().active(), Some(&id("place.pune")));
        assert_eq!(widget.pending_focus(), None);

        let kinds: Vec<_> = widget.events().iter().map(|e| e.event.kind()).collect();
        let reconciled = kinds.iter().rposition(|k| *k == "reconciled").unwrap();
        let focused = kinds.iter().position(|k| *k == "focus_applied").unwrap();
        assert!(reconciled < focused);
    }

    #[test]
    fn focus_survives_a_style_switch() {
        let (mut widget, probe) = loaded_widget();
        widget.request_style("Dark").unwrap();
        let ticket = widget.begin_search("pune").unwrap();
        widget.finish_search(ticket, Ok(Some(pune())));
        widget.render_pass();
        assert_eq!(probe.last_flight(), None);

        widget.on_style_loaded().unwrap();
        assert_eq!(widget.selection().active(), Some(&id("place.pune")));
        assert_eq!(probe.last_flight().map(|f| f.duration_ms), Some(1500));
    }

    #[test]
    fn stale_response_never_touches_the_store() {
        let (mut widget, _) = loaded_widget();
        let slow = widget.begin_search("pu").unwrap();
        let fast = widget.begin_search("pune").unwrap();

        widget.finish_search(fast, Ok(Some(pune())));
        let revision = widget.store().revision();
        let wrong = Location::new("place.puducherry", "Puducherry", 11.9416, 79.8083, "").unwrap();
        let outcome = widget.finish_search(slow, Ok(Some(wrong)));

        assert_eq!(outcome, SearchOutcome::Stale { seq: 1, latest: 2 });
        assert_eq!(widget.store().revision(), revision);
        assert!(!widget.store().contains(&id("place.puducherry")));
        assert_eq!(widget.metrics().counter(metrics::SEARCH_STALE), 1);
    }

    #[test]
    fn failed_search_changes_nothing() {
        let (mut widget, _) = loaded_widget();
        widget.on_decoration_click(&id("goa"));
        let revision = widget.store().revision();
        let ticket = widget.begin_search("pune").unwrap();
        let outcome = widget.finish_search(ticket, Err(GeocodeError::Network("offline".into())));

        assert!(matches!(outcome, SearchOutcome::Failed(_)));
        assert_eq!(widget.store().revision(), revision);
        assert_eq!(widget.selection().active(), Some(&id("goa")));
        assert_eq!(widget.pending_focus(), None);
    }

    #[test]
    fn resolving_the_same_place_twice_keeps_one_entry() {
        let (mut widget, _) = loaded_widget();
        for name in ["Pune", "Pune City"] {
            let ticket = widget.begin_search("pune").unwrap();
            let place = Location::new("place.pune", name, 18.5204, 73.8567, "").unwrap();
            widget.finish_search(ticket, Ok(Some(place)));
        }
        let matches: Vec<_> = widget
            .store()
            .iter()
            .filter(|l| l.id == id("place.pune"))
            .collect();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].display_name, "Pune City");
        assert_eq!(widget.store().len(), 7);
    }

    #[tokio::test]
    async fn search_through_geocoder() {
        let geocoder = FixtureGeocoder::new()
            .with_response(
                "pune",
                GeocodeResponse {
                    features: vec![Feature {
                        id: "place.pune".to_string(),
                        text: "Pune".to_string(),
                        place_name: "Pune, Maharashtra, India".to_string(),
                        center: [73.8567, 18.5204],
                    }],
                },
            )
            .with_error("boom", GeocodeError::Status(500));
        let (mut widget, probe) = loaded_widget();

        assert_eq!(widget.search(&geocoder, "   ").await, None);
        assert_eq!(geocoder.calls(), 0);

        let outcome = widget.search(&geocoder, " Pune ").await.unwrap();
        assert_eq!(outcome, SearchOutcome::Resolved(pune()));
        widget.render_pass();
        assert_eq!(probe.live_ids().len(), 7);

        let outcome = widget.search(&geocoder, "boom").await.unwrap();
        assert_eq!(outcome, SearchOutcome::Failed(GeocodeError::Status(500)));
        let outcome = widget.search(&geocoder, "nowhere").await.unwrap();
        assert_eq!(outcome, SearchOutcome::NoMatch);
        assert_eq!(widget.store().len(), 7);
    }

    #[test]
    fn destroy_is_idempotent() {
        let (mut widget, probe) = loaded_widget();
        assert_eq!(probe.observers_attached(), 1);
        widget.destroy();
        widget.destroy();
        assert!(probe.is_removed());
        assert!(probe.markers().is_empty());
        assert_eq!(probe.observers_attached(), 0);
        assert_eq!(probe.count_ops(|op| matches!(op, SurfaceOp::Remove)), 1);
        assert!(widget.render_pass().skipped);
        assert_eq!(widget.on_decoration_click(&id("delhi")), None);

        drop(widget);
        assert_eq!(probe.count_ops(|op| matches!(op, SurfaceOp::Remove)), 1);
    }

    #[test]
    fn focus_waits_out_a_queued_switch() {
        let (mut widget, probe) = loaded_widget();
        widget.request_style("Dark").unwrap();
        widget.request_style("Outdoors").unwrap();
        let ticket = widget.begin_search("pune").unwrap();
        widget.finish_search(ticket, Ok(Some(pune())));
        widget.render_pass();

        // Dark completes and Outdoors starts right away: still not ready.
        let first = widget.on_style_loaded().unwrap();
        assert_eq!(first.next.map(|s| s.name), Some("Outdoors"));
        assert_eq!(widget.pending_focus(), Some(&id("place.pune")));
        assert_eq!(widget.selection().active(), None);
        assert_eq!(probe.last_flight(), None);

        widget.on_style_loaded().unwrap();
        assert_eq!(widget.pending_focus(), None);
        assert_eq!(widget.selection().active(), Some(&id("place.pune")));
        let flight = probe.last_flight().unwrap();
        assert_eq!(flight.center, LngLat::new(73.8567, 18.5204));
        assert_eq!((flight.zoom, flight.duration_ms), (12.0, 1500));
    }

    #[test]
    fn focus_on_a_rendered_place_waits_for_the_new_style() {
        let (mut widget, probe) = loaded_widget();
        let goa = widget.store().get(&id("goa")).cloned().unwrap();
        let ticket = widget.begin_search("goa").unwrap();
        widget.finish_search(ticket, Ok(Some(goa.clone())));
        widget.request_style("Dark").unwrap();
        widget.render_pass();

        assert_eq!(widget.pending_focus(), Some(&id("goa")));
        assert_eq!(widget.selection().active(), None);
        assert_eq!(probe.last_flight(), None);

        widget.on_style_loaded().unwrap();
        assert_eq!(widget.selection().active(), Some(&id("goa")));
        assert_eq!(probe.last_flight().map(|f| f.center), Some(goa.position()));
    }

    #[test]
    fn clicks_are_ignored_while_a_style_loads() {
        let (mut widget, probe) = loaded_widget();
        widget.request_style("Dark").unwrap();
        assert_eq!(widget.on_decoration_click(&id("delhi")), None);
        assert_eq!(widget.selection().active(), None);

        widget.on_style_loaded().unwrap();
        assert!(widget.on_decoration_click(&id("delhi")).is_some());
        assert_eq!(probe.last_flight().map(|f| f.duration_ms), Some(1000));
    }

    #[test]
    fn pending_focus_dropped_when_its_place_is_removed() {
        let (mut widget, probe) = loaded_widget();
        let ticket = widget.begin_search("pune").unwrap();
        widget.finish_search(ticket, Ok(Some(pune())));
        widget.remove_location(&id("place.pune"));
        widget.render_pass();

        assert_eq!(widget.pending_focus(), None);
        assert_eq!(probe.last_flight(), None);
        assert_eq!(widget.selection().active(), None);
        assert!(!probe.live_ids().contains(&id("place.pune")));
    }

    #[test]
    fn destroy_mid_switch_leaves_the_switcher_idle() {
        let (mut widget, _) = loaded_widget();
        widget.request_style("Dark").unwrap();
        widget.request_style("Outdoors").unwrap();
        widget.destroy();

        assert!(!widget.switcher().is_switching());
        assert_eq!(widget.switcher().queued(), None);
        assert_eq!(widget.on_style_loaded(), None);
    }
}
