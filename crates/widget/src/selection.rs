use catalog::{Location, LocationStore};
use foundation::geo::FlyTo;
use foundation::ids::LocationId;
use surface::MapSurfaceHandle;
use tracing::{debug, info};

/// Active location, panel visibility and the list filter.
///
/// Invariant: `active` is `None` or names a location in the store it was last
/// validated against.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionController {
    active: Option<LocationId>,
    panel_collapsed: bool,
    filter: String,
    focus_zoom: f64,
    click_flight_ms: u32,
}

impl SelectionController {
    pub fn new(focus_zoom: f64, click_flight_ms: u32) -> Self {
        Self {
            active: None,
            panel_collapsed: false,
            filter: String::new(),
            focus_zoom,
            click_flight_ms,
        }
    }

    pub fn active(&self) -> Option<&LocationId> {
        self.active.as_ref()
    }

    pub fn active_location<'s>(&self, store: &'s LocationStore) -> Option<&'s Location> {
        self.active.as_ref().and_then(|id| store.get(id))
    }

    pub fn is_panel_collapsed(&self) -> bool {
        self.panel_collapsed
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Marker or list-badge click: select, expand the panel and fly there.
    pub fn on_marker_click(&mut self, handle: &mut MapSurfaceHandle, location: &Location) -> FlyTo {
        self.focus(handle, location, self.click_flight_ms)
    }

    /// Selects `location`, expands the panel and flies to it over
    /// `duration_ms`. A surface that cannot fly right now (mid style switch)
    /// keeps its camera; the selection still changes.
    pub fn focus(
        &mut self,
        handle: &mut MapSurfaceHandle,
        location: &Location,
        duration_ms: u32,
    ) -> FlyTo {
        self.select(location.id.clone());
        self.panel_collapsed = false;
        let flight = FlyTo::new(location.position(), self.focus_zoom, duration_ms);
        if let Err(e) = handle.fly_to(flight) {
            debug!(id = %location.id, error = %e, "camera flight skipped");
        }
        flight
    }

    /// Returns `true` if the selection changed.
    pub fn select(&mut self, id: LocationId) -> bool {
        if self.active.as_ref() == Some(&id) {
            return false;
        }
        info!(id = %id, "location selected");
        self.active = Some(id);
        true
    }

    /// Flips the panel; selection is untouched. Returns the new collapsed
    /// flag.
    pub fn on_panel_toggle(&mut self) -> bool {
        self.panel_collapsed = !self.panel_collapsed;
        self.panel_collapsed
    }

    pub fn set_filter(&mut self, query: &str) {
        self.filter = query.to_string();
    }

    /// The store filtered by the current query.
    pub fn filtered<'s>(&self, store: &'s LocationStore) -> Vec<&'s Location> {
        filter_locations(store, &self.filter)
    }

    /// Drops a selection whose location is no longer in `store`. Returns
    /// `true` if it did.
    pub fn validate(&mut self, store: &LocationStore) -> bool {
        match &self.active {
            Some(id) if !store.contains(id) => {
                info!(id = %id, "selected location removed, clearing selection");
                self.active = None;
                true
            }
            _ => false,
        }
    }
}

/// Case-insensitive substring match on display names, in store order. The
/// query is trimmed; an empty query keeps everything.
pub fn filter_locations<'s>(store: &'s LocationStore, query: &str) -> Vec<&'s Location> {
    store.filter_by_name(query)
}
