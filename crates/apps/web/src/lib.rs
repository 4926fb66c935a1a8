//! Browser host for the map widget.
//!
//! JS constructs a [`MapsSection`], calls `tick()` from its animation frame
//! loop and forwards UI input (search box, style picker, panel toggle, list
//! filter). Renderer callbacks are queued and applied inside `tick()`.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::OnceLock;

use catalog::{Location, LocationStore, default_locations};
use foundation::ids::LocationId;
use foundation::viewport::ContainerSize;
use geocode::{Geocoder, GeocoderConfig};
use runtime::event_bus::Event;
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use widget::{
    MapWidget, PreferenceThemeSink, SearchOutcome, SearchTicket, ThemeSink, WidgetConfig,
    stored_theme,
};

mod events;
mod geocoder;
mod mapbox;
mod theme;

pub use events::{EventQueue, HostEvent};
use geocoder::GlooGeocoder;
use mapbox::MapboxFactory;
use theme::{DocumentThemeSink, preference_store};

static PANIC_HOOK_SET: OnceLock<()> = OnceLock::new();

fn init_panic_hook() {
    PANIC_HOOK_SET.get_or_init(|| {
        std::panic::set_hook(Box::new(|info| {
            let msg = info.to_string();
            web_sys::console::error_1(&JsValue::from_str(&msg));
        }));
    });
}

pub(crate) fn log_info(msg: &str) {
    web_sys::console::log_1(&JsValue::from_str(msg));
}

pub(crate) fn log_error(msg: &str) {
    web_sys::console::error_1(&JsValue::from_str(msg));
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    init_panic_hook();
    Ok(())
}

/// The maps section of the page.
#[wasm_bindgen]
pub struct MapsSection {
    widget: Rc<RefCell<MapWidget>>,
    queue: EventQueue,
    geocoder: Rc<GlooGeocoder>,
}

#[wasm_bindgen]
impl MapsSection {
    /// Mounts the map into the element with id `container`. Throws when
    /// mapbox-gl cannot start.
    #[wasm_bindgen(constructor)]
    pub fn new(container: &str, access_token: &str) -> Result<MapsSection, JsValue> {
        init_panic_hook();
        let config = WidgetConfig {
            container: container.to_string(),
            geocoder: GeocoderConfig::with_token(access_token),
            ..WidgetConfig::default()
        };

        let prefs = preference_store();
        let mut document = DocumentThemeSink;
        if let Some(theme) = stored_theme(&prefs) {
            document.apply(theme);
        }
        let sink = Box::new((PreferenceThemeSink::new(prefs), document));

        let queue = EventQueue::new();
        let mut factory = MapboxFactory::new(access_token, queue.clone());
        let store = LocationStore::seeded(default_locations()).map_err(to_js)?;
        let geocoder = Rc::new(GlooGeocoder::new(config.geocoder.clone()));
        let widget = MapWidget::create(config, &mut factory, store, sink).map_err(to_js)?;

        Ok(MapsSection {
            widget: Rc::new(RefCell::new(widget)),
            queue,
            geocoder,
        })
    }

    /// Applies queued renderer events, runs one render pass and returns the
    /// panel state as JSON.
    pub fn tick(&self) -> Result<String, JsValue> {
        let mut widget = self.widget.borrow_mut();
        apply_host_events(&mut widget, self.queue.drain());
        widget.render_pass();
        if let Err(e) = widget.poll_style_timeout() {
            log_error(&e.to_string());
        }
        for event in widget.drain_events() {
            log_event(&event);
        }
        serde_json::to_string(&SectionView::of(&widget)).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Called on every input change. The same text filters the location
    /// list. Overlapping lookups are fine: only the latest can land.
    pub fn search(&self, text: &str) {
        let Some(ticket) = search_input(&mut self.widget.borrow_mut(), text) else {
            return;
        };
        let widget = self.widget.clone();
        let geocoder = self.geocoder.clone();
        spawn_local(async move {
            let response = geocoder.lookup(&ticket.query).await;
            let outcome = widget.borrow_mut().finish_search(ticket, response);
            if let SearchOutcome::Failed(e) = outcome {
                log_error(&format!("search failed: {e}"));
            }
        });
    }

    pub fn select_style(&self, name: &str) -> Result<(), JsValue> {
        self.widget
            .borrow_mut()
            .request_style(name)
            .map(|_| ())
            .map_err(to_js)
    }

    /// A click on a badge in the location list.
    pub fn select(&self, id: &str) -> bool {
        self.widget
            .borrow_mut()
            .select_from_list(&LocationId::from(id))
            .is_some()
    }

    /// Returns the new collapsed flag.
    pub fn toggle_panel(&self) -> bool {
        self.widget.borrow_mut().on_panel_toggle()
    }

    pub fn set_filter(&self, query: &str) {
        self.widget.borrow_mut().set_filter(query);
    }

    pub fn destroy(&self) {
        self.widget.borrow_mut().destroy();
    }
}

fn to_js(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn log_event(event: &Event) {
    log_info(&format!("[atlas] pass {} {:?}", event.pass_index, event.event));
}

/// The search box drives both the list filter and the geocoder lookup.
pub fn search_input(widget: &mut MapWidget, text: &str) -> Option<SearchTicket> {
    widget.set_filter(text);
    widget.begin_search(text)
}

/// Feeds renderer callbacks into the widget in arrival order.
pub fn apply_host_events(widget: &mut MapWidget, events: Vec<HostEvent>) {
    for event in events {
        match event {
            HostEvent::Loaded => {
                widget.on_surface_loaded();
            }
            HostEvent::StyleLoaded => {
                widget.on_style_loaded();
            }
            HostEvent::Click { id } => {
                widget.on_decoration_click(&LocationId::from(id));
            }
            HostEvent::Hover { id, on } => {
                widget.on_decoration_hover(&LocationId::from(id), on);
            }
            HostEvent::Resize { width, height } => {
                widget.on_container_resized(ContainerSize::new(width, height));
            }
        }
    }
}

/// What the page needs to draw the side panel.
#[derive(Debug, Serialize)]
pub struct SectionView<'a> {
    pub style: &'static str,
    pub theme: &'static str,
    pub switching: bool,
    pub selected: Option<&'a Location>,
    pub panel_collapsed: bool,
    pub filter: &'a str,
    pub locations: Vec<&'a Location>,
}

impl<'a> SectionView<'a> {
    pub fn of(widget: &'a MapWidget) -> Self {
        let style = widget.switcher().current();
        Self {
            style: style.name,
            theme: style.theme.as_str(),
            switching: widget.switcher().is_switching(),
            selected: widget.active_location(),
            panel_collapsed: widget.selection().is_panel_collapsed(),
            filter: widget.selection().filter(),
            locations: widget.filtered(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{HostEvent, SectionView, apply_host_events, search_input};
    use catalog::{LocationStore, default_locations};
    use pretty_assertions::assert_eq;
    use surface::headless::HeadlessFactory;
    use widget::{MapWidget, RecordingThemeSink, WidgetConfig};

    fn widget() -> (MapWidget, surface::headless::HeadlessProbe) {
        let mut factory = HeadlessFactory::new();
        let probe = factory.probe();
        let widget = MapWidget::create(
            WidgetConfig::default(),
            &mut factory,
            LocationStore::seeded(default_locations()).unwrap(),
            Box::new(RecordingThemeSink::default()),
        )
        .unwrap();
        (widget, probe)
    }

    #[test]
    fn host_events_drive_the_widget() {
        let (mut widget, probe) = widget();
        apply_host_events(
            &mut widget,
            vec![
                HostEvent::Loaded,
                HostEvent::Resize {
                    width: 1024,
                    height: 480,
                },
                HostEvent::Click {
                    id: "goa".to_string(),
                },
                HostEvent::Hover {
                    id: "goa".to_string(),
                    on: true,
                },
            ],
        );
        assert_eq!(probe.live_ids().len(), 6);
        assert_eq!(probe.resize_count(), 1);
        assert_eq!(
            widget.selection().active().map(|id| id.as_str()),
            Some("goa")
        );
        assert!(probe.marker(&"goa".into()).unwrap().hovered);
    }

    #[test]
    fn style_loaded_completes_a_switch() {
        let (mut widget, _) = widget();
        apply_host_events(&mut widget, vec![HostEvent::Loaded, HostEvent::StyleLoaded]);
        widget.request_style("Dark").unwrap();
        assert!(widget.switcher().is_switching());
        apply_host_events(&mut widget, vec![HostEvent::StyleLoaded]);
        assert!(!widget.switcher().is_switching());

        let view = SectionView::of(&widget);
        assert_eq!((view.style, view.theme), ("Dark", "dark"));
    }

    #[test]
    fn view_reflects_filter_and_selection() {
        let (mut widget, _) = widget();
        apply_host_events(&mut widget, vec![HostEvent::Loaded]);
        widget.set_filter("JAI");
        widget.select_from_list(&"jaipur".into());

        let json = serde_json::to_value(SectionView::of(&widget)).unwrap();
        assert_eq!(json["filter"], "JAI");
        assert_eq!(json["locations"].as_array().unwrap().len(), 1);
        assert_eq!(json["selected"]["display_name"], "Jaipur");
        assert_eq!(json["panel_collapsed"], false);
    }

    #[test]
    fn search_box_filters_the_list_too() {
        let (mut widget, _) = widget();
        apply_host_events(&mut widget, vec![HostEvent::Loaded]);

        let ticket = search_input(&mut widget, "Mum").unwrap();
        assert_eq!(ticket.query, "Mum");
        let view = SectionView::of(&widget);
        assert_eq!(view.filter, "Mum");
        assert_eq!(view.locations.len(), 1);

        assert!(search_input(&mut widget, "  ").is_none());
        assert_eq!(SectionView::of(&widget).locations.len(), 6);
    }
}
