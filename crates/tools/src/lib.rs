//! Scripted headless widget sessions behind the `atlas` CLI.

use std::collections::BTreeMap;

use catalog::{Location, LocationStore};
use foundation::geo::CameraState;
use foundation::ids::LocationId;
use geocode::Geocoder;
use serde::Serialize;
use surface::headless::{HeadlessFactory, HeadlessProbe};
use surface::style::MAP_STYLES;
use tracing::info;
use widget::{MapWidget, RecordingThemeSink, SearchOutcome, WidgetConfig, WidgetError};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StyleRow {
    pub name: &'static str,
    pub url: &'static str,
    pub theme: &'static str,
}

pub fn style_rows() -> Vec<StyleRow> {
    MAP_STYLES
        .iter()
        .map(|s| StyleRow {
            name: s.name,
            url: s.url,
            theme: s.theme.as_str(),
        })
        .collect()
}

/// Surface state after one scripted step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub step: String,
    pub style: String,
    pub camera: Option<CameraState>,
    pub rendered: Vec<LocationId>,
    pub selected: Option<LocationId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemoReport {
    pub steps: Vec<Snapshot>,
    pub events: Vec<&'static str>,
    pub counters: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchReport {
    pub outcomes: Vec<String>,
    pub selected: Option<LocationId>,
    pub camera: Option<CameraState>,
    pub locations: Vec<Location>,
}

struct Session {
    widget: MapWidget,
    probe: HeadlessProbe,
}

impl Session {
    fn start(config: WidgetConfig, seed: Vec<Location>) -> Result<Self, WidgetError> {
        let mut factory = HeadlessFactory::new();
        let probe = factory.probe();
        let store = LocationStore::seeded(seed)?;
        let mut widget = MapWidget::create(
            config,
            &mut factory,
            store,
            Box::new(RecordingThemeSink::default()),
        )?;
        widget.on_surface_loaded();
        Ok(Self { widget, probe })
    }

    fn snapshot(&self, step: &str) -> Snapshot {
        Snapshot {
            step: step.to_string(),
            style: self.widget.switcher().current().name.to_string(),
            camera: self.probe.camera(),
            rendered: self.probe.live_ids(),
            selected: self.widget.selection().active().cloned(),
        }
    }
}

/// Seeds a headless widget, clicks the first location, switches to `style`
/// and removes the last location, recording the surface after each step.
pub fn run_demo(
    config: WidgetConfig,
    seed: Vec<Location>,
    style: &str,
) -> Result<DemoReport, WidgetError> {
    let mut s = Session::start(config, seed)?;
    let mut steps = vec![s.snapshot("loaded")];

    let first = s.widget.store().ids().next().cloned();
    if let Some(first) = first {
        s.widget.on_decoration_click(&first);
        steps.push(s.snapshot(&format!("click {first}")));
    }

    s.widget.request_style(style)?;
    s.widget.render_pass();
    s.widget.on_style_loaded();
    steps.push(s.snapshot(&format!("style {style}")));

    if let Some(last) = s.widget.store().iter().last().map(|l| l.id.clone()) {
        s.widget.remove_location(&last);
        s.widget.render_pass();
        steps.push(s.snapshot(&format!("remove {last}")));
    }

    let counters = s.widget.metrics().snapshot().counters.into_iter().collect();
    let events = s.widget.events().iter().map(|e| e.event.kind()).collect();
    info!(steps = steps.len(), "demo finished");
    Ok(DemoReport {
        steps,
        events,
        counters,
    })
}

/// Runs `queries` in order through `geocoder` against a seeded headless
/// widget, rendering after each one.
pub async fn run_search(
    config: WidgetConfig,
    seed: Vec<Location>,
    geocoder: &dyn Geocoder,
    queries: &[String],
) -> Result<SearchReport, WidgetError> {
    let mut s = Session::start(config, seed)?;
    let mut outcomes = Vec::new();
    for query in queries {
        let outcome = s.widget.search(geocoder, query).await;
        s.widget.render_pass();
        outcomes.push(describe(query, outcome));
    }
    Ok(SearchReport {
        outcomes,
        selected: s.widget.selection().active().cloned(),
        camera: s.probe.camera(),
        locations: s.widget.store().iter().cloned().collect(),
    })
}

fn describe(query: &str, outcome: Option<SearchOutcome>) -> String {
    match outcome {
        None => format!("{query:?}: skipped"),
        Some(SearchOutcome::Resolved(l)) => format!("{query:?}: {} ({})", l.display_name, l.id),
        Some(SearchOutcome::NoMatch) => format!("{query:?}: no match"),
        Some(SearchOutcome::Stale { seq, latest }) => {
            format!("{query:?}: stale (#{seq}, latest #{latest})")
        }
        Some(SearchOutcome::Failed(e)) => format!("{query:?}: failed: {e}"),
    }
}
