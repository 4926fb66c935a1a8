use std::collections::BTreeMap;

/// Decorations created on the surface.
pub const DECORATIONS_CREATED: &str = "decorations.created";
/// Decorations removed from the surface.
pub const DECORATIONS_REMOVED: &str = "decorations.removed";
/// Decorations moved in place.
pub const DECORATIONS_MOVED: &str = "decorations.moved";
/// Completed style switches.
pub const STYLE_SWITCHES: &str = "style.switches";
/// Geocoder responses dropped because a newer query was issued.
pub const SEARCH_STALE: &str = "search.stale";
/// Geocoder lookups that failed.
pub const SEARCH_FAILED: &str = "search.failed";
/// Camera flights issued.
pub const CAMERA_FLIGHTS: &str = "camera.flights";
/// Currently rendered decorations.
pub const GAUGE_RENDERED: &str = "decorations.rendered";

/// Deterministic counters and gauges for a widget session.
///
/// Sorted maps keep snapshots stable so they can be diffed in tests and
/// printed in reports.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Metrics {
    counters: BTreeMap<String, u64>,
    gauges: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub counters: Vec<(String, u64)>,
    pub gauges: Vec<(String, i64)>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counter(&self, name: &str) -> u64 {
        self.counters.get(name).copied().unwrap_or(0)
    }

    pub fn inc_counter(&mut self, name: impl Into<String>, by: u64) {
        if by == 0 {
            return;
        }
        *self.counters.entry(name.into()).or_insert(0) += by;
    }

    pub fn gauge(&self, name: &str) -> Option<i64> {
        self.gauges.get(name).copied()
    }

    pub fn set_gauge(&mut self, name: impl Into<String>, value: i64) {
        self.gauges.insert(name.into(), value);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            counters: self.counters.iter().map(|(k, v)| (k.clone(), *v)).collect(),
            gauges: self.gauges.iter().map(|(k, v)| (k.clone(), *v)).collect(),
        }
    }
}
