use foundation::ids::LocationId;

use crate::pass::RenderPass;

/// Everything the widget reports about itself.
///
/// Hosts drain these after each pass; tests assert on them to check the
/// ordering of the search and style-switch protocols.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetEvent {
    SurfaceLoaded,
    Reconciled {
        created: usize,
        updated: usize,
        removed: usize,
    },
    Rebuilt {
        created: usize,
    },
    StyleSwitchStarted {
        style: String,
    },
    StyleSwitchQueued {
        style: String,
    },
    StyleSwitchCompleted {
        style: String,
    },
    SelectionChanged {
        id: Option<LocationId>,
    },
    SearchResolved {
        seq: u64,
        id: LocationId,
    },
    SearchDiscarded {
        seq: u64,
    },
    SearchFailed {
        seq: u64,
        message: String,
    },
    FocusApplied {
        id: LocationId,
    },
    Destroyed,
}

impl WidgetEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            WidgetEvent::SurfaceLoaded => "surface_loaded",
            WidgetEvent::Reconciled { .. } => "reconciled",
            WidgetEvent::Rebuilt { .. } => "rebuilt",
            WidgetEvent::StyleSwitchStarted { .. } => "style_switch_started",
            WidgetEvent::StyleSwitchQueued { .. } => "style_switch_queued",
            WidgetEvent::StyleSwitchCompleted { .. } => "style_switch_completed",
            WidgetEvent::SelectionChanged { .. } => "selection_changed",
            WidgetEvent::SearchResolved { .. } => "search_resolved",
            WidgetEvent::SearchDiscarded { .. } => "search_discarded",
            WidgetEvent::SearchFailed { .. } => "search_failed",
            WidgetEvent::FocusApplied { .. } => "focus_applied",
            WidgetEvent::Destroyed => "destroyed",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub pass_index: u64,
    pub event: WidgetEvent,
}

#[derive(Debug, Default)]
pub struct EventBus {
    events: Vec<Event>,
}

impl EventBus {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, pass: RenderPass, event: WidgetEvent) {
        self.events.push(Event {
            pass_index: pass.index,
            event,
        });
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::{EventBus, WidgetEvent};
    use crate::pass::RenderPass;

    #[test]
    fn records_events_with_pass_index() {
        let mut bus = EventBus::new();
        bus.emit(RenderPass::new(2), WidgetEvent::SurfaceLoaded);
        assert_eq!(bus.events().len(), 1);
        assert_eq!(bus.events()[0].pass_index, 2);
        assert_eq!(bus.events()[0].event.kind(), "surface_loaded");
    }

    #[test]
    fn drain_clears_events() {
        let mut bus = EventBus::new();
        bus.emit(RenderPass::new(0), WidgetEvent::Destroyed);
        let drained = bus.drain();
        assert_eq!(drained.len(), 1);
        assert!(bus.events().is_empty());
    }
}
