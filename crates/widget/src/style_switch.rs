use catalog::LocationStore;
use foundation::geo::CameraState;
use runtime::pass::RenderPass;
use surface::style::MapStyle;
use surface::{MapSurfaceHandle, StyleLoad};
use tracing::{debug, info, warn};

use crate::error::WidgetError;
use crate::reconciler::MarkerReconciler;
use crate::theme::ThemeSink;

#[derive(Debug, Clone, PartialEq)]
pub enum SwitchState {
    Idle,
    Switching {
        target: MapStyle,
        /// Camera to restore once the new style has loaded.
        captured: CameraState,
        load: StyleLoad,
        started: RenderPass,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SwitchRequest {
    Started(StyleLoad),
    /// Another switch is in flight; this one runs after it. `replaced` is the
    /// previously queued style this request superseded.
    Queued { replaced: Option<MapStyle> },
    /// The style is already current (or already loading); nothing to do.
    AlreadyActive,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCompleted {
    pub style: MapStyle,
    pub camera: CameraState,
    pub rebuilt: usize,
    /// The queued style whose switch started on completion, if any.
    pub next: Option<MapStyle>,
}

/// Runs destructive style changes: capture the camera, swap the style, and
/// once the surface reports "style-loaded" restore the camera, rebuild every
/// marker in the new theme and persist the theme.
///
/// Requests made mid-switch coalesce: only the latest is kept and it starts
/// when the in-flight switch completes.
#[derive(Debug)]
pub struct StyleSwitchCoordinator {
    state: SwitchState,
    current: MapStyle,
    queued: Option<MapStyle>,
    timeout_passes: Option<u64>,
}

impl StyleSwitchCoordinator {
    pub fn new(initial: MapStyle, timeout_passes: Option<u64>) -> Self {
        Self {
            state: SwitchState::Idle,
            current: initial,
            queued: None,
            timeout_passes,
        }
    }

    pub fn state(&self) -> &SwitchState {
        &self.state
    }

    pub fn is_switching(&self) -> bool {
        matches!(self.state, SwitchState::Switching { .. })
    }

    /// The last style whose switch completed.
    pub fn current(&self) -> MapStyle {
        self.current
    }

    pub fn queued(&self) -> Option<MapStyle> {
        self.queued
    }

    pub fn request_switch(
        &mut self,
        handle: &mut MapSurfaceHandle,
        style: MapStyle,
        pass: RenderPass,
    ) -> Result<SwitchRequest, WidgetError> {
        if let SwitchState::Switching { target, .. } = &self.state {
            if *target == style {
                // Back to the in-flight target: whatever was queued is moot.
                self.queued = None;
                return Ok(SwitchRequest::AlreadyActive);
            }
            let replaced = self.queued.replace(style);
            info!(style = style.name, in_flight = target.name, "style switch queued");
            return Ok(SwitchRequest::Queued { replaced });
        }

        if style == self.current {
            debug!(style = style.name, "style already active");
            return Ok(SwitchRequest::AlreadyActive);
        }
        let captured = handle.camera()?;
        self.start(handle, style, captured, pass)
            .map(SwitchRequest::Started)
    }

    /// Handles the surface's "style-loaded" event.
    ///
    /// Returns `None` when no switch was in flight (the initial load fires
    /// the event too).
    pub fn on_style_loaded(
        &mut self,
        handle: &mut MapSurfaceHandle,
        reconciler: &mut MarkerReconciler,
        store: &LocationStore,
        sink: &mut dyn ThemeSink,
        pass: RenderPass,
    ) -> Option<SwitchCompleted> {
        let SwitchState::Switching {
            target,
            captured,
            load,
            ..
        } = self.state.clone()
        else {
            debug!("style-loaded outside a switch");
            return None;
        };
        let completed = handle.on_style_loaded()?;
        if completed.generation != load.generation {
            warn!(
                expected = load.generation,
                got = completed.generation,
                "style-loaded for an unexpected generation"
            );
        }

        if let Err(e) = handle.set_camera(captured) {
            warn!(error = %e, "could not restore camera after style switch");
        }
        self.current = target;
        self.state = SwitchState::Idle;
        reconciler.set_theme(target.theme);
        let rebuilt = reconciler.rebuild_all(handle, store);
        sink.apply(target.theme);
        info!(style = target.name, theme = target.theme.as_str(), rebuilt, "style switch completed");

        let next = match self.queued.take() {
            Some(style) if style != self.current => match self.start(handle, style, captured, pass) {
                Ok(_) => Some(style),
                Err(e) => {
                    warn!(style = style.name, error = %e, "queued style switch failed to start");
                    None
                }
            },
            _ => None,
        };

        Some(SwitchCompleted {
            style: target,
            camera: captured,
            rebuilt,
            next,
        })
    }

    /// Abandons any in-flight or queued switch. Used when the surface is
    /// torn down mid-switch.
    pub fn reset(&mut self) {
        if let SwitchState::Switching { target, .. } = &self.state {
            debug!(style = target.name, "style switch abandoned");
        }
        self.state = SwitchState::Idle;
        self.queued = None;
    }

    /// Reports a switch that has waited longer than the configured number of
    /// passes. The switch stays in flight either way.
    pub fn check_timeout(&self, pass: RenderPass) -> Result<(), WidgetError> {
        let (Some(limit), SwitchState::Switching { target, started, .. }) =
            (self.timeout_passes, &self.state)
        else {
            return Ok(());
        };
        let waited = pass.since(*started);
        if waited > limit {
            return Err(WidgetError::StyleLoadTimeout {
                style: target.name.to_string(),
                waited_passes: waited,
            });
        }
        Ok(())
    }

    fn start(
        &mut self,
        handle: &mut MapSurfaceHandle,
        style: MapStyle,
        captured: CameraState,
        pass: RenderPass,
    ) -> Result<StyleLoad, WidgetError> {
        let load = handle.change_style(style.url)?;
        info!(style = style.name, "style switch started");
        self.state = SwitchState::Switching {
            target: style,
            captured,
            load: load.clone(),
            started: pass,
        };
        Ok(load)
    }
}
