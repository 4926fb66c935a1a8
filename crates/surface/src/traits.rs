//! Interfaces of the external map renderer.
//!
//! The widget never talks to a renderer directly; it goes through
//! [`crate::MapSurfaceHandle`], which owns the boxed trait objects below.

use foundation::geo::{CameraState, FlyTo, LngLat};
use foundation::ids::LocationId;

use crate::marker::MarkerVisual;

/// Error type for surface operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    /// The renderer could not be constructed. Fatal to the widget.
    Init(String),
    /// A camera or decoration call arrived before "loaded" or during a
    /// style reload.
    NotReady,
    Destroyed,
}

impl std::fmt::Display for SurfaceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SurfaceError::Init(msg) => write!(f, "map surface failed to initialize: {msg}"),
            SurfaceError::NotReady => write!(f, "map surface is not ready"),
            SurfaceError::Destroyed => write!(f, "map surface was destroyed"),
        }
    }
}

impl std::error::Error for SurfaceError {}

/// Construction parameters for a surface.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceOptions {
    /// Host element identifier (a DOM id in the web host).
    pub container: String,
    pub style_url: String,
    pub camera: CameraState,
}

/// A live rendering context.
///
/// Implementations signal "loaded" and "style-loaded" out of band: the host
/// forwards those events to the widget, which updates the handle.
pub trait RenderSurface {
    /// Replaces the whole rendering context. Existing decorations become
    /// invalid once the new style has loaded.
    fn set_style(&mut self, style_url: &str);
    /// Animated transition; a second call retargets the first.
    fn fly_to(&mut self, flight: FlyTo);
    fn camera(&self) -> CameraState;
    fn set_camera(&mut self, camera: CameraState);
    /// Re-reads the container dimensions.
    fn resize(&mut self);
    /// Places an interactive marker. Clicks and hovers on it are reported
    /// back to the host tagged with `id`.
    fn add_decoration(
        &mut self,
        id: &LocationId,
        visual: &MarkerVisual,
        at: LngLat,
    ) -> Box<dyn Decoration>;
    /// Releases the context. Called at most once by the handle.
    fn remove(&mut self);
}

/// One marker on the surface.
pub trait Decoration {
    fn set_position(&mut self, at: LngLat);
    fn set_hovered(&mut self, hovered: bool);
    fn remove(&mut self);
}

/// A long-lived observation that must be torn down with the widget.
pub trait Subscription {
    fn disconnect(&mut self);
}

/// Creates surfaces and the container size observation that feeds them.
pub trait SurfaceFactory {
    fn construct(&mut self, options: &SurfaceOptions)
        -> Result<Box<dyn RenderSurface>, SurfaceError>;

    fn observe_resize(&mut self, container: &str) -> Box<dyn Subscription>;
}
