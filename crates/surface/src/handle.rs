use foundation::geo::{CameraState, FlyTo, LngLat};
use foundation::ids::LocationId;
use foundation::viewport::ContainerSize;
use tracing::{debug, info};

use crate::marker::MarkerVisual;
use crate::traits::{
    Decoration, RenderSurface, Subscription, SurfaceError, SurfaceFactory, SurfaceOptions,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SurfaceState {
    /// Constructed, waiting for "loaded".
    Loading,
    Ready,
    /// A style change is in flight; `generation` identifies it.
    StyleLoading { generation: u64 },
    Destroyed,
}

/// Completion ticket for [`MapSurfaceHandle::change_style`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleLoad {
    pub generation: u64,
    pub style_url: String,
}

/// Owns one external rendering context for its whole lifetime.
///
/// All surface mutation goes through the command methods here; nothing else
/// holds the renderer.
pub struct MapSurfaceHandle {
    surface: Option<Box<dyn RenderSurface>>,
    resize_watch: Option<Box<dyn Subscription>>,
    state: SurfaceState,
    style_url: String,
    style_generation: u64,
    last_size: Option<ContainerSize>,
}

impl std::fmt::Debug for MapSurfaceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapSurfaceHandle")
            .field("state", &self.state)
            .field("style_url", &self.style_url)
            .field("style_generation", &self.style_generation)
            .field("last_size", &self.last_size)
            .finish()
    }
}

impl MapSurfaceHandle {
    /// Constructs the renderer and starts observing the container size.
    ///
    /// The handle starts in [`SurfaceState::Loading`]; call
    /// [`MapSurfaceHandle::on_loaded`] when the renderer reports "loaded".
    pub fn create(
        factory: &mut dyn SurfaceFactory,
        options: &SurfaceOptions,
    ) -> Result<Self, SurfaceError> {
        let surface = factory.construct(options)?;
        let resize_watch = factory.observe_resize(&options.container);
        info!(container = %options.container, style = %options.style_url, "map surface created");
        Ok(Self {
            surface: Some(surface),
            resize_watch: Some(resize_watch),
            state: SurfaceState::Loading,
            style_url: options.style_url.clone(),
            style_generation: 0,
            last_size: None,
        })
    }

    pub fn state(&self) -> SurfaceState {
        self.state
    }

    /// Decorations and camera calls are only safe in this state.
    pub fn is_ready(&self) -> bool {
        self.state == SurfaceState::Ready
    }

    pub fn is_destroyed(&self) -> bool {
        self.state == SurfaceState::Destroyed
    }

    pub fn style_url(&self) -> &str {
        &self.style_url
    }

    /// Handles the renderer's "loaded" event. Returns `true` on the
    /// Loading -> Ready transition.
    pub fn on_loaded(&mut self) -> bool {
        if self.state != SurfaceState::Loading {
            debug!(state = ?self.state, "ignoring loaded event");
            return false;
        }
        self.state = SurfaceState::Ready;
        info!("map surface loaded");
        true
    }

    /// Feeds one container size observation. The renderer is resized only
    /// when the dimensions actually changed.
    pub fn on_container_resized(&mut self, size: ContainerSize) -> bool {
        if self.resize_watch.is_none() || self.last_size == Some(size) {
            return false;
        }
        self.last_size = Some(size);
        let Some(surface) = self.surface.as_mut() else {
            return false;
        };
        debug!(width = size.width, height = size.height, "resize surface");
        surface.resize();
        true
    }

    /// Starts a destructive style change. Decorations must not be touched
    /// until [`MapSurfaceHandle::on_style_loaded`] completes the returned
    /// ticket.
    pub fn change_style(&mut self, style_url: &str) -> Result<StyleLoad, SurfaceError> {
        match self.state {
            SurfaceState::Ready | SurfaceState::StyleLoading { .. } => {}
            SurfaceState::Loading => return Err(SurfaceError::NotReady),
            SurfaceState::Destroyed => return Err(SurfaceError::Destroyed),
        }
        let surface = self.surface.as_mut().ok_or(SurfaceError::Destroyed)?;
        surface.set_style(style_url);
        self.style_generation += 1;
        self.style_url = style_url.to_string();
        self.state = SurfaceState::StyleLoading {
            generation: self.style_generation,
        };
        info!(style = %style_url, generation = self.style_generation, "style change started");
        Ok(StyleLoad {
            generation: self.style_generation,
            style_url: style_url.to_string(),
        })
    }

    /// Handles the renderer's "style-loaded" event. Returns the completed
    /// ticket, or `None` when no style change was pending (the initial
    /// style load also fires this event).
    pub fn on_style_loaded(&mut self) -> Option<StyleLoad> {
        let SurfaceState::StyleLoading { generation } = self.state else {
            debug!(state = ?self.state, "ignoring style-loaded event");
            return None;
        };
        self.state = SurfaceState::Ready;
        info!(style = %self.style_url, generation, "style change completed");
        Some(StyleLoad {
            generation,
            style_url: self.style_url.clone(),
        })
    }

    pub fn camera(&self) -> Result<CameraState, SurfaceError> {
        self.ready_surface().map(|s| s.camera())
    }

    pub fn set_camera(&mut self, camera: CameraState) -> Result<(), SurfaceError> {
        self.ready_surface_mut()?.set_camera(camera);
        Ok(())
    }

    /// Fire-and-forget animated camera move; the last call wins.
    pub fn fly_to(&mut self, flight: FlyTo) -> Result<(), SurfaceError> {
        debug!(lng = flight.center.lng, lat = flight.center.lat, zoom = flight.zoom, "fly to");
        self.ready_surface_mut()?.fly_to(flight);
        Ok(())
    }

    pub fn add_decoration(
        &mut self,
        id: &LocationId,
        visual: &MarkerVisual,
        at: LngLat,
    ) -> Result<Box<dyn Decoration>, SurfaceError> {
        Ok(self.ready_surface_mut()?.add_decoration(id, visual, at))
    }

    /// Releases the renderer and detaches the resize observation. Safe to
    /// call any number of times.
    pub fn destroy(&mut self) {
        if let Some(mut watch) = self.resize_watch.take() {
            watch.disconnect();
        }
        if let Some(mut surface) = self.surface.take() {
            surface.remove();
            info!("map surface destroyed");
        }
        self.state = SurfaceState::Destroyed;
    }

    fn ready_surface(&self) -> Result<&dyn RenderSurface, SurfaceError> {
        match self.state {
            SurfaceState::Ready => self.surface.as_deref().ok_or(SurfaceError::Destroyed),
            SurfaceState::Destroyed => Err(SurfaceError::Destroyed),
            _ => Err(SurfaceError::NotReady),
        }
    }

    fn ready_surface_mut(&mut self) -> Result<&mut dyn RenderSurface, SurfaceError> {
        match self.state {
            SurfaceState::Ready => match self.surface.as_mut() {
                Some(surface) => Ok(surface.as_mut()),
                None => Err(SurfaceError::Destroyed),
            },
            SurfaceState::Destroyed => Err(SurfaceError::Destroyed),
            _ => Err(SurfaceError::NotReady),
        }
    }
}

impl Drop for MapSurfaceHandle {
    fn drop(&mut self) {
        self.destroy();
    }
}
