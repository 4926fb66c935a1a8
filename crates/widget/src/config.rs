use foundation::geo::{CameraState, LngLat};
use geocode::GeocoderConfig;
use serde::{Deserialize, Serialize};
use surface::style::{MapStyle, find_style};

use crate::error::WidgetError;

pub const ENV_TOKEN: &str = "MAPBOX_TOKEN";
pub const ENV_GEOCODER_URL: &str = "ATLAS_GEOCODER_URL";
pub const ENV_DEFAULT_STYLE: &str = "ATLAS_DEFAULT_STYLE";
pub const ENV_STYLE_TIMEOUT: &str = "ATLAS_STYLE_TIMEOUT_PASSES";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetConfig {
    /// Host element the surface renders into.
    pub container: String,
    pub initial_center: LngLat,
    pub initial_zoom: f64,
    /// Zoom used when flying to a clicked or searched location.
    pub focus_zoom: f64,
    pub click_flight_ms: u32,
    pub search_flight_ms: u32,
    pub default_style: String,
    pub geocoder: GeocoderConfig,
    /// Passes to wait for "style-loaded" before reporting a timeout. `None`
    /// waits forever.
    pub style_load_timeout_passes: Option<u64>,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            container: "map".to_string(),
            initial_center: LngLat::new(77.209, 28.6139),
            initial_zoom: 4.0,
            focus_zoom: 12.0,
            click_flight_ms: 1000,
            search_flight_ms: 1500,
            default_style: "Streets".to_string(),
            geocoder: GeocoderConfig::default(),
            style_load_timeout_passes: None,
        }
    }
}

impl WidgetConfig {
    pub fn from_json(raw: &str) -> Result<Self, WidgetError> {
        serde_json::from_str(raw).map_err(|e| WidgetError::Config(e.to_string()))
    }

    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Result<Self, WidgetError> {
        Self::default().with_env(|key| std::env::var(key).ok())
    }

    /// Overlays `MAPBOX_TOKEN`, `ATLAS_GEOCODER_URL`, `ATLAS_DEFAULT_STYLE`
    /// and `ATLAS_STYLE_TIMEOUT_PASSES` as read through `lookup`.
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, WidgetError> {
        if let Some(token) = lookup(ENV_TOKEN) {
            self.geocoder.access_token = token;
        }
        if let Some(url) = lookup(ENV_GEOCODER_URL) {
            self.geocoder.endpoint = url;
        }
        if let Some(style) = lookup(ENV_DEFAULT_STYLE) {
            self.default_style = style;
        }
        if let Some(raw) = lookup(ENV_STYLE_TIMEOUT) {
            let passes = raw.trim().parse::<u64>().map_err(|e| {
                WidgetError::Config(format!("{ENV_STYLE_TIMEOUT}={raw:?}: {e}"))
            })?;
            self.style_load_timeout_passes = Some(passes);
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), WidgetError> {
        LngLat::try_new(self.initial_center.lng, self.initial_center.lat)
            .map_err(|e| WidgetError::Config(format!("initial_center: {e}")))?;
        self.resolve_default_style()?;
        Ok(())
    }

    pub fn initial_camera(&self) -> CameraState {
        CameraState::new(self.initial_center, self.initial_zoom)
    }

    pub fn resolve_default_style(&self) -> Result<MapStyle, WidgetError> {
        find_style(&self.default_style)
            .ok_or_else(|| WidgetError::UnknownStyle(self.default_style.clone()))
    }
}
