use catalog::CatalogError;
use geocode::GeocodeError;
use surface::SurfaceError;

#[derive(Debug, Clone, PartialEq)]
pub enum WidgetError {
    /// The rendering surface could not be constructed. The widget cannot
    /// start; hosts show a blocking error state.
    SurfaceInit(String),
    Surface(SurfaceError),
    UnknownStyle(String),
    /// The "style-loaded" event did not arrive within the configured number
    /// of render passes. The switch stays in flight.
    StyleLoadTimeout { style: String, waited_passes: u64 },
    Catalog(CatalogError),
    Geocode(GeocodeError),
    Config(String),
}

impl std::fmt::Display for WidgetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WidgetError::SurfaceInit(msg) => write!(f, "map failed to load: {msg}"),
            WidgetError::Surface(e) => write!(f, "{e}"),
            WidgetError::UnknownStyle(name) => write!(f, "unknown map style {name:?}"),
            WidgetError::StyleLoadTimeout {
                style,
                waited_passes,
            } => write!(
                f,
                "style {style:?} did not finish loading after {waited_passes} passes"
            ),
            WidgetError::Catalog(e) => write!(f, "{e}"),
            WidgetError::Geocode(e) => write!(f, "{e}"),
            WidgetError::Config(msg) => write!(f, "invalid widget config: {msg}"),
        }
    }
}

impl std::error::Error for WidgetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WidgetError::Surface(e) => Some(e),
            WidgetError::Catalog(e) => Some(e),
            WidgetError::Geocode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SurfaceError> for WidgetError {
    fn from(e: SurfaceError) -> Self {
        match e {
            SurfaceError::Init(msg) => WidgetError::SurfaceInit(msg),
            other => WidgetError::Surface(other),
        }
    }
}

impl From<CatalogError> for WidgetError {
    fn from(e: CatalogError) -> Self {
        WidgetError::Catalog(e)
    }
}

impl From<GeocodeError> for WidgetError {
    fn from(e: GeocodeError) -> Self {
        WidgetError::Geocode(e)
    }
}
