//! Location catalog: the single source of truth for what the map shows,
//! plus the small key-value preference store the widget persists its theme
//! into.

pub mod location;
pub mod prefs;
pub mod seed;
pub mod store;

pub use location::*;
pub use prefs::*;
pub use seed::*;
pub use store::*;

use foundation::geo::GeoError;
use foundation::ids::LocationId;

#[derive(Debug, Clone, PartialEq)]
pub enum CatalogError {
    InvalidCoordinate { id: String, source: GeoError },
    DuplicateId(LocationId),
    StorageUnavailable,
    Corrupt(String),
    Io(String),
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::InvalidCoordinate { id, source } => {
                write!(f, "location {id:?} has invalid coordinates: {source}")
            }
            CatalogError::DuplicateId(id) => write!(f, "duplicate location id {id:?}"),
            CatalogError::StorageUnavailable => write!(f, "browser storage unavailable"),
            CatalogError::Corrupt(msg) => write!(f, "catalog data corrupt: {msg}"),
            CatalogError::Io(msg) => write!(f, "catalog storage error: {msg}"),
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogError::InvalidCoordinate { source, .. } => Some(source),
            _ => None,
        }
    }
}
