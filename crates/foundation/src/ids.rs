use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier of a location.
///
/// Seed entries use short slugs (`"delhi"`); geocoder results use the
/// provider's feature id (`"place.123"`). Both are compared byte-for-byte.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationId(String);

impl LocationId {
    pub fn new(id: impl Into<String>) -> Self {
        LocationId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LocationId {
    fn from(value: &str) -> Self {
        LocationId::new(value)
    }
}

impl From<String> for LocationId {
    fn from(value: String) -> Self {
        LocationId(value)
    }
}
