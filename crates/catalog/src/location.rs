use foundation::geo::LngLat;
use foundation::ids::LocationId;
use serde::{Deserialize, Serialize};

use crate::CatalogError;

/// A point of interest shown on the map.
///
/// Seed data and geocoder results go through the same constructor, so a
/// `Location` always carries in-range coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawLocation")]
pub struct Location {
    pub id: LocationId,
    pub display_name: String,
    pub lat: f64,
    pub lng: f64,
    pub description: String,
}

#[derive(Deserialize)]
struct RawLocation {
    id: LocationId,
    display_name: String,
    lat: f64,
    lng: f64,
    #[serde(default)]
    description: String,
}

impl TryFrom<RawLocation> for Location {
    type Error = CatalogError;

    fn try_from(raw: RawLocation) -> Result<Self, Self::Error> {
        Location::new(raw.id, raw.display_name, raw.lat, raw.lng, raw.description)
    }
}

impl Location {
    pub fn new(
        id: impl Into<LocationId>,
        display_name: impl Into<String>,
        lat: f64,
        lng: f64,
        description: impl Into<String>,
    ) -> Result<Self, CatalogError> {
        let id = id.into();
        LngLat::try_new(lng, lat).map_err(|source| CatalogError::InvalidCoordinate {
            id: id.to_string(),
            source,
        })?;
        Ok(Self {
            id,
            display_name: display_name.into(),
            lat,
            lng,
            description: description.into(),
        })
    }

    pub fn position(&self) -> LngLat {
        LngLat::new(self.lng, self.lat)
    }

    /// Case-insensitive substring match on the display name.
    ///
    /// `needle_lower` must already be lowercased.
    pub fn name_contains(&self, needle_lower: &str) -> bool {
        self.display_name.to_lowercase().contains(needle_lower)
    }
}

#[cfg(test)]
mod tests {
    use super::Location;
    use crate::CatalogError;

    #[test]
    fn rejects_out_of_range_latitude() {
        let err = Location::new("x", "Nowhere", 95.0, 0.0, "").unwrap_err();
        assert!(matches!(err, CatalogError::InvalidCoordinate { .. }));
    }

    #[test]
    fn deserialization_goes_through_validation() {
        let ok: Location = serde_json::from_str(
            r#"{"id":"goa","display_name":"Goa","lat":15.2993,"lng":73.8243}"#,
        )
        .unwrap();
        assert_eq!(ok.description, "");

        let bad = serde_json::from_str::<Location>(
            r#"{"id":"bad","display_name":"Bad","lat":0.0,"lng":200.0}"#,
        );
        assert!(bad.is_err());
    }

    #[test]
    fn name_match_ignores_case() {
        let delhi = Location::new("delhi", "Delhi", 28.6139, 77.209, "").unwrap();
        assert!(delhi.name_contains("del"));
        assert!(delhi.name_contains("delhi"));
        assert!(!delhi.name_contains("mum"));
    }
}
