use catalog::Location;
use serde::{Deserialize, Serialize};

use crate::GeocodeError;

/// Forward-geocoding response: a feature collection, best match first.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GeocodeResponse {
    #[serde(default)]
    pub features: Vec<Feature>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub id: String,
    /// Short name ("Pune").
    pub text: String,
    /// Full place description ("Pune, Maharashtra, India").
    pub place_name: String,
    /// `[lng, lat]`.
    pub center: [f64; 2],
}

impl Feature {
    pub fn to_location(&self) -> Result<Location, GeocodeError> {
        let [lng, lat] = self.center;
        Location::new(
            self.id.as_str(),
            self.text.as_str(),
            lat,
            lng,
            self.place_name.as_str(),
        )
        .map_err(|e| GeocodeError::InvalidFeature(e.to_string()))
    }
}

impl GeocodeResponse {
    /// The first feature as a location; the rest are ignored.
    pub fn first_location(&self) -> Result<Option<Location>, GeocodeError> {
        self.features.first().map(Feature::to_location).transpose()
    }
}

pub fn parse_response(body: &str) -> Result<Option<Location>, GeocodeError> {
    let response: GeocodeResponse =
        serde_json::from_str(body).map_err(|e| GeocodeError::Parse(e.to_string()))?;
    response.first_location()
}
