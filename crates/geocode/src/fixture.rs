use std::cell::Cell;
use std::collections::HashMap;

use catalog::Location;
use serde::Deserialize;

use crate::{GeocodeError, GeocodeResponse, Geocoder, LocalBoxFuture};

/// Answers lookups from a fixed table keyed by lowercased, trimmed query.
///
/// Unknown queries resolve to "no match". Used by tests and by the CLI's
/// `--fixture` mode.
#[derive(Debug, Default)]
pub struct FixtureGeocoder {
    responses: HashMap<String, Result<GeocodeResponse, GeocodeError>>,
    calls: Cell<u32>,
}

#[derive(Deserialize)]
#[serde(transparent)]
struct FixtureFile(HashMap<String, GeocodeResponse>);

impl FixtureGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads `{ "<query>": <feature collection>, ... }`.
    pub fn from_json(raw: &str) -> Result<Self, GeocodeError> {
        let file: FixtureFile =
            serde_json::from_str(raw).map_err(|e| GeocodeError::Parse(e.to_string()))?;
        let mut geocoder = Self::new();
        for (query, response) in file.0 {
            geocoder = geocoder.with_response(&query, response);
        }
        Ok(geocoder)
    }

    pub fn with_response(mut self, query: &str, response: GeocodeResponse) -> Self {
        self.responses.insert(normalize(query), Ok(response));
        self
    }

    pub fn with_error(mut self, query: &str, error: GeocodeError) -> Self {
        self.responses.insert(normalize(query), Err(error));
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.get()
    }
}

impl Geocoder for FixtureGeocoder {
    fn lookup<'a>(
        &'a self,
        query: &'a str,
    ) -> LocalBoxFuture<'a, Result<Option<Location>, GeocodeError>> {
        self.calls.set(self.calls.get() + 1);
        let answer = match self.responses.get(&normalize(query)) {
            Some(Ok(response)) => response.first_location(),
            Some(Err(e)) => Err(e.clone()),
            None => Ok(None),
        };
        Box::pin(async move { answer })
    }
}

fn normalize(query: &str) -> String {
    query.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::FixtureGeocoder;
    use crate::{Feature, GeocodeError, GeocodeResponse, Geocoder};

    fn pune() -> GeocodeResponse {
        GeocodeResponse {
            features: vec![Feature {
                id: "place.8749".to_string(),
                text: "Pune".to_string(),
                place_name: "Pune, Maharashtra, India".to_string(),
                center: [73.8567, 18.5204],
            }],
        }
    }

    #[tokio::test]
    async fn answers_from_table() {
        let geo = FixtureGeocoder::new()
            .with_response("Pune", pune())
            .with_error("offline", GeocodeError::Network("down".to_string()));

        let hit = geo.lookup("  pune ").await.unwrap().unwrap();
        assert_eq!(hit.id.as_str(), "place.8749");
        assert_eq!(geo.lookup("atlantis").await.unwrap(), None);
        assert!(geo.lookup("offline").await.is_err());
        assert_eq!(geo.calls(), 3);
    }

    #[test]
    fn loads_fixture_file() {
        let raw = serde_json::json!({
            "pune": { "features": [{
                "id": "place.8749", "text": "Pune",
                "place_name": "Pune, Maharashtra, India", "center": [73.8567, 18.5204]
            }]}
        })
        .to_string();
        let geo = FixtureGeocoder::from_json(&raw).unwrap();
        assert!(geo.responses.contains_key("pune"));
    }
}
