use serde::{Deserialize, Serialize};
use url::Url;

use crate::GeocodeError;

pub const DEFAULT_ENDPOINT: &str = "https://api.mapbox.com/geocoding/v5/mapbox.places";

/// Where and how to query the forward-geocoding endpoint.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocoderConfig {
    pub endpoint: String,
    pub access_token: String,
    /// Only the first feature is ever used; the provider is asked for no more.
    pub limit: u32,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            access_token: String::new(),
            limit: 1,
        }
    }
}

// Keeps the token out of logs.
impl std::fmt::Debug for GeocoderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeocoderConfig")
            .field("endpoint", &self.endpoint)
            .field("access_token", &if self.access_token.is_empty() { "<unset>" } else { "<redacted>" })
            .field("limit", &self.limit)
            .finish()
    }
}

impl GeocoderConfig {
    pub fn with_token(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            ..Self::default()
        }
    }

    /// `{endpoint}/{query}.json?access_token=..&limit=..`, with the query
    /// percent-encoded as a single path segment.
    pub fn request_url(&self, query: &str) -> Result<Url, GeocodeError> {
        let mut url = Url::parse(&self.endpoint)
            .map_err(|e| GeocodeError::Config(format!("endpoint {:?}: {e}", self.endpoint)))?;
        url.path_segments_mut()
            .map_err(|_| GeocodeError::Config(format!("endpoint {:?} cannot take a path", self.endpoint)))?
            .pop_if_empty()
            .push(&format!("{query}.json"));
        url.query_pairs_mut()
            .append_pair("access_token", &self.access_token)
            .append_pair("limit", &self.limit.max(1).to_string());
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::GeocoderConfig;
    use crate::GeocodeError;

    #[test]
    fn encodes_query_as_one_segment() {
        let cfg = GeocoderConfig::with_token("pk.test");
        let url = cfg.request_url("New Delhi/NCR").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.mapbox.com/geocoding/v5/mapbox.places/New%20Delhi%2FNCR.json?access_token=pk.test&limit=1"
        );
    }

    #[test]
    fn tolerates_trailing_slash_in_endpoint() {
        let cfg = GeocoderConfig {
            endpoint: "http://127.0.0.1:9000/places/".to_string(),
            ..GeocoderConfig::with_token("t")
        };
        assert_eq!(cfg.request_url("goa").unwrap().path(), "/places/goa.json");
    }

    #[test]
    fn rejects_unusable_endpoint() {
        let cfg = GeocoderConfig {
            endpoint: "not a url".to_string(),
            ..GeocoderConfig::default()
        };
        assert!(matches!(cfg.request_url("goa"), Err(GeocodeError::Config(_))));
    }

    #[test]
    fn debug_hides_token() {
        let cfg = GeocoderConfig::with_token("pk.secret");
        assert!(!format!("{cfg:?}").contains("pk.secret"));
    }
}
