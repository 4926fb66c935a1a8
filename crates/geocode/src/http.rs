use catalog::Location;
use tracing::debug;

use crate::{GeocodeError, Geocoder, GeocoderConfig, LocalBoxFuture, parse_response};

/// Forward geocoder over HTTP.
pub struct HttpGeocoder {
    config: GeocoderConfig,
    client: reqwest::Client,
}

impl HttpGeocoder {
    pub fn new(config: GeocoderConfig) -> Self {
        Self::with_client(config, reqwest::Client::new())
    }

    pub fn with_client(config: GeocoderConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    async fn fetch(&self, query: &str) -> Result<Option<Location>, GeocodeError> {
        let url = self.config.request_url(query)?;
        debug!(endpoint = %self.config.endpoint, query, "geocode request");

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| GeocodeError::Network(e.without_url().to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(GeocodeError::Status(status.as_u16()));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| GeocodeError::Network(e.without_url().to_string()))?;
        parse_response(&body)
    }
}

impl Geocoder for HttpGeocoder {
    fn lookup<'a>(
        &'a self,
        query: &'a str,
    ) -> LocalBoxFuture<'a, Result<Option<Location>, GeocodeError>> {
        Box::pin(self.fetch(query))
    }
}
