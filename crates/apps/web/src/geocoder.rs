use catalog::Location;
use geocode::{GeocodeError, Geocoder, GeocoderConfig, LocalBoxFuture, parse_response};
use gloo_net::http::Request;

/// Browser `fetch` geocoder.
#[derive(Debug, Clone)]
pub struct GlooGeocoder {
    config: GeocoderConfig,
}

impl GlooGeocoder {
    pub fn new(config: GeocoderConfig) -> Self {
        Self { config }
    }
}

impl Geocoder for GlooGeocoder {
    fn lookup<'a>(
        &'a self,
        query: &'a str,
    ) -> LocalBoxFuture<'a, Result<Option<Location>, GeocodeError>> {
        Box::pin(async move {
            let url = self.config.request_url(query)?;
            let resp = Request::get(url.as_str())
                .send()
                .await
                .map_err(|e| GeocodeError::Network(e.to_string()))?;
            if !resp.ok() {
                return Err(GeocodeError::Status(resp.status()));
            }
            let body = resp
                .text()
                .await
                .map_err(|e| GeocodeError::Network(e.to_string()))?;
            parse_response(&body)
        })
    }
}
