//! Free-text place lookup.
//!
//! This module defines the [`Geocoder`] trait and the pieces shared by its
//! implementations:
//! - the provider response model ([`feature`])
//! - request construction ([`config`])
//! - an HTTP client for native targets ([`http`])
//! - a canned-response geocoder for tests and offline sessions ([`fixture`])
//!
//! The web host implements [`Geocoder`] on top of the browser fetch API.

pub mod config;
pub mod feature;
pub mod fixture;
#[cfg(not(target_arch = "wasm32"))]
pub mod http;

pub use config::*;
pub use feature::*;
pub use fixture::*;
#[cfg(not(target_arch = "wasm32"))]
pub use http::*;

use std::future::Future;
use std::pin::Pin;

use catalog::Location;

/// Error type for geocoding lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeocodeError {
    /// Transport failure (DNS, TLS, connection reset, fetch rejected).
    Network(String),
    /// The provider answered with a non-success status.
    Status(u16),
    /// The body was not a valid feature collection.
    Parse(String),
    /// A feature was present but unusable (e.g. coordinates out of range).
    InvalidFeature(String),
    /// The request URL could not be built from the configuration.
    Config(String),
}

impl std::fmt::Display for GeocodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeocodeError::Network(msg) => write!(f, "geocoding request failed: {msg}"),
            GeocodeError::Status(code) => write!(f, "geocoding provider returned HTTP {code}"),
            GeocodeError::Parse(msg) => write!(f, "geocoding response malformed: {msg}"),
            GeocodeError::InvalidFeature(msg) => write!(f, "geocoding feature unusable: {msg}"),
            GeocodeError::Config(msg) => write!(f, "geocoder misconfigured: {msg}"),
        }
    }
}

impl std::error::Error for GeocodeError {}

/// Boxed future without a `Send` bound; the widget runs on a single thread
/// and browser fetch futures are not `Send`.
pub type LocalBoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Resolves free text to at most one location.
///
/// Returns `Ok(None)` when the provider found nothing.
pub trait Geocoder {
    fn lookup<'a>(&'a self, query: &'a str)
        -> LocalBoxFuture<'a, Result<Option<Location>, GeocodeError>>;
}

impl<G: Geocoder + ?Sized> Geocoder for Box<G> {
    fn lookup<'a>(
        &'a self,
        query: &'a str,
    ) -> LocalBoxFuture<'a, Result<Option<Location>, GeocodeError>> {
        (**self).lookup(query)
    }
}
