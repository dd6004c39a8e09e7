//! Reverse geocoding: coordinates to a postal address.

use anyhow::Result;
use super::location::Coordinates;

/// The subset of a structured address the dashboard cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Address {
    pub postcode: Option<String>,
    pub city: Option<String>,
}

#[async_trait::async_trait]
pub trait ReverseGeocoder: Send + Sync {
    /// Resolves `coords` to an address.
    ///
    /// Any failure, whether transport, status or decoding, is an error; the
    /// caller does not distinguish between them.
    async fn reverse(&self, coords: Coordinates) -> Result<Address>;
}
