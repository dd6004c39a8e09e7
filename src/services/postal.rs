//! Postal code to municipality resolution.

use anyhow::Result;
/// A municipality: display name plus its administrative (IBGE) code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityIdentity {
    pub name: String,
    pub code: String,
}

#[async_trait::async_trait]
pub trait PostalCodeLookup: Send + Sync {
    /// Looks up a postal code, already stripped of hyphens.
    async fn lookup(&self, postcode: &str) -> Result<CityIdentity>;
}

/// Removes every hyphen from `postcode`. Nothing else is validated.
pub fn normalize_postcode(postcode: &str) -> String {
    postcode.replace('-', "")
}
