//! Traits and types for the external lookups the dashboard chains together.
//!
//! Each stage is a trait so the pipeline can be driven with mocked
//! collaborators; the HTTP-backed implementations live in `crate::infra`.

pub mod geocode;
pub mod location;
pub mod postal;
pub mod surveillance;

pub use geocode::{Address, ReverseGeocoder};
pub use location::{
    Coordinates, FixedLocation, LocationError, LocationProvider, UNSUPPORTED_MESSAGE,
};
pub use postal::{CityIdentity, PostalCodeLookup, normalize_postcode};
pub use surveillance::SurveillanceApi;
