//! HTTP-backed implementations of the `services` traits.

pub mod awesomeapi;
pub mod infodengue;
pub mod iplocate;
pub mod nominatim;

pub use awesomeapi::AwesomeCepClient;
pub use infodengue::InfoDengueClient;
pub use iplocate::IpLocateClient;
pub use nominatim::NominatimClient;
