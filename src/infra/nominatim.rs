//! Reverse geocoding via Nominatim (OpenStreetMap).

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::fetch::{HttpClient, fetch_json};
use crate::services::{Address, Coordinates, ReverseGeocoder};

#[derive(Debug, Deserialize)]
struct NominatimResponse {
    address: Option<NominatimAddress>,
}

#[derive(Debug, Deserialize)]
struct NominatimAddress {
    postcode: Option<String>,
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    municipality: Option<String>,
}

pub struct NominatimClient<C> {
    client: C,
    base_url: String,
}

impl<C: HttpClient> NominatimClient<C> {
    pub fn new(client: C, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl<C: HttpClient> ReverseGeocoder for NominatimClient<C> {
    #[tracing::instrument(skip(self))]
    async fn reverse(&self, coords: Coordinates) -> Result<Address> {
        let url = format!(
            "{}/reverse?format=json&lat={}&lon={}",
            self.base_url.trim_end_matches('/'),
            coords.latitude,
            coords.longitude
        );

        let body: NominatimResponse = fetch_json(&self.client, &url).await?;

        // A response without an address is still a success; the postal
        // stage fails on the missing postcode instead.
        let Some(addr) = body.address else {
            debug!("Reverse geocode returned no address");
            return Ok(Address::default());
        };

        let city = addr
            .city
            .or(addr.town)
            .or(addr.village)
            .or(addr.municipality);

        debug!(postcode = ?addr.postcode, city = ?city, "Reverse geocoded");
        Ok(Address {
            postcode: addr.postcode,
            city,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::BasicClient;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const RIO: Coordinates = Coordinates {
        latitude: -22.9,
        longitude: -43.2,
    };

    #[tokio::test]
    async fn test_reverse_returns_postcode() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/reverse"))
            .and(query_param("format", "json"))
            .and(query_param("lat", "-22.9"))
            .and(query_param("lon", "-43.2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "display_name": "Centro, Rio de Janeiro",
                "address": {
                    "postcode": "20040-020",
                    "city": "Rio de Janeiro",
                    "state": "Rio de Janeiro"
                }
            })))
            .mount(&server)
            .await;

        let address = NominatimClient::new(BasicClient::new(), server.uri())
            .reverse(RIO)
            .await
            .unwrap();
        assert_eq!(address.postcode.as_deref(), Some("20040-020"));
        assert_eq!(address.city.as_deref(), Some("Rio de Janeiro"));
    }

    #[tokio::test]
    async fn test_reverse_falls_back_to_town() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/reverse"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "address": {"town": "Paraty", "postcode": "23970-000"}
            })))
            .mount(&server)
            .await;

        let address = NominatimClient::new(BasicClient::new(), server.uri())
            .reverse(RIO)
            .await
            .unwrap();
        assert_eq!(address.city.as_deref(), Some("Paraty"));
    }

    #[tokio::test]
    async fn test_reverse_without_address_has_no_postcode() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "error": "Unable to geocode"
            })))
            .mount(&server)
            .await;

        let address = NominatimClient::new(BasicClient::new(), server.uri())
            .reverse(RIO)
            .await
            .unwrap();
        assert_eq!(address, Address::default());
    }

    #[tokio::test]
    async fn test_reverse_server_error_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let result = NominatimClient::new(BasicClient::new(), server.uri())
            .reverse(RIO)
            .await;
        assert!(result.is_err());
    }
}
