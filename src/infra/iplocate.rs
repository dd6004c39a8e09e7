//! Approximate location from the caller's public IP address.
//!
//! Stands in for a platform location API on machines without one. The
//! service answers `{status, lat, lon, message}` (ip-api.com shape).

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::fetch::HttpClient;
use crate::services::{Coordinates, LocationError, LocationProvider};

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
    message: Option<String>,
}

pub struct IpLocateClient<C> {
    client: C,
    base_url: String,
}

impl<C: HttpClient> IpLocateClient<C> {
    pub fn new(client: C, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

fn classify(err: &reqwest::Error) -> LocationError {
    if err.is_timeout() {
        LocationError::Timeout
    } else {
        LocationError::Unknown
    }
}

#[async_trait]
impl<C: HttpClient> LocationProvider for IpLocateClient<C> {
    #[tracing::instrument(skip(self), fields(base_url = %self.base_url))]
    async fn locate(&self) -> Result<Coordinates, LocationError> {
        let url = format!("{}/json", self.base_url.trim_end_matches('/'));
        let url: reqwest::Url = url.parse().map_err(|e| {
            debug!(error = %e, "Invalid location endpoint");
            LocationError::Unknown
        })?;

        let resp = self
            .client
            .execute(reqwest::Request::new(reqwest::Method::GET, url))
            .await
            .map_err(|e| {
                debug!(error = %e, "Location request failed");
                classify(&e)
            })?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(LocationError::PermissionDenied);
        }
        if !status.is_success() {
            debug!(%status, "Location service returned an error status");
            return Err(LocationError::Unknown);
        }

        let body: IpApiResponse = resp.json().await.map_err(|e| {
            debug!(error = %e, "Location response could not be decoded");
            classify(&e)
        })?;

        if body.status.as_deref() == Some("fail") {
            debug!(message = ?body.message, "Location service could not place this address");
            return Err(LocationError::PositionUnavailable);
        }

        match (body.lat, body.lon) {
            (Some(latitude), Some(longitude)) => Ok(Coordinates {
                latitude,
                longitude,
            }),
            _ => Err(LocationError::PositionUnavailable),
        }
    }
}
