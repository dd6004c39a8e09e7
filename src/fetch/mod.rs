//! HTTP plumbing shared by every external lookup.
//!
//! Every service client is generic over [`HttpClient`] so the transport can be
//! wrapped (see [`WithHeader`]) or swapped out in tests.

mod basic;
mod client;
mod header;

pub use basic::BasicClient;
pub use client::HttpClient;
pub use header::WithHeader;

use anyhow::{Result, bail};
use serde::de::DeserializeOwned;
use tracing::debug;

/// Issues a GET for `url` and decodes the JSON body into `T`.
///
/// # Errors
///
/// Returns an error on transport failure, on any non-success status, or when
/// the body does not decode into `T`.
pub async fn fetch_json<C: HttpClient, T: DeserializeOwned>(client: &C, url: &str) -> Result<T> {
    let req = reqwest::Request::new(reqwest::Method::GET, url.parse()?);

    let resp = client.execute(req).await?;
    let status = resp.status();
    debug!(%status, url, "HTTP response received");

    if !status.is_success() {
        bail!("GET {} returned status {}", url, status);
    }

    Ok(resp.json::<T>().await?)
}
