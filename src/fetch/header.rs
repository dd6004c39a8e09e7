use super::client::HttpClient;
use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};

/// An [`HttpClient`] wrapper that sets one header on every request.
///
/// Nominatim rejects anonymous traffic, so the reverse geocoder is wrapped
/// with `User-Agent` set to the configured application identifier.
pub struct WithHeader<C> {
    inner: C,
    name: HeaderName,
    value: HeaderValue,
}

impl<C> WithHeader<C> {
    /// # Errors
    ///
    /// Fails when `name` or `value` is not a legal HTTP header.
    pub fn new(inner: C, name: &str, value: &str) -> anyhow::Result<Self> {
        Ok(Self {
            inner,
            name: HeaderName::from_bytes(name.as_bytes())?,
            value: HeaderValue::from_str(value)?,
        })
    }

    pub fn user_agent(inner: C, value: &str) -> anyhow::Result<Self> {
        Self::new(inner, "User-Agent", value)
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for WithHeader<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        req.headers_mut().insert(self.name.clone(), self.value.clone());
        self.inner.execute(req).await
    }
}
