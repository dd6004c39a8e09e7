use async_trait::async_trait;
use reqwest::{Request, Response};

/// The transport every service client sends its requests through.
///
/// Implementations may decorate requests (see [`super::WithHeader`]) before
/// handing them to an inner client.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
