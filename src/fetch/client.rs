use async_trait::async_trait;
use reqwest::{Request, Response};

/// Minimal HTTP execution seam. Auth wrappers decorate requests before
/// delegating to an inner client, so store credentials never leak into
/// call sites.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
