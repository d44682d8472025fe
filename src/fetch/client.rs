use async_trait::async_trait;
use reqwest::{Request, Response};

/// Executes a single prepared HTTP request.
///
/// Implementations are layered: [`super::BasicClient`] does the network I/O and
/// wrappers such as [`super::auth::ApiKey`] decorate the request on the way through.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}

#[async_trait]
impl<C: HttpClient + ?Sized> HttpClient for std::sync::Arc<C> {
    async fn execute(&self, req: Request) -> reqwest::Result<Response> {
        (**self).execute(req).await
    }
}
