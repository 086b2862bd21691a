pub mod endpoint;

use std::{sync::Arc, time::Duration};

pub use endpoint::EndpointResolver;

use crate::{
    domain::models::BookSet,
    error::{AcquisitionError, AcquisitionResult},
};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(60);
const READ_TIMEOUT: Duration = Duration::from_secs(100);

/// The shared HTTP client for every upstream call. Timeouts are generous
/// because the catalog is a third-party service; callers wanting tighter
/// bounds wrap individual calls in `tokio::time::timeout`.
pub fn build_http_client() -> anyhow::Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .read_timeout(READ_TIMEOUT)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

/// Queries against the primary catalog. Holds no mutable state of its own;
/// the base URL always comes from the shared [`EndpointResolver`].
#[derive(Clone, Debug)]
pub struct CatalogClient {
    resolver: Arc<EndpointResolver>,
    client: reqwest::Client,
}

impl CatalogClient {
    pub fn new(resolver: Arc<EndpointResolver>, client: reqwest::Client) -> Self {
        CatalogClient { resolver, client }
    }

    /// The catalog base URL, once it has been resolved.
    pub fn base_url(&self) -> Option<&str> {
        self.resolver.cached()
    }

    /// Unfiltered listing (`?page=`).
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn list_all(&self, page: u32) -> AcquisitionResult<BookSet> {
        self.query(&[("page", page.to_string())]).await
    }

    /// Free-text search (`?search=`); the query is percent-encoded on the wire.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn search(&self, query: &str) -> AcquisitionResult<BookSet> {
        self.query(&[("search", query.to_string())]).await
    }

    /// Lookup by catalog id (`?ids=`). Zero results is a valid, empty set.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn get_by_id(&self, id: i64) -> AcquisitionResult<BookSet> {
        self.query(&[("ids", id.to_string())]).await
    }

    /// Filtered listing (`?page=&topic=`).
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn list_by_category(&self, category: &str, page: u32) -> AcquisitionResult<BookSet> {
        self.query(&[("page", page.to_string()), ("topic", category.to_string())])
            .await
    }

    async fn query(&self, params: &[(&str, String)]) -> AcquisitionResult<BookSet> {
        let base_url = self.resolver.resolve().await?;
        tracing::debug!(url = %base_url, ?params, "GET catalog");
        let resp = self.client.get(&base_url).query(params).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(AcquisitionError::Status {
                status: status.as_u16(),
                url: resp.url().to_string(),
            });
        }
        let body = resp.text().await?;
        match serde_json::from_str::<BookSet>(&body) {
            Ok(parsed) => Ok(parsed),
            Err(e) => {
                let snippet: String = body.chars().take(2000).collect();
                tracing::error!(error = %e, body_snippet = %snippet, "failed to parse BookSet");
                Err(e.into())
            }
        }
    }
}
