use serde::Deserialize;
use tokio::sync::OnceCell;

use crate::error::{AcquisitionError, AcquisitionResult};

/// Body of the bootstrap pointer document.
#[derive(Debug, Deserialize, PartialEq)]
struct PointerDocument {
    api_url: String,
}

/// Discovers the catalog base URL from a remote pointer document.
///
/// The first successful resolution is kept for the lifetime of the resolver;
/// a failed attempt leaves the cell empty so the next call fetches again.
/// Share one resolver (behind an `Arc`) between every client that talks to
/// the catalog.
#[derive(Debug)]
pub struct EndpointResolver {
    bootstrap_url: String,
    client: reqwest::Client,
    base_url: OnceCell<String>,
}

impl EndpointResolver {
    pub fn new(client: reqwest::Client, bootstrap_url: impl Into<String>) -> Self {
        EndpointResolver {
            bootstrap_url: bootstrap_url.into(),
            client,
            base_url: OnceCell::new(),
        }
    }

    /// A resolver that never fetches, e.g. for tests or a pinned deployment.
    pub fn preresolved(base_url: impl Into<String>) -> Self {
        EndpointResolver {
            bootstrap_url: String::new(),
            client: reqwest::Client::new(),
            base_url: OnceCell::new_with(Some(base_url.into())),
        }
    }

    pub fn cached(&self) -> Option<&str> {
        self.base_url.get().map(String::as_str)
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn resolve(&self) -> AcquisitionResult<String> {
        let url = self
            .base_url
            .get_or_try_init(|| self.fetch_pointer())
            .await?;
        Ok(url.clone())
    }

    async fn fetch_pointer(&self) -> AcquisitionResult<String> {
        tracing::debug!(url = %self.bootstrap_url, "GET bootstrap pointer");
        let resp = self
            .client
            .get(&self.bootstrap_url)
            .send()
            .await
            .map_err(|e| AcquisitionError::Resolution(format!("bootstrap fetch failed: {e}")))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(AcquisitionError::Resolution(format!(
                "bootstrap fetch returned HTTP {}",
                status.as_u16()
            )));
        }
        let body = resp
            .text()
            .await
            .map_err(|e| AcquisitionError::Resolution(format!("bootstrap read failed: {e}")))?;
        let pointer: PointerDocument = serde_json::from_str(&body).map_err(|e| {
            AcquisitionError::Resolution(format!("malformed pointer document: {e}"))
        })?;
        if pointer.api_url.trim().is_empty() {
            return Err(AcquisitionError::Resolution(
                "pointer document has an empty api_url".into(),
            ));
        }
        tracing::info!(api_url = %pointer.api_url, "resolved catalog endpoint");
        Ok(pointer.api_url)
    }
}
